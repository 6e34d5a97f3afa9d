//! Semantic value types.
//!
//! `Type::equals` is the compatibility relation used by every check in the
//! analyzer. It is deliberately not an equivalence:
//!
//! - `Any` is compatible with everything, so compatibility is not transitive
//! - `string` and `char[]` are the same value and compare equal, also when
//!   nested (`string[]` is `char[][]`)
//! - an array with `-1` dimensions is compatible with every array
//! - `IntOrChar` only exists while checking ordering operands
//!
//! The relation is symmetric: every rule is applied in both directions.

use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Any,
    Int,
    Bool,
    Char,
    String,
    /// Element type and dimension count; `-1` dimensions matches any array
    Array(Box<Type>, i32),
    Pair(Box<Type>, Box<Type>),
    IntOrChar,
}

impl Type {
    pub fn array(element: Type, dimensions: i32) -> Self {
        Type::Array(Box::new(element), dimensions)
    }

    pub fn pair(left: Type, right: Type) -> Self {
        Type::Pair(Box::new(left), Box::new(right))
    }

    /// The array type every array is compatible with.
    pub fn any_array() -> Self {
        Type::array(Type::Any, -1)
    }

    /// The universal pair type, also the type of `null`.
    pub fn any_pair() -> Self {
        Type::pair(Type::Any, Type::Any)
    }

    pub fn size_in_bytes(&self) -> i32 {
        match self {
            Type::Bool | Type::Char => 1,
            _ => 4,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array(..) | Type::String)
    }

    /// Views a string as the character array it is stored as. Arrays of
    /// strings gain the extra dimension. Other types are returned unchanged.
    pub fn as_array(&self) -> Type {
        match self {
            Type::String => Type::array(Type::Char, 1),
            Type::Array(element, dimensions) if **element == Type::String && *dimensions >= 0 => {
                Type::array(Type::Char, dimensions + 1)
            }
            other => other.clone(),
        }
    }

    /// Whether values of this type are rendered as text by `print`.
    pub fn is_string_like(&self) -> bool {
        match self.as_array() {
            Type::Array(element, 1) => *element == Type::Char,
            _ => false,
        }
    }

    /// The type of an array after indexing it `depth` times, or `None` when
    /// the array has fewer dimensions than that.
    pub fn index_into(&self, depth: usize) -> Option<Type> {
        match self.as_array() {
            Type::Array(element, -1) => Some(if depth == 0 {
                Type::Array(element, -1)
            } else {
                *element
            }),
            Type::Array(element, dimensions) => {
                let remaining = dimensions - depth as i32;
                if remaining < 0 {
                    None
                } else if remaining == 0 {
                    Some(*element)
                } else {
                    Some(Type::Array(element, remaining))
                }
            }
            _ => None,
        }
    }

    pub fn equals(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Any, _) | (_, Type::Any) => true,
            (Type::Int, Type::Int)
            | (Type::Bool, Type::Bool)
            | (Type::Char, Type::Char)
            | (Type::String, Type::String)
            | (Type::IntOrChar, Type::IntOrChar) => true,
            (Type::IntOrChar, Type::Int | Type::Char) | (Type::Int | Type::Char, Type::IntOrChar) => {
                true
            }
            (Type::String, Type::Array(..))
            | (Type::Array(..), Type::String)
            | (Type::Array(..), Type::Array(..)) => array_equals(&self.as_array(), &other.as_array()),
            (Type::Pair(left, right), Type::Pair(other_left, other_right)) => {
                left.equals(other_left) && right.equals(other_right)
            }
            _ => false,
        }
    }
}

fn array_equals(left: &Type, right: &Type) -> bool {
    match (left, right) {
        (Type::Array(left_element, left_dimensions), Type::Array(right_element, right_dimensions)) => {
            let dimensions_match =
                left_dimensions == right_dimensions || *left_dimensions == -1 || *right_dimensions == -1;
            dimensions_match && left_element.equals(right_element)
        }
        _ => false,
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Any => write!(f, "any"),
            Type::Int => write!(f, "int"),
            Type::Bool => write!(f, "bool"),
            Type::Char => write!(f, "char"),
            Type::String => write!(f, "string"),
            Type::IntOrChar => write!(f, "int/char"),
            Type::Array(element, dimensions) => {
                write!(f, "{}", element)?;
                for _ in 0..(*dimensions).max(1) {
                    write!(f, "[]")?;
                }
                Ok(())
            }
            Type::Pair(left, right) => write!(f, "pair({}, {})", left, right),
        }
    }
}
