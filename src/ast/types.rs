use std::fmt::Display;

/// A type annotation as written in the source program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeNode {
    Int,
    Bool,
    Char,
    String,
    /// `T[]`, nesting once per pair of brackets
    Array(Box<TypeNode>),
    /// `pair(L, R)`
    Pair(Box<TypeNode>, Box<TypeNode>),
    /// The bare `pair` keyword used as the element type of another pair
    ErasedPair,
}

impl TypeNode {
    pub fn array_of(element: TypeNode) -> Self {
        TypeNode::Array(Box::new(element))
    }

    pub fn pair_of(left: TypeNode, right: TypeNode) -> Self {
        TypeNode::Pair(Box::new(left), Box::new(right))
    }
}

impl Display for TypeNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeNode::Int => write!(f, "int"),
            TypeNode::Bool => write!(f, "bool"),
            TypeNode::Char => write!(f, "char"),
            TypeNode::String => write!(f, "string"),
            TypeNode::Array(element) => write!(f, "{}[]", element),
            TypeNode::Pair(left, right) => write!(f, "pair({}, {})", left, right),
            TypeNode::ErasedPair => write!(f, "pair"),
        }
    }
}
