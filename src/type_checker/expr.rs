//! Expression checking and constant folding.
//!
//! Every `type_check_*` function here pushes exactly one type, the type of
//! the expression it built, after popping whatever its children pushed.

use crate::{
    ast::expressions::{BinaryOperator, Expr, ExprKind, UnaryOperator},
    errors::errors::{ErrorImpl, InternalError},
    Position,
};

use super::{
    type_checker::TypeChecker,
    typed_ast::{TypedExpr, TypedExprKind},
    types::Type,
};

fn finish(type_checker: &mut TypeChecker, kind: TypedExprKind, ty: Type, position: Position) -> TypedExpr {
    type_checker.push_type(ty.clone());
    TypedExpr {
        index: type_checker.next_index(),
        ty,
        position,
        kind,
    }
}

pub fn type_check_expr(type_checker: &mut TypeChecker, ast: &Expr) -> Result<TypedExpr, InternalError> {
    let position = ast.position;

    match &ast.kind {
        ExprKind::IntLiteral(value) => {
            let value = match i32::try_from(*value) {
                Ok(value) => value,
                Err(_) => {
                    type_checker.add_error(ErrorImpl::IntegerOutOfRange { value: *value }, position);
                    -1
                }
            };
            Ok(finish(type_checker, TypedExprKind::IntLiteral(value), Type::Int, position))
        }
        ExprKind::BoolLiteral(value) => Ok(finish(
            type_checker,
            TypedExprKind::BoolLiteral(*value),
            Type::Bool,
            position,
        )),
        ExprKind::CharLiteral(value) => Ok(finish(
            type_checker,
            TypedExprKind::CharLiteral(*value),
            Type::Char,
            position,
        )),
        ExprKind::StringLiteral(text) => {
            let elements = text
                .chars()
                .map(|character| TypedExpr {
                    index: type_checker.next_index(),
                    ty: Type::Char,
                    position,
                    kind: TypedExprKind::CharLiteral(character),
                })
                .collect();

            Ok(finish(
                type_checker,
                TypedExprKind::ArrayLiteral {
                    elements,
                    is_string: true,
                },
                Type::String,
                position,
            ))
        }
        ExprKind::PairLiteral => Ok(finish(type_checker, TypedExprKind::Null, Type::any_pair(), position)),
        ExprKind::Identifier(name) => type_check_identifier(type_checker, name, position),
        ExprKind::ArrayElement { name, indices } => type_check_array_element(type_checker, name, indices, position),
        ExprKind::Unary { operator, operand } => type_check_unary(type_checker, *operator, operand, position),
        ExprKind::Binary { operator, left, right } => {
            type_check_binary(type_checker, *operator, left, right, position)
        }
        ExprKind::ArrayLiteral(elements) => type_check_array_literal(type_checker, elements, position),
        ExprKind::NewPair(left, right) => {
            let left = type_check_expr(type_checker, left)?;
            let right = type_check_expr(type_checker, right)?;
            let right_type = type_checker.pop_type(position)?;
            let left_type = type_checker.pop_type(position)?;

            Ok(finish(
                type_checker,
                TypedExprKind::NewPair(Box::new(left), Box::new(right)),
                Type::pair(left_type, right_type),
                position,
            ))
        }
        ExprKind::PairElement { is_first, value } => {
            let value = type_check_expr(type_checker, value)?;
            let pair = type_checker.pop_type(position)?;

            let ty = match pair {
                Type::Pair(left, right) => {
                    if *is_first {
                        *left
                    } else {
                        *right
                    }
                }
                Type::Any => Type::Any,
                other => {
                    type_checker.add_error(
                        ErrorImpl::PairElementOfNonPair {
                            received: other.to_string(),
                        },
                        position,
                    );
                    Type::Any
                }
            };

            Ok(finish(
                type_checker,
                TypedExprKind::PairElement {
                    is_first: *is_first,
                    value: Box::new(value),
                },
                ty,
                position,
            ))
        }
        ExprKind::Call { name, arguments } => type_check_call(type_checker, name, arguments, position),
    }
}

pub fn type_check_identifier(
    type_checker: &mut TypeChecker,
    name: &str,
    position: Position,
) -> Result<TypedExpr, InternalError> {
    let scope = type_checker.current_scope();

    let (variable, ty) = match type_checker.scopes.lookup(scope, name, position) {
        Ok(variable) => (Some(variable), type_checker.scopes.variable(variable)?.ty.clone()),
        Err(error) => {
            type_checker.report(error);
            (None, Type::Any)
        }
    };

    Ok(finish(
        type_checker,
        TypedExprKind::Identifier {
            name: name.to_string(),
            variable,
        },
        ty,
        position,
    ))
}

fn type_check_array_element(
    type_checker: &mut TypeChecker,
    name: &str,
    indices: &[Expr],
    position: Position,
) -> Result<TypedExpr, InternalError> {
    let base = type_check_identifier(type_checker, name, position)?;

    let mut typed_indices = vec![];
    for index in indices.iter() {
        typed_indices.push(type_check_expr(type_checker, index)?);
    }

    let index_types = type_checker.pop_types(indices.len(), position)?;
    let array = type_checker.pop_type(position)?;

    let ty = if index_types.iter().any(|ty| !Type::Int.equals(ty)) {
        type_checker.add_error(ErrorImpl::NonIntegerIndex, position);
        Type::Any
    } else if array == Type::Any {
        Type::Any
    } else if !Type::any_array().equals(&array.as_array()) {
        type_checker.add_error(
            ErrorImpl::IndexNonArray {
                received: array.to_string(),
            },
            position,
        );
        Type::Any
    } else {
        match array.index_into(indices.len()) {
            Some(ty) => ty,
            None => {
                let dimensions = match array.as_array() {
                    Type::Array(_, dimensions) => dimensions,
                    _ => 0,
                };
                type_checker.add_error(
                    ErrorImpl::TooManyIndices {
                        array: name.to_string(),
                        dimensions,
                        depth: indices.len(),
                    },
                    position,
                );
                Type::Any
            }
        }
    };

    Ok(finish(
        type_checker,
        TypedExprKind::ArrayElement {
            base: Box::new(base),
            indices: typed_indices,
        },
        ty,
        position,
    ))
}

fn type_check_unary(
    type_checker: &mut TypeChecker,
    operator: UnaryOperator,
    operand: &Expr,
    position: Position,
) -> Result<TypedExpr, InternalError> {
    let operand = type_check_expr(type_checker, operand)?;
    let received = type_checker.pop_type(position)?;

    let (expected, result) = match operator {
        UnaryOperator::Not => (Type::Bool, Type::Bool),
        UnaryOperator::Negate => (Type::Int, Type::Int),
        UnaryOperator::Len => (Type::any_array(), Type::Int),
        UnaryOperator::Ord => (Type::Char, Type::Int),
        UnaryOperator::Chr => (Type::Int, Type::Char),
    };

    if !expected.equals(&received.as_array()) {
        type_checker.add_error(
            ErrorImpl::UnaryOperandMismatch {
                operator: operator.to_string(),
                expected: expected.to_string(),
                received: received.to_string(),
            },
            position,
        );
    }

    Ok(finish(
        type_checker,
        TypedExprKind::Unary {
            operator,
            operand: Box::new(operand),
        },
        result,
        position,
    ))
}

/// Operand type an operator requires, and the type it produces.
pub fn binary_signature(operator: BinaryOperator) -> (Type, Type) {
    match operator {
        BinaryOperator::Multiply
        | BinaryOperator::Divide
        | BinaryOperator::Modulo
        | BinaryOperator::Plus
        | BinaryOperator::Minus => (Type::Int, Type::Int),
        BinaryOperator::Greater
        | BinaryOperator::GreaterEqual
        | BinaryOperator::Less
        | BinaryOperator::LessEqual => (Type::IntOrChar, Type::Bool),
        BinaryOperator::Equal | BinaryOperator::NotEqual => (Type::Any, Type::Bool),
        BinaryOperator::And | BinaryOperator::Or => (Type::Bool, Type::Bool),
    }
}

fn type_check_binary(
    type_checker: &mut TypeChecker,
    operator: BinaryOperator,
    left: &Expr,
    right: &Expr,
    position: Position,
) -> Result<TypedExpr, InternalError> {
    let left = type_check_expr(type_checker, left)?;
    let right = type_check_expr(type_checker, right)?;
    let right_type = type_checker.pop_type(position)?;
    let left_type = type_checker.pop_type(position)?;

    let (expected, result) = binary_signature(operator);
    let mut is_valid = true;

    if !expected.equals(&left_type) {
        // Naming the right operand's type reads better when that side is fine
        let wanted = if expected.equals(&right_type) { &right_type } else { &expected };
        type_checker.add_error(
            ErrorImpl::LeftOperandMismatch {
                operator: operator.to_string(),
                expected: wanted.to_string(),
                received: left_type.to_string(),
            },
            position,
        );
        is_valid = false;
    }

    if !expected.equals(&right_type) {
        let wanted = if expected.equals(&left_type) { &left_type } else { &expected };
        type_checker.add_error(
            ErrorImpl::RightOperandMismatch {
                operator: operator.to_string(),
                expected: wanted.to_string(),
                received: right_type.to_string(),
            },
            position,
        );
        is_valid = false;
    }

    if is_valid && !left_type.equals(&right_type) {
        type_checker.add_error(
            ErrorImpl::OperandTypeMismatch {
                operator: operator.to_string(),
            },
            position,
        );
        is_valid = false;
    }

    if is_valid {
        if let (Some(lhs), Some(rhs)) = (left.literal_value(), right.literal_value()) {
            if let Some(folded) = fold_constant(type_checker, operator, lhs, rhs, position) {
                log::trace!("folded '{}' on line {} into {:?}", operator, position.0, folded);
                let ty = match folded {
                    TypedExprKind::BoolLiteral(_) => Type::Bool,
                    _ => Type::Int,
                };
                return Ok(finish(type_checker, folded, ty, position));
            }
        }
    }

    Ok(finish(
        type_checker,
        TypedExprKind::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        },
        result,
        position,
    ))
}

/// Evaluates an operator over two literal values. Reports and refuses to
/// fold operations that would fault at runtime.
fn fold_constant(
    type_checker: &mut TypeChecker,
    operator: BinaryOperator,
    lhs: i64,
    rhs: i64,
    position: Position,
) -> Option<TypedExprKind> {
    let arithmetic = |value: Option<i64>, type_checker: &mut TypeChecker| match value
        .and_then(|value| i32::try_from(value).ok())
    {
        Some(value) => Some(TypedExprKind::IntLiteral(value)),
        None => {
            type_checker.add_error(
                ErrorImpl::ConstantOverflow {
                    operator: operator.to_string(),
                },
                position,
            );
            None
        }
    };

    match operator {
        BinaryOperator::Plus => arithmetic(lhs.checked_add(rhs), type_checker),
        BinaryOperator::Minus => arithmetic(lhs.checked_sub(rhs), type_checker),
        BinaryOperator::Multiply => arithmetic(lhs.checked_mul(rhs), type_checker),
        BinaryOperator::Divide | BinaryOperator::Modulo if rhs == 0 => {
            type_checker.add_error(ErrorImpl::DivideByZero, position);
            None
        }
        BinaryOperator::Divide => Some(TypedExprKind::IntLiteral((lhs as i32).wrapping_div(rhs as i32))),
        BinaryOperator::Modulo => Some(TypedExprKind::IntLiteral((lhs as i32).wrapping_rem(rhs as i32))),
        BinaryOperator::Greater => Some(TypedExprKind::BoolLiteral(lhs > rhs)),
        BinaryOperator::GreaterEqual => Some(TypedExprKind::BoolLiteral(lhs >= rhs)),
        BinaryOperator::Less => Some(TypedExprKind::BoolLiteral(lhs < rhs)),
        BinaryOperator::LessEqual => Some(TypedExprKind::BoolLiteral(lhs <= rhs)),
        BinaryOperator::Equal => Some(TypedExprKind::BoolLiteral(lhs == rhs)),
        BinaryOperator::NotEqual => Some(TypedExprKind::BoolLiteral(lhs != rhs)),
        BinaryOperator::And => Some(TypedExprKind::BoolLiteral(lhs == 1 && rhs == 1)),
        BinaryOperator::Or => Some(TypedExprKind::BoolLiteral(lhs == 1 || rhs == 1)),
    }
}

fn type_check_array_literal(
    type_checker: &mut TypeChecker,
    elements: &[Expr],
    position: Position,
) -> Result<TypedExpr, InternalError> {
    let mut typed = vec![];
    for element in elements.iter() {
        typed.push(type_check_expr(type_checker, element)?);
    }
    let element_types = type_checker.pop_types(elements.len(), position)?;

    let ty = match element_types.first() {
        None => Type::any_array(),
        Some(first) if element_types.iter().any(|ty| !ty.equals(first)) => {
            type_checker.add_error(ErrorImpl::UnmatchedArrayLiteral, position);
            Type::any_array()
        }
        Some(first) => match first.as_array() {
            Type::Array(base, -1) => Type::Array(base, -1),
            Type::Array(base, dimensions) => Type::Array(base, dimensions + 1),
            element => Type::array(element, 1),
        },
    };

    let is_string = !typed.is_empty()
        && typed
            .iter()
            .all(|element| matches!(element.kind, TypedExprKind::CharLiteral(_)));

    Ok(finish(
        type_checker,
        TypedExprKind::ArrayLiteral {
            elements: typed,
            is_string,
        },
        ty,
        position,
    ))
}

fn type_check_call(
    type_checker: &mut TypeChecker,
    name: &str,
    arguments: &[Expr],
    position: Position,
) -> Result<TypedExpr, InternalError> {
    let mut typed = vec![];
    for argument in arguments.iter() {
        typed.push(type_check_expr(type_checker, argument)?);
    }
    let argument_types = type_checker.pop_types(arguments.len(), position)?;

    let (function, ty) = match type_checker.functions.resolve(name, &argument_types, position) {
        Ok(function) => (Some(function), type_checker.functions.get(function).return_type.clone()),
        Err(_) => {
            let overloads = type_checker.functions.overloads(name);
            let candidate = overloads
                .iter()
                .copied()
                .find(|id| type_checker.functions.get(*id).parameters.len() == arguments.len())
                .or_else(|| overloads.first().copied());

            match candidate {
                None => {
                    type_checker.add_error(
                        ErrorImpl::UndeclaredFunction {
                            function: name.to_string(),
                        },
                        position,
                    );
                    (None, Type::Any)
                }
                Some(candidate) => {
                    report_call_mismatch(type_checker, name, candidate, &argument_types, position);
                    (
                        Some(candidate),
                        type_checker.functions.get(candidate).return_type.clone(),
                    )
                }
            }
        }
    };

    Ok(finish(
        type_checker,
        TypedExprKind::Call {
            name: name.to_string(),
            function,
            arguments: typed,
        },
        ty,
        position,
    ))
}

fn report_call_mismatch(
    type_checker: &mut TypeChecker,
    name: &str,
    candidate: super::functions::FunctionId,
    arguments: &[Type],
    position: Position,
) {
    let parameters = type_checker.functions.get(candidate).parameter_types();

    if arguments.len() > parameters.len() {
        type_checker.add_error(
            ErrorImpl::TooManyArguments {
                function: name.to_string(),
                expected: parameters.len(),
                received: arguments.len(),
            },
            position,
        );
    } else if arguments.len() < parameters.len() {
        type_checker.add_error(
            ErrorImpl::TooFewArguments {
                function: name.to_string(),
                expected: parameters.len(),
                received: arguments.len(),
            },
            position,
        );
    }

    // Overlapping positions are checked even after an arity error
    for (number, (parameter, argument)) in parameters.iter().zip(arguments.iter()).enumerate() {
        if !parameter.equals(argument) {
            type_checker.add_error(
                ErrorImpl::ArgumentTypeMismatch {
                    function: name.to_string(),
                    position: number + 1,
                    expected: parameter.to_string(),
                    received: argument.to_string(),
                },
                position,
            );
        }
    }
}
