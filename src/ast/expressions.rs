use std::fmt::Display;

use crate::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Multiply,
    Divide,
    Modulo,
    Plus,
    Minus,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Equal,
    NotEqual,
    And,
    Or,
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Plus => "+",
            BinaryOperator::Minus => "-",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Not,
    Negate,
    Len,
    Ord,
    Chr,
}

impl Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            UnaryOperator::Not => "!",
            UnaryOperator::Negate => "-",
            UnaryOperator::Len => "len",
            UnaryOperator::Ord => "ord",
            UnaryOperator::Chr => "chr",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Integer literal as scanned; range checking happens during analysis
    IntLiteral(i64),
    BoolLiteral(bool),
    CharLiteral(char),
    /// String literal with escape sequences already decoded
    StringLiteral(String),
    /// The `null` pair literal
    PairLiteral,
    Identifier(String),
    ArrayElement {
        name: String,
        indices: Vec<Expr>,
    },
    Unary {
        operator: UnaryOperator,
        operand: Box<Expr>,
    },
    Binary {
        operator: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    ArrayLiteral(Vec<Expr>),
    NewPair(Box<Expr>, Box<Expr>),
    PairElement {
        is_first: bool,
        value: Box<Expr>,
    },
    Call {
        name: String,
        arguments: Vec<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub position: Position,
}

impl Expr {
    pub fn new(kind: ExprKind, position: Position) -> Self {
        Expr { kind, position }
    }

    pub fn int(value: i64, position: Position) -> Self {
        Expr::new(ExprKind::IntLiteral(value), position)
    }

    pub fn bool(value: bool, position: Position) -> Self {
        Expr::new(ExprKind::BoolLiteral(value), position)
    }

    pub fn char(value: char, position: Position) -> Self {
        Expr::new(ExprKind::CharLiteral(value), position)
    }

    pub fn string(value: &str, position: Position) -> Self {
        Expr::new(ExprKind::StringLiteral(value.to_string()), position)
    }

    pub fn null(position: Position) -> Self {
        Expr::new(ExprKind::PairLiteral, position)
    }

    pub fn ident(name: &str, position: Position) -> Self {
        Expr::new(ExprKind::Identifier(name.to_string()), position)
    }

    pub fn array_element(name: &str, indices: Vec<Expr>, position: Position) -> Self {
        Expr::new(
            ExprKind::ArrayElement {
                name: name.to_string(),
                indices,
            },
            position,
        )
    }

    pub fn unary(operator: UnaryOperator, operand: Expr, position: Position) -> Self {
        Expr::new(
            ExprKind::Unary {
                operator,
                operand: Box::new(operand),
            },
            position,
        )
    }

    pub fn binary(operator: BinaryOperator, left: Expr, right: Expr, position: Position) -> Self {
        Expr::new(
            ExprKind::Binary {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            },
            position,
        )
    }

    pub fn array_literal(elements: Vec<Expr>, position: Position) -> Self {
        Expr::new(ExprKind::ArrayLiteral(elements), position)
    }

    pub fn new_pair(left: Expr, right: Expr, position: Position) -> Self {
        Expr::new(ExprKind::NewPair(Box::new(left), Box::new(right)), position)
    }

    pub fn fst(value: Expr, position: Position) -> Self {
        Expr::new(
            ExprKind::PairElement {
                is_first: true,
                value: Box::new(value),
            },
            position,
        )
    }

    pub fn snd(value: Expr, position: Position) -> Self {
        Expr::new(
            ExprKind::PairElement {
                is_first: false,
                value: Box::new(value),
            },
            position,
        )
    }

    pub fn call(name: &str, arguments: Vec<Expr>, position: Position) -> Self {
        Expr::new(
            ExprKind::Call {
                name: name.to_string(),
                arguments,
            },
            position,
        )
    }
}
