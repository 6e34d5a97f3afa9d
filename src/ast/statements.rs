use crate::Position;

use super::{expressions::Expr, types::TypeNode};

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Skip,
    /// `T name = rhs`
    Declare {
        ty: TypeNode,
        name: String,
        value: Expr,
    },
    /// `lhs = rhs` where `lhs` is an identifier, array element or pair element
    Assign { target: Expr, value: Expr },
    Read(Expr),
    Free(Expr),
    Return(Expr),
    Exit(Expr),
    Print(Expr),
    Println(Expr),
    If {
        condition: Expr,
        then_body: Box<Stmt>,
        else_body: Box<Stmt>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    /// `begin ... end`
    Block(Box<Stmt>),
    Sequence(Vec<Stmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub position: Position,
}

impl Stmt {
    pub fn new(kind: StmtKind, position: Position) -> Self {
        Stmt { kind, position }
    }

    pub fn skip(position: Position) -> Self {
        Stmt::new(StmtKind::Skip, position)
    }

    pub fn declare(ty: TypeNode, name: &str, value: Expr, position: Position) -> Self {
        Stmt::new(
            StmtKind::Declare {
                ty,
                name: name.to_string(),
                value,
            },
            position,
        )
    }

    pub fn assign(target: Expr, value: Expr, position: Position) -> Self {
        Stmt::new(StmtKind::Assign { target, value }, position)
    }

    pub fn read(target: Expr, position: Position) -> Self {
        Stmt::new(StmtKind::Read(target), position)
    }

    pub fn free(value: Expr, position: Position) -> Self {
        Stmt::new(StmtKind::Free(value), position)
    }

    pub fn ret(value: Expr, position: Position) -> Self {
        Stmt::new(StmtKind::Return(value), position)
    }

    pub fn exit(value: Expr, position: Position) -> Self {
        Stmt::new(StmtKind::Exit(value), position)
    }

    pub fn print(value: Expr, position: Position) -> Self {
        Stmt::new(StmtKind::Print(value), position)
    }

    pub fn println(value: Expr, position: Position) -> Self {
        Stmt::new(StmtKind::Println(value), position)
    }

    pub fn if_else(condition: Expr, then_body: Stmt, else_body: Stmt, position: Position) -> Self {
        Stmt::new(
            StmtKind::If {
                condition,
                then_body: Box::new(then_body),
                else_body: Box::new(else_body),
            },
            position,
        )
    }

    pub fn while_loop(condition: Expr, body: Stmt, position: Position) -> Self {
        Stmt::new(
            StmtKind::While {
                condition,
                body: Box::new(body),
            },
            position,
        )
    }

    pub fn block(body: Stmt, position: Position) -> Self {
        Stmt::new(StmtKind::Block(Box::new(body)), position)
    }

    /// Joins statements with `;`. The sequence takes the first statement's line.
    pub fn sequence(statements: Vec<Stmt>) -> Self {
        let position = statements
            .first()
            .map(|stmt| stmt.position)
            .unwrap_or_else(Position::null);
        Stmt::new(StmtKind::Sequence(statements), position)
    }
}
