use crate::Position;

use super::{statements::Stmt, types::TypeNode};

/// A whole program: the function declarations followed by the main body.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub functions: Vec<FunctionDecl>,
    pub body: Stmt,
}

impl Program {
    pub fn new(functions: Vec<FunctionDecl>, body: Stmt) -> Self {
        Program { functions, body }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub return_type: TypeNode,
    pub parameters: Vec<Parameter>,
    pub body: Stmt,
    pub position: Position,
}

impl FunctionDecl {
    pub fn new(
        name: &str,
        return_type: TypeNode,
        parameters: Vec<Parameter>,
        body: Stmt,
        position: Position,
    ) -> Self {
        FunctionDecl {
            name: name.to_string(),
            return_type,
            parameters,
            body,
            position,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeNode,
    pub position: Position,
}

impl Parameter {
    pub fn new(ty: TypeNode, name: &str, position: Position) -> Self {
        Parameter {
            name: name.to_string(),
            ty,
            position,
        }
    }
}
