//! Typed tree definitions.
//!
//! This module contains the tree produced by the type checker. Compared to
//! the syntax tree handed over by the front-end:
//! - every expression carries its resolved type
//! - identifiers are bound to the variable they denote
//! - calls are bound to the overload they resolve to
//! - every branch and loop body owns the scope it declares into
//! - literal-only binary operations are already folded
//!
//! Every node carries a creation index from one counter per compilation.
//! The [`Visitor`] trait and the `walk_*` functions fix the traversal order
//! other passes rely on.

use crate::{
    ast::expressions::{BinaryOperator, UnaryOperator},
    Position,
};

use super::{functions::FunctionId, scope::{ScopeId, VariableId}, types::Type};

/// A statement wrapped in the scope it declares into.
#[derive(Debug, Clone)]
pub struct TypedScope {
    pub index: usize,
    pub scope: ScopeId,
    pub body: Box<TypedStmt>,
}

#[derive(Debug, Clone)]
pub struct TypedStmt {
    pub index: usize,
    pub position: Position,
    pub kind: TypedStmtKind,
}

#[derive(Debug, Clone)]
pub enum TypedStmtKind {
    Sequence(Vec<TypedStmt>),
    Scope(TypedScope),
    If {
        condition: TypedExpr,
        then_body: TypedScope,
        else_body: TypedScope,
    },
    While {
        condition: TypedExpr,
        body: TypedScope,
    },
    /// Also used for declarations, whose target is the new identifier
    Assignment {
        target: TypedExpr,
        value: TypedExpr,
    },
    Return(TypedExpr),
    Exit(TypedExpr),
    Print(TypedExpr),
    Println(TypedExpr),
    Read(TypedExpr),
    Free(TypedExpr),
    Skip,
}

#[derive(Debug, Clone)]
pub struct TypedExpr {
    pub index: usize,
    pub ty: Type,
    pub position: Position,
    pub kind: TypedExprKind,
}

#[derive(Debug, Clone)]
pub enum TypedExprKind {
    IntLiteral(i32),
    CharLiteral(char),
    BoolLiteral(bool),
    /// `is_string` marks literals stored as one read-only blob
    ArrayLiteral {
        elements: Vec<TypedExpr>,
        is_string: bool,
    },
    /// `variable` is `None` only for undeclared identifiers
    Identifier {
        name: String,
        variable: Option<VariableId>,
    },
    ArrayElement {
        base: Box<TypedExpr>,
        indices: Vec<TypedExpr>,
    },
    Binary {
        operator: BinaryOperator,
        left: Box<TypedExpr>,
        right: Box<TypedExpr>,
    },
    Unary {
        operator: UnaryOperator,
        operand: Box<TypedExpr>,
    },
    /// `function` is `None` only for calls to undeclared functions
    Call {
        name: String,
        function: Option<FunctionId>,
        arguments: Vec<TypedExpr>,
    },
    NewPair(Box<TypedExpr>, Box<TypedExpr>),
    PairElement {
        is_first: bool,
        value: Box<TypedExpr>,
    },
    Null,
}

impl TypedExpr {
    /// The compile-time value of an int, char or bool literal.
    pub fn literal_value(&self) -> Option<i64> {
        match &self.kind {
            TypedExprKind::IntLiteral(value) => Some(*value as i64),
            TypedExprKind::CharLiteral(value) => Some(*value as i64),
            TypedExprKind::BoolLiteral(value) => Some(*value as i64),
            _ => None,
        }
    }
}

/// Read-only consumer of the typed tree. Every hook defaults to doing nothing.
pub trait Visitor {
    fn visit_stmt(&mut self, _stmt: &TypedStmt) {}
    fn visit_expr(&mut self, _expr: &TypedExpr) {}
    /// Called before a loop's condition is visited
    fn enter_loop(&mut self, _stmt: &TypedStmt) {}
    /// Called after a loop's body was visited
    fn exit_loop(&mut self, _stmt: &TypedStmt) {}
}

pub fn walk_scope<V: Visitor + ?Sized>(visitor: &mut V, scope: &TypedScope) {
    walk_stmt(visitor, &scope.body);
}

pub fn walk_stmt<V: Visitor + ?Sized>(visitor: &mut V, stmt: &TypedStmt) {
    visitor.visit_stmt(stmt);

    match &stmt.kind {
        TypedStmtKind::Sequence(statements) => {
            for statement in statements.iter() {
                walk_stmt(visitor, statement);
            }
        }
        TypedStmtKind::Scope(scope) => walk_scope(visitor, scope),
        TypedStmtKind::If {
            condition,
            then_body,
            else_body,
        } => {
            walk_expr(visitor, condition);
            walk_scope(visitor, then_body);
            walk_scope(visitor, else_body);
        }
        TypedStmtKind::While { condition, body } => {
            visitor.enter_loop(stmt);
            walk_expr(visitor, condition);
            walk_scope(visitor, body);
            visitor.exit_loop(stmt);
        }
        TypedStmtKind::Assignment { target, value } => {
            walk_expr(visitor, target);
            walk_expr(visitor, value);
        }
        TypedStmtKind::Return(value)
        | TypedStmtKind::Exit(value)
        | TypedStmtKind::Print(value)
        | TypedStmtKind::Println(value)
        | TypedStmtKind::Read(value)
        | TypedStmtKind::Free(value) => walk_expr(visitor, value),
        TypedStmtKind::Skip => {}
    }
}

pub fn walk_expr<V: Visitor + ?Sized>(visitor: &mut V, expr: &TypedExpr) {
    visitor.visit_expr(expr);

    match &expr.kind {
        TypedExprKind::ArrayLiteral { elements, .. } => {
            for element in elements.iter() {
                walk_expr(visitor, element);
            }
        }
        TypedExprKind::ArrayElement { base, indices } => {
            walk_expr(visitor, base);
            for index in indices.iter() {
                walk_expr(visitor, index);
            }
        }
        TypedExprKind::Binary { left, right, .. } => {
            walk_expr(visitor, left);
            walk_expr(visitor, right);
        }
        TypedExprKind::Unary { operand, .. } => walk_expr(visitor, operand),
        TypedExprKind::Call { arguments, .. } => {
            for argument in arguments.iter() {
                walk_expr(visitor, argument);
            }
        }
        TypedExprKind::NewPair(left, right) => {
            walk_expr(visitor, left);
            walk_expr(visitor, right);
        }
        TypedExprKind::PairElement { value, .. } => walk_expr(visitor, value),
        TypedExprKind::IntLiteral(_)
        | TypedExprKind::CharLiteral(_)
        | TypedExprKind::BoolLiteral(_)
        | TypedExprKind::Identifier { .. }
        | TypedExprKind::Null => {}
    }
}
