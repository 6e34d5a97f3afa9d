//! Approximate live ranges of variables.
//!
//! A variable is born at its first use and dies at its last one. A use
//! inside a loop keeps the variable alive until the end of the outermost
//! enclosing loop, since the loop may read it again on a later iteration.

use crate::errors::errors::InternalError;

use super::{
    functions::FunctionTable,
    scope::{LiveRange, Scopes},
    typed_ast::{walk_scope, TypedExpr, TypedExprKind, TypedStmt, Visitor},
};

pub struct LivenessAnalyser<'a> {
    scopes: &'a mut Scopes,
    loops: Vec<usize>,
    error: Option<InternalError>,
}

impl<'a> LivenessAnalyser<'a> {
    pub fn new(scopes: &'a mut Scopes) -> Self {
        LivenessAnalyser {
            scopes,
            loops: vec![],
            error: None,
        }
    }
}

impl Visitor for LivenessAnalyser<'_> {
    fn visit_expr(&mut self, expr: &TypedExpr) {
        let TypedExprKind::Identifier {
            variable: Some(variable),
            ..
        } = &expr.kind
        else {
            return;
        };

        let death = self.loops.iter().copied().max().unwrap_or(expr.index).max(expr.index);

        match self.scopes.variable_mut(*variable) {
            Ok(variable) => {
                variable.live_range = Some(match variable.live_range {
                    None => LiveRange {
                        birth: expr.index,
                        death,
                    },
                    Some(range) => LiveRange {
                        birth: range.birth.min(expr.index),
                        death: range.death.max(death),
                    },
                });
            }
            Err(error) => {
                self.error.get_or_insert(error);
            }
        }
    }

    fn enter_loop(&mut self, stmt: &TypedStmt) {
        self.loops.push(stmt.index);
    }

    fn exit_loop(&mut self, _stmt: &TypedStmt) {
        self.loops.pop();
    }
}

/// Records a live range on every variable used in any function body.
pub fn analyse_liveness(functions: &FunctionTable, scopes: &mut Scopes) -> Result<(), InternalError> {
    let mut analyser = LivenessAnalyser::new(scopes);

    let bodies = functions
        .declared()
        .iter()
        .copied()
        .chain(functions.main())
        .filter_map(|id| functions.get(id).body.as_ref());

    for body in bodies {
        walk_scope(&mut analyser, body);
    }

    match analyser.error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
