//! Scopes and stack-frame layout.
//!
//! Every scope lives in one [`Scopes`] arena and refers to its parent by
//! id. Variables are owned by the scope that declared them and are named
//! from the outside by a [`VariableId`] (owning scope plus declaration slot).
//!
//! Frame layout: a scope reserves its own bytes below its parent's. A
//! variable's `offset` is the running size of its scope right after it was
//! declared, so the first declared variable sits at the highest address.
//! Parameter scopes additionally sit above the saved link register.

use indexmap::IndexMap;

use crate::{
    errors::errors::{Error, ErrorImpl, InternalError},
    Position,
};

use super::types::Type;

/// Bytes pushed between a function's parameters and its locals (`PUSH {lr}`).
pub const LINK_REGISTER_BYTES: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableId {
    pub scope: ScopeId,
    pub slot: usize,
}

/// Creation indices of the first and last use of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveRange {
    pub birth: usize,
    pub death: usize,
}

#[derive(Debug, Clone)]
pub struct Variable {
    pub ty: Type,
    pub size: i32,
    pub offset: i32,
    pub live_range: Option<LiveRange>,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub parent: Option<ScopeId>,
    variables: IndexMap<String, Variable>,
    size: i32,
    stack_adjustment: i32,
    is_parameter_scope: bool,
}

impl Scope {
    fn new(id: ScopeId, parent: Option<ScopeId>, is_parameter_scope: bool) -> Self {
        Scope {
            id,
            parent,
            variables: IndexMap::new(),
            size: 0,
            stack_adjustment: 0,
            is_parameter_scope,
        }
    }

    pub fn declare_variable(&mut self, name: &str, ty: Type, position: Position) -> Result<VariableId, Error> {
        if self.variables.contains_key(name) {
            return Err(Error::new(
                ErrorImpl::DuplicateDeclaration {
                    identifier: name.to_string(),
                },
                position,
            ));
        }

        let size = ty.size_in_bytes();
        self.size += size;
        let (slot, _) = self.variables.insert_full(
            name.to_string(),
            Variable {
                ty,
                size,
                offset: self.size,
                live_range: None,
            },
        );

        Ok(VariableId { scope: self.id, slot })
    }

    pub fn get_variable(&self, name: &str) -> Option<VariableId> {
        self.variables
            .get_index_of(name)
            .map(|slot| VariableId { scope: self.id, slot })
    }

    /// Bytes declared directly in this scope.
    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn is_parameter_scope(&self) -> bool {
        self.is_parameter_scope
    }

    pub fn stack_adjustment(&self) -> i32 {
        self.stack_adjustment
    }

    /// Records that `sp` moved down by `bytes` (negative when it moves back up).
    pub fn adjust_stack_pointer(&mut self, bytes: i32) {
        self.stack_adjustment += bytes;
    }

    pub fn variables(&self) -> impl Iterator<Item = (&String, &Variable)> {
        self.variables.iter()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scopes {
    scopes: Vec<Scope>,
}

impl Scopes {
    pub fn new() -> Self {
        Scopes { scopes: vec![] }
    }

    pub fn new_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        self.push_scope(parent, false)
    }

    /// A parent-less scope holding a function's parameters.
    pub fn new_parameter_scope(&mut self) -> ScopeId {
        self.push_scope(None, true)
    }

    fn push_scope(&mut self, parent: Option<ScopeId>, is_parameter_scope: bool) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(id, parent, is_parameter_scope));
        id
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn get(&self, id: ScopeId) -> Result<&Scope, InternalError> {
        self.scopes.get(id.0).ok_or(InternalError::UnknownScope { scope: id.0 })
    }

    pub fn get_mut(&mut self, id: ScopeId) -> Result<&mut Scope, InternalError> {
        self.scopes
            .get_mut(id.0)
            .ok_or(InternalError::UnknownScope { scope: id.0 })
    }

    pub fn variable(&self, id: VariableId) -> Result<&Variable, InternalError> {
        self.get(id.scope)?
            .variables
            .get_index(id.slot)
            .map(|(_, variable)| variable)
            .ok_or_else(|| InternalError::UnreachableVariable {
                variable: format!("#{}", id.slot),
                scope: id.scope.0,
            })
    }

    pub fn variable_mut(&mut self, id: VariableId) -> Result<&mut Variable, InternalError> {
        self.get_mut(id.scope)?
            .variables
            .get_index_mut(id.slot)
            .map(|(_, variable)| variable)
            .ok_or_else(|| InternalError::UnreachableVariable {
                variable: format!("#{}", id.slot),
                scope: id.scope.0,
            })
    }

    /// Finds `name` in `scope` or the nearest ancestor declaring it.
    pub fn lookup(&self, scope: ScopeId, name: &str, position: Position) -> Result<VariableId, Error> {
        let mut current = self.scopes.get(scope.0);

        while let Some(scope) = current {
            if let Some(variable) = scope.get_variable(name) {
                return Ok(variable);
            }
            current = scope.parent.and_then(|parent| self.scopes.get(parent.0));
        }

        Err(Error::new(
            ErrorImpl::UndeclaredIdentifier {
                identifier: name.to_string(),
            },
            position,
        ))
    }

    /// Byte displacement from the current `sp` to `variable`, as seen from
    /// code running in `from`. Depends on the pending stack adjustment of
    /// `from`, so it must be recomputed at every use.
    pub fn frame_offset_of(&self, from: ScopeId, variable: VariableId) -> Result<i32, InternalError> {
        let mut offset = 0;
        let mut current = self.get(from)?;

        while current.id != variable.scope {
            offset += current.size;
            current = match current.parent {
                Some(parent) => self.get(parent)?,
                None => {
                    return Err(InternalError::UnreachableVariable {
                        variable: format!("#{}", variable.slot),
                        scope: from.0,
                    })
                }
            };
        }

        offset += current.size - self.variable(variable)?.offset;
        if current.is_parameter_scope {
            offset += LINK_REGISTER_BYTES;
        }

        log::trace!("frame offset of {:?} from scope #{} is {}", variable, from.0, offset);
        Ok(offset + self.get(from)?.stack_adjustment)
    }

    pub fn total_size_including_ancestors(&self, scope: ScopeId) -> Result<i32, InternalError> {
        let scope = self.get(scope)?;
        match scope.parent {
            Some(parent) => Ok(scope.size + self.total_size_including_ancestors(parent)?),
            None => Ok(scope.size),
        }
    }
}
