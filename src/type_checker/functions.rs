//! The function table.
//!
//! Functions are grouped into overload sets by base name. Each member gets
//! a unique assembly label: the first overload of `name` is `f_name`, the
//! n-th one after it `f_n_name`. The entry routine is kept apart from the
//! overload sets under its fixed label.

use rustc_hash::FxHashMap;

use crate::{
    errors::errors::{Error, ErrorImpl},
    Position,
};

use super::{scope::ScopeId, typed_ast::TypedScope, types::Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(pub usize);

#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub label: String,
    pub return_type: Type,
    pub parameters: Vec<(String, Type)>,
    /// Scope holding the parameters; `None` for the entry routine
    pub parameter_scope: Option<ScopeId>,
    pub body: Option<TypedScope>,
    pub position: Position,
}

impl Function {
    pub fn new(
        name: &str,
        return_type: Type,
        parameters: Vec<(String, Type)>,
        parameter_scope: Option<ScopeId>,
        position: Position,
    ) -> Self {
        Function {
            name: name.to_string(),
            label: String::new(),
            return_type,
            parameters,
            parameter_scope,
            body: None,
            position,
        }
    }

    pub fn parameter_types(&self) -> Vec<Type> {
        self.parameters.iter().map(|(_, ty)| ty.clone()).collect()
    }

    /// Bytes the caller pushes for this function's arguments.
    pub fn parameter_bytes(&self) -> i32 {
        self.parameters.iter().map(|(_, ty)| ty.size_in_bytes()).sum()
    }

    /// Whether a call with `arguments` fits this signature.
    pub fn accepts(&self, arguments: &[Type]) -> bool {
        self.parameters.len() == arguments.len()
            && self
                .parameters
                .iter()
                .zip(arguments.iter())
                .all(|((_, parameter), argument)| parameter.equals(argument))
    }
}

#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    functions: Vec<Function>,
    overloads: FxHashMap<String, Vec<FunctionId>>,
    declared: Vec<FunctionId>,
    main: Option<FunctionId>,
}

impl FunctionTable {
    pub fn new() -> Self {
        FunctionTable::default()
    }

    /// Registers `function` in the overload set of its base name.
    ///
    /// # Returns
    ///
    /// The new function's id, or `DuplicateFunction` when a member with the
    /// same parameter types already exists.
    pub fn declare(&mut self, mut function: Function) -> Result<FunctionId, Error> {
        let parameter_types = function.parameter_types();
        let members = self.overloads.get(&function.name).map(Vec::as_slice).unwrap_or(&[]);

        if members
            .iter()
            .any(|member| self.functions[member.0].accepts(&parameter_types))
        {
            return Err(Error::new(
                ErrorImpl::DuplicateFunction {
                    function: function.name.clone(),
                },
                function.position,
            ));
        }

        function.label = if members.is_empty() {
            format!("f_{}", function.name)
        } else {
            format!("f_{}_{}", members.len(), function.name)
        };

        let id = FunctionId(self.functions.len());
        log::trace!("declared {} as {}", function.name, function.label);
        self.overloads.entry(function.name.clone()).or_default().push(id);
        self.declared.push(id);
        self.functions.push(function);
        Ok(id)
    }

    /// Stores a function that is checked but never callable or emitted,
    /// such as a rejected duplicate declaration.
    pub fn add_detached(&mut self, function: Function) -> FunctionId {
        let id = FunctionId(self.functions.len());
        self.functions.push(function);
        id
    }

    pub fn set_main(&mut self, mut function: Function, label: &str) -> FunctionId {
        function.label = label.to_string();
        let id = FunctionId(self.functions.len());
        self.functions.push(function);
        self.main = Some(id);
        id
    }

    /// Finds the first member of `name`'s overload set accepting `arguments`.
    pub fn resolve(&self, name: &str, arguments: &[Type], position: Position) -> Result<FunctionId, Error> {
        self.overloads(name)
            .iter()
            .copied()
            .find(|id| self.functions[id.0].accepts(arguments))
            .ok_or_else(|| {
                Error::new(
                    ErrorImpl::UndeclaredIdentifier {
                        identifier: name.to_string(),
                    },
                    position,
                )
            })
    }

    pub fn overloads(&self, name: &str) -> &[FunctionId] {
        self.overloads.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get(&self, id: FunctionId) -> &Function {
        &self.functions[id.0]
    }

    pub fn attach_body(&mut self, id: FunctionId, body: TypedScope) {
        self.functions[id.0].body = Some(body);
    }

    pub fn main(&self) -> Option<FunctionId> {
        self.main
    }

    /// Registered functions in declaration order, without the entry routine.
    pub fn declared(&self) -> &[FunctionId] {
        &self.declared
    }
}
