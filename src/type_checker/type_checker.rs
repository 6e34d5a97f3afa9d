use crate::{
    ast::{
        ast::{FunctionDecl, Program},
        expressions::Expr,
        statements::{Stmt, StmtKind},
        types::TypeNode,
    },
    config::CompilerConfig,
    errors::errors::{Diagnostics, Error, ErrorImpl, InternalError},
    Position,
};

use super::{
    expr::type_check_expr,
    functions::{Function, FunctionId, FunctionTable},
    liveness::analyse_liveness,
    scope::{ScopeId, Scopes},
    typed_ast::{TypedExpr, TypedExprKind, TypedScope, TypedStmt, TypedStmtKind},
    types::Type,
};

#[derive(Debug)]
pub struct TypeChecker {
    pub scopes: Scopes,
    pub functions: FunctionTable,
    pub diagnostics: Diagnostics,
    /// Root scope of the entry routine
    pub main_scope: ScopeId,
    type_stack: Vec<Type>,
    next_index: usize,
    current_scope: ScopeId,
    current_function: Option<FunctionId>,
    exited: bool,
}

impl TypeChecker {
    pub fn new() -> Self {
        let mut scopes = Scopes::new();
        let main_scope = scopes.new_scope(None);

        TypeChecker {
            scopes,
            functions: FunctionTable::new(),
            diagnostics: Diagnostics::new(),
            main_scope,
            type_stack: vec![],
            next_index: 1,
            current_scope: main_scope,
            current_function: None,
            exited: false,
        }
    }

    /// Hands out the next creation index.
    pub fn next_index(&mut self) -> usize {
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    pub fn push_type(&mut self, ty: Type) {
        self.type_stack.push(ty);
    }

    pub fn pop_type(&mut self, position: Position) -> Result<Type, InternalError> {
        self.type_stack
            .pop()
            .ok_or(InternalError::TypeStackUnderflow { line: position.0 })
    }

    /// Pops the types of `count` sibling expressions, first sibling first.
    pub fn pop_types(&mut self, count: usize, position: Position) -> Result<Vec<Type>, InternalError> {
        if self.type_stack.len() < count {
            return Err(InternalError::TypeStackUnderflow { line: position.0 });
        }
        Ok(self.type_stack.split_off(self.type_stack.len() - count))
    }

    pub fn type_stack_depth(&self) -> usize {
        self.type_stack.len()
    }

    pub fn add_error(&mut self, error: ErrorImpl, position: Position) {
        self.diagnostics.push(Error::new(error, position));
    }

    pub fn report(&mut self, error: Error) {
        self.diagnostics.push(error);
    }

    pub fn current_scope(&self) -> ScopeId {
        self.current_scope
    }

    pub fn current_function(&self) -> Option<FunctionId> {
        self.current_function
    }

    /// Resolves a type annotation and pushes it onto the type stack.
    pub fn push_type_node(&mut self, node: &TypeNode) {
        let ty = match node {
            TypeNode::Int => Type::Int,
            TypeNode::Bool => Type::Bool,
            TypeNode::Char => Type::Char,
            TypeNode::String => Type::String,
            TypeNode::ErasedPair => Type::any_pair(),
            TypeNode::Array(element) => {
                self.push_type_node(element);
                match self.type_stack.pop() {
                    Some(Type::String) => Type::array(Type::Char, 2),
                    Some(Type::Array(base, dimensions)) => Type::Array(base, dimensions + 1),
                    Some(element) => Type::array(element, 1),
                    None => Type::Any,
                }
            }
            TypeNode::Pair(left, right) => {
                self.push_type_node(left);
                self.push_type_node(right);
                let right = self.type_stack.pop().unwrap_or(Type::Any);
                let left = self.type_stack.pop().unwrap_or(Type::Any);
                Type::pair(left, right)
            }
        };
        self.push_type(ty);
    }

    /// Runs `check` inside a new child scope of the current one.
    fn in_new_scope<F>(&mut self, check: F) -> Result<TypedScope, InternalError>
    where
        F: FnOnce(&mut TypeChecker) -> Result<TypedStmt, InternalError>,
    {
        let scope = self.scopes.new_scope(Some(self.current_scope));
        self.in_scope(scope, check)
    }

    fn in_scope<F>(&mut self, scope: ScopeId, check: F) -> Result<TypedScope, InternalError>
    where
        F: FnOnce(&mut TypeChecker) -> Result<TypedStmt, InternalError>,
    {
        let previous = self.current_scope;
        self.current_scope = scope;
        let body = check(self);
        self.current_scope = previous;

        Ok(TypedScope {
            body: Box::new(body?),
            scope,
            index: self.next_index(),
        })
    }

    fn expr_type(&mut self, expr: &Expr) -> Result<(TypedExpr, Type), InternalError> {
        let typed = type_check_expr(self, expr)?;
        let ty = self.pop_type(expr.position)?;
        Ok((typed, ty))
    }

    fn statement(&mut self, kind: TypedStmtKind, position: Position) -> TypedStmt {
        TypedStmt {
            index: self.next_index(),
            position,
            kind,
        }
    }
}

impl Default for TypeChecker {
    fn default() -> Self {
        TypeChecker::new()
    }
}

pub fn type_check_stmt(type_checker: &mut TypeChecker, ast: &Stmt) -> Result<TypedStmt, InternalError> {
    let position = ast.position;

    let kind = match &ast.kind {
        StmtKind::Skip => TypedStmtKind::Skip,
        StmtKind::Sequence(statements) => {
            let mut typed = vec![];
            for statement in statements.iter() {
                if type_checker.exited {
                    type_checker.add_error(ErrorImpl::StatementAfterReturn, statement.position);
                    break;
                }
                typed.push(type_check_stmt(type_checker, statement)?);
            }
            TypedStmtKind::Sequence(typed)
        }
        StmtKind::Block(body) => {
            TypedStmtKind::Scope(type_checker.in_new_scope(|type_checker| type_check_stmt(type_checker, body))?)
        }
        StmtKind::If {
            condition,
            then_body,
            else_body,
        } => {
            let condition = type_check_condition(type_checker, condition, "if")?;

            type_checker.exited = false;
            let then_body =
                type_checker.in_new_scope(|type_checker| type_check_stmt(type_checker, then_body))?;
            let then_exited = type_checker.exited;

            type_checker.exited = false;
            let else_body =
                type_checker.in_new_scope(|type_checker| type_check_stmt(type_checker, else_body))?;
            type_checker.exited = then_exited && type_checker.exited;

            TypedStmtKind::If {
                condition,
                then_body,
                else_body,
            }
        }
        StmtKind::While { condition, body } => {
            let condition = type_check_condition(type_checker, condition, "while")?;

            type_checker.exited = false;
            let body = type_checker.in_new_scope(|type_checker| type_check_stmt(type_checker, body))?;
            // The body may never run
            type_checker.exited = false;

            TypedStmtKind::While { condition, body }
        }
        StmtKind::Declare { ty, name, value } => {
            type_checker.push_type_node(ty);
            let declared = type_checker.pop_type(position)?;

            let scope = type_checker.current_scope;
            let variable = match type_checker
                .scopes
                .get_mut(scope)?
                .declare_variable(name, declared.clone(), position)
            {
                Ok(variable) => Some(variable),
                Err(error) => {
                    type_checker.report(error);
                    None
                }
            };

            let target = TypedExpr {
                index: type_checker.next_index(),
                ty: declared.clone(),
                position,
                kind: TypedExprKind::Identifier {
                    name: name.clone(),
                    variable,
                },
            };

            let (value, received) = type_checker.expr_type(value)?;
            check_assignable(type_checker, &declared, &received, position);

            TypedStmtKind::Assignment { target, value }
        }
        StmtKind::Assign { target, value } => {
            let (target, expected) = type_checker.expr_type(target)?;
            let (value, received) = type_checker.expr_type(value)?;
            check_assignable(type_checker, &expected, &received, position);

            TypedStmtKind::Assignment { target, value }
        }
        StmtKind::Read(target) => {
            let (target, ty) = type_checker.expr_type(target)?;
            if !(Type::Int.equals(&ty) || Type::Char.equals(&ty)) {
                type_checker.add_error(
                    ErrorImpl::InvalidReadTarget {
                        received: ty.to_string(),
                    },
                    position,
                );
            }
            TypedStmtKind::Read(target)
        }
        StmtKind::Free(value) => {
            let (value, ty) = type_checker.expr_type(value)?;
            if !(Type::any_pair().equals(&ty) || Type::any_array().equals(&ty.as_array())) {
                type_checker.add_error(
                    ErrorImpl::InvalidFreeTarget {
                        received: ty.to_string(),
                    },
                    position,
                );
            }
            TypedStmtKind::Free(value)
        }
        StmtKind::Return(value) => {
            let (value, ty) = type_checker.expr_type(value)?;

            match type_checker.current_function {
                None => type_checker.add_error(ErrorImpl::ReturnOutsideFunction, position),
                Some(function) => {
                    let expected = type_checker.functions.get(function).return_type.clone();
                    if !expected.equals(&ty) {
                        type_checker.add_error(
                            ErrorImpl::ReturnTypeMismatch {
                                expected: expected.to_string(),
                                received: ty.to_string(),
                            },
                            position,
                        );
                    }
                }
            }

            type_checker.exited = true;
            TypedStmtKind::Return(value)
        }
        StmtKind::Exit(value) => {
            let (value, ty) = type_checker.expr_type(value)?;
            if !Type::Int.equals(&ty) {
                type_checker.add_error(
                    ErrorImpl::InvalidExitCode {
                        received: ty.to_string(),
                    },
                    position,
                );
            }

            type_checker.exited = true;
            TypedStmtKind::Exit(value)
        }
        StmtKind::Print(value) => TypedStmtKind::Print(type_checker.expr_type(value)?.0),
        StmtKind::Println(value) => TypedStmtKind::Println(type_checker.expr_type(value)?.0),
    };

    Ok(type_checker.statement(kind, position))
}

fn type_check_condition(
    type_checker: &mut TypeChecker,
    condition: &Expr,
    construct: &str,
) -> Result<TypedExpr, InternalError> {
    let (condition, ty) = type_checker.expr_type(condition)?;
    if !Type::Bool.equals(&ty) {
        type_checker.add_error(
            ErrorImpl::ConditionNotBool {
                construct: construct.to_string(),
                received: ty.to_string(),
            },
            condition.position,
        );
    }
    Ok(condition)
}

fn check_assignable(type_checker: &mut TypeChecker, expected: &Type, received: &Type, position: Position) {
    if !expected.equals(received) {
        type_checker.add_error(
            ErrorImpl::AssignTypeMismatch {
                expected: expected.to_string(),
                received: received.to_string(),
            },
            position,
        );
    }
}

/// Registers every function signature before any body is checked, so
/// bodies may call functions declared after them.
fn declare_prototypes(
    type_checker: &mut TypeChecker,
    declarations: &[FunctionDecl],
) -> Result<Vec<(FunctionId, bool)>, InternalError> {
    let mut prototypes = vec![];

    for declaration in declarations.iter() {
        let parameter_scope = type_checker.scopes.new_parameter_scope();

        for parameter in declaration.parameters.iter() {
            type_checker.push_type_node(&parameter.ty);
        }
        type_checker.push_type_node(&declaration.return_type);

        let return_type = type_checker.pop_type(declaration.position)?;
        let parameter_types = type_checker.pop_types(declaration.parameters.len(), declaration.position)?;

        let mut parameters = vec![];
        for (parameter, ty) in declaration.parameters.iter().zip(parameter_types) {
            if let Err(error) = type_checker
                .scopes
                .get_mut(parameter_scope)?
                .declare_variable(&parameter.name, ty.clone(), parameter.position)
            {
                type_checker.report(error);
            }
            parameters.push((parameter.name.clone(), ty));
        }

        let function = Function::new(
            &declaration.name,
            return_type,
            parameters,
            Some(parameter_scope),
            declaration.position,
        );

        match type_checker.functions.declare(function.clone()) {
            Ok(id) => prototypes.push((id, true)),
            Err(error) => {
                type_checker.report(error);
                prototypes.push((type_checker.functions.add_detached(function), false));
            }
        }
    }

    Ok(prototypes)
}

fn type_check_function(
    type_checker: &mut TypeChecker,
    declaration: &FunctionDecl,
    prototype: FunctionId,
    is_registered: bool,
) -> Result<(), InternalError> {
    let function = type_checker.functions.get(prototype).clone();

    if is_registered {
        let resolved = type_checker
            .functions
            .resolve(&function.name, &function.parameter_types(), function.position)
            .map_err(|_| InternalError::UnresolvedFunction {
                function: function.name.clone(),
            })?;
        if resolved != prototype {
            return Err(InternalError::UnresolvedFunction {
                function: function.name.clone(),
            });
        }
    }

    let parameter_scope = function.parameter_scope.ok_or(InternalError::UnresolvedFunction {
        function: function.name.clone(),
    })?;

    type_checker.current_function = Some(prototype);
    type_checker.exited = false;
    type_checker.current_scope = parameter_scope;

    let body = type_checker.in_new_scope(|type_checker| type_check_stmt(type_checker, &declaration.body))?;

    if !type_checker.exited {
        type_checker.add_error(
            ErrorImpl::MissingReturn {
                function: function.name.clone(),
            },
            declaration.position,
        );
    }

    type_checker.functions.attach_body(prototype, body);
    Ok(())
}

/// Checks the top-level statements as the body of the entry routine.
fn type_check_main(type_checker: &mut TypeChecker, body: &Stmt, config: &CompilerConfig) -> Result<(), InternalError> {
    type_checker.current_function = None;
    type_checker.exited = false;

    let root = type_checker.main_scope;
    let body = type_checker.in_scope(root, |type_checker| {
        let mut body = type_check_stmt(type_checker, body)?;

        if !type_checker.exited {
            let position = body.position;
            let zero = TypedExpr {
                index: type_checker.next_index(),
                ty: Type::Int,
                position,
                kind: TypedExprKind::IntLiteral(0),
            };
            let implicit_return = type_checker.statement(TypedStmtKind::Return(zero), position);
            body = type_checker.statement(TypedStmtKind::Sequence(vec![body, implicit_return]), position);
        }

        Ok(body)
    })?;

    let mut main = Function::new(&config.entry_label, Type::Int, vec![], None, body.body.position);
    main.body = Some(body);
    type_checker.functions.set_main(main, &config.entry_label);
    Ok(())
}

/// Checks a whole program.
///
/// # Arguments
///
/// * `ast` - The program handed over by the front-end
/// * `config` - Compiler configuration
///
/// # Returns
///
/// The checker holding the typed functions and scopes, and every diagnostic
/// of the run. Code generation may only run when the diagnostics are empty.
pub fn type_check(ast: &Program, config: &CompilerConfig) -> Result<(TypeChecker, Diagnostics), InternalError> {
    let mut type_checker = TypeChecker::new();

    log::debug!("declaring {} function prototype(s)", ast.functions.len());
    let prototypes = declare_prototypes(&mut type_checker, &ast.functions)?;

    log::debug!("checking function bodies");
    for (declaration, (prototype, is_registered)) in ast.functions.iter().zip(prototypes) {
        type_check_function(&mut type_checker, declaration, prototype, is_registered)?;
    }

    log::debug!("checking entry routine");
    type_check_main(&mut type_checker, &ast.body, config)?;

    analyse_liveness(&type_checker.functions, &mut type_checker.scopes)?;

    let diagnostics = std::mem::take(&mut type_checker.diagnostics);
    log::debug!("type checking finished with {} diagnostic(s)", diagnostics.count());
    Ok((type_checker, diagnostics))
}
