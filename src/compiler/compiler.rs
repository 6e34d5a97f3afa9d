//! Main code generator module.
//!
//! This module contains the core Compiler structure and the entry point
//! turning a checked program into an [`Assembly`]. It manages:
//!
//! - The window of registers holding intermediate values, and spilling
//!   past its end onto the stack
//! - The lowering mode telling identifiers and element accesses whether
//!   their value or their address is wanted
//! - Stack pointer movement and the frame offsets depending on it
//! - Label numbering and the runtime support registry

use bitflags::bitflags;

use crate::{
    config::CompilerConfig,
    errors::errors::InternalError,
    type_checker::{
        functions::{FunctionId, FunctionTable},
        scope::{ScopeId, Scopes, VariableId},
        type_checker::TypeChecker,
        typed_ast::TypedScope,
    },
};

use super::{
    instructions::{Assembly, Condition, Instruction, Operand2, Register},
    stdlib::{RuntimeRoutine, RuntimeSupport},
    stmt::gen_statement,
};

bitflags! {
    /// What the expression being lowered is used for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LoweringMode: u8 {
        /// Target of an assignment: produce an address
        const ASSIGN_TARGET = 1 << 0;
        /// Operand of `print`, `println` or `free`: always produce a value
        const PRINT_OR_FREE = 1 << 1;
        /// Target of `read`: produce an address
        const READ_TARGET = 1 << 2;
        /// Index of an array access: always produce a value
        const ARRAY_INDEX = 1 << 3;
    }
}

/// The state of one code generation run.
///
/// Expressions are evaluated into `current_register`. Nested evaluations
/// move one register up the window with [`Compiler::ascend`] and hand the
/// register back with [`Compiler::descend`].
pub struct Compiler<'a> {
    pub config: &'a CompilerConfig,
    pub functions: &'a FunctionTable,
    /// Private copy; code generation records stack adjustments in it
    pub scopes: Scopes,
    pub runtime: RuntimeSupport,
    pub instructions: Vec<Instruction>,

    pub current_register: Register,
    /// Registers pushed because the window was exhausted
    pub spill_count: usize,
    pub mode: LoweringMode,
    pub current_scope: ScopeId,
    pub current_function: Option<FunctionId>,
    /// Set by `return` for the innermost enclosing scope to unwind the frame
    pub returning: bool,

    label_count: usize,
}

impl<'a> Compiler<'a> {
    pub fn new(type_checker: &'a TypeChecker, config: &'a CompilerConfig) -> Self {
        Compiler {
            config,
            functions: &type_checker.functions,
            scopes: type_checker.scopes.clone(),
            runtime: RuntimeSupport::new(),
            instructions: vec![],
            current_register: config.first_value_register,
            spill_count: 0,
            mode: LoweringMode::empty(),
            current_scope: type_checker.main_scope,
            current_function: None,
            returning: false,
            label_count: 0,
        }
    }

    pub fn emit(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// A fresh control-flow label, `L0`, `L1` and so on.
    pub fn new_label(&mut self) -> String {
        let label = format!("L{}", self.label_count);
        self.label_count += 1;
        label
    }

    pub fn call_runtime(&mut self, routine: RuntimeRoutine) {
        self.call_runtime_if(Condition::Always, routine);
    }

    pub fn call_runtime_if(&mut self, condition: Condition, routine: RuntimeRoutine) {
        let call = self.runtime.request(routine, condition);
        self.emit(call);
    }

    /// Moves to the next register of the window. Past the last one the
    /// current register is pushed and reused instead.
    pub fn ascend(&mut self) -> Result<(), InternalError> {
        if self.current_register == self.config.last_value_register {
            self.emit(Instruction::Push(vec![self.current_register]));
            self.spill_count += 1;
            self.adjust_stack(4)?;
            return Ok(());
        }

        self.current_register = self
            .current_register
            .next()
            .unwrap_or(self.config.last_value_register);
        Ok(())
    }

    /// Leaves the current register and returns it. When it was spilled,
    /// its value moves to the scratch register and the saved value is
    /// restored, so the scratch register is returned instead.
    pub fn descend(&mut self) -> Result<Register, InternalError> {
        let released = self.current_register;

        if self.spill_count > 0 {
            let scratch = self.config.scratch_register;
            self.emit(Instruction::mov(scratch, Operand2::Register(released)));
            self.emit(Instruction::Pop(vec![released]));
            self.spill_count -= 1;
            self.adjust_stack(-4)?;
            return Ok(scratch);
        }

        self.current_register = released
            .previous()
            .filter(|register| *register >= self.config.first_value_register)
            .unwrap_or(self.config.first_value_register);
        Ok(released)
    }

    /// A register usable as a temporary next to the current one.
    pub fn next_free_register(&self) -> Register {
        if self.current_register == self.config.last_value_register {
            return self.config.scratch_register;
        }
        self.current_register
            .next()
            .unwrap_or(self.config.scratch_register)
    }

    /// Registers below the current one, all holding values still needed.
    pub fn live_registers(&self) -> Vec<Register> {
        self.config.first_value_register.range_to(self.current_register)
    }

    /// Runs `lower` with the lowering mode replaced by `mode`, restoring the
    /// previous mode afterwards.
    pub fn with_mode<T, F>(&mut self, mode: LoweringMode, lower: F) -> Result<T, InternalError>
    where
        F: FnOnce(&mut Compiler<'a>) -> Result<T, InternalError>,
    {
        let previous = self.mode;
        self.mode = mode;
        let result = lower(self);
        self.mode = previous;
        result
    }

    /// Whether the expression being lowered should produce an address.
    pub fn wants_address(&self) -> bool {
        self.mode
            .intersects(LoweringMode::ASSIGN_TARGET | LoweringMode::READ_TARGET)
            && !self
                .mode
                .intersects(LoweringMode::PRINT_OR_FREE | LoweringMode::ARRAY_INDEX)
    }

    /// Records that `sp` moved down by `bytes` while in the current scope.
    pub fn adjust_stack(&mut self, bytes: i32) -> Result<(), InternalError> {
        let scope = self.current_scope;
        self.scopes.get_mut(scope)?.adjust_stack_pointer(bytes);
        Ok(())
    }

    pub fn frame_offset(&self, variable: VariableId) -> Result<i32, InternalError> {
        self.scopes.frame_offset_of(self.current_scope, variable)
    }

    /// Emits `SUB sp` (or `ADD sp` when `grow` is false) for `bytes`, split
    /// into chunks no instruction can reject.
    pub fn move_stack_pointer(&mut self, bytes: i32, grow: bool) {
        let mut remaining = bytes;
        while remaining > 0 {
            let chunk = remaining.min(self.config.stack_adjust_limit);
            let operand = Operand2::Immediate(chunk);
            self.emit(if grow {
                Instruction::sub(Register::Sp, Register::Sp, operand)
            } else {
                Instruction::add(Register::Sp, Register::Sp, operand)
            });
            remaining -= chunk;
        }
    }
}

/// Lowers a scope: reserve its bytes, lower the body, then release the
/// bytes, or the whole frame when the body returned.
pub fn gen_scope(compiler: &mut Compiler<'_>, scope: &TypedScope) -> Result<(), InternalError> {
    let size = compiler.scopes.get(scope.scope)?.size();
    let previous = compiler.current_scope;
    compiler.current_scope = scope.scope;

    compiler.move_stack_pointer(size, true);
    gen_statement(compiler, &scope.body)?;

    if std::mem::take(&mut compiler.returning) {
        let parameter_bytes = compiler
            .current_function
            .map(|function| compiler.functions.get(function).parameter_bytes())
            .unwrap_or(0);
        let frame = compiler.scopes.total_size_including_ancestors(scope.scope)? - parameter_bytes;
        compiler.move_stack_pointer(frame, false);
        compiler.emit(Instruction::Pop(vec![Register::Pc]));
    } else {
        compiler.move_stack_pointer(size, false);
    }

    compiler.current_scope = previous;
    Ok(())
}

fn gen_function(compiler: &mut Compiler<'_>, function: FunctionId) -> Result<(), InternalError> {
    let functions = compiler.functions;
    let declaration = functions.get(function);
    let body = declaration
        .body
        .as_ref()
        .ok_or_else(|| InternalError::MissingFunctionBody {
            function: declaration.name.clone(),
        })?;

    log::debug!("generating {}", declaration.label);
    compiler.current_function = Some(function);
    compiler.current_register = compiler.config.first_value_register;

    compiler.emit(Instruction::label(&declaration.label));
    compiler.emit(Instruction::Push(vec![Register::Lr]));
    gen_scope(compiler, body)?;

    let already_returned = compiler.instructions.last() == Some(&Instruction::Pop(vec![Register::Pc]));
    if !already_returned {
        compiler.emit(Instruction::Pop(vec![Register::Pc]));
    }
    compiler.emit(Instruction::Directive(String::from(".ltorg")));
    Ok(())
}

/// Generates the assembly of a checked program.
///
/// # Arguments
///
/// * `type_checker` - The checker of a run that produced no diagnostics
/// * `config` - Target constants
///
/// # Returns
///
/// The data section, then every function in declaration order, the entry
/// routine and the runtime routines the program needed.
pub fn compile(type_checker: &TypeChecker, config: &CompilerConfig) -> Result<Assembly, InternalError> {
    let mut compiler = Compiler::new(type_checker, config);
    let functions = compiler.functions;

    for function in functions.declared().iter().copied() {
        gen_function(&mut compiler, function)?;
    }

    let main = functions.main().ok_or_else(|| InternalError::MissingFunctionBody {
        function: config.entry_label.clone(),
    })?;
    gen_function(&mut compiler, main)?;

    let Compiler {
        runtime, instructions, ..
    } = compiler;
    let (data, routines) = runtime.into_parts();

    let mut text = instructions;
    text.extend(routines);

    log::debug!("generated {} instruction(s) and {} message(s)", text.len(), data.len());
    Ok(Assembly {
        data,
        text,
        entry_label: config.entry_label.clone(),
    })
}
