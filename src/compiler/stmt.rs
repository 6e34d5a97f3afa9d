use crate::{
    errors::errors::InternalError,
    type_checker::{
        typed_ast::{TypedExpr, TypedExprKind, TypedStmt, TypedStmtKind},
        types::Type,
    },
};

use super::{
    compiler::{gen_scope, Compiler, LoweringMode},
    expr::gen_expression,
    instructions::{Address, Condition, Instruction, Operand2, Register, Width},
    stdlib::RuntimeRoutine,
};

pub fn gen_statement(compiler: &mut Compiler<'_>, statement: &TypedStmt) -> Result<(), InternalError> {
    match &statement.kind {
        TypedStmtKind::Skip => {}
        TypedStmtKind::Sequence(statements) => {
            for statement in statements.iter() {
                gen_statement(compiler, statement)?;
            }
        }
        TypedStmtKind::Scope(scope) => gen_scope(compiler, scope)?,
        TypedStmtKind::If {
            condition,
            then_body,
            else_body,
        } => {
            let else_label = compiler.new_label();
            let end_label = compiler.new_label();

            gen_expression(compiler, condition)?;
            let current = compiler.current_register;
            compiler.emit(Instruction::cmp(current, Operand2::Immediate(0)));
            compiler.emit(Instruction::b(Condition::Eq, &else_label));

            gen_scope(compiler, then_body)?;
            compiler.emit(Instruction::b(Condition::Always, &end_label));

            compiler.emit(Instruction::label(&else_label));
            gen_scope(compiler, else_body)?;
            compiler.emit(Instruction::label(&end_label));
        }
        TypedStmtKind::While { condition, body } => {
            let body_label = compiler.new_label();
            let condition_label = compiler.new_label();

            compiler.emit(Instruction::b(Condition::Always, &condition_label));
            compiler.emit(Instruction::label(&body_label));
            gen_scope(compiler, body)?;

            compiler.emit(Instruction::label(&condition_label));
            gen_expression(compiler, condition)?;
            let current = compiler.current_register;
            compiler.emit(Instruction::cmp(current, Operand2::Immediate(1)));
            compiler.emit(Instruction::b(Condition::Eq, &body_label));
        }
        TypedStmtKind::Assignment { target, value } => gen_assignment(compiler, target, value)?,
        TypedStmtKind::Return(value) => {
            gen_expression(compiler, value)?;
            let current = compiler.current_register;
            compiler.emit(Instruction::mov(Register::R0, Operand2::Register(current)));
            compiler.returning = true;
        }
        TypedStmtKind::Exit(value) => {
            gen_expression(compiler, value)?;
            let current = compiler.current_register;
            compiler.emit(Instruction::mov(Register::R0, Operand2::Register(current)));
            compiler.emit(Instruction::bl(Condition::Always, "exit"));
        }
        TypedStmtKind::Print(value) => gen_print(compiler, value, false)?,
        TypedStmtKind::Println(value) => gen_print(compiler, value, true)?,
        TypedStmtKind::Read(target) => {
            compiler.with_mode(LoweringMode::READ_TARGET, |compiler| gen_expression(compiler, target))?;
            let current = compiler.current_register;
            compiler.emit(Instruction::mov(Register::R0, Operand2::Register(current)));

            let routine = if target.ty == Type::Char {
                RuntimeRoutine::ReadChar
            } else {
                RuntimeRoutine::ReadInt
            };
            compiler.call_runtime(routine);
        }
        TypedStmtKind::Free(value) => {
            compiler.with_mode(LoweringMode::PRINT_OR_FREE, |compiler| gen_expression(compiler, value))?;
            let current = compiler.current_register;
            compiler.emit(Instruction::mov(Register::R0, Operand2::Register(current)));

            let routine = if value.ty.is_array() {
                RuntimeRoutine::FreeArray
            } else {
                RuntimeRoutine::FreePair
            };
            compiler.call_runtime(routine);
        }
    }

    Ok(())
}

/// Stores a plain variable straight into its stack slot; any other target
/// is lowered to an address first.
fn gen_assignment(compiler: &mut Compiler<'_>, target: &TypedExpr, value: &TypedExpr) -> Result<(), InternalError> {
    gen_expression(compiler, value)?;
    let width = Width::of_size(target.ty.size_in_bytes());

    if let TypedExprKind::Identifier { name, variable } = &target.kind {
        let variable = variable.ok_or_else(|| InternalError::UnreachableVariable {
            variable: name.clone(),
            scope: compiler.current_scope.0,
        })?;
        let offset = compiler.frame_offset(variable)?;
        let current = compiler.current_register;
        compiler.emit(Instruction::str(width, current, Address::Offset(Register::Sp, offset)));
        return Ok(());
    }

    compiler.ascend()?;
    compiler.with_mode(LoweringMode::ASSIGN_TARGET, |compiler| gen_expression(compiler, target))?;
    let address = compiler.descend()?;

    let current = compiler.current_register;
    compiler.emit(Instruction::str(width, current, Address::Offset(address, 0)));
    Ok(())
}

fn gen_print(compiler: &mut Compiler<'_>, value: &TypedExpr, newline: bool) -> Result<(), InternalError> {
    compiler.with_mode(LoweringMode::PRINT_OR_FREE, |compiler| gen_expression(compiler, value))?;
    let current = compiler.current_register;
    compiler.emit(Instruction::mov(Register::R0, Operand2::Register(current)));

    match &value.ty {
        Type::Bool => compiler.call_runtime(RuntimeRoutine::PrintBool),
        Type::Int => compiler.call_runtime(RuntimeRoutine::PrintInt),
        Type::Char => compiler.emit(Instruction::bl(Condition::Always, "putchar")),
        ty if ty.is_string_like() => compiler.call_runtime(RuntimeRoutine::PrintString),
        _ => compiler.call_runtime(RuntimeRoutine::PrintReference),
    }

    if newline {
        compiler.call_runtime(RuntimeRoutine::Println);
    }
    Ok(())
}
