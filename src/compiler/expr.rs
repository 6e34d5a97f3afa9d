use crate::{
    ast::expressions::{BinaryOperator, UnaryOperator},
    errors::errors::InternalError,
    type_checker::{
        functions::FunctionId,
        scope::VariableId,
        typed_ast::{TypedExpr, TypedExprKind},
        types::Type,
    },
};

use super::{
    compiler::{Compiler, LoweringMode},
    instructions::{
        Address, ArithmeticOperation, Condition, Instruction, LogicalOperation, Operand2, Register, Shift, Width,
    },
    stdlib::RuntimeRoutine,
};

/// Lowers `expression` into the current register.
pub fn gen_expression(compiler: &mut Compiler<'_>, expression: &TypedExpr) -> Result<(), InternalError> {
    let current = compiler.current_register;

    match &expression.kind {
        TypedExprKind::IntLiteral(value) => compiler.emit(Instruction::ldr_constant(current, *value)),
        TypedExprKind::CharLiteral(value) => compiler.emit(Instruction::mov(current, Operand2::Char(*value))),
        TypedExprKind::BoolLiteral(value) => {
            compiler.emit(Instruction::mov(current, Operand2::Immediate(*value as i32)))
        }
        TypedExprKind::Null => compiler.emit(Instruction::ldr_constant(current, 0)),
        TypedExprKind::Identifier { name, variable } => {
            let variable = bound_variable(compiler, name, *variable)?;
            gen_identifier(compiler, variable, &expression.ty)?;
        }
        TypedExprKind::ArrayElement { base, indices } => gen_array_element(compiler, base, indices, &expression.ty)?,
        TypedExprKind::Unary { operator, operand } => {
            gen_expression(compiler, operand)?;
            match operator {
                UnaryOperator::Not => compiler.emit(Instruction::logical(
                    LogicalOperation::Xor,
                    current,
                    current,
                    Operand2::Immediate(1),
                )),
                UnaryOperator::Negate => {
                    compiler.emit(Instruction::flag_setting(
                        ArithmeticOperation::ReverseSubtract,
                        current,
                        current,
                        Operand2::Immediate(0),
                    ));
                    compiler.call_runtime_if(Condition::Vs, RuntimeRoutine::ThrowOverflowError);
                }
                UnaryOperator::Len => {
                    compiler.emit(Instruction::ldr(Width::Word, current, Address::Offset(current, 0)))
                }
                // Chars and ints share a register representation
                UnaryOperator::Ord | UnaryOperator::Chr => {}
            }
        }
        TypedExprKind::Binary { operator, left, right } => gen_binary(compiler, *operator, left, right)?,
        TypedExprKind::ArrayLiteral { elements, is_string } => {
            if *is_string {
                let text = elements
                    .iter()
                    .filter_map(|element| match element.kind {
                        TypedExprKind::CharLiteral(character) => Some(character),
                        _ => None,
                    })
                    .collect::<String>();
                let label = compiler.runtime.user_message(&text);
                compiler.emit(Instruction::ldr_label(Condition::Always, current, &label));
            } else {
                gen_array_literal(compiler, elements, &expression.ty)?;
            }
        }
        TypedExprKind::NewPair(left, right) => {
            compiler.emit(Instruction::ldr_constant(Register::R0, 8));
            compiler.emit(Instruction::bl(Condition::Always, "malloc"));
            compiler.emit(Instruction::mov(current, Operand2::Register(Register::R0)));

            for (element, offset) in [(left, 0), (right, 4)] {
                compiler.ascend()?;
                gen_expression(compiler, element)?;
                let value = compiler.descend()?;

                let size = element.ty.size_in_bytes();
                compiler.emit(Instruction::ldr_constant(Register::R0, size));
                compiler.emit(Instruction::bl(Condition::Always, "malloc"));
                compiler.emit(Instruction::str(
                    Width::of_size(size),
                    value,
                    Address::Offset(Register::R0, 0),
                ));
                compiler.emit(Instruction::str(
                    Width::Word,
                    Register::R0,
                    Address::Offset(current, offset),
                ));
            }
        }
        TypedExprKind::PairElement { is_first, value } => {
            compiler.with_mode(LoweringMode::empty(), |compiler| gen_expression(compiler, value))?;

            compiler.emit(Instruction::mov(Register::R0, Operand2::Register(current)));
            compiler.call_runtime(RuntimeRoutine::CheckNullPointer);

            let offset = if *is_first { 0 } else { 4 };
            compiler.emit(Instruction::ldr(Width::Word, current, Address::Offset(current, offset)));
            if !compiler.wants_address() {
                let width = Width::of_size(expression.ty.size_in_bytes());
                compiler.emit(Instruction::ldr(width, current, Address::Offset(current, 0)));
            }
        }
        TypedExprKind::Call {
            name,
            function,
            arguments,
        } => {
            let function = function.ok_or_else(|| InternalError::UnresolvedFunction { function: name.clone() })?;
            gen_call(compiler, function, arguments)?;
        }
    }

    Ok(())
}

fn bound_variable(
    compiler: &Compiler<'_>,
    name: &str,
    variable: Option<VariableId>,
) -> Result<VariableId, InternalError> {
    variable.ok_or_else(|| InternalError::UnreachableVariable {
        variable: name.to_string(),
        scope: compiler.current_scope.0,
    })
}

/// Loads a variable, or computes its address when the mode asks for one.
fn gen_identifier(compiler: &mut Compiler<'_>, variable: VariableId, ty: &Type) -> Result<(), InternalError> {
    let current = compiler.current_register;
    let offset = compiler.frame_offset(variable)?;

    if compiler.wants_address() {
        compiler.emit(Instruction::add(current, Register::Sp, Operand2::Immediate(offset)));
    } else {
        let width = Width::of_size(ty.size_in_bytes());
        compiler.emit(Instruction::ldr(width, current, Address::Offset(Register::Sp, offset)));
    }
    Ok(())
}

/// Walks one array level per index, checking bounds each time. The last
/// level is only dereferenced when a value is wanted.
fn gen_array_element(
    compiler: &mut Compiler<'_>,
    base: &TypedExpr,
    indices: &[TypedExpr],
    ty: &Type,
) -> Result<(), InternalError> {
    let current = compiler.current_register;
    let wants_address = compiler.wants_address();
    let index_mode = compiler.mode | LoweringMode::ARRAY_INDEX;

    compiler.with_mode(LoweringMode::empty(), |compiler| gen_expression(compiler, base))?;

    for (depth, index) in indices.iter().enumerate() {
        compiler.ascend()?;
        compiler.with_mode(index_mode, |compiler| gen_expression(compiler, index))?;
        let index_register = compiler.descend()?;

        compiler.emit(Instruction::mov(Register::R0, Operand2::Register(index_register)));
        compiler.emit(Instruction::mov(Register::R1, Operand2::Register(current)));
        compiler.call_runtime(RuntimeRoutine::CheckArrayBounds);

        let is_last = depth + 1 == indices.len();
        let element = if is_last {
            ty.clone()
        } else {
            base.ty.index_into(depth + 1).unwrap_or(Type::Any)
        };
        let element_size = element.size_in_bytes();

        compiler.emit(Instruction::add(current, current, Operand2::Immediate(4)));
        let scaled = if element_size == 1 {
            Operand2::Register(index_register)
        } else {
            Operand2::Shifted(index_register, Shift::Lsl(2))
        };
        compiler.emit(Instruction::add(current, current, scaled));

        if !is_last || !wants_address {
            compiler.emit(Instruction::ldr(
                Width::of_size(element_size),
                current,
                Address::Offset(current, 0),
            ));
        }
    }

    Ok(())
}

/// The operand an int, char or bool literal folds into, when it fits.
fn immediate_operand(compiler: &Compiler<'_>, expression: &TypedExpr) -> Option<Operand2> {
    let value = expression.literal_value()?;
    if !compiler.config.fits_immediate(value) {
        return None;
    }
    Some(match expression.kind {
        TypedExprKind::CharLiteral(character) => Operand2::Char(character),
        _ => Operand2::Immediate(value as i32),
    })
}

fn gen_binary(
    compiler: &mut Compiler<'_>,
    operator: BinaryOperator,
    left: &TypedExpr,
    right: &TypedExpr,
) -> Result<(), InternalError> {
    if let Some(operand) = immediate_operand(compiler, right) {
        gen_expression(compiler, left)?;
        return gen_operation(compiler, operator, operand, false);
    }

    if let Some(operand) = immediate_operand(compiler, left) {
        gen_expression(compiler, right)?;
        return gen_operation(compiler, operator, operand, true);
    }

    gen_expression(compiler, left)?;
    compiler.ascend()?;
    gen_expression(compiler, right)?;
    let rhs = compiler.descend()?;
    gen_operation(compiler, operator, Operand2::Register(rhs), false)
}

/// Emits `current = current <operator> operand`, or `operand <operator>
/// current` when `swapped`.
fn gen_operation(
    compiler: &mut Compiler<'_>,
    operator: BinaryOperator,
    operand: Operand2,
    swapped: bool,
) -> Result<(), InternalError> {
    let current = compiler.current_register;

    match operator {
        BinaryOperator::Plus => {
            compiler.emit(Instruction::flag_setting(ArithmeticOperation::Add, current, current, operand));
            compiler.call_runtime_if(Condition::Vs, RuntimeRoutine::ThrowOverflowError);
        }
        BinaryOperator::Minus => {
            let operation = if swapped {
                ArithmeticOperation::ReverseSubtract
            } else {
                ArithmeticOperation::Subtract
            };
            compiler.emit(Instruction::flag_setting(operation, current, current, operand));
            compiler.call_runtime_if(Condition::Vs, RuntimeRoutine::ThrowOverflowError);
        }
        BinaryOperator::Multiply => {
            let multiplier = match operand {
                Operand2::Register(register) => register,
                immediate => {
                    let scratch = compiler.next_free_register();
                    compiler.emit(Instruction::mov(scratch, immediate));
                    scratch
                }
            };
            compiler.emit(Instruction::MultiplyLong {
                low: current,
                high: multiplier,
                operand: current,
                multiplier,
            });
            compiler.emit(Instruction::cmp(multiplier, Operand2::Shifted(current, Shift::Asr(31))));
            compiler.call_runtime_if(Condition::Ne, RuntimeRoutine::ThrowOverflowError);
        }
        BinaryOperator::Divide | BinaryOperator::Modulo => {
            if swapped {
                compiler.emit(Instruction::mov(Register::R0, operand));
                compiler.emit(Instruction::mov(Register::R1, Operand2::Register(current)));
            } else {
                compiler.emit(Instruction::mov(Register::R0, Operand2::Register(current)));
                compiler.emit(Instruction::mov(Register::R1, operand));
            }
            compiler.call_runtime(RuntimeRoutine::CheckDivideByZero);

            let (routine, result) = if operator == BinaryOperator::Divide {
                ("__aeabi_idiv", Register::R0)
            } else {
                ("__aeabi_idivmod", Register::R1)
            };
            compiler.emit(Instruction::bl(Condition::Always, routine));
            compiler.emit(Instruction::mov(current, Operand2::Register(result)));
        }
        BinaryOperator::Greater
        | BinaryOperator::GreaterEqual
        | BinaryOperator::Less
        | BinaryOperator::LessEqual
        | BinaryOperator::Equal
        | BinaryOperator::NotEqual => {
            let condition = match operator {
                BinaryOperator::Greater => Condition::Gt,
                BinaryOperator::GreaterEqual => Condition::Ge,
                BinaryOperator::Less => Condition::Lt,
                BinaryOperator::LessEqual => Condition::Le,
                BinaryOperator::Equal => Condition::Eq,
                _ => Condition::Ne,
            };
            let condition = if swapped { condition.swapped() } else { condition };

            compiler.emit(Instruction::cmp(current, operand));
            compiler.emit(Instruction::mov_if(condition, current, Operand2::Immediate(1)));
            compiler.emit(Instruction::mov_if(condition.inverse(), current, Operand2::Immediate(0)));
        }
        BinaryOperator::And => {
            compiler.emit(Instruction::logical(LogicalOperation::And, current, current, operand))
        }
        BinaryOperator::Or => compiler.emit(Instruction::logical(LogicalOperation::Or, current, current, operand)),
    }

    Ok(())
}

/// Allocates `4 + n * size` bytes, stores the elements after the length
/// word, then the length.
fn gen_array_literal(compiler: &mut Compiler<'_>, elements: &[TypedExpr], ty: &Type) -> Result<(), InternalError> {
    let current = compiler.current_register;
    let element_size = ty.index_into(1).map(|element| element.size_in_bytes()).unwrap_or(4);
    let total = 4 + element_size * elements.len() as i32;

    compiler.emit(Instruction::ldr_constant(Register::R0, total));
    compiler.emit(Instruction::bl(Condition::Always, "malloc"));
    compiler.emit(Instruction::mov(current, Operand2::Register(Register::R0)));

    let mut offset = 4;
    for element in elements.iter() {
        compiler.ascend()?;
        gen_expression(compiler, element)?;
        let value = compiler.descend()?;
        compiler.emit(Instruction::str(
            Width::of_size(element_size),
            value,
            Address::Offset(current, offset),
        ));
        offset += element_size;
    }

    compiler.ascend()?;
    let length_register = compiler.current_register;
    compiler.emit(Instruction::ldr_constant(length_register, elements.len() as i32));
    let length = compiler.descend()?;
    compiler.emit(Instruction::str(Width::Word, length, Address::Offset(current, 0)));
    Ok(())
}

/// Pushes the arguments right above `sp`, calls, and releases them again.
/// Registers holding values of the enclosing expression are saved around
/// the call.
fn gen_call(
    compiler: &mut Compiler<'_>,
    function: FunctionId,
    arguments: &[TypedExpr],
) -> Result<(), InternalError> {
    let current = compiler.current_register;
    let functions = compiler.functions;
    let callee = functions.get(function);

    let live = compiler.live_registers();
    if !live.is_empty() {
        compiler.emit(Instruction::Push(live.clone()));
        compiler.adjust_stack(4 * live.len() as i32)?;
    }

    let mut pushed = 0;
    for (argument, (_, parameter)) in arguments.iter().zip(callee.parameters.iter()) {
        gen_expression(compiler, argument)?;
        let size = parameter.size_in_bytes();
        compiler.emit(Instruction::str(
            Width::of_size(size),
            current,
            Address::PreIndexed(Register::Sp, -size),
        ));
        compiler.adjust_stack(size)?;
        pushed += size;
    }

    compiler.emit(Instruction::bl(Condition::Always, &callee.label));
    compiler.adjust_stack(-pushed)?;
    compiler.move_stack_pointer(pushed, false);

    if !live.is_empty() {
        compiler.emit(Instruction::Pop(live.clone()));
        compiler.adjust_stack(-4 * live.len() as i32)?;
    }

    compiler.emit(Instruction::mov(current, Operand2::Register(Register::R0)));
    Ok(())
}
