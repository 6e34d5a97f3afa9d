//! Runtime support routines.
//!
//! Generated code calls a small library of `p_*` routines for printing,
//! reading, freeing and runtime checks. A routine's body is emitted once,
//! the first time any code asks for it, together with the routines and
//! messages it depends on. Routine messages live in the data section and
//! are shared by content; string literals of the program are never shared.

use rustc_hash::{FxHashMap, FxHashSet};

use super::instructions::{Address, Condition, DataEntry, Instruction, Operand2, Register, Width};

const NULL_REFERENCE: &str = "NullReferenceError: dereference a null reference\n\0";
const OVERFLOW: &str = "OverflowError: the result is too small/large to store in a 4-byte signed-integer.\n";
const DIVIDE_BY_ZERO: &str = "DivideByZeroError: divide or modulo by zero\n\0";
const NEGATIVE_INDEX: &str = "ArrayIndexOutOfBoundsError: negative index\n\0";
const INDEX_TOO_LARGE: &str = "ArrayIndexOutOfBoundsError: index too large\n\0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeRoutine {
    PrintBool,
    PrintInt,
    PrintString,
    PrintReference,
    Println,
    ReadInt,
    ReadChar,
    FreeArray,
    FreePair,
    CheckDivideByZero,
    CheckArrayBounds,
    CheckNullPointer,
    ThrowOverflowError,
    PrintRuntimeError,
}

impl RuntimeRoutine {
    pub fn label(&self) -> &'static str {
        match self {
            RuntimeRoutine::PrintBool => "p_print_bool",
            RuntimeRoutine::PrintInt => "p_print_int",
            RuntimeRoutine::PrintString => "p_print_string",
            RuntimeRoutine::PrintReference => "p_print_reference",
            RuntimeRoutine::Println => "p_println",
            RuntimeRoutine::ReadInt => "p_read_int",
            RuntimeRoutine::ReadChar => "p_read_char",
            RuntimeRoutine::FreeArray => "p_free_array",
            RuntimeRoutine::FreePair => "p_free_pair",
            RuntimeRoutine::CheckDivideByZero => "p_check_divide_by_zero",
            RuntimeRoutine::CheckArrayBounds => "p_check_array_bounds",
            RuntimeRoutine::CheckNullPointer => "p_check_null_pointer",
            RuntimeRoutine::ThrowOverflowError => "p_throw_overflow_error",
            RuntimeRoutine::PrintRuntimeError => "p_print_runtime_error",
        }
    }
}

/// Data section entries and routine bodies requested so far.
#[derive(Debug, Clone, Default)]
pub struct RuntimeSupport {
    messages: Vec<DataEntry>,
    shared_messages: FxHashMap<String, usize>,
    registered: FxHashSet<RuntimeRoutine>,
    routines: Vec<Instruction>,
}

impl RuntimeSupport {
    pub fn new() -> Self {
        RuntimeSupport::default()
    }

    fn add_message(&mut self, text: &str) -> usize {
        let index = self.messages.len();
        self.messages.push(DataEntry {
            label: format!("msg_{}", index),
            text: text.to_string(),
        });
        index
    }

    /// Label of the message holding `text`, reusing an equal message.
    pub fn message(&mut self, text: &str) -> String {
        let index = match self.shared_messages.get(text) {
            Some(index) => *index,
            None => {
                let index = self.add_message(text);
                self.shared_messages.insert(text.to_string(), index);
                index
            }
        };
        self.messages[index].label.clone()
    }

    /// Label of a fresh message for a string literal of the program.
    pub fn user_message(&mut self, text: &str) -> String {
        let index = self.add_message(text);
        self.messages[index].label.clone()
    }

    /// Makes sure `routine` is emitted and returns the call to it.
    pub fn request(&mut self, routine: RuntimeRoutine, condition: Condition) -> Instruction {
        self.register(routine);
        Instruction::bl(condition, routine.label())
    }

    pub fn is_registered(&self, routine: RuntimeRoutine) -> bool {
        self.registered.contains(&routine)
    }

    pub fn messages(&self) -> &[DataEntry] {
        &self.messages
    }

    /// Consumes the registry, returning the data entries and routine bodies.
    pub fn into_parts(self) -> (Vec<DataEntry>, Vec<Instruction>) {
        (self.messages, self.routines)
    }

    fn register(&mut self, routine: RuntimeRoutine) {
        if !self.registered.insert(routine) {
            return;
        }
        log::trace!("emitting runtime routine {}", routine.label());

        // Dependencies registered while building the body land after it
        let start = self.routines.len();
        let body = match routine {
            RuntimeRoutine::PrintBool => {
                let true_label = self.message("true\0");
                let false_label = self.message("false\0");
                let mut body = vec![
                    Instruction::cmp(Register::R0, Operand2::Immediate(0)),
                    Instruction::ldr_label(Condition::Ne, Register::R0, &true_label),
                    Instruction::ldr_label(Condition::Eq, Register::R0, &false_label),
                ];
                body.extend(print_with("printf"));
                body
            }
            RuntimeRoutine::PrintInt => self.formatted_call("%d\0", "printf", true),
            RuntimeRoutine::PrintReference => self.formatted_call("%p\0", "printf", true),
            RuntimeRoutine::ReadInt => self.formatted_call("%d\0", "scanf", false),
            RuntimeRoutine::ReadChar => self.formatted_call(" %c\0", "scanf", false),
            RuntimeRoutine::PrintString => {
                let format = self.message("%.*s\0");
                let mut body = vec![
                    Instruction::ldr(Width::Word, Register::R1, Address::Offset(Register::R0, 0)),
                    Instruction::add(Register::R2, Register::R0, Operand2::Immediate(4)),
                    Instruction::ldr_label(Condition::Always, Register::R0, &format),
                ];
                body.extend(print_with("printf"));
                body
            }
            RuntimeRoutine::Println => {
                let empty = self.message("\0");
                let mut body = vec![Instruction::ldr_label(Condition::Always, Register::R0, &empty)];
                body.extend(print_with("puts"));
                body
            }
            RuntimeRoutine::FreeArray => {
                let mut body = self.null_check(NULL_REFERENCE, Condition::Eq, false);
                body.push(Instruction::bl(Condition::Always, "free"));
                body
            }
            RuntimeRoutine::FreePair => {
                let mut body = self.null_check(NULL_REFERENCE, Condition::Eq, false);
                body.extend([
                    Instruction::Push(vec![Register::R0]),
                    Instruction::ldr(Width::Word, Register::R0, Address::Offset(Register::R0, 0)),
                    Instruction::bl(Condition::Always, "free"),
                    Instruction::ldr(Width::Word, Register::R0, Address::Offset(Register::Sp, 0)),
                    Instruction::ldr(Width::Word, Register::R0, Address::Offset(Register::R0, 4)),
                    Instruction::bl(Condition::Always, "free"),
                    Instruction::Pop(vec![Register::R0]),
                    Instruction::bl(Condition::Always, "free"),
                ]);
                body
            }
            RuntimeRoutine::CheckNullPointer => self.null_check(NULL_REFERENCE, Condition::Eq, true),
            RuntimeRoutine::CheckDivideByZero => {
                let message = self.message(DIVIDE_BY_ZERO);
                self.register(RuntimeRoutine::PrintRuntimeError);
                vec![
                    Instruction::cmp(Register::R1, Operand2::Immediate(0)),
                    Instruction::ldr_label(Condition::Eq, Register::R0, &message),
                    Instruction::bl(Condition::Eq, RuntimeRoutine::PrintRuntimeError.label()),
                ]
            }
            RuntimeRoutine::CheckArrayBounds => {
                let negative = self.message(NEGATIVE_INDEX);
                let too_large = self.message(INDEX_TOO_LARGE);
                self.register(RuntimeRoutine::PrintRuntimeError);
                vec![
                    Instruction::cmp(Register::R0, Operand2::Immediate(0)),
                    Instruction::ldr_label(Condition::Lt, Register::R0, &negative),
                    Instruction::bl(Condition::Lt, RuntimeRoutine::PrintRuntimeError.label()),
                    Instruction::ldr(Width::Word, Register::R1, Address::Offset(Register::R1, 0)),
                    Instruction::cmp(Register::R0, Operand2::Register(Register::R1)),
                    Instruction::ldr_label(Condition::Cs, Register::R0, &too_large),
                    Instruction::bl(Condition::Cs, RuntimeRoutine::PrintRuntimeError.label()),
                ]
            }
            RuntimeRoutine::ThrowOverflowError => {
                let message = self.message(OVERFLOW);
                self.register(RuntimeRoutine::PrintRuntimeError);
                vec![
                    Instruction::ldr_label(Condition::Always, Register::R0, &message),
                    Instruction::bl(Condition::Always, RuntimeRoutine::PrintRuntimeError.label()),
                ]
            }
            RuntimeRoutine::PrintRuntimeError => {
                self.register(RuntimeRoutine::PrintString);
                vec![
                    Instruction::bl(Condition::Always, RuntimeRoutine::PrintString.label()),
                    Instruction::mov(Register::R0, Operand2::Immediate(-1)),
                    Instruction::bl(Condition::Always, "exit"),
                ]
            }
        };

        let mut block = vec![Instruction::label(routine.label())];
        // Error routines never return, so they keep the caller's lr
        let saves_link = !matches!(
            routine,
            RuntimeRoutine::ThrowOverflowError | RuntimeRoutine::PrintRuntimeError
        );
        if saves_link {
            block.push(Instruction::Push(vec![Register::Lr]));
        }
        block.extend(body);
        if saves_link {
            block.push(Instruction::Pop(vec![Register::Pc]));
        }
        self.routines.splice(start..start, block);
    }

    /// `r1 = r0; r0 = format; call`, used by the int, reference and read routines.
    fn formatted_call(&mut self, format: &str, function: &str, flush: bool) -> Vec<Instruction> {
        let format = self.message(format);
        let mut body = vec![
            Instruction::mov(Register::R1, Operand2::Register(Register::R0)),
            Instruction::ldr_label(Condition::Always, Register::R0, &format),
        ];
        if flush {
            body.extend(print_with(function));
        } else {
            body.push(Instruction::add(Register::R0, Register::R0, Operand2::Immediate(4)));
            body.push(Instruction::bl(Condition::Always, function));
        }
        body
    }

    fn null_check(&mut self, text: &str, condition: Condition, link: bool) -> Vec<Instruction> {
        let message = self.message(text);
        self.register(RuntimeRoutine::PrintRuntimeError);
        let branch = if link {
            Instruction::bl(condition, RuntimeRoutine::PrintRuntimeError.label())
        } else {
            Instruction::b(condition, RuntimeRoutine::PrintRuntimeError.label())
        };
        vec![
            Instruction::cmp(Register::R0, Operand2::Immediate(0)),
            Instruction::ldr_label(condition, Register::R0, &message),
            branch,
        ]
    }
}

/// Skips the length word of the format in `r0`, calls `function` and flushes stdout.
fn print_with(function: &str) -> Vec<Instruction> {
    vec![
        Instruction::add(Register::R0, Register::R0, Operand2::Immediate(4)),
        Instruction::bl(Condition::Always, function),
        Instruction::mov(Register::R0, Operand2::Immediate(0)),
        Instruction::bl(Condition::Always, "fflush"),
    ]
}
