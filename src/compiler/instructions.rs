//! Instruction model for the 32-bit ARM target.
//!
//! A closed set of instruction nodes plus the data section entries. Nothing
//! here is optimised; the text is produced once, by `Display for Assembly`.

use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Register {
    R0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
    R8,
    R9,
    R10,
    R11,
    R12,
    Sp,
    Lr,
    Pc,
}

const GENERAL_PURPOSE: [Register; 13] = [
    Register::R0,
    Register::R1,
    Register::R2,
    Register::R3,
    Register::R4,
    Register::R5,
    Register::R6,
    Register::R7,
    Register::R8,
    Register::R9,
    Register::R10,
    Register::R11,
    Register::R12,
];

impl Register {
    /// Position of a general purpose register, `None` for `sp`, `lr` and `pc`.
    pub fn number(self) -> Option<usize> {
        GENERAL_PURPOSE.iter().position(|register| *register == self)
    }

    pub fn next(self) -> Option<Register> {
        self.number().and_then(|number| GENERAL_PURPOSE.get(number + 1).copied())
    }

    pub fn previous(self) -> Option<Register> {
        self.number()
            .and_then(|number| number.checked_sub(1))
            .map(|number| GENERAL_PURPOSE[number])
    }

    /// Every general purpose register from `self` up to but excluding `end`.
    pub fn range_to(self, end: Register) -> Vec<Register> {
        match (self.number(), end.number()) {
            (Some(start), Some(end)) if start < end => GENERAL_PURPOSE[start..end].to_vec(),
            _ => vec![],
        }
    }
}

impl Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Register::Sp => write!(f, "sp"),
            Register::Lr => write!(f, "lr"),
            Register::Pc => write!(f, "pc"),
            register => write!(f, "r{}", register.number().unwrap_or_default()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    Always,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Cs,
    Vs,
}

impl Condition {
    /// The condition holding exactly when `self` does not.
    pub fn inverse(self) -> Condition {
        match self {
            Condition::Always => Condition::Always,
            Condition::Eq => Condition::Ne,
            Condition::Ne => Condition::Eq,
            Condition::Gt => Condition::Le,
            Condition::Ge => Condition::Lt,
            Condition::Lt => Condition::Ge,
            Condition::Le => Condition::Gt,
            Condition::Cs => Condition::Cs,
            Condition::Vs => Condition::Vs,
        }
    }

    /// The condition to test after swapping the operands of the comparison.
    pub fn swapped(self) -> Condition {
        match self {
            Condition::Gt => Condition::Lt,
            Condition::Ge => Condition::Le,
            Condition::Lt => Condition::Gt,
            Condition::Le => Condition::Ge,
            other => other,
        }
    }
}

impl Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let suffix = match self {
            Condition::Always => "",
            Condition::Eq => "EQ",
            Condition::Ne => "NE",
            Condition::Gt => "GT",
            Condition::Ge => "GE",
            Condition::Lt => "LT",
            Condition::Le => "LE",
            Condition::Cs => "CS",
            Condition::Vs => "VS",
        };
        write!(f, "{}", suffix)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    Lsl(u8),
    Asr(u8),
}

/// The flexible second operand of data-processing instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand2 {
    Immediate(i32),
    Char(char),
    Register(Register),
    Shifted(Register, Shift),
}

impl Display for Operand2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand2::Immediate(value) => write!(f, "#{}", value),
            Operand2::Char(value) if value.is_ascii_graphic() && *value != '\'' && *value != '\\' => {
                write!(f, "#'{}'", value)
            }
            Operand2::Char(value) => write!(f, "#{}", *value as u32),
            Operand2::Register(register) => write!(f, "{}", register),
            Operand2::Shifted(register, Shift::Lsl(amount)) => write!(f, "{}, LSL #{}", register, amount),
            Operand2::Shifted(register, Shift::Asr(amount)) => write!(f, "{}, ASR #{}", register, amount),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Address {
    /// `[base, #offset]`
    Offset(Register, i32),
    /// `[base, #offset]!`, moving `base` by `offset` first
    PreIndexed(Register, i32),
}

impl Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Address::Offset(base, 0) => write!(f, "[{}]", base),
            Address::Offset(base, offset) => write!(f, "[{}, #{}]", base, offset),
            Address::PreIndexed(base, offset) => write!(f, "[{}, #{}]!", base, offset),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadSource {
    Address(Address),
    /// `=label`, the address of a data entry
    Label(String),
    /// `=value`, a constant placed in the literal pool
    Constant(i32),
}

impl Display for LoadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadSource::Address(address) => write!(f, "{}", address),
            LoadSource::Label(label) => write!(f, "={}", label),
            LoadSource::Constant(value) => write!(f, "={}", value),
        }
    }
}

/// Memory access width. Bytes load sign-extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Word,
    Byte,
}

impl Width {
    pub fn of_size(size: i32) -> Width {
        if size == 1 {
            Width::Byte
        } else {
            Width::Word
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperation {
    And,
    Or,
    Xor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOperation {
    Add,
    Subtract,
    ReverseSubtract,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Label(String),
    Directive(String),
    Move {
        condition: Condition,
        destination: Register,
        source: Operand2,
    },
    Arithmetic {
        operation: ArithmeticOperation,
        set_flags: bool,
        destination: Register,
        operand: Register,
        source: Operand2,
    },
    /// Signed 32x32 to 64 bit multiply
    MultiplyLong {
        low: Register,
        high: Register,
        operand: Register,
        multiplier: Register,
    },
    Compare {
        operand: Register,
        source: Operand2,
    },
    Logical {
        operation: LogicalOperation,
        destination: Register,
        operand: Register,
        source: Operand2,
    },
    Load {
        condition: Condition,
        width: Width,
        destination: Register,
        source: LoadSource,
    },
    Store {
        width: Width,
        source: Register,
        address: Address,
    },
    Branch {
        link: bool,
        condition: Condition,
        label: String,
    },
    Push(Vec<Register>),
    Pop(Vec<Register>),
}

impl Instruction {
    pub fn label(name: &str) -> Self {
        Instruction::Label(name.to_string())
    }

    pub fn mov(destination: Register, source: Operand2) -> Self {
        Instruction::Move {
            condition: Condition::Always,
            destination,
            source,
        }
    }

    pub fn mov_if(condition: Condition, destination: Register, source: Operand2) -> Self {
        Instruction::Move {
            condition,
            destination,
            source,
        }
    }

    pub fn add(destination: Register, operand: Register, source: Operand2) -> Self {
        Instruction::Arithmetic {
            operation: ArithmeticOperation::Add,
            set_flags: false,
            destination,
            operand,
            source,
        }
    }

    pub fn sub(destination: Register, operand: Register, source: Operand2) -> Self {
        Instruction::Arithmetic {
            operation: ArithmeticOperation::Subtract,
            set_flags: false,
            destination,
            operand,
            source,
        }
    }

    pub fn flag_setting(operation: ArithmeticOperation, destination: Register, operand: Register, source: Operand2) -> Self {
        Instruction::Arithmetic {
            operation,
            set_flags: true,
            destination,
            operand,
            source,
        }
    }

    pub fn cmp(operand: Register, source: Operand2) -> Self {
        Instruction::Compare { operand, source }
    }

    pub fn logical(operation: LogicalOperation, destination: Register, operand: Register, source: Operand2) -> Self {
        Instruction::Logical {
            operation,
            destination,
            operand,
            source,
        }
    }

    pub fn ldr(width: Width, destination: Register, address: Address) -> Self {
        Instruction::Load {
            condition: Condition::Always,
            width,
            destination,
            source: LoadSource::Address(address),
        }
    }

    pub fn ldr_constant(destination: Register, value: i32) -> Self {
        Instruction::Load {
            condition: Condition::Always,
            width: Width::Word,
            destination,
            source: LoadSource::Constant(value),
        }
    }

    pub fn ldr_label(condition: Condition, destination: Register, label: &str) -> Self {
        Instruction::Load {
            condition,
            width: Width::Word,
            destination,
            source: LoadSource::Label(label.to_string()),
        }
    }

    pub fn str(width: Width, source: Register, address: Address) -> Self {
        Instruction::Store { width, source, address }
    }

    pub fn b(condition: Condition, label: &str) -> Self {
        Instruction::Branch {
            link: false,
            condition,
            label: label.to_string(),
        }
    }

    pub fn bl(condition: Condition, label: &str) -> Self {
        Instruction::Branch {
            link: true,
            condition,
            label: label.to_string(),
        }
    }
}

fn register_list(registers: &[Register]) -> String {
    registers
        .iter()
        .map(Register::to_string)
        .collect::<Vec<String>>()
        .join(", ")
}

impl Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::Label(name) => write!(f, "{}:", name),
            Instruction::Directive(directive) => write!(f, "\t{}", directive),
            Instruction::Move {
                condition,
                destination,
                source,
            } => write!(f, "\tMOV{} {}, {}", condition, destination, source),
            Instruction::Arithmetic {
                operation,
                set_flags,
                destination,
                operand,
                source,
            } => {
                let mnemonic = match operation {
                    ArithmeticOperation::Add => "ADD",
                    ArithmeticOperation::Subtract => "SUB",
                    ArithmeticOperation::ReverseSubtract => "RSB",
                };
                let flags = if *set_flags { "S" } else { "" };
                write!(f, "\t{}{} {}, {}, {}", mnemonic, flags, destination, operand, source)
            }
            Instruction::MultiplyLong {
                low,
                high,
                operand,
                multiplier,
            } => write!(f, "\tSMULL {}, {}, {}, {}", low, high, operand, multiplier),
            Instruction::Compare { operand, source } => write!(f, "\tCMP {}, {}", operand, source),
            Instruction::Logical {
                operation,
                destination,
                operand,
                source,
            } => {
                let mnemonic = match operation {
                    LogicalOperation::And => "AND",
                    LogicalOperation::Or => "ORR",
                    LogicalOperation::Xor => "EOR",
                };
                write!(f, "\t{} {}, {}, {}", mnemonic, destination, operand, source)
            }
            Instruction::Load {
                condition,
                width,
                destination,
                source,
            } => {
                let suffix = match width {
                    Width::Word => "",
                    Width::Byte => "SB",
                };
                write!(f, "\tLDR{}{} {}, {}", suffix, condition, destination, source)
            }
            Instruction::Store { width, source, address } => {
                let suffix = match width {
                    Width::Word => "",
                    Width::Byte => "B",
                };
                write!(f, "\tSTR{} {}, {}", suffix, source, address)
            }
            Instruction::Branch { link, condition, label } => {
                let mnemonic = if *link { "BL" } else { "B" };
                write!(f, "\t{}{} {}", mnemonic, condition, label)
            }
            Instruction::Push(registers) => write!(f, "\tPUSH {{{}}}", register_list(registers)),
            Instruction::Pop(registers) => write!(f, "\tPOP {{{}}}", register_list(registers)),
        }
    }
}

/// A length-prefixed string in the data section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataEntry {
    pub label: String,
    /// Decoded text; escaped when rendered
    pub text: String,
}

impl DataEntry {
    pub fn length(&self) -> usize {
        self.text.chars().count()
    }
}

/// Escapes `text` for an `.ascii` directive.
pub fn escape_ascii(text: &str) -> String {
    let mut escaped = String::new();
    for character in text.chars() {
        match character {
            '\0' => escaped.push_str("\\0"),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            '"' => escaped.push_str("\\\""),
            '\'' => escaped.push_str("\\'"),
            '\\' => escaped.push_str("\\\\"),
            character if character.is_ascii_control() => {
                escaped.push_str(&format!("\\{:03o}", character as u32))
            }
            character => escaped.push(character),
        }
    }
    escaped
}

/// One complete assembly module.
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    pub data: Vec<DataEntry>,
    pub text: Vec<Instruction>,
    pub entry_label: String,
}

impl Display for Assembly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.data.is_empty() {
            write!(f, ".data\n\n")?;
            for entry in self.data.iter() {
                write!(
                    f,
                    "{}:\n\t.word {}\n\t.ascii \"{}\"\n",
                    entry.label,
                    entry.length(),
                    escape_ascii(&entry.text)
                )?;
            }
            writeln!(f)?;
        }

        write!(f, ".text\n\n.global {}\n", self.entry_label)?;
        for instruction in self.text.iter() {
            writeln!(f, "{}", instruction)?;
        }
        Ok(())
    }
}
