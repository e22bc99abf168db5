//! The executable program image: opcodes, instructions, and the label index.
//!
//! A [`Program`] is the ordered sequence of [`Instruction`]s the loader
//! hands to the execution engine. Operands are already decoded; the
//! per-opcode signature table below is what the loader checks argument
//! kinds and arity against. The [`LabelIndex`] is built in a pre-pass over
//! the program before the first instruction runs.

use std::collections::HashMap;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::operand::Operand;

/// The syntactic operand classes an instruction slot admits.
///
/// `Symb` covers both variable references and literals; the remaining
/// slots are exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Var,
    Symb,
    Label,
    Type,
}

impl Slot {
    pub fn admits(self, operand: &Operand) -> bool {
        match self {
            Slot::Var => matches!(operand, Operand::Var { .. }),
            Slot::Symb => matches!(operand, Operand::Var { .. } | Operand::Literal(_)),
            Slot::Label => matches!(operand, Operand::Label(_)),
            Slot::Type => matches!(operand, Operand::Type(_)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Slot::Var => "var",
            Slot::Symb => "symb",
            Slot::Label => "label",
            Slot::Type => "type",
        }
    }
}

/// Every instruction of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Move,
    CreateFrame,
    PushFrame,
    PopFrame,
    DefVar,
    Call,
    Return,
    Pushs,
    Pops,
    Add,
    Sub,
    Mul,
    Idiv,
    Lt,
    Gt,
    Eq,
    And,
    Or,
    Not,
    Int2Char,
    Stri2Int,
    Read,
    Write,
    Concat,
    Strlen,
    GetChar,
    SetChar,
    Type,
    Label,
    Jump,
    JumpIfEq,
    JumpIfNeq,
    Exit,
    Dprint,
    Break,
}

impl Opcode {
    /// The canonical (uppercase) mnemonic.
    pub fn name(self) -> &'static str {
        match self {
            Opcode::Move => "MOVE",
            Opcode::CreateFrame => "CREATEFRAME",
            Opcode::PushFrame => "PUSHFRAME",
            Opcode::PopFrame => "POPFRAME",
            Opcode::DefVar => "DEFVAR",
            Opcode::Call => "CALL",
            Opcode::Return => "RETURN",
            Opcode::Pushs => "PUSHS",
            Opcode::Pops => "POPS",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Idiv => "IDIV",
            Opcode::Lt => "LT",
            Opcode::Gt => "GT",
            Opcode::Eq => "EQ",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Not => "NOT",
            Opcode::Int2Char => "INT2CHAR",
            Opcode::Stri2Int => "STRI2INT",
            Opcode::Read => "READ",
            Opcode::Write => "WRITE",
            Opcode::Concat => "CONCAT",
            Opcode::Strlen => "STRLEN",
            Opcode::GetChar => "GETCHAR",
            Opcode::SetChar => "SETCHAR",
            Opcode::Type => "TYPE",
            Opcode::Label => "LABEL",
            Opcode::Jump => "JUMP",
            Opcode::JumpIfEq => "JUMPIFEQ",
            Opcode::JumpIfNeq => "JUMPIFNEQ",
            Opcode::Exit => "EXIT",
            Opcode::Dprint => "DPRINT",
            Opcode::Break => "BREAK",
        }
    }

    /// The operand slots this instruction takes, in order.
    pub fn signature(self) -> &'static [Slot] {
        use Slot::*;
        match self {
            Opcode::CreateFrame
            | Opcode::PushFrame
            | Opcode::PopFrame
            | Opcode::Return
            | Opcode::Break => &[],
            Opcode::DefVar | Opcode::Pops => &[Var],
            Opcode::Call | Opcode::Label | Opcode::Jump => &[Label],
            Opcode::Pushs | Opcode::Write | Opcode::Exit | Opcode::Dprint => &[Symb],
            Opcode::Move | Opcode::Not | Opcode::Int2Char | Opcode::Strlen | Opcode::Type => {
                &[Var, Symb]
            }
            Opcode::Read => &[Var, Type],
            Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Idiv
            | Opcode::Lt
            | Opcode::Gt
            | Opcode::Eq
            | Opcode::And
            | Opcode::Or
            | Opcode::Stri2Int
            | Opcode::Concat
            | Opcode::GetChar
            | Opcode::SetChar => &[Var, Symb, Symb],
            Opcode::JumpIfEq | Opcode::JumpIfNeq => &[Label, Symb, Symb],
        }
    }
}

impl FromStr for Opcode {
    type Err = Error;

    /// Mnemonics are case-normalised; anything unrecognised is exit 32.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "MOVE" => Ok(Opcode::Move),
            "CREATEFRAME" => Ok(Opcode::CreateFrame),
            "PUSHFRAME" => Ok(Opcode::PushFrame),
            "POPFRAME" => Ok(Opcode::PopFrame),
            "DEFVAR" => Ok(Opcode::DefVar),
            "CALL" => Ok(Opcode::Call),
            "RETURN" => Ok(Opcode::Return),
            "PUSHS" => Ok(Opcode::Pushs),
            "POPS" => Ok(Opcode::Pops),
            "ADD" => Ok(Opcode::Add),
            "SUB" => Ok(Opcode::Sub),
            "MUL" => Ok(Opcode::Mul),
            "IDIV" => Ok(Opcode::Idiv),
            "LT" => Ok(Opcode::Lt),
            "GT" => Ok(Opcode::Gt),
            "EQ" => Ok(Opcode::Eq),
            "AND" => Ok(Opcode::And),
            "OR" => Ok(Opcode::Or),
            "NOT" => Ok(Opcode::Not),
            "INT2CHAR" => Ok(Opcode::Int2Char),
            "STRI2INT" => Ok(Opcode::Stri2Int),
            "READ" => Ok(Opcode::Read),
            "WRITE" => Ok(Opcode::Write),
            "CONCAT" => Ok(Opcode::Concat),
            "STRLEN" => Ok(Opcode::Strlen),
            "GETCHAR" => Ok(Opcode::GetChar),
            "SETCHAR" => Ok(Opcode::SetChar),
            "TYPE" => Ok(Opcode::Type),
            "LABEL" => Ok(Opcode::Label),
            "JUMP" => Ok(Opcode::Jump),
            "JUMPIFEQ" => Ok(Opcode::JumpIfEq),
            "JUMPIFNEQ" => Ok(Opcode::JumpIfNeq),
            "EXIT" => Ok(Opcode::Exit),
            "DPRINT" => Ok(Opcode::Dprint),
            "BREAK" => Ok(Opcode::Break),
            other => Err(Error::Program(format!("unknown opcode '{other}'"))),
        }
    }
}

/// One instruction of the program image.
#[derive(Debug, Clone)]
pub struct Instruction {
    pub opcode: Opcode,
    /// The source-order key. Execution order is the position in
    /// [`Program::instructions`]; `order` is kept for diagnostics and
    /// statistics.
    pub order: u32,
    pub args: Vec<Operand>,
}

impl Instruction {
    /// Fetch an operand by position.
    ///
    /// The loader has already checked arity against the opcode signature,
    /// so a miss here is an internal invariant violation.
    pub fn arg(&self, index: usize) -> Result<&Operand> {
        self.args.get(index).ok_or_else(|| {
            Error::Internal(format!(
                "{} has no operand {}",
                self.opcode.name(),
                index + 1
            ))
        })
    }
}

/// A loaded program: instructions sorted into execution order.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub instructions: Vec<Instruction>,
}

/// The pre-computed mapping from label names to instruction indices.
#[derive(Debug, Clone, Default)]
pub struct LabelIndex {
    targets: HashMap<String, usize>,
}

impl LabelIndex {
    /// Scan the program once and record every `LABEL` definition.
    pub fn build(program: &Program) -> Result<Self> {
        let mut targets = HashMap::new();
        for (index, instruction) in program.instructions.iter().enumerate() {
            if instruction.opcode != Opcode::Label {
                continue;
            }
            let name = match instruction.arg(0)? {
                Operand::Label(name) => name.clone(),
                other => {
                    return Err(Error::Internal(format!(
                        "LABEL with a {} operand",
                        other.class_name()
                    )));
                }
            };
            if targets.insert(name.clone(), index).is_some() {
                return Err(Error::DuplicateLabel(name));
            }
        }
        Ok(Self { targets })
    }

    pub fn lookup(&self, name: &str) -> Result<usize> {
        self.targets
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownLabel(name.to_string()))
    }
}
