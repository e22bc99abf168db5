//! The execution engine: frames, stacks, and the instruction dispatch loop.
//!
//! This module executes [`Program`]s produced by the loader. It uses a
//! simple fetch-decode-execute loop over the sorted instruction array. All
//! runtime state lives here: the frame stack, the data stack, the call
//! stack, and the instruction pointer.
//!
//! The engine is the **only** module that mutates runtime state; the
//! loader is pure translation and `operators` is a stateless helper.
//! Control flow never goes through an exception mechanism: jumps are the
//! dispatcher overwriting the instruction pointer, and fatal errors travel
//! the ordinary `Result` channel out of [`Vm::run`], after being rendered
//! to the diagnostic stream.

use std::io::{BufRead, Write};

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::diagnostic::{Diagnostic, Site};
use crate::error::{Error, Result};
use crate::frames::FrameStack;
use crate::operand::{DataType, Operand, Scope};
use crate::operators;
use crate::program::{Instruction, LabelIndex, Opcode, Program};
use crate::stats::Stats;
use crate::value::Value;

/// What the dispatcher should do after an instruction.
enum Flow {
    Continue,
    Exit(i32),
}

/// The virtual machine.
///
/// Owns all mutable runtime state and borrows the three external streams:
/// program input (consumed by `READ`), program output (written by
/// `WRITE`), and the diagnostic stream (written by `DPRINT`, `BREAK`, and
/// fatal-error reports).
pub struct Vm<'io> {
    frames: FrameStack,
    data_stack: Vec<Value>,
    call_stack: Vec<usize>,
    labels: LabelIndex,
    /// Index of the *next* instruction to execute.
    ip: usize,
    stats: Stats,
    input: &'io mut dyn BufRead,
    output: &'io mut dyn Write,
    diag: &'io mut dyn Write,
}

impl<'io> Vm<'io> {
    pub fn new(
        labels: LabelIndex,
        input: &'io mut dyn BufRead,
        output: &'io mut dyn Write,
        diag: &'io mut dyn Write,
    ) -> Self {
        Self {
            frames: FrameStack::new(),
            data_stack: Vec::new(),
            call_stack: Vec::new(),
            labels,
            ip: 0,
            stats: Stats::new(),
            input,
            output,
            diag,
        }
    }

    /// Run the program to completion.
    ///
    /// Returns the process exit code: the value of an executed `EXIT`, or 0
    /// when the instruction pointer runs off the end of the program. On a
    /// fatal condition the faulting site is reported to the diagnostic
    /// stream and the error is handed back to the caller.
    pub fn run(&mut self, program: &Program) -> Result<i32> {
        self.stats.record_source(program);

        while self.ip < program.instructions.len() {
            let index = self.ip;
            let instruction = &program.instructions[index];

            // Advance before dispatch so that jumps can overwrite it.
            self.ip = index + 1;
            self.stats
                .record_execution(instruction.opcode, instruction.order);

            match self.dispatch(index, instruction) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit(code)) => {
                    self.stats.record_vars(self.frames.defined_vars());
                    return Ok(code);
                }
                Err(err) => {
                    self.report(&err, instruction);
                    return Err(err);
                }
            }
            self.stats.record_vars(self.frames.defined_vars());
        }
        Ok(0)
    }

    pub fn into_stats(self) -> Stats {
        self.stats
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    fn dispatch(&mut self, index: usize, instruction: &Instruction) -> Result<Flow> {
        match instruction.opcode {
            Opcode::Move => {
                let value = self.defined_value_of(instruction.arg(1)?)?;
                self.assign_to(instruction.arg(0)?, value)?;
            }
            Opcode::DefVar => {
                let (scope, name) = variable(instruction.arg(0)?)?;
                self.frames.declare(scope, name)?;
            }

            // --- Frames ---
            Opcode::CreateFrame => self.frames.create_temporary(),
            Opcode::PushFrame => self.frames.push_frame()?,
            Opcode::PopFrame => self.frames.pop_frame()?,

            // --- Procedure calls ---
            Opcode::Call => {
                let target = self.labels.lookup(label(instruction.arg(0)?)?)?;
                self.call_stack.push(index);
                self.ip = target;
            }
            Opcode::Return => {
                let site = self
                    .call_stack
                    .pop()
                    .ok_or_else(|| Error::Missing("the call stack is empty".to_string()))?;
                self.ip = site + 1;
            }

            // --- Data stack ---
            Opcode::Pushs => {
                let value = self.defined_value_of(instruction.arg(0)?)?;
                self.data_stack.push(value);
            }
            Opcode::Pops => {
                let value = self
                    .data_stack
                    .pop()
                    .ok_or_else(|| Error::Missing("the data stack is empty".to_string()))?;
                self.assign_to(instruction.arg(0)?, value)?;
            }

            // --- Arithmetic, relational, logical ---
            Opcode::Add => self.binary(instruction, operators::add)?,
            Opcode::Sub => self.binary(instruction, operators::sub)?,
            Opcode::Mul => self.binary(instruction, operators::mul)?,
            Opcode::Idiv => self.binary(instruction, operators::idiv)?,
            Opcode::Lt => self.binary(instruction, operators::lt)?,
            Opcode::Gt => self.binary(instruction, operators::gt)?,
            Opcode::Eq => self.binary(instruction, operators::eq)?,
            Opcode::And => self.binary(instruction, operators::and)?,
            Opcode::Or => self.binary(instruction, operators::or)?,
            Opcode::Not => self.unary(instruction, operators::not)?,

            // --- Conversions and strings ---
            Opcode::Int2Char => self.unary(instruction, operators::int_to_char)?,
            Opcode::Stri2Int => self.binary(instruction, operators::str_to_int)?,
            Opcode::Concat => self.binary(instruction, operators::concat)?,
            Opcode::Strlen => self.unary(instruction, operators::strlen)?,
            Opcode::GetChar => self.binary(instruction, operators::get_char)?,
            Opcode::SetChar => {
                let (scope, name) = variable(instruction.arg(0)?)?;
                let current = self.defined_variable(scope, name)?;
                let index = self.defined_value_of(instruction.arg(1)?)?;
                let replacement = self.defined_value_of(instruction.arg(2)?)?;
                let updated = operators::set_char(&current, &index, &replacement)?;
                self.frames.assign(scope, name, updated)?;
            }

            // --- Input / output ---
            Opcode::Read => {
                let wanted = match instruction.arg(1)? {
                    Operand::Type(wanted) => *wanted,
                    other => {
                        return Err(Error::Internal(format!(
                            "READ with a {} operand",
                            other.class_name()
                        )));
                    }
                };
                let value = self.read_value(wanted)?;
                self.assign_to(instruction.arg(0)?, value)?;
            }
            Opcode::Write => {
                let value = self.defined_value_of(instruction.arg(0)?)?;
                write!(self.output, "{value}")?;
            }
            Opcode::Dprint => {
                let value = self.defined_value_of(instruction.arg(0)?)?;
                write!(self.diag, "{value}")?;
            }

            Opcode::Type => {
                let value = match instruction.arg(1)? {
                    // TYPE is the one reader that tolerates Uninit.
                    Operand::Var { scope, name } => self.frames.read(*scope, name)?.clone(),
                    Operand::Literal(value) => value.clone(),
                    other => {
                        return Err(Error::Internal(format!(
                            "TYPE with a {} operand",
                            other.class_name()
                        )));
                    }
                };
                self.assign_to(instruction.arg(0)?, Value::from(value.type_name()))?;
            }

            // --- Jumps ---
            Opcode::Label => {}
            Opcode::Jump => {
                self.ip = self.labels.lookup(label(instruction.arg(0)?)?)?;
            }
            Opcode::JumpIfEq | Opcode::JumpIfNeq => {
                // The label must exist whether or not the jump is taken.
                let target = self.labels.lookup(label(instruction.arg(0)?)?)?;
                let left = self.defined_value_of(instruction.arg(1)?)?;
                let right = self.defined_value_of(instruction.arg(2)?)?;
                let equal = operators::values_equal(&left, &right)?;
                if equal == (instruction.opcode == Opcode::JumpIfEq) {
                    self.ip = target;
                }
            }

            Opcode::Exit => {
                let value = self.defined_value_of(instruction.arg(0)?)?;
                let code = match &value {
                    Value::Int(code) => code,
                    other => {
                        return Err(Error::Type {
                            expected: "int".to_string(),
                            got: other.type_name().to_string(),
                        });
                    }
                };
                let code = code
                    .to_i32()
                    .filter(|code| (0..=49).contains(code))
                    .ok_or_else(|| {
                        Error::Operand(format!("exit code {code} is outside 0..=49"))
                    })?;
                return Ok(Flow::Exit(code));
            }

            Opcode::Break => self.dump_state(index, instruction)?,
        }
        Ok(Flow::Continue)
    }

    // -----------------------------------------------------------------------
    // Operand resolution
    // -----------------------------------------------------------------------

    /// Resolve a symbol operand to its value, requiring it to be defined.
    ///
    /// The checks layer in the mandated order: frame existence, then
    /// declaration, then initialisation. Type admissibility is left to the
    /// per-instruction handler.
    fn defined_value_of(&self, operand: &Operand) -> Result<Value> {
        match operand {
            Operand::Var { scope, name } => self.defined_variable(*scope, name),
            Operand::Literal(value) => Ok(value.clone()),
            other => Err(Error::Internal(format!(
                "expected a symbol operand, found a {}",
                other.class_name()
            ))),
        }
    }

    fn defined_variable(&self, scope: Scope, name: &str) -> Result<Value> {
        let value = self.frames.read(scope, name)?;
        if !value.is_defined() {
            return Err(Error::Missing(format!(
                "variable '{scope}@{name}' is not initialised"
            )));
        }
        Ok(value.clone())
    }

    fn assign_to(&mut self, operand: &Operand, value: Value) -> Result<()> {
        let (scope, name) = variable(operand)?;
        self.frames.assign(scope, name, value)
    }

    /// Shared shape of the two-source instructions: read both symbols,
    /// apply, assign to the target variable.
    fn binary(
        &mut self,
        instruction: &Instruction,
        op: fn(&Value, &Value) -> Result<Value>,
    ) -> Result<()> {
        let left = self.defined_value_of(instruction.arg(1)?)?;
        let right = self.defined_value_of(instruction.arg(2)?)?;
        let result = op(&left, &right)?;
        self.assign_to(instruction.arg(0)?, result)
    }

    fn unary(
        &mut self,
        instruction: &Instruction,
        op: fn(&Value) -> Result<Value>,
    ) -> Result<()> {
        let operand = self.defined_value_of(instruction.arg(1)?)?;
        let result = op(&operand)?;
        self.assign_to(instruction.arg(0)?, result)
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// Read one input line and convert it per the requested type.
    ///
    /// End of input yields `nil`, as does an unparsable `int`. A malformed
    /// `bool` token is `false`.
    fn read_value(&mut self, wanted: DataType) -> Result<Value> {
        let Some(line) = self.read_line()? else {
            return Ok(Value::Nil);
        };
        Ok(match wanted {
            DataType::Int => line
                .parse::<BigInt>()
                .map(Value::Int)
                .unwrap_or(Value::Nil),
            DataType::Bool => Value::Bool(line.eq_ignore_ascii_case("true")),
            DataType::Str => Value::Str(line),
        })
    }

    /// One line from the input stream, without its trailing newline.
    /// `None` at end of input.
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }

    // -----------------------------------------------------------------------
    // Diagnostics
    // -----------------------------------------------------------------------

    /// Render a fatal error to the diagnostic stream.
    fn report(&mut self, err: &Error, instruction: &Instruction) {
        let report = Diagnostic::new(err.to_string()).with_site(Site {
            order: instruction.order,
            opcode: instruction.opcode.name(),
        });
        let _ = writeln!(self.diag, "{report}");
    }

    /// `BREAK`: dump the engine state to the diagnostic stream.
    fn dump_state(&mut self, index: usize, instruction: &Instruction) -> Result<()> {
        writeln!(
            self.diag,
            "break at order {} (instruction {}, {} executed so far)",
            instruction.order,
            index + 1,
            self.stats.insts()
        )?;
        writeln!(self.diag, "global frame: {:?}", self.frames.global())?;
        match self.frames.temporary() {
            Some(frame) => writeln!(self.diag, "temporary frame: {frame:?}")?,
            None => writeln!(self.diag, "temporary frame: none")?,
        }
        match self.frames.local() {
            Some(frame) => writeln!(
                self.diag,
                "local frames: {} deep, top {frame:?}",
                self.frames.local_depth()
            )?,
            None => writeln!(self.diag, "local frames: empty")?,
        }
        writeln!(
            self.diag,
            "data stack: {} value(s), call stack: {} return site(s)",
            self.data_stack.len(),
            self.call_stack.len()
        )?;
        Ok(())
    }
}

fn variable(operand: &Operand) -> Result<(Scope, &str)> {
    match operand {
        Operand::Var { scope, name } => Ok((*scope, name)),
        other => Err(Error::Internal(format!(
            "expected a variable operand, found a {}",
            other.class_name()
        ))),
    }
}

fn label(operand: &Operand) -> Result<&str> {
    match operand {
        Operand::Label(name) => Ok(name),
        other => Err(Error::Internal(format!(
            "expected a label operand, found a {}",
            other.class_name()
        ))),
    }
}
