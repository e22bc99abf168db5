use std::io::{self, BufRead, Write};

use crate::diagnostic::Diagnostic;
use crate::error::Result;
use crate::program::LabelIndex;
use crate::stats::Stats;
use crate::vm::Vm;
use crate::xml;

/// The interpreter: wires the source loader to the execution engine.
///
/// An `Interpreter` owns the three external streams: program input
/// (consumed by `READ`), program output (written by `WRITE`), and the
/// diagnostic stream. They default to stdin, stdout, and stderr. Fatal
/// conditions are rendered to the diagnostic stream and returned as
/// [`Error`](crate::Error)s whose [`exit_code`](crate::Error::exit_code)
/// is the mandated process exit code.
///
/// # Example
///
/// ```
/// use ippr::Interpreter;
///
/// let source = r#"
/// <program language="IPPcode23">
///   <instruction order="1" opcode="WRITE">
///     <arg1 type="string">Hello\032World</arg1>
///   </instruction>
/// </program>"#;
///
/// let mut output = Vec::new();
/// let mut interpreter = Interpreter::new().with_output(&mut output);
/// let exit = interpreter.run(source).unwrap();
/// drop(interpreter);
///
/// assert_eq!(exit, 0);
/// assert_eq!(output, b"Hello World");
/// ```
pub struct Interpreter<'io> {
    input: Box<dyn BufRead + 'io>,
    output: Box<dyn Write + 'io>,
    diag: Box<dyn Write + 'io>,
    stats: Stats,
}

impl<'io> Interpreter<'io> {
    /// Create an interpreter bound to the standard streams.
    pub fn new() -> Self {
        Self {
            input: Box::new(io::stdin().lock()),
            output: Box::new(io::stdout()),
            diag: Box::new(io::stderr()),
            stats: Stats::new(),
        }
    }

    /// Replace the program input stream read by `READ`.
    pub fn with_input(mut self, input: impl BufRead + 'io) -> Self {
        self.input = Box::new(input);
        self
    }

    /// Replace the program output stream written by `WRITE`.
    pub fn with_output(mut self, output: impl Write + 'io) -> Self {
        self.output = Box::new(output);
        self
    }

    /// Replace the diagnostic stream written by `DPRINT`, `BREAK`, and
    /// fatal-error reports.
    pub fn with_diagnostics(mut self, diag: impl Write + 'io) -> Self {
        self.diag = Box::new(diag);
        self
    }

    /// Load and execute a source document.
    ///
    /// Returns the process exit code on orderly termination: the operand
    /// of an executed `EXIT`, or 0 when execution runs off the end of the
    /// program.
    pub fn run(&mut self, source: &str) -> Result<i32> {
        let program = match xml::parse_program(source) {
            Ok(program) => program,
            Err(err) => {
                let _ = writeln!(self.diag, "{}", Diagnostic::new(err.to_string()));
                return Err(err);
            }
        };
        let labels = match LabelIndex::build(&program) {
            Ok(labels) => labels,
            Err(err) => {
                let _ = writeln!(self.diag, "{}", Diagnostic::new(err.to_string()));
                return Err(err);
            }
        };

        let mut vm = Vm::new(
            labels,
            &mut *self.input,
            &mut *self.output,
            &mut *self.diag,
        );
        let outcome = vm.run(&program);
        self.stats = vm.into_stats();
        outcome
    }

    /// Statistics collected by the most recent [`run`](Self::run).
    pub fn stats(&self) -> &Stats {
        &self.stats
    }
}

impl Default for Interpreter<'_> {
    fn default() -> Self {
        Self::new()
    }
}
