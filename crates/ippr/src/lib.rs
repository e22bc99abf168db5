//! Ippr is an interpreter for the IPPcode23 intermediate language.
//!
//! IPPcode23 is a three-address, assembly-style intermediate language
//! delivered as an XML document. Ippr loads such a document, executes it
//! against a line-oriented input stream, and produces program output,
//! diagnostics, and a process exit code.
//!
//! # Quick start
//!
//! ```
//! use ippr::Interpreter;
//!
//! let source = r#"
//! <program language="IPPcode23">
//!   <instruction order="1" opcode="DEFVAR">
//!     <arg1 type="var">GF@answer</arg1>
//!   </instruction>
//!   <instruction order="2" opcode="MOVE">
//!     <arg1 type="var">GF@answer</arg1>
//!     <arg2 type="int">42</arg2>
//!   </instruction>
//!   <instruction order="3" opcode="WRITE">
//!     <arg1 type="var">GF@answer</arg1>
//!   </instruction>
//! </program>"#;
//!
//! let mut output = Vec::new();
//! let mut interpreter = Interpreter::new().with_output(&mut output);
//! interpreter.run(source).unwrap();
//! drop(interpreter);
//!
//! assert_eq!(output, b"42");
//! ```
//!
//! # The language
//!
//! ## Values
//! - `int`: arbitrary-precision signed integers
//! - `bool`, `string`, `nil`
//! - declared-but-unassigned variables are a distinct, typeless state
//!
//! ## Variable scopes
//! - `GF`: the global frame, alive for the whole run
//! - `TF`: the optional temporary frame (`CREATEFRAME`)
//! - `LF`: the top of the local-frame stack (`PUSHFRAME`/`POPFRAME`)
//!
//! ## Control flow
//! - labels with `JUMP`, `JUMPIFEQ`, `JUMPIFNEQ`
//! - procedure calls with `CALL`/`RETURN` over a return-address stack
//! - a data stack with `PUSHS`/`POPS`
//! - `EXIT` with a code in `0..=49`
//!
//! # Error reporting
//!
//! Every fatal condition carries a fixed process exit code (see
//! [`Error::exit_code`]): 31–32 for source-format faults, 52–58 for
//! semantic and runtime faults, 99 for internal invariant violations. A
//! report is written to the diagnostic stream before the error is handed
//! back.
//!
//! # Statistics
//!
//! The engine counts executed instructions, the hottest instruction, and
//! the high-water mark of initialised variables; see [`Stats`].

mod diagnostic;
mod error;
mod frames;
mod interpreter;
mod operand;
mod operators;
mod program;
mod stats;
mod value;
mod vm;
mod xml;

pub use diagnostic::{Diagnostic, Site};
pub use error::{Error, Result};
pub use interpreter::Interpreter;
pub use operand::{DataType, Operand, Scope};
pub use program::{Instruction, LabelIndex, Opcode, Program, Slot};
pub use stats::{StatField, Stats};
pub use value::Value;
pub use xml::parse_program;
