use num_bigint::BigInt;
use thiserror::Error;

use crate::operand::Scope;

/// Every fatal condition the interpreter can report.
///
/// Errors are terminal: there is no instruction-level recovery. Each variant
/// maps onto exactly one process exit code via [`Error::exit_code`].
#[derive(Debug, Error)]
pub enum Error {
    /// The source is not a well-formed XML document.
    #[error("malformed program document: {0}")]
    Document(String),

    /// The document is well-formed XML but not a valid program: wrong root,
    /// bad `order`, unknown opcode, wrong arity, or a malformed literal.
    #[error("invalid program: {0}")]
    Program(String),

    #[error("label '{0}' is defined more than once")]
    DuplicateLabel(String),

    #[error("label '{0}' is not defined")]
    UnknownLabel(String),

    #[error("variable '{0}' is already declared")]
    Redeclared(String),

    /// An operand does not satisfy the instruction's typing profile.
    #[error("operand type mismatch: expected {expected}, got {got}")]
    Type { expected: String, got: String },

    #[error("variable '{0}' is not declared")]
    Undeclared(String),

    #[error("frame {0} does not exist")]
    NoFrame(Scope),

    /// A value was required but none is available: an empty stack or an
    /// uninitialised variable.
    #[error("missing value: {0}")]
    Missing(String),

    #[error("division by zero")]
    DivisionByZero,

    /// A well-typed operand with an inadmissible value, e.g. an exit code
    /// outside the permitted range.
    #[error("invalid operand value: {0}")]
    Operand(String),

    #[error("string index {0} is out of range")]
    IndexOutOfRange(BigInt),

    #[error("{0} is not a valid Unicode code point")]
    BadCodePoint(BigInt),

    #[error("bad string operation: {0}")]
    StringOp(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// The process exit code this condition terminates with.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Document(_) => 31,
            Error::Program(_) => 32,
            Error::DuplicateLabel(_) | Error::UnknownLabel(_) | Error::Redeclared(_) => 52,
            Error::Type { .. } => 53,
            Error::Undeclared(_) => 54,
            Error::NoFrame(_) => 55,
            Error::Missing(_) => 56,
            Error::DivisionByZero | Error::Operand(_) => 57,
            Error::IndexOutOfRange(_) | Error::BadCodePoint(_) | Error::StringOp(_) => 58,
            Error::Io(_) | Error::Internal(_) => 99,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
