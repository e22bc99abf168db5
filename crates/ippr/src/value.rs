use std::fmt;

use num_bigint::BigInt;

/// A runtime value of the interpreted language.
///
/// Strings are kept in decoded form: escape sequences from the source
/// document are resolved when the literal is ingested, so `Str` always
/// holds plain Unicode text.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Arbitrary-precision signed integer.
    Int(BigInt),
    Bool(bool),
    Str(String),
    /// The distinguished unit value.
    Nil,
    /// A declared variable that has not been assigned yet.
    Uninit,
}

impl Value {
    /// The language-level type name, as reported by the `TYPE` instruction.
    ///
    /// An uninitialised variable has no type and yields the empty string.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Nil => "nil",
            Value::Uninit => "",
        }
    }

    /// Whether the value is anything other than `Uninit`.
    pub fn is_defined(&self) -> bool {
        !matches!(self, Value::Uninit)
    }

    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// The output form used by `WRITE` and `DPRINT`: integers in decimal,
/// booleans as `true`/`false`, strings verbatim, `nil` as nothing at all.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Bool(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Str(s) => write!(f, "{}", s),
            Value::Nil | Value::Uninit => Ok(()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<BigInt> for Value {
    fn from(i: BigInt) -> Self {
        Value::Int(i)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(BigInt::from(i))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}
