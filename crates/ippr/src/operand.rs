//! Operand syntax: scope-qualified variables and literal decoding.
//!
//! Every instruction argument arrives from the source document as a
//! `(type, text)` pair. This module turns those pairs into [`Operand`]s,
//! validating variable names against the identifier alphabet and decoding
//! literal text (including `\DDD` string escapes) into [`Value`]s. All
//! failures here are syntactic and terminate with exit code 32.

use std::fmt;

use num_bigint::BigInt;

use crate::error::{Error, Result};
use crate::value::Value;

/// The three variable address spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// `GF`: created once at start, never destroyed.
    Global,
    /// `LF`: the top of the local-frame stack, when one exists.
    Local,
    /// `TF`: the single optional temporary frame.
    Temporary,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Scope::Global => "GF",
            Scope::Local => "LF",
            Scope::Temporary => "TF",
        })
    }
}

/// The type selector carried by a `READ` instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Int,
    Bool,
    Str,
}

/// A decoded instruction argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A scope-qualified variable reference, e.g. `GF@counter`.
    Var { scope: Scope, name: String },
    /// A literal, already decoded into its runtime value.
    Literal(Value),
    Label(String),
    Type(DataType),
}

impl Operand {
    /// Decode a `(type, text)` argument pair from the source document.
    pub fn decode(kind: &str, text: &str) -> Result<Operand> {
        match kind {
            "var" => {
                let (scope, name) = variable(text)?;
                Ok(Operand::Var { scope, name })
            }
            "int" | "bool" | "string" | "nil" => Ok(Operand::Literal(literal(kind, text)?)),
            "label" => Ok(Operand::Label(name_token(text, "label")?)),
            "type" => Ok(Operand::Type(type_tag(text)?)),
            other => Err(Error::Program(format!("unknown operand type '{other}'"))),
        }
    }

    /// A short human-readable class name for error messages.
    pub fn class_name(&self) -> &'static str {
        match self {
            Operand::Var { .. } => "variable",
            Operand::Literal(_) => "literal",
            Operand::Label(_) => "label",
            Operand::Type(_) => "type",
        }
    }
}

/// Split and validate a `SCOPE@name` variable reference.
pub fn variable(text: &str) -> Result<(Scope, String)> {
    let (scope, name) = text
        .split_once('@')
        .ok_or_else(|| Error::Program(format!("invalid variable '{text}'")))?;
    let scope = match scope {
        "GF" => Scope::Global,
        "LF" => Scope::Local,
        "TF" => Scope::Temporary,
        other => return Err(Error::Program(format!("invalid frame prefix '{other}'"))),
    };
    if !is_identifier(name) {
        return Err(Error::Program(format!("invalid variable name '{name}'")));
    }
    Ok((scope, name.to_string()))
}

/// Decode a literal of the given kind into a runtime value.
pub fn literal(kind: &str, text: &str) -> Result<Value> {
    match kind {
        "int" => text
            .parse::<BigInt>()
            .map(Value::Int)
            .map_err(|_| Error::Program(format!("invalid int literal '{text}'"))),
        "bool" => match text {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            other => Err(Error::Program(format!("invalid bool literal '{other}'"))),
        },
        "nil" => match text {
            "nil" | "" => Ok(Value::Nil),
            other => Err(Error::Program(format!("invalid nil literal '{other}'"))),
        },
        "string" => unescape(text).map(Value::Str),
        other => Err(Error::Internal(format!("'{other}' is not a literal kind"))),
    }
}

fn type_tag(text: &str) -> Result<DataType> {
    match text {
        "int" => Ok(DataType::Int),
        "bool" => Ok(DataType::Bool),
        "string" => Ok(DataType::Str),
        other => Err(Error::Program(format!("invalid type operand '{other}'"))),
    }
}

/// Validate a label (or similar bare-name) token: non-empty, and free of
/// whitespace and `#`.
fn name_token(text: &str, what: &str) -> Result<String> {
    if text.is_empty() || text.chars().any(|c| c.is_whitespace() || c == '#') {
        return Err(Error::Program(format!("invalid {what} '{text}'")));
    }
    Ok(text.to_string())
}

/// Resolve `\DDD` escapes in a string literal.
///
/// A backslash must be followed by exactly three decimal digits naming a
/// Unicode code point; raw whitespace and `#` are not permitted.
fn unescape(text: &str) -> Result<String> {
    if text.chars().any(|c| c.is_whitespace() || c == '#') {
        return Err(Error::Program(format!("invalid string literal '{text}'")));
    }
    let mut decoded = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            decoded.push(c);
            continue;
        }
        let mut code = 0u32;
        for _ in 0..3 {
            match chars.next().and_then(|d| d.to_digit(10)) {
                Some(digit) => code = code * 10 + digit,
                None => {
                    return Err(Error::Program(format!(
                        "invalid escape sequence in string literal '{text}'"
                    )));
                }
            }
        }
        match char::from_u32(code) {
            Some(decoded_char) => decoded.push(decoded_char),
            None => {
                return Err(Error::Program(format!(
                    "escape \\{code:03} is not a valid code point"
                )));
            }
        }
    }
    Ok(decoded)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_identifier_start(first) => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_digit() || is_identifier_start(c))
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, '_' | '-' | '$' | '&' | '%' | '*' | '!' | '?')
}
