//! Typed operator semantics: arithmetic, relational, logical, and string
//! operations.
//!
//! These helpers are stateless; the execution engine resolves operands to
//! [`Value`]s and delegates the actual computation here. Each function
//! enforces its instruction's typing profile: a profile violation is a
//! type error (exit 53), while range faults on otherwise well-typed string
//! operations are exit 58.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{ToPrimitive, Zero};

use crate::error::{Error, Result};
use crate::value::Value;

pub fn add(left: &Value, right: &Value) -> Result<Value> {
    int_binop(left, right, |a, b| a + b)
}

pub fn sub(left: &Value, right: &Value) -> Result<Value> {
    int_binop(left, right, |a, b| a - b)
}

pub fn mul(left: &Value, right: &Value) -> Result<Value> {
    int_binop(left, right, |a, b| a * b)
}

/// Integer division, rounding toward negative infinity. Division by zero
/// is exit 57.
pub fn idiv(left: &Value, right: &Value) -> Result<Value> {
    let a = expect_int(left)?;
    let b = expect_int(right)?;
    if b.is_zero() {
        return Err(Error::DivisionByZero);
    }
    Ok(Value::Int(a.div_floor(b)))
}

pub fn lt(left: &Value, right: &Value) -> Result<Value> {
    relational(left, right, std::cmp::Ordering::Less)
}

pub fn gt(left: &Value, right: &Value) -> Result<Value> {
    relational(left, right, std::cmp::Ordering::Greater)
}

/// Equality over matching non-nil types, with `nil` comparable to
/// everything: `nil` equals only `nil`. Mismatched non-nil types are a
/// type error.
pub fn values_equal(left: &Value, right: &Value) -> Result<bool> {
    match (left, right) {
        (Value::Nil, _) | (_, Value::Nil) => Ok(left == right),
        (Value::Int(a), Value::Int(b)) => Ok(a == b),
        (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
        (Value::Str(a), Value::Str(b)) => Ok(a == b),
        _ => Err(type_error("two operands of the same type", left, right)),
    }
}

pub fn eq(left: &Value, right: &Value) -> Result<Value> {
    values_equal(left, right).map(Value::Bool)
}

pub fn and(left: &Value, right: &Value) -> Result<Value> {
    Ok(Value::Bool(expect_bool(left)? && expect_bool(right)?))
}

pub fn or(left: &Value, right: &Value) -> Result<Value> {
    Ok(Value::Bool(expect_bool(left)? || expect_bool(right)?))
}

pub fn not(operand: &Value) -> Result<Value> {
    Ok(Value::Bool(!expect_bool(operand)?))
}

/// `INT2CHAR`: the integer must name a valid Unicode code point.
pub fn int_to_char(operand: &Value) -> Result<Value> {
    let code = expect_int(operand)?;
    code.to_u32()
        .and_then(char::from_u32)
        .map(|c| Value::Str(c.to_string()))
        .ok_or_else(|| Error::BadCodePoint(code.clone()))
}

/// `STRI2INT`: the code point of the character at the given index.
pub fn str_to_int(string: &Value, index: &Value) -> Result<Value> {
    let s = expect_str(string)?;
    let i = char_index(s, expect_int(index)?)?;
    let c = s.chars().nth(i).expect("index was checked against length");
    Ok(Value::Int(BigInt::from(c as u32)))
}

pub fn concat(left: &Value, right: &Value) -> Result<Value> {
    let a = expect_str(left)?;
    let b = expect_str(right)?;
    Ok(Value::Str(format!("{a}{b}")))
}

pub fn strlen(operand: &Value) -> Result<Value> {
    let s = expect_str(operand)?;
    Ok(Value::Int(BigInt::from(s.chars().count())))
}

/// `GETCHAR`: the single-character string at the given index.
pub fn get_char(string: &Value, index: &Value) -> Result<Value> {
    let s = expect_str(string)?;
    let i = char_index(s, expect_int(index)?)?;
    let c = s.chars().nth(i).expect("index was checked against length");
    Ok(Value::Str(c.to_string()))
}

/// `SETCHAR`: replace the character of `target` at `index` with the first
/// character of `replacement`. An out-of-range index and an empty
/// replacement string are one combined range fault.
pub fn set_char(target: &Value, index: &Value, replacement: &Value) -> Result<Value> {
    let dst = expect_str(target)?;
    let i = expect_int(index)?;
    let src = expect_str(replacement)?;

    let (Some(first), Ok(i)) = (src.chars().next(), char_index(dst, i)) else {
        return Err(Error::StringOp(format!(
            "cannot place '{src}' at position {i} of '{dst}'"
        )));
    };
    Ok(Value::Str(
        dst.chars()
            .enumerate()
            .map(|(j, c)| if j == i { first } else { c })
            .collect(),
    ))
}

fn relational(left: &Value, right: &Value, wanted: std::cmp::Ordering) -> Result<Value> {
    let ordering = match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Str(a), Value::Str(b)) => a.cmp(b),
        _ => {
            return Err(type_error(
                "two int, bool, or string operands of the same type",
                left,
                right,
            ));
        }
    };
    Ok(Value::Bool(ordering == wanted))
}

fn int_binop<F>(left: &Value, right: &Value, op: F) -> Result<Value>
where
    F: Fn(&BigInt, &BigInt) -> BigInt,
{
    Ok(Value::Int(op(expect_int(left)?, expect_int(right)?)))
}

fn expect_int(value: &Value) -> Result<&BigInt> {
    value.as_int().ok_or_else(|| Error::Type {
        expected: "int".to_string(),
        got: value.type_name().to_string(),
    })
}

fn expect_bool(value: &Value) -> Result<bool> {
    value.as_bool().ok_or_else(|| Error::Type {
        expected: "bool".to_string(),
        got: value.type_name().to_string(),
    })
}

fn expect_str(value: &Value) -> Result<&str> {
    value.as_str().ok_or_else(|| Error::Type {
        expected: "string".to_string(),
        got: value.type_name().to_string(),
    })
}

/// Check `0 <= index < len` over characters, not bytes.
fn char_index(s: &str, index: &BigInt) -> Result<usize> {
    index
        .to_usize()
        .filter(|i| *i < s.chars().count())
        .ok_or_else(|| Error::IndexOutOfRange(index.clone()))
}

fn type_error(expected: &str, left: &Value, right: &Value) -> Error {
    Error::Type {
        expected: expected.to_string(),
        got: format!("{} and {}", left.type_name(), right.type_name()),
    }
}
