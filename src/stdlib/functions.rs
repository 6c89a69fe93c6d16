//! Built-in functions: `size`, type conversions and string predicates.
//!
//! Each overload is registered with the exact argument kinds it accepts. A
//! method call passes its receiver as the first argument, so `"abc".size()`
//! and `size("abc")` both dispatch to `size(string)`.

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::error::EvaluationError;
use crate::extension::Function;
use crate::span::Span;
use crate::stdlib::operand_mismatch;
use crate::stdlib::time::{parse_duration, parse_timestamp, timestamp_in_range};
use crate::value::ValueKind as K;
use crate::value::{Value, format_duration, format_timestamp};

pub fn all() -> Vec<Function> {
    vec![
        size(),
        int(),
        uint(),
        double(),
        string(),
        bytes(),
        boolean(),
        timestamp(),
        duration(),
        string_predicate("contains", |s, sub| s.contains(sub)),
        string_predicate("startsWith", |s, prefix| s.starts_with(prefix)),
        string_predicate("endsWith", |s, suffix| s.ends_with(suffix)),
        matches(),
    ]
}

fn length(n: usize, span: Span) -> Result<Value, EvaluationError> {
    i64::try_from(n)
        .map(Value::Int)
        .map_err(|_| EvaluationError::overflow("size", span))
}

/// Identity overload for conversions to a value's own kind.
fn same(span: Span, args: &[Value]) -> Result<Value, EvaluationError> {
    match args {
        [value] => Ok(value.clone()),
        _ => Err(operand_mismatch("conversion", args, span)),
    }
}

// ========================================
// Size
// ========================================

fn size() -> Function {
    Function::new("size")
        .overload([K::String], |span, args| match args {
            [Value::String(s)] => length(s.chars().count(), span),
            _ => Err(operand_mismatch("size", args, span)),
        })
        .overload([K::Bytes], |span, args| match args {
            [Value::Bytes(b)] => length(b.len(), span),
            _ => Err(operand_mismatch("size", args, span)),
        })
        .overload([K::List], |span, args| match args {
            [Value::List(items)] => length(items.len(), span),
            _ => Err(operand_mismatch("size", args, span)),
        })
        .overload([K::Map], |span, args| match args {
            [Value::Map(map)] => length(map.len(), span),
            _ => Err(operand_mismatch("size", args, span)),
        })
}

// ========================================
// Numeric Conversions
// ========================================

fn float_to_int(f: f64, span: Span) -> Result<i64, EvaluationError> {
    let truncated = f.trunc();
    if truncated.is_finite() && truncated >= -9_223_372_036_854_775_808.0 && truncated < 9_223_372_036_854_775_808.0 {
        Ok(truncated as i64)
    } else {
        Err(EvaluationError::conversion(K::Float, K::Int, format!("{} is out of range", f), span))
    }
}

fn float_to_uint(f: f64, span: Span) -> Result<u64, EvaluationError> {
    let truncated = f.trunc();
    if truncated.is_finite() && truncated >= 0.0 && truncated < 18_446_744_073_709_551_616.0 {
        Ok(truncated as u64)
    } else {
        Err(EvaluationError::conversion(K::Float, K::UInt, format!("{} is out of range", f), span))
    }
}

fn int() -> Function {
    Function::new("int")
        .overload([K::Int], same)
        .overload([K::UInt], |span, args| match args {
            [Value::UInt(n)] => i64::try_from(*n).map(Value::Int).map_err(|_| {
                EvaluationError::conversion(K::UInt, K::Int, format!("{} is out of range", n), span)
            }),
            _ => Err(operand_mismatch("int", args, span)),
        })
        .overload([K::Float], |span, args| match args {
            [Value::Float(f)] => float_to_int(*f, span).map(Value::Int),
            _ => Err(operand_mismatch("int", args, span)),
        })
        .overload([K::String], |span, args| match args {
            [Value::String(s)] => s.parse::<i64>().map(Value::Int).map_err(|e| {
                EvaluationError::conversion(K::String, K::Int, format!("{:?}: {}", s, e), span)
            }),
            _ => Err(operand_mismatch("int", args, span)),
        })
        .overload([K::Bool], |span, args| match args {
            [Value::Bool(b)] => Ok(Value::Int(i64::from(*b))),
            _ => Err(operand_mismatch("int", args, span)),
        })
        .overload([K::Timestamp], |span, args| match args {
            [Value::Timestamp(t)] => Ok(Value::Int(t.timestamp())),
            _ => Err(operand_mismatch("int", args, span)),
        })
}

fn uint() -> Function {
    Function::new("uint")
        .overload([K::UInt], same)
        .overload([K::Int], |span, args| match args {
            [Value::Int(n)] => u64::try_from(*n).map(Value::UInt).map_err(|_| {
                EvaluationError::conversion(K::Int, K::UInt, format!("{} is negative", n), span)
            }),
            _ => Err(operand_mismatch("uint", args, span)),
        })
        .overload([K::Float], |span, args| match args {
            [Value::Float(f)] => float_to_uint(*f, span).map(Value::UInt),
            _ => Err(operand_mismatch("uint", args, span)),
        })
        .overload([K::String], |span, args| match args {
            [Value::String(s)] => s.parse::<u64>().map(Value::UInt).map_err(|e| {
                EvaluationError::conversion(K::String, K::UInt, format!("{:?}: {}", s, e), span)
            }),
            _ => Err(operand_mismatch("uint", args, span)),
        })
        .overload([K::Bool], |span, args| match args {
            [Value::Bool(b)] => Ok(Value::UInt(u64::from(*b))),
            _ => Err(operand_mismatch("uint", args, span)),
        })
}

fn double() -> Function {
    Function::new("double")
        .overload([K::Float], same)
        .overload([K::Int], |span, args| match args {
            [Value::Int(n)] => Ok(Value::Float(*n as f64)),
            _ => Err(operand_mismatch("double", args, span)),
        })
        .overload([K::UInt], |span, args| match args {
            [Value::UInt(n)] => Ok(Value::Float(*n as f64)),
            _ => Err(operand_mismatch("double", args, span)),
        })
        .overload([K::String], |span, args| match args {
            [Value::String(s)] => s.parse::<f64>().map(Value::Float).map_err(|e| {
                EvaluationError::conversion(K::String, K::Float, format!("{:?}: {}", s, e), span)
            }),
            _ => Err(operand_mismatch("double", args, span)),
        })
}

// ========================================
// String and Bytes Conversions
// ========================================

fn string() -> Function {
    Function::new("string")
        .overload([K::String], same)
        .overload([K::Int], |span, args| match args {
            [Value::Int(n)] => Ok(Value::from(n.to_string())),
            _ => Err(operand_mismatch("string", args, span)),
        })
        .overload([K::UInt], |span, args| match args {
            [Value::UInt(n)] => Ok(Value::from(n.to_string())),
            _ => Err(operand_mismatch("string", args, span)),
        })
        .overload([K::Float], |span, args| match args {
            [Value::Float(f)] => Ok(Value::from(f.to_string())),
            _ => Err(operand_mismatch("string", args, span)),
        })
        .overload([K::Bool], |span, args| match args {
            [Value::Bool(b)] => Ok(Value::from(b.to_string())),
            _ => Err(operand_mismatch("string", args, span)),
        })
        .overload([K::Bytes], |span, args| match args {
            [Value::Bytes(b)] => std::str::from_utf8(b).map(Value::string).map_err(|e| {
                EvaluationError::conversion(K::Bytes, K::String, e.to_string(), span)
            }),
            _ => Err(operand_mismatch("string", args, span)),
        })
        .overload([K::Timestamp], |span, args| match args {
            [Value::Timestamp(t)] => Ok(Value::from(format_timestamp(*t))),
            _ => Err(operand_mismatch("string", args, span)),
        })
        .overload([K::Duration], |span, args| match args {
            [Value::Duration(d)] => Ok(Value::from(format_duration(*d))),
            _ => Err(operand_mismatch("string", args, span)),
        })
}

fn bytes() -> Function {
    Function::new("bytes")
        .overload([K::Bytes], same)
        .overload([K::String], |span, args| match args {
            [Value::String(s)] => Ok(Value::bytes(s.as_bytes())),
            _ => Err(operand_mismatch("bytes", args, span)),
        })
}

fn boolean() -> Function {
    Function::new("bool")
        .overload([K::Bool], same)
        .overload([K::String], |span, args| match args {
            [Value::String(s)] => match &**s {
                "1" | "t" | "true" | "TRUE" | "True" => Ok(Value::Bool(true)),
                "0" | "f" | "false" | "FALSE" | "False" => Ok(Value::Bool(false)),
                other => Err(EvaluationError::conversion(
                    K::String,
                    K::Bool,
                    format!("{:?} is not a boolean", other),
                    span,
                )),
            },
            _ => Err(operand_mismatch("bool", args, span)),
        })
}

// ========================================
// Time Conversions
// ========================================

fn timestamp() -> Function {
    Function::new("timestamp")
        .overload([K::Timestamp], same)
        .overload([K::String], |span, args| match args {
            [Value::String(s)] => parse_timestamp(s)
                .map(Value::Timestamp)
                .map_err(|reason| EvaluationError::conversion(K::String, K::Timestamp, reason, span)),
            _ => Err(operand_mismatch("timestamp", args, span)),
        })
        .overload([K::Int], |span, args| match args {
            [Value::Int(seconds)] => DateTime::<Utc>::from_timestamp(*seconds, 0)
                .filter(timestamp_in_range)
                .map(Value::Timestamp)
                .ok_or_else(|| {
                    EvaluationError::conversion(
                        K::Int,
                        K::Timestamp,
                        format!("{} seconds is out of range", seconds),
                        span,
                    )
                }),
            _ => Err(operand_mismatch("timestamp", args, span)),
        })
}

fn duration() -> Function {
    Function::new("duration")
        .overload([K::Duration], same)
        .overload([K::String], |span, args| match args {
            [Value::String(s)] => parse_duration(s)
                .map(Value::Duration)
                .map_err(|reason| EvaluationError::conversion(K::String, K::Duration, reason, span)),
            _ => Err(operand_mismatch("duration", args, span)),
        })
}

// ========================================
// String Predicates
// ========================================

fn string_predicate(name: &'static str, test: fn(&str, &str) -> bool) -> Function {
    Function::new(name).overload([K::String, K::String], move |span, args| match args {
        [Value::String(s), Value::String(other)] => Ok(Value::Bool(test(s, other))),
        _ => Err(operand_mismatch(name, args, span)),
    })
}

fn matches() -> Function {
    Function::new("matches").overload([K::String, K::String], |span, args| match args {
        [Value::String(s), Value::String(pattern)] => {
            let re = Regex::new(pattern).map_err(|e| {
                EvaluationError::unsupported(format!("invalid regular expression: {}", e), span)
            })?;
            Ok(Value::Bool(re.is_match(s)))
        }
        _ => Err(operand_mismatch("matches", args, span)),
    })
}
