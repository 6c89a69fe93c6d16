//! Built-in operator overloads.
//!
//! Handlers rely on the dispatch table having matched their operand kinds.
//! A kind mismatch inside a handler is a registration bug and is reported as
//! an internal error.

use chrono::{DateTime, TimeDelta, Utc};

use crate::ast::BinaryOperatorKind as Op;
use crate::ast::UnaryOperatorKind;
use crate::error::EvaluationError;
use crate::extension::{BinaryOperatorOverload, Handler, UnaryOperatorOverload, handler};
use crate::span::Span;
use crate::stdlib::operand_mismatch;
use crate::stdlib::time::{duration_in_range, timestamp_in_range};
use crate::value::ValueKind as K;
use crate::value::{MapKey, Value, ValueKind, map_lookup};

/// Kinds that can sit on the left of `x in list`.
const SCALAR_KINDS: [ValueKind; 9] = [
    K::Bool,
    K::Bytes,
    K::Float,
    K::Int,
    K::UInt,
    K::String,
    K::Null,
    K::Timestamp,
    K::Duration,
];

const ORDERED_KINDS: [ValueKind; 8] = [
    K::Bool,
    K::Int,
    K::UInt,
    K::Float,
    K::String,
    K::Bytes,
    K::Timestamp,
    K::Duration,
];

const NUMERIC_CROSS_PAIRS: [(ValueKind, ValueKind); 6] = [
    (K::Int, K::UInt),
    (K::UInt, K::Int),
    (K::Int, K::Float),
    (K::Float, K::Int),
    (K::UInt, K::Float),
    (K::Float, K::UInt),
];

pub fn binary() -> Vec<BinaryOperatorOverload> {
    let mut overloads = vec![
        addition(),
        subtraction(),
        numeric(Op::Multiply),
        numeric(Op::Divide),
        numeric(Op::Modulo),
        equality(Op::Equal),
        equality(Op::NotEqual),
        membership(),
    ];
    for op in [Op::Less, Op::LessEqual, Op::Greater, Op::GreaterEqual] {
        overloads.push(ordering(op));
    }
    overloads
}

pub fn unary() -> Vec<UnaryOperatorOverload> {
    vec![
        UnaryOperatorOverload::new(UnaryOperatorKind::Not).overload(K::Bool, |span, args| match args {
            [Value::Bool(b)] => Ok(Value::Bool(!b)),
            _ => Err(operand_mismatch("!", args, span)),
        }),
        UnaryOperatorOverload::new(UnaryOperatorKind::Negate)
            .overload(K::Int, |span, args| match args {
                [Value::Int(n)] => n
                    .checked_neg()
                    .map(Value::Int)
                    .ok_or_else(|| EvaluationError::overflow("-", span)),
                _ => Err(operand_mismatch("-", args, span)),
            })
            .overload(K::Float, |span, args| match args {
                [Value::Float(n)] => Ok(Value::Float(-n)),
                _ => Err(operand_mismatch("-", args, span)),
            })
            .overload(K::Duration, |span, args| match args {
                [Value::Duration(d)] => Ok(Value::Duration(-*d)),
                _ => Err(operand_mismatch("-", args, span)),
            }),
    ]
}

fn int_arithmetic(op: Op, a: i64, b: i64, span: Span) -> Result<Value, EvaluationError> {
    let result = match op {
        Op::Plus => a.checked_add(b),
        Op::Minus => a.checked_sub(b),
        Op::Multiply => a.checked_mul(b),
        Op::Divide | Op::Modulo if b == 0 => return Err(EvaluationError::DivisionByZero { span }),
        Op::Divide => a.checked_div(b),
        Op::Modulo => a.checked_rem(b),
        _ => return Err(EvaluationError::internal(format!("`{}` is not arithmetic", op), span)),
    };
    result
        .map(Value::Int)
        .ok_or_else(|| EvaluationError::overflow(op.symbol(), span))
}

fn uint_arithmetic(op: Op, a: u64, b: u64, span: Span) -> Result<Value, EvaluationError> {
    let result = match op {
        Op::Plus => a.checked_add(b),
        Op::Minus => a.checked_sub(b),
        Op::Multiply => a.checked_mul(b),
        Op::Divide | Op::Modulo if b == 0 => return Err(EvaluationError::DivisionByZero { span }),
        Op::Divide => a.checked_div(b),
        Op::Modulo => a.checked_rem(b),
        _ => return Err(EvaluationError::internal(format!("`{}` is not arithmetic", op), span)),
    };
    result
        .map(Value::UInt)
        .ok_or_else(|| EvaluationError::overflow(op.symbol(), span))
}

fn float_arithmetic(op: Op, a: f64, b: f64, span: Span) -> Result<Value, EvaluationError> {
    let result = match op {
        Op::Plus => a + b,
        Op::Minus => a - b,
        Op::Multiply => a * b,
        Op::Divide if b == 0.0 => return Err(EvaluationError::DivisionByZero { span }),
        Op::Divide => a / b,
        _ => return Err(EvaluationError::internal(format!("`{}` is not defined on doubles", op), span)),
    };
    Ok(Value::Float(result))
}

/// Int/Int and UInt/UInt for every arithmetic operator, plus Float/Float for
/// everything except `%`.
fn numeric(op: Op) -> BinaryOperatorOverload {
    let overloads = BinaryOperatorOverload::new(op)
        .overload(K::Int, K::Int, move |span, args| match args {
            [Value::Int(a), Value::Int(b)] => int_arithmetic(op, *a, *b, span),
            _ => Err(operand_mismatch(op.symbol(), args, span)),
        })
        .overload(K::UInt, K::UInt, move |span, args| match args {
            [Value::UInt(a), Value::UInt(b)] => uint_arithmetic(op, *a, *b, span),
            _ => Err(operand_mismatch(op.symbol(), args, span)),
        });

    if op == Op::Modulo {
        return overloads;
    }

    overloads.overload(K::Float, K::Float, move |span, args| match args {
        [Value::Float(a), Value::Float(b)] => float_arithmetic(op, *a, *b, span),
        _ => Err(operand_mismatch(op.symbol(), args, span)),
    })
}

fn shift_timestamp(t: DateTime<Utc>, d: TimeDelta, op: Op, span: Span) -> Result<Value, EvaluationError> {
    let shifted = match op {
        Op::Minus => t.checked_sub_signed(d),
        _ => t.checked_add_signed(d),
    };
    shifted
        .filter(timestamp_in_range)
        .map(Value::Timestamp)
        .ok_or_else(|| EvaluationError::overflow(op.symbol(), span))
}

fn combine_durations(a: TimeDelta, b: TimeDelta, op: Op, span: Span) -> Result<Value, EvaluationError> {
    let combined = match op {
        Op::Minus => a.checked_sub(&b),
        _ => a.checked_add(&b),
    };
    combined
        .filter(duration_in_range)
        .map(Value::Duration)
        .ok_or_else(|| EvaluationError::overflow(op.symbol(), span))
}

fn addition() -> BinaryOperatorOverload {
    numeric(Op::Plus)
        .overload(K::String, K::String, |span, args| match args {
            [Value::String(a), Value::String(b)] => {
                let mut joined = String::with_capacity(a.len() + b.len());
                joined.push_str(a);
                joined.push_str(b);
                Ok(Value::from(joined))
            }
            _ => Err(operand_mismatch("+", args, span)),
        })
        .overload(K::Bytes, K::Bytes, |span, args| match args {
            [Value::Bytes(a), Value::Bytes(b)] => Ok(Value::bytes([&a[..], &b[..]].concat())),
            _ => Err(operand_mismatch("+", args, span)),
        })
        .overload(K::List, K::List, |span, args| match args {
            [Value::List(a), Value::List(b)] => Ok(Value::list(a.iter().chain(b.iter()).cloned())),
            _ => Err(operand_mismatch("+", args, span)),
        })
        .overload(K::Timestamp, K::Duration, |span, args| match args {
            [Value::Timestamp(t), Value::Duration(d)] => shift_timestamp(*t, *d, Op::Plus, span),
            _ => Err(operand_mismatch("+", args, span)),
        })
        .overload(K::Duration, K::Timestamp, |span, args| match args {
            [Value::Duration(d), Value::Timestamp(t)] => shift_timestamp(*t, *d, Op::Plus, span),
            _ => Err(operand_mismatch("+", args, span)),
        })
        .overload(K::Duration, K::Duration, |span, args| match args {
            [Value::Duration(a), Value::Duration(b)] => combine_durations(*a, *b, Op::Plus, span),
            _ => Err(operand_mismatch("+", args, span)),
        })
}

fn subtraction() -> BinaryOperatorOverload {
    numeric(Op::Minus)
        .overload(K::Timestamp, K::Timestamp, |span, args| match args {
            [Value::Timestamp(a), Value::Timestamp(b)] => {
                let difference = a.signed_duration_since(*b);
                if duration_in_range(&difference) {
                    Ok(Value::Duration(difference))
                } else {
                    Err(EvaluationError::overflow("-", span))
                }
            }
            _ => Err(operand_mismatch("-", args, span)),
        })
        .overload(K::Timestamp, K::Duration, |span, args| match args {
            [Value::Timestamp(t), Value::Duration(d)] => shift_timestamp(*t, *d, Op::Minus, span),
            _ => Err(operand_mismatch("-", args, span)),
        })
        .overload(K::Duration, K::Duration, |span, args| match args {
            [Value::Duration(a), Value::Duration(b)] => combine_durations(*a, *b, Op::Minus, span),
            _ => Err(operand_mismatch("-", args, span)),
        })
}

fn equality_pairs() -> Vec<(ValueKind, ValueKind)> {
    let mut pairs: Vec<(ValueKind, ValueKind)> = K::ALL.iter().map(|k| (*k, *k)).collect();
    pairs.extend(NUMERIC_CROSS_PAIRS);
    for kind in K::ALL {
        if kind != K::Null {
            pairs.push((K::Null, kind));
            pairs.push((kind, K::Null));
        }
    }
    pairs
}

fn equality(op: Op) -> BinaryOperatorOverload {
    let negate = op == Op::NotEqual;
    let compare: Handler = handler(move |span, args| {
        let [left, right] = args else {
            return Err(operand_mismatch(op.symbol(), args, span));
        };
        match left.is_equal(right) {
            Some(equal) => Ok(Value::Bool(equal != negate)),
            None => Err(EvaluationError::unsupported(
                format!("cannot compare {} with {}", left, right),
                span,
            )),
        }
    });
    BinaryOperatorOverload::new(op).overload_all(&equality_pairs(), compare)
}

fn ordering(op: Op) -> BinaryOperatorOverload {
    let compare: Handler = handler(move |span, args| {
        let [left, right] = args else {
            return Err(operand_mismatch(op.symbol(), args, span));
        };
        let result = match op {
            Op::Less => left.is_less_than(right),
            Op::Greater => left.is_greater_than(right),
            Op::LessEqual => left
                .is_less_than(right)
                .zip(left.is_equal(right))
                .map(|(less, equal)| less || equal),
            Op::GreaterEqual => left
                .is_greater_than(right)
                .zip(left.is_equal(right))
                .map(|(greater, equal)| greater || equal),
            _ => None,
        };
        result.map(Value::Bool).ok_or_else(|| {
            EvaluationError::unsupported(
                format!("cannot order {} and {}", left.kind(), right.kind()),
                span,
            )
        })
    });

    let mut pairs: Vec<(ValueKind, ValueKind)> = ORDERED_KINDS.iter().map(|k| (*k, *k)).collect();
    pairs.extend(NUMERIC_CROSS_PAIRS);
    BinaryOperatorOverload::new(op).overload_all(&pairs, compare)
}

fn membership() -> BinaryOperatorOverload {
    let in_list = handler(|span, args| match args {
        [needle, Value::List(items)] => Ok(Value::Bool(
            items.iter().any(|item| needle.is_equal(item) == Some(true)),
        )),
        _ => Err(operand_mismatch("in", args, span)),
    });
    let in_map = handler(|span, args| match args {
        [needle, Value::Map(map)] if MapKey::from_value(needle).is_some() => {
            Ok(Value::Bool(map_lookup(map, needle).is_some()))
        }
        _ => Err(operand_mismatch("in", args, span)),
    });

    let list_pairs: Vec<(ValueKind, ValueKind)> = SCALAR_KINDS.iter().map(|k| (*k, K::List)).collect();
    let map_pairs: Vec<(ValueKind, ValueKind)> = [K::Bool, K::Int, K::UInt, K::String]
        .iter()
        .map(|k| (*k, K::Map))
        .collect();

    BinaryOperatorOverload::new(Op::In)
        .overload_all(&list_pairs, in_list)
        .overload_all(&map_pairs, in_map)
}
