// tests/conformance_tests.rs
//
// Language-level guarantees: the worked scenarios plus the properties that
// hold for every expression.

use cel_lang::ast::{BinaryOperatorKind, Expression, LiteralValue, UnaryOperatorKind};
use cel_lang::optimizer::ConstantFolding;
use cel_lang::{
    BinaryOperatorOverload, Environment, Error, EvaluationError, Extension, MapKey, MessageType,
    MessageValue, Optimizer, Parser, Runtime, Span, Value, ValueKind, tokenize,
};
use chrono::{DateTime, TimeDelta, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;

fn runtime() -> Runtime {
    Runtime::builder().build().unwrap()
}

fn evaluation_error(result: Result<cel_lang::Receipt, Error>) -> EvaluationError {
    match result {
        Err(Error::Evaluation(e)) => e,
        other => panic!("expected an evaluation error, got {:?}", other),
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_precedence_evaluation_and_folding() {
    let expr = Parser::new().parse("1 + 2 * 3").unwrap();

    let Expression::Binary(plus) = &expr else {
        panic!("expected binary, got {}", expr);
    };
    assert_eq!(plus.op.kind, BinaryOperatorKind::Plus);
    assert_eq!(plus.left.as_literal(), Some(&LiteralValue::Int(1)));
    let Expression::Binary(times) = &*plus.right else {
        panic!("expected binary, got {}", plus.right);
    };
    assert_eq!(times.op.kind, BinaryOperatorKind::Multiply);

    let runtime = runtime();
    let receipt = runtime.run(&expr, &runtime.environment()).unwrap();
    assert_eq!(receipt.value, Value::Int(7));

    let folded = Optimizer::new().with_pass(ConstantFolding::new()).optimize(expr);
    assert_eq!(folded.as_literal(), Some(&LiteralValue::Int(7)));
    assert_eq!(folded.node_count(), 1);
}

#[test]
fn test_overdraft_rule() {
    let source = "(account.balance >= transaction.withdrawal) \
                  || (account.overdraftProtection \
                  && account.overdraftLimit >= transaction.withdrawal - account.balance)";

    let runtime = runtime();
    let mut env = runtime.environment();
    env.add_raw(
        "account",
        &json!({"balance": 500, "overdraftProtection": true, "overdraftLimit": 1000}),
    )
    .unwrap();
    env.add_raw("transaction", &json!({"withdrawal": 700})).unwrap();

    let receipt = runtime.evaluate(source, &env).unwrap();
    assert_eq!(receipt.value, Value::Bool(true));
    assert!(receipt.idempotent);

    env.add_raw("transaction", &json!({"withdrawal": 1600})).unwrap();
    assert_eq!(runtime.evaluate(source, &env).unwrap().value, Value::Bool(false));
}

#[test]
fn test_division_by_zero_spans_the_operation() {
    let runtime = runtime();
    let mut env = runtime.environment();
    env.add("x", 5);

    match evaluation_error(runtime.evaluate("x / 0", &env)) {
        EvaluationError::DivisionByZero { span } => assert_eq!(span, Span::new(0, 5)),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_has_versus_direct_selection() {
    let runtime = runtime();
    let mut env = runtime.environment();
    env.add("m", Value::map([]));

    assert_eq!(runtime.evaluate("has(m.missing)", &env).unwrap().value, Value::Bool(false));
    assert!(matches!(
        evaluation_error(runtime.evaluate("m.missing", &env)),
        EvaluationError::NoSuchKey { .. }
    ));
}

// ============================================================================
// Numeric Tower
// ============================================================================

#[test]
fn test_numeric_equality_crosses_kinds() {
    let runtime = runtime();
    let env = runtime.environment();
    for source in ["1 == 1.0", "1 == 1u", "1u == 1.0", "-0.0 == 0", "2 != 2.5"] {
        assert_eq!(
            runtime.evaluate(source, &env).unwrap().value,
            Value::Bool(true),
            "Failed for input: {}",
            source
        );
    }
    assert_eq!(runtime.evaluate("-1 == 18446744073709551615u", &env).unwrap().value, Value::Bool(false));
}

#[test]
fn test_numeric_ordering_does_not_cross_kinds() {
    let runtime = runtime();
    let env = runtime.environment();
    for source in ["1 < 2.0", "1u <= 2", "1.0 > 0u"] {
        assert!(
            matches!(
                evaluation_error(runtime.evaluate(source, &env)),
                EvaluationError::UnsupportedOperation { .. }
            ),
            "Failed for input: {}",
            source
        );
    }
}

#[test]
fn test_arithmetic_does_not_cross_kinds() {
    let runtime = runtime();
    match evaluation_error(runtime.evaluate("1 + 2u", &runtime.environment())) {
        EvaluationError::NoSuchOverload { name, arguments, span, .. } => {
            assert_eq!(name, "+");
            assert_eq!(arguments, vec![ValueKind::Int, ValueKind::UInt]);
            assert_eq!(span, Span::new(0, 6));
        }
        other => panic!("unexpected error: {}", other),
    }
}

// ============================================================================
// Dispatch
// ============================================================================

struct MixedAddition;

impl Extension for MixedAddition {
    fn name(&self) -> &str {
        "mixed-addition"
    }

    fn binary_operator_overloads(&self) -> Vec<BinaryOperatorOverload> {
        vec![BinaryOperatorOverload::new(BinaryOperatorKind::Plus).overload(
            ValueKind::Int,
            ValueKind::Float,
            |_, args| match args {
                [Value::Int(a), Value::Float(b)] => Ok(Value::Float(*a as f64 + b)),
                _ => Err(EvaluationError::internal("int + double", Span::empty(0))),
            },
        )]
    }
}

#[test]
fn test_dispatch_matches_the_exact_kind_pair() {
    let runtime = Runtime::builder().extension(MixedAddition).build().unwrap();
    let env = runtime.environment();

    assert_eq!(runtime.evaluate("1 + 0.5", &env).unwrap().value, Value::Float(1.5));
    assert!(matches!(
        evaluation_error(runtime.evaluate("0.5 + 1", &env)),
        EvaluationError::NoSuchOverload { .. }
    ));
}

struct Points;

impl Extension for Points {
    fn name(&self) -> &str {
        "points"
    }

    fn message_types(&self) -> Vec<MessageType> {
        vec![MessageType::new("geo.Point", |fields| {
            let fields: Vec<(String, Value)> =
                fields.iter().map(|(name, value)| (name.to_string(), value.clone())).collect();
            Ok(MessageValue::new("geo.Point", fields).into())
        })]
    }
}

/// At least one value of every kind, with the edge cases handlers branch on.
fn samples(runtime: &Runtime) -> Vec<Value> {
    let point = runtime
        .evaluate("geo.Point{x: 1, y: 2}", &runtime.environment())
        .unwrap()
        .value;
    vec![
        Value::Null,
        Value::Bool(true),
        Value::Bool(false),
        Value::Int(0),
        Value::Int(-7),
        Value::Int(i64::MAX),
        Value::Int(i64::MIN),
        Value::UInt(0),
        Value::UInt(u64::MAX),
        Value::Float(0.0),
        Value::Float(-2.5),
        Value::Float(f64::NAN),
        Value::Float(f64::INFINITY),
        Value::string(""),
        Value::string("1h30m"),
        Value::string("2023-01-02T03:04:05Z"),
        Value::string("("),
        Value::string("true"),
        Value::bytes(b"\xff\x00"),
        Value::bytes(b"ok"),
        Value::list([]),
        Value::list([Value::Int(1), Value::string("a")]),
        Value::map([]),
        Value::map([(MapKey::from("k"), Value::Int(1)), (MapKey::Int(2), Value::Null)]),
        Value::Timestamp(DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap()),
        Value::Timestamp(DateTime::<Utc>::from_timestamp(253_402_300_799, 0).unwrap()),
        Value::Duration(TimeDelta::zero()),
        Value::Duration(TimeDelta::seconds(-90)),
        Value::Duration(TimeDelta::seconds(315_537_897_599)),
        point,
    ]
}

fn internal_failure(runtime: &Runtime, expr: &Expression, env: &Environment) -> Option<String> {
    match runtime.run(expr, env) {
        Err(e) if e.is_internal() => Some(format!("{}: {}", expr, e)),
        _ => None,
    }
}

#[test]
fn test_samples_cover_every_kind() {
    let runtime = Runtime::builder().extension(Points).build().unwrap();
    let kinds: Vec<ValueKind> = samples(&runtime).iter().map(Value::kind).collect();
    for kind in ValueKind::ALL {
        assert!(kinds.contains(&kind), "no sample of kind {}", kind);
    }
}

#[test]
fn test_operators_never_fail_internally() {
    let runtime = Runtime::builder().extension(Points).build().unwrap();
    let samples = samples(&runtime);
    let parser = Parser::new();
    let mut failures = Vec::new();

    for op in BinaryOperatorKind::ALL {
        let expr = parser.parse(&format!("a {} b", op)).unwrap();
        for left in &samples {
            for right in &samples {
                let mut env = runtime.environment();
                env.add("a", left.clone()).add("b", right.clone());
                failures.extend(internal_failure(&runtime, &expr, &env).map(|f| {
                    format!("{} with a = {}, b = {}", f, left, right)
                }));
            }
        }
    }

    for op in [UnaryOperatorKind::Not, UnaryOperatorKind::Negate] {
        let expr = parser.parse(&format!("{}a", op)).unwrap();
        for operand in &samples {
            let mut env = runtime.environment();
            env.add("a", operand.clone());
            failures.extend(internal_failure(&runtime, &expr, &env).map(|f| {
                format!("{} with a = {}", f, operand)
            }));
        }
    }

    assert_eq!(failures, Vec::<String>::new());
}

#[test]
fn test_functions_never_fail_internally() {
    let runtime = Runtime::builder().extension(Points).build().unwrap();
    let samples = samples(&runtime);
    let parser = Parser::new();
    let mut failures = Vec::new();
    let mut calls = 0;

    for name in runtime.functions().names() {
        for kinds in runtime.functions().overloads(name) {
            let params: Vec<String> = (0..kinds.len()).map(|i| format!("a{}", i)).collect();
            let expr = parser.parse(&format!("{}({})", name, params.join(", "))).unwrap();

            // Every combination of samples whose kinds match this overload.
            let mut combinations: Vec<Vec<&Value>> = vec![Vec::new()];
            for kind in kinds {
                combinations = combinations
                    .into_iter()
                    .flat_map(|prefix| {
                        samples.iter().filter(|v| v.kind() == *kind).map(move |v| {
                            let mut args = prefix.clone();
                            args.push(v);
                            args
                        })
                    })
                    .collect();
            }

            for args in combinations {
                let mut env = runtime.environment();
                for (param, value) in params.iter().zip(&args) {
                    env.add(param.as_str(), (*value).clone());
                }
                calls += 1;
                failures.extend(internal_failure(&runtime, &expr, &env));
            }
        }
    }

    assert!(calls > 50, "only {} calls made", calls);
    assert_eq!(failures, Vec::<String>::new());
}

#[test]
fn test_logical_operators_short_circuit() {
    let runtime = runtime();
    let env = runtime.environment();
    let test_cases = vec![
        ("false && undefined", false),
        ("true || undefined", true),
        ("false && 1 / 0 == 1", false),
        ("true || size(1) > 0", true),
        ("false && 'not bool'", false),
    ];

    for (source, expected) in test_cases {
        assert_eq!(
            runtime.evaluate(source, &env).unwrap().value,
            Value::Bool(expected),
            "Failed for input: {}",
            source
        );
    }
}

#[test]
fn test_conditional_evaluates_one_branch() {
    let runtime = runtime();
    let env = runtime.environment();
    assert_eq!(runtime.evaluate("true ? 1 : 1 / 0", &env).unwrap().value, Value::Int(1));
    assert_eq!(runtime.evaluate("false ? undefined : 'b'", &env).unwrap().value, Value::string("b"));
}

// ============================================================================
// Determinism and Losslessness
// ============================================================================

const CORPUS: &[&str] = &[
    "1 + 2 * 3",
    "a.b.c[0] == 'x' && !flag",
    "xs.map(x, x > 1, x * 2).exists(y, y in [4, 6])",
    "acme.Account{balance: 500, owner: {'name': 'ada'}}",
    "cond ? r'raw\\d' : b\"\\x00\" // trailing comment",
    "-9223372036854775808 - 1u",
    "  ((a))  ",
];

#[test]
fn test_tokens_concatenate_to_source() {
    for source in CORPUS {
        let rebuilt: Vec<u8> = tokenize(source).iter().flat_map(|t| t.value.to_vec()).collect();
        assert_eq!(rebuilt, source.as_bytes(), "Failed for input: {}", source);
    }
}

#[test]
fn test_parsing_is_deterministic() {
    let parser = Parser::new();
    for source in CORPUS {
        let first = parser.parse(source).unwrap();
        let second = parser.parse(source).unwrap();
        assert_eq!(first, second, "Failed for input: {}", source);
        assert_eq!(first.to_string(), second.to_string());
    }
}

#[test]
fn test_evaluation_is_repeatable() {
    let runtime = runtime();
    let mut env = runtime.environment();
    env.add("xs", vec![Value::Int(1), Value::Int(2), Value::Int(3)]);

    let expr = Parser::new().parse(CORPUS[2]).unwrap();
    let first = runtime.run(&expr, &env).unwrap();
    let second = runtime.run(&expr, &env).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.value, Value::Bool(true));
}

#[test]
fn test_runtime_is_shareable_across_threads() {
    let runtime = std::sync::Arc::new(runtime());
    let expr = std::sync::Arc::new(Parser::new().parse("n * n").unwrap());

    let handles: Vec<_> = (0..4i64)
        .map(|n| {
            let runtime = runtime.clone();
            let expr = expr.clone();
            std::thread::spawn(move || {
                let mut env = Environment::new();
                env.add("n", n);
                runtime.run(&expr, &env).map(|r| r.value)
            })
        })
        .collect();

    let results: Vec<Value> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();
    assert_eq!(results, vec![Value::Int(0), Value::Int(1), Value::Int(4), Value::Int(9)]);
}
