// tests/parser_tests.rs

use cel_lang::ast::{Expression, LiteralValue};
use cel_lang::{ParseError, Parser, Span, TokenKind};
use pretty_assertions::assert_eq;

fn parse(source: &str) -> Expression {
    Parser::new()
        .parse(source)
        .unwrap_or_else(|e| panic!("failed to parse {:?}: {}", source, e))
}

fn shape(source: &str) -> String {
    parse(source).to_string()
}

fn parse_err(source: &str) -> ParseError {
    match Parser::new().parse(source) {
        Ok(expr) => panic!("expected {:?} to fail, got {}", source, expr),
        Err(e) => e,
    }
}

fn literal(source: &str) -> LiteralValue {
    match parse(source) {
        Expression::Literal(lit) => lit.value,
        other => panic!("expected literal, got {}", other),
    }
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_parse_literals() {
    assert_eq!(literal("42"), LiteralValue::Int(42));
    assert_eq!(literal("-0x10"), LiteralValue::Int(-16));
    assert_eq!(literal("7u"), LiteralValue::UInt(7));
    assert_eq!(literal("2.5e1"), LiteralValue::Float(25.0));
    assert_eq!(literal("'hi\\n'"), LiteralValue::String("hi\n".into()));
    assert_eq!(literal("r'hi\\n'"), LiteralValue::String("hi\\n".into()));
    assert_eq!(literal("b'\\x00\\xff'"), LiteralValue::Bytes(vec![0x00, 0xff]));
    assert_eq!(literal("true"), LiteralValue::Bool(true));
    assert_eq!(literal("null"), LiteralValue::Null);
}

#[test]
fn test_int_bounds() {
    assert_eq!(literal("-9223372036854775808"), LiteralValue::Int(i64::MIN));
    assert_eq!(literal("18446744073709551615u"), LiteralValue::UInt(u64::MAX));
    assert!(matches!(parse_err("9223372036854775808"), ParseError::InvalidLiteral { .. }));
    assert!(matches!(parse_err("18446744073709551616u"), ParseError::InvalidLiteral { .. }));
}

#[test]
fn test_invalid_literals_carry_their_span() {
    let err = parse_err("x + 'unterminated");
    assert!(matches!(err, ParseError::InvalidLiteral { .. }));
    assert_eq!(err.span(), Span::new(4, 17));

    let err = parse_err("'\\q'");
    assert!(matches!(err, ParseError::InvalidLiteral { .. }));

    let err = parse_err("1e999");
    assert!(matches!(err, ParseError::InvalidLiteral { .. }));
}

// ============================================================================
// Precedence and Associativity
// ============================================================================

#[test]
fn test_precedence_table() {
    let test_cases = vec![
        ("1 + 2 * 3", "(1 + (2 * 3))"),
        ("1 * 2 + 3", "((1 * 2) + 3)"),
        ("a + b == c", "((a + b) == c)"),
        ("a < b && c", "((a < b) && c)"),
        ("a && b || c && d", "((a && b) || (c && d))"),
        ("a in b && c", "((a in b) && c)"),
        ("!a == b", "(!a == b)"),
        ("-a.b", "-a.b"),
        ("a || b ? c : d", "((a || b) ? c : d)"),
    ];

    for (input, expected) in test_cases {
        assert_eq!(shape(input), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_binary_operators_are_left_associative() {
    assert_eq!(shape("a - b - c"), "((a - b) - c)");
    assert_eq!(shape("a / b * c"), "((a / b) * c)");
    assert_eq!(shape("a == b == c"), "((a == b) == c)");
    assert_eq!(shape("a || b || c"), "((a || b) || c)");
}

#[test]
fn test_conditional_nests_to_the_right() {
    assert_eq!(shape("a ? b : c ? d : e"), "(a ? b : (c ? d : e))");
    assert_eq!(shape("a ? (b ? c : d) : e"), "(a ? ((b ? c : d)) : e)");
}

#[test]
fn test_parentheses_are_preserved() {
    assert_eq!(shape("(1 + 2) * 3"), "((1 + 2) * 3)");
    assert!(matches!(parse("(a)"), Expression::Parenthesized(_)));
}

#[test]
fn test_unary_chains() {
    assert_eq!(shape("!!a"), "!!a");
    assert_eq!(shape("- -a"), "- -a");
    assert_eq!(shape("-(1)"), "-(1)");
}

#[test]
fn test_negated_numbers_render_back_to_the_same_tree() {
    for source in ["- -1", "- 1", "- -2.5", "- - -7"] {
        let rendered = shape(source);
        assert_eq!(shape(&rendered), rendered, "Failed for input: {}", source);
        assert_eq!(
            parse(&rendered).node_count(),
            parse(source).node_count(),
            "Failed for input: {}",
            source
        );
    }

    let Expression::Unary(node) = parse(&shape("- -1")) else {
        panic!("expected unary");
    };
    assert_eq!(node.operand.as_literal(), Some(&LiteralValue::Int(-1)));
}

// ============================================================================
// Postfix Forms
// ============================================================================

#[test]
fn test_member_access_and_index_chain() {
    assert_eq!(shape("a.b[0].c"), "a.b[0].c");
    assert_eq!(shape("m['k'][1 + 1]"), "m[\"k\"][(1 + 1)]");
}

#[test]
fn test_calls() {
    let expr = parse("size(a, b)");
    let Expression::Call(call) = &expr else {
        panic!("expected call, got {}", expr);
    };
    assert!(call.target.is_none());
    assert_eq!(call.function.name, "size");
    assert_eq!(call.args.len(), 2);
    assert_eq!(call.span, Span::new(0, 10));

    let expr = parse("name.startsWith('a')");
    let Expression::Call(call) = &expr else {
        panic!("expected call, got {}", expr);
    };
    assert_eq!(call.target.as_deref().map(|t| t.to_string()), Some("name".to_string()));
    assert_eq!(call.function.name, "startsWith");

    assert_eq!(shape("f()"), "f()");
    assert_eq!(shape("a.b.c(1)"), "a.b.c(1)");
}

#[test]
fn test_comprehension_calls_parse_as_method_calls() {
    assert_eq!(shape("xs.all(x, x > 0)"), "xs.all(x, (x > 0))");
    assert_eq!(shape("[1, 2].map(n, n * 2)"), "[1, 2].map(n, (n * 2))");
}

#[test]
fn test_call_on_non_identifier_is_trailing_input() {
    let err = parse_err("(f)(1)");
    assert!(matches!(
        err,
        ParseError::UnexpectedToken {
            found: TokenKind::LParen,
            ..
        }
    ));
}

// ============================================================================
// Aggregates
// ============================================================================

#[test]
fn test_list_literals() {
    assert_eq!(shape("[]"), "[]");
    assert_eq!(shape("[1, 'a', [true]]"), "[1, \"a\", [true]]");
    assert_eq!(shape("[1, 2,]"), "[1, 2]");
}

#[test]
fn test_map_literals() {
    assert_eq!(shape("{}"), "{}");
    assert_eq!(shape("{'a': 1, 2: [x],}"), "{\"a\": 1, 2: [x]}");
}

#[test]
fn test_message_literals() {
    let expr = parse("google.protobuf.Duration{seconds: 5, nanos: 0}");
    let Expression::Message(message) = &expr else {
        panic!("expected message, got {}", expr);
    };
    assert_eq!(message.type_name(), "google.protobuf.Duration");
    let names: Vec<&str> = message.fields.iter().map(|f| f.name.name.as_str()).collect();
    assert_eq!(names, vec!["seconds", "nanos"]);

    assert_eq!(shape("Empty{}"), "Empty{}");
}

#[test]
fn test_message_needs_a_plain_type_path() {
    let err = parse_err("a[0]{x: 1}");
    assert!(matches!(
        err,
        ParseError::UnexpectedToken {
            found: TokenKind::LBrace,
            ..
        }
    ));
}

#[test]
fn test_trailing_comma_rejected_in_calls() {
    let err = parse_err("f(1,)");
    assert!(matches!(
        err,
        ParseError::UnexpectedToken {
            found: TokenKind::RParen,
            ..
        }
    ));
}

// ============================================================================
// Spans
// ============================================================================

#[test]
fn test_node_spans() {
    let expr = parse("  a.b + f(c)  ");
    assert_eq!(expr.span(), Span::new(2, 12));

    let Expression::Binary(binary) = &expr else {
        panic!("expected binary, got {}", expr);
    };
    assert_eq!(binary.left.span(), Span::new(2, 5));
    assert_eq!(binary.op.span, Span::new(6, 7));
    assert_eq!(binary.right.span(), Span::new(8, 12));
}

#[test]
fn test_comments_are_ignored() {
    assert_eq!(shape("a // first\n + b // second"), "(a + b)");
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_unexpected_end_of_input() {
    match parse_err("1 +") {
        ParseError::UnexpectedEndOfFile { position, expected } => {
            assert_eq!(position, 3);
            assert!(expected.contains(&TokenKind::Identifier));
            assert!(expected.contains(&TokenKind::LParen));
        }
        other => panic!("unexpected error: {}", other),
    }

    assert!(matches!(parse_err(""), ParseError::UnexpectedEndOfFile { position: 0, .. }));
}

#[test]
fn test_unclosed_list_reports_comma_or_bracket() {
    match parse_err("[1, 2") {
        ParseError::UnexpectedEndOfFile { expected, .. } => {
            assert_eq!(expected, vec![TokenKind::Comma, TokenKind::RBracket]);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_reserved_word_is_not_an_operand() {
    match parse_err("if") {
        ParseError::UnexpectedToken { found, text, span, .. } => {
            assert_eq!(found, TokenKind::Reserved);
            assert_eq!(text, "if");
            assert_eq!(span, Span::new(0, 2));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_unrecognized_byte() {
    assert!(matches!(
        parse_err("a # b"),
        ParseError::UnexpectedToken {
            found: TokenKind::Unrecognized,
            ..
        }
    ));
}

#[test]
fn test_trailing_tokens() {
    match parse_err("a b") {
        ParseError::UnexpectedToken { text, expected, .. } => {
            assert_eq!(text, "b");
            assert!(expected.is_empty());
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_error_messages() {
    assert_eq!(
        parse_err("a ? b").to_string(),
        "unexpected end of input at 5, expected `:`"
    );
}

// ============================================================================
// Nesting Limit
// ============================================================================

#[test]
fn test_nesting_limit() {
    let deep = format!("{}1{}", "(".repeat(200), ")".repeat(200));
    assert!(matches!(
        parse_err(&deep),
        ParseError::NestingTooDeep { limit: 128, .. }
    ));

    let shallow = format!("{}1{}", "(".repeat(20), ")".repeat(20));
    assert!(Parser::new().parse(&shallow).is_ok());
    assert!(Parser::new().with_max_depth(10).parse(&shallow).is_err());
}

#[test]
fn test_long_operator_chain_hits_limit() {
    let chain = vec!["x"; 300].join(" + ");
    assert!(matches!(
        Parser::new().parse(&chain),
        Err(ParseError::NestingTooDeep { .. })
    ));
    let chain = vec!["x"; 50].join(" + ");
    assert!(Parser::new().parse(&chain).is_ok());
}

#[test]
fn test_deep_unary_hits_limit() {
    let deep = format!("{}a", "!".repeat(500));
    assert!(matches!(
        Parser::new().parse(&deep),
        Err(ParseError::NestingTooDeep { .. })
    ));
}
