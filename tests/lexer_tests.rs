// tests/lexer_tests.rs

use cel_lang::{Span, TokenKind, tokenize};
use pretty_assertions::assert_eq;

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source)
        .into_iter()
        .map(|t| t.kind)
        .filter(|k| !k.is_trivia())
        .collect()
}

fn single(source: &str) -> TokenKind {
    let tokens = tokenize(source);
    assert_eq!(tokens.len(), 1, "expected one token for {:?}", source);
    tokens[0].kind
}

// ============================================================================
// Operators and Delimiters
// ============================================================================

#[test]
fn test_single_char_tokens() {
    let test_cases = vec![
        ("<", TokenKind::Less),
        (">", TokenKind::Greater),
        ("+", TokenKind::Plus),
        ("-", TokenKind::Minus),
        ("*", TokenKind::Star),
        ("/", TokenKind::Slash),
        ("%", TokenKind::Percent),
        ("!", TokenKind::Bang),
        ("?", TokenKind::Question),
        (":", TokenKind::Colon),
        (".", TokenKind::Dot),
        (",", TokenKind::Comma),
        ("(", TokenKind::LParen),
        (")", TokenKind::RParen),
        ("[", TokenKind::LBracket),
        ("]", TokenKind::RBracket),
        ("{", TokenKind::LBrace),
        ("}", TokenKind::RBrace),
    ];

    for (input, expected) in test_cases {
        assert_eq!(single(input), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_two_char_tokens() {
    let test_cases = vec![
        ("&&", TokenKind::And),
        ("||", TokenKind::Or),
        ("==", TokenKind::Equal),
        ("!=", TokenKind::NotEqual),
        ("<=", TokenKind::LessEqual),
        (">=", TokenKind::GreaterEqual),
    ];

    for (input, expected) in test_cases {
        assert_eq!(single(input), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_lone_ampersand_and_pipe_are_unrecognized() {
    assert_eq!(kinds("a & b"), vec![TokenKind::Identifier, TokenKind::Unrecognized, TokenKind::Identifier]);
    assert_eq!(kinds("|"), vec![TokenKind::Unrecognized]);
    assert_eq!(kinds("#"), vec![TokenKind::Unrecognized]);
}

// ============================================================================
// Numbers
// ============================================================================

#[test]
fn test_integer_forms() {
    for input in ["0", "42", "-7", "0x1F", "0XfF", "0o17", "0b101", "-0x10"] {
        assert_eq!(single(input), TokenKind::Int, "Failed for input: {}", input);
    }
}

#[test]
fn test_unsigned_suffix() {
    for input in ["0u", "42U", "0xFFu", "0b1U"] {
        assert_eq!(single(input), TokenKind::UInt, "Failed for input: {}", input);
    }
}

#[test]
fn test_float_forms() {
    for input in ["3.14", "1e10", "-2.5E-3", "6.02e+23", "0.0"] {
        assert_eq!(single(input), TokenKind::Float, "Failed for input: {}", input);
    }
}

#[test]
fn test_dot_without_digit_is_member_access() {
    assert_eq!(kinds("1.size"), vec![TokenKind::Int, TokenKind::Dot, TokenKind::Identifier]);
    assert_eq!(kinds("1e"), vec![TokenKind::Int, TokenKind::Identifier]);
}

#[test]
fn test_sign_depends_on_previous_token() {
    assert_eq!(kinds("a-1"), vec![TokenKind::Identifier, TokenKind::Minus, TokenKind::Int]);
    assert_eq!(kinds(")-1"), vec![TokenKind::RParen, TokenKind::Minus, TokenKind::Int]);
    assert_eq!(kinds("(-1"), vec![TokenKind::LParen, TokenKind::Int]);
    assert_eq!(kinds("2 * -1"), vec![TokenKind::Int, TokenKind::Star, TokenKind::Int]);
    assert_eq!(kinds("- 1"), vec![TokenKind::Minus, TokenKind::Int]);
}

// ============================================================================
// Strings and Bytes
// ============================================================================

#[test]
fn test_string_forms() {
    for input in [
        r#""double""#,
        "'single'",
        r#""""triple "quoted" text""""#,
        "'''multi\nline'''",
        r#"r"raw \d""#,
        r#"R'raw'"#,
        r#""esc \" aped""#,
    ] {
        assert_eq!(single(input), TokenKind::String, "Failed for input: {}", input);
    }
}

#[test]
fn test_bytes_forms() {
    for input in [r#"b"abc""#, "B'abc'", r#"rb"\x""#, r#"br'\x'"#] {
        assert_eq!(single(input), TokenKind::Bytes, "Failed for input: {}", input);
    }
}

#[test]
fn test_prefix_letter_without_quote_is_identifier() {
    assert_eq!(kinds("r + b"), vec![TokenKind::Identifier, TokenKind::Plus, TokenKind::Identifier]);
    assert_eq!(kinds("rb"), vec![TokenKind::Identifier]);
}

#[test]
fn test_raw_string_does_not_escape_quote() {
    let tokens = tokenize(r#"r"a\" + 1"#);
    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].value, br#"r"a\""#);
}

// ============================================================================
// Words
// ============================================================================

#[test]
fn test_reserved_words() {
    for input in ["as", "break", "const", "else", "for", "if", "let", "return", "var", "while"] {
        assert_eq!(single(input), TokenKind::Reserved, "Failed for input: {}", input);
    }
}

#[test]
fn test_identifiers() {
    for input in ["x", "_private", "camelCase", "snake_case_2", "nullable", "trueish"] {
        assert_eq!(single(input), TokenKind::Identifier, "Failed for input: {}", input);
    }
}

// ============================================================================
// Spans and Losslessness
// ============================================================================

#[test]
fn test_token_spans() {
    let tokens = tokenize("ab <= 10");
    let spans: Vec<Span> = tokens.iter().map(|t| t.span).collect();
    assert_eq!(
        spans,
        vec![
            Span::new(0, 2),
            Span::new(2, 3),
            Span::new(3, 5),
            Span::new(5, 6),
            Span::new(6, 8),
        ]
    );
}

#[test]
fn test_comment_runs_through_newline() {
    let tokens = tokenize("a // note\nb");
    let summary: Vec<(TokenKind, &[u8])> = tokens.iter().map(|t| (t.kind, t.value)).collect();
    assert_eq!(
        summary,
        vec![
            (TokenKind::Identifier, &b"a"[..]),
            (TokenKind::Whitespace, &b" "[..]),
            (TokenKind::Comment, &b"// note\n"[..]),
            (TokenKind::Identifier, &b"b"[..]),
        ]
    );
}

#[test]
fn test_tokens_reassemble_source() {
    let sources = [
        "",
        "account.balance >= 100 ? 'ok' : 'low' // trailing",
        "[1, -2u, 3.5e-2, b'\\xff', r\"\\d+\"].exists(x, x > 0)",
        "   \t\n  ",
        "'unterminated",
        "#$ @ ~`",
        "acme.Account{balance: 500,}",
        "\"\"\"a\n\"b\"\n\"\"\" + 'é'",
    ];

    for source in sources {
        let tokens = tokenize(source);
        let rebuilt: Vec<u8> = tokens.iter().flat_map(|t| t.value.iter().copied()).collect();
        assert_eq!(rebuilt, source.as_bytes(), "Failed for input: {:?}", source);

        let mut offset = 0;
        for token in &tokens {
            assert_eq!(token.span.start, offset);
            assert!(token.span.end > token.span.start);
            offset = token.span.end;
        }
        assert_eq!(offset, source.len());
    }
}

#[test]
fn test_invalid_utf8_is_lossless() {
    let source: &[u8] = b"'a\xffb' + \xfe";
    let tokens = tokenize(source);
    let rebuilt: Vec<u8> = tokens.iter().flat_map(|t| t.value.iter().copied()).collect();
    assert_eq!(rebuilt, source);
    assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Unrecognized));
}
