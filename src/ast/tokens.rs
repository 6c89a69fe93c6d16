use std::fmt;

use crate::span::Span;

/// Lexical category of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Trivia, filtered out before parsing
    /// A run of ASCII whitespace
    Whitespace,
    /// `// ...` through the end of the line, newline included
    Comment,

    // Literals
    /// `42`, `-7`, `0x1F`, `0o17`, `0b101`
    Int,
    /// `42u`, `0xFFU`
    UInt,
    /// `3.14`, `1e10`, `-2.5E-3`
    Float,
    /// `"text"`, `'text'`, `"""text"""`, `r"raw"`
    String,
    /// `b"bytes"`, `rb'raw bytes'`
    Bytes,

    // Words
    /// `[A-Za-z_][A-Za-z0-9_]*` that is not a keyword
    Identifier,
    True,
    False,
    Null,
    In,
    /// Words CEL reserves for future use, e.g. `if`, `let`, `return`
    Reserved,

    // Two-character operators
    And,
    Or,
    Equal,
    NotEqual,
    LessEqual,
    GreaterEqual,

    // One-character operators
    Less,
    Greater,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Question,
    Colon,

    // Delimiters
    Dot,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    /// Any single byte the lexer cannot classify
    Unrecognized,
}

impl TokenKind {
    /// Whitespace and comments never reach the parser.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Whitespace | TokenKind::Comment)
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::Int
                | TokenKind::UInt
                | TokenKind::Float
                | TokenKind::String
                | TokenKind::Bytes
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
        )
    }

    /// Tokens after which a `-` is a binary operator rather than a sign.
    pub fn ends_operand(self) -> bool {
        self.is_literal()
            || matches!(
                self,
                TokenKind::Identifier | TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace
            )
    }

    /// Fixed source text for punctuation and keyword kinds.
    pub fn symbol(self) -> Option<&'static str> {
        let symbol = match self {
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::In => "in",
            TokenKind::And => "&&",
            TokenKind::Or => "||",
            TokenKind::Equal => "==",
            TokenKind::NotEqual => "!=",
            TokenKind::LessEqual => "<=",
            TokenKind::GreaterEqual => ">=",
            TokenKind::Less => "<",
            TokenKind::Greater => ">",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Bang => "!",
            TokenKind::Question => "?",
            TokenKind::Colon => ":",
            TokenKind::Dot => ".",
            TokenKind::Comma => ",",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            _ => return None,
        };
        Some(symbol)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(symbol) = self.symbol() {
            return write!(f, "`{}`", symbol);
        }
        let name = match self {
            TokenKind::Whitespace => "whitespace",
            TokenKind::Comment => "comment",
            TokenKind::Int => "int literal",
            TokenKind::UInt => "uint literal",
            TokenKind::Float => "float literal",
            TokenKind::String => "string literal",
            TokenKind::Bytes => "bytes literal",
            TokenKind::Identifier => "identifier",
            TokenKind::Reserved => "reserved word",
            _ => "unrecognized character",
        };
        f.write_str(name)
    }
}

/// One lexeme. `value` borrows the exact source bytes, so concatenating the
/// values of every token reproduces the input byte for byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub span: Span,
    pub kind: TokenKind,
    pub value: &'a [u8],
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, span: Span, value: &'a [u8]) -> Self {
        Token { span, kind, value }
    }

    /// The token text, with invalid UTF-8 replaced for display purposes.
    pub fn text(&self) -> std::borrow::Cow<'a, str> {
        String::from_utf8_lossy(self.value)
    }
}

/// Keyword table consulted after an identifier-shaped run is scanned.
pub fn keyword(word: &[u8]) -> Option<TokenKind> {
    let kind = match word {
        b"true" => TokenKind::True,
        b"false" => TokenKind::False,
        b"null" => TokenKind::Null,
        b"in" => TokenKind::In,
        b"as" | b"break" | b"const" | b"continue" | b"else" | b"for" | b"function" | b"if"
        | b"import" | b"let" | b"loop" | b"package" | b"namespace" | b"return" | b"var"
        | b"void" | b"while" => TokenKind::Reserved,
        _ => return None,
    };
    Some(kind)
}
