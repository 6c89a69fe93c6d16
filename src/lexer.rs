//! Lossless tokenizer.
//!
//! The lexer never fails: bytes it cannot classify come out as one-byte
//! [`TokenKind::Unrecognized`] tokens and the parser reports them. Whitespace
//! and comments are emitted as tokens too, so joining every token's `value`
//! reproduces the source exactly.

use crate::ast::tokens::keyword;
use crate::ast::{Token, TokenKind};
use crate::input::Input;
use crate::span::Span;

pub struct Lexer<'a> {
    input: Input<'a>,
    /// Kind of the last non-trivia token, used to decide whether a `-` is a
    /// sign or an operator.
    last_significant: Option<TokenKind>,
}

impl<'a> Lexer<'a> {
    pub fn new<S: AsRef<[u8]> + ?Sized>(source: &'a S) -> Self {
        Lexer {
            input: Input::new(source.as_ref()),
            last_significant: None,
        }
    }

    /// Returns the next token, or `None` once the input is exhausted.
    pub fn advance(&mut self) -> Option<Token<'a>> {
        if self.input.is_at_end() {
            return None;
        }

        let start = self.input.position();
        let kind = self.scan();
        let end = self.input.position();

        if !kind.is_trivia() {
            self.last_significant = Some(kind);
        }

        Some(Token::new(kind, Span::new(start, end), self.input.slice(start, end)))
    }

    fn scan(&mut self) -> TokenKind {
        let Some(current) = self.input.peek() else {
            return TokenKind::Unrecognized;
        };

        if current.is_ascii_whitespace() {
            self.input.consume_whitespace();
            return TokenKind::Whitespace;
        }

        if self.input.starts_with(b"//") {
            self.input.consume_through(b"\n");
            return TokenKind::Comment;
        }

        if let Some(kind) = self.scan_number() {
            return kind;
        }

        if let Some(kind) = self.scan_string() {
            return kind;
        }

        if current.is_ascii_alphabetic() || current == b'_' {
            let start = self.input.position();
            self.input
                .consume_while(|b| b.is_ascii_alphanumeric() || b == b'_');
            let word = self.input.slice(start, self.input.position());
            return keyword(word).unwrap_or(TokenKind::Identifier);
        }

        if let Some(kind) = self.scan_two_char_operator() {
            return kind;
        }

        self.input.consume();
        match current {
            b'<' => TokenKind::Less,
            b'>' => TokenKind::Greater,
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Star,
            b'/' => TokenKind::Slash,
            b'%' => TokenKind::Percent,
            b'!' => TokenKind::Bang,
            b'?' => TokenKind::Question,
            b':' => TokenKind::Colon,
            b'.' => TokenKind::Dot,
            b',' => TokenKind::Comma,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            _ => TokenKind::Unrecognized,
        }
    }

    fn scan_two_char_operator(&mut self) -> Option<TokenKind> {
        let kind = match self.input.peek_n(2) {
            b"&&" => TokenKind::And,
            b"||" => TokenKind::Or,
            b"==" => TokenKind::Equal,
            b"!=" => TokenKind::NotEqual,
            b"<=" => TokenKind::LessEqual,
            b">=" => TokenKind::GreaterEqual,
            _ => return None,
        };
        self.input.consume_n(2);
        Some(kind)
    }

    fn scan_number(&mut self) -> Option<TokenKind> {
        let negative = self.input.peek() == Some(b'-');
        let first_digit = usize::from(negative);

        if !self
            .input
            .peek_at(first_digit)
            .is_some_and(|b| b.is_ascii_digit())
        {
            return None;
        }

        // After an operand, `-` is subtraction: `x-1` is `x`, `-`, `1`
        if negative && self.last_significant.is_some_and(TokenKind::ends_operand) {
            return None;
        }

        self.input.consume_n(first_digit);

        if self.input.peek() == Some(b'0') {
            let radix = match self.input.peek_at(1) {
                Some(b'x' | b'X') => Some(16),
                Some(b'o' | b'O') => Some(8),
                Some(b'b' | b'B') => Some(2),
                _ => None,
            };

            if let Some(radix) = radix
                && self
                    .input
                    .peek_at(2)
                    .is_some_and(|b| (b as char).is_digit(radix))
            {
                self.input.consume_n(2);
                self.input.consume_while(|b| (b as char).is_digit(radix));
                return Some(self.scan_unsigned_suffix());
            }
        }

        self.input.consume_while(|b| b.is_ascii_digit());

        let mut is_float = false;

        if self.input.peek() == Some(b'.')
            && self.input.peek_at(1).is_some_and(|b| b.is_ascii_digit())
        {
            self.input.consume();
            self.input.consume_while(|b| b.is_ascii_digit());
            is_float = true;
        }

        if matches!(self.input.peek(), Some(b'e' | b'E')) {
            let sign = usize::from(matches!(self.input.peek_at(1), Some(b'+' | b'-')));
            if self
                .input
                .peek_at(1 + sign)
                .is_some_and(|b| b.is_ascii_digit())
            {
                self.input.consume_n(1 + sign);
                self.input.consume_while(|b| b.is_ascii_digit());
                is_float = true;
            }
        }

        if is_float {
            Some(TokenKind::Float)
        } else {
            Some(self.scan_unsigned_suffix())
        }
    }

    fn scan_unsigned_suffix(&mut self) -> TokenKind {
        if matches!(self.input.peek(), Some(b'u' | b'U')) {
            self.input.consume();
            TokenKind::UInt
        } else {
            TokenKind::Int
        }
    }

    /// Length of an `r`/`b`/`rb`/`br` prefix directly followed by a quote,
    /// plus whether the literal is raw and whether it is bytes.
    fn string_prefix(&self) -> Option<(usize, bool, bool)> {
        let mut raw = false;
        let mut bytes = false;
        let mut len = 0;

        while len < 2 {
            match self.input.peek_at(len) {
                Some(b'r' | b'R') if !raw => raw = true,
                Some(b'b' | b'B') if !bytes => bytes = true,
                _ => break,
            }
            len += 1;
        }

        match self.input.peek_at(len) {
            Some(b'"' | b'\'') => Some((len, raw, bytes)),
            _ => None,
        }
    }

    fn scan_string(&mut self) -> Option<TokenKind> {
        let (prefix_len, raw, bytes) = self.string_prefix()?;
        self.input.consume_n(prefix_len);

        let quote = self.input.peek()?;
        let triple = [quote; 3];
        let terminator: &[u8] = if self.input.starts_with(&triple) {
            &triple
        } else {
            &triple[..1]
        };
        self.input.consume_n(terminator.len());

        // Iterative scan: safe for arbitrarily long literals
        while !self.input.is_at_end() {
            if !raw && self.input.peek() == Some(b'\\') {
                self.input.consume_n(2);
                continue;
            }
            if self.input.starts_with(terminator) {
                self.input.consume_n(terminator.len());
                break;
            }
            self.input.consume();
        }

        Some(if bytes {
            TokenKind::Bytes
        } else {
            TokenKind::String
        })
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        self.advance()
    }
}

/// Tokenizes the whole source, trivia included.
pub fn tokenize<S: AsRef<[u8]> + ?Sized>(source: &S) -> Vec<Token<'_>> {
    Lexer::new(source).collect()
}

#[cfg(test)]
fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source)
        .into_iter()
        .map(|t| t.kind)
        .filter(|k| !k.is_trivia())
        .collect()
}

#[test]
fn test_keywords() {
    assert_eq!(
        kinds("true false null in if"),
        vec![
            TokenKind::True,
            TokenKind::False,
            TokenKind::Null,
            TokenKind::In,
            TokenKind::Reserved,
        ]
    );
}

#[test]
fn test_keyword_prefix_is_identifier() {
    assert_eq!(kinds("inner truest"), vec![TokenKind::Identifier, TokenKind::Identifier]);
}

#[test]
fn test_minus_after_operand_is_operator() {
    assert_eq!(
        kinds("x-1"),
        vec![TokenKind::Identifier, TokenKind::Minus, TokenKind::Int]
    );
    assert_eq!(kinds("[-1]"), vec![TokenKind::LBracket, TokenKind::Int, TokenKind::RBracket]);
    assert_eq!(kinds("1 - -2"), vec![TokenKind::Int, TokenKind::Minus, TokenKind::Int]);
}

#[test]
fn test_unterminated_string_runs_to_end() {
    let tokens = tokenize("'abc");
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].value, b"'abc");
}
