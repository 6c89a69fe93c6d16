//! Precedence-climbing parser.
//!
//! The parser consumes the lexer's token stream with whitespace and comments
//! filtered out and produces a single [`Expression`]. It fails on the first
//! error; there is no recovery and no partial tree.
//!
//! # Examples
//!
//! ```
//! use cel_lang::Parser;
//!
//! let expr = Parser::new().parse("1 + 2 * 3").unwrap();
//! assert_eq!(expr.to_string(), "(1 + (2 * 3))");
//!
//! assert!(Parser::new().parse("1 +").is_err());
//! ```
mod literals;

use crate::DEFAULT_MAX_DEPTH;
use crate::ast::{
    BinaryOperatorKind, Call, Expression, Identifier, Index, List, LiteralValue, Map, MapEntry,
    MemberAccess, Message, MessageField, Parenthesized, Precedence, Token, TokenKind,
    UnaryOperatorKind,
};
use crate::error::ParseError;
use crate::lexer::Lexer;
use crate::span::Span;

/// Tokens that can start an operand.
const OPERAND_START: &[TokenKind] = &[
    TokenKind::Int,
    TokenKind::UInt,
    TokenKind::Float,
    TokenKind::String,
    TokenKind::Bytes,
    TokenKind::True,
    TokenKind::False,
    TokenKind::Null,
    TokenKind::Identifier,
    TokenKind::LParen,
    TokenKind::LBracket,
    TokenKind::LBrace,
    TokenKind::Bang,
    TokenKind::Minus,
];

/// Parser configuration. Each call to [`Parser::parse`] runs independently.
#[derive(Debug, Clone, Copy)]
pub struct Parser {
    max_depth: usize,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Parser {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limits how deeply expressions may nest before parsing fails with
    /// [`ParseError::NestingTooDeep`].
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Parses a complete expression. Trailing tokens are an error.
    pub fn parse<S: AsRef<[u8]> + ?Sized>(&self, source: &S) -> Result<Expression, ParseError> {
        let source = source.as_ref();
        let tokens: Vec<Token<'_>> = Lexer::new(source).filter(|t| !t.kind.is_trivia()).collect();

        let mut state = ParseState {
            tokens,
            position: 0,
            end: source.len(),
            depth: 0,
            max_depth: self.max_depth,
        };

        let expr = state.parse_expression()?;
        if state.peek().is_some() {
            return Err(state.unexpected(&[]));
        }
        Ok(expr)
    }
}

struct ParseState<'a> {
    tokens: Vec<Token<'a>>,
    position: usize,
    /// Source length, reported as the position of end-of-input errors.
    end: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> ParseState<'a> {
    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.position)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn bump(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.position).copied();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token<'a>, ParseError> {
        if self.at(kind) {
            self.bump().ok_or_else(|| self.unexpected(&[kind]))
        } else {
            Err(self.unexpected(&[kind]))
        }
    }

    /// Consumes `kind` if it is next.
    fn eat(&mut self, kind: TokenKind) -> Option<Token<'a>> {
        if self.at(kind) { self.bump() } else { None }
    }

    fn unexpected(&self, expected: &[TokenKind]) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::UnexpectedToken {
                found: token.kind,
                text: token.text().into_owned(),
                span: token.span,
                expected: expected.to_vec(),
            },
            None => ParseError::UnexpectedEndOfFile {
                position: self.end,
                expected: expected.to_vec(),
            },
        }
    }

    fn current_span(&self) -> Span {
        self.peek().map(|t| t.span).unwrap_or(Span::empty(self.end))
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        self.check_depth(0)
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Fails when `extra` more levels on top of the current depth would
    /// exceed the limit. Operator and postfix chains are built iteratively
    /// but still deepen the tree.
    fn check_depth(&self, extra: usize) -> Result<(), ParseError> {
        if self.depth + extra > self.max_depth {
            return Err(ParseError::NestingTooDeep {
                span: self.current_span(),
                limit: self.max_depth,
            });
        }
        Ok(())
    }

    // ========================================
    // Expressions
    // ========================================

    fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.enter()?;
        let expr = self.parse_conditional()?;
        self.leave();
        Ok(expr)
    }

    /// `cond ? then : otherwise`, right-associative through the recursive
    /// `otherwise` branch.
    fn parse_conditional(&mut self) -> Result<Expression, ParseError> {
        let condition = self.parse_binary(Precedence::Or)?;
        if self.eat(TokenKind::Question).is_none() {
            return Ok(condition);
        }

        let then = self.parse_binary(Precedence::Or)?;
        self.expect(TokenKind::Colon)?;
        let otherwise = self.parse_expression()?;
        Ok(Expression::conditional(condition, then, otherwise))
    }

    /// Climbs every binary operator that binds at least as tightly as
    /// `ceiling`.
    fn parse_binary(&mut self, ceiling: Precedence) -> Result<Expression, ParseError> {
        let mut left = self.parse_unary()?;
        let mut chain = 0;

        while let Some(op) = self.peek_kind().and_then(BinaryOperatorKind::from_token) {
            let precedence = op.precedence();
            if precedence > ceiling {
                break;
            }

            chain += 1;
            self.check_depth(chain)?;

            let Some(op_token) = self.bump() else { break };
            let right = self.parse_binary(precedence.tighter())?;
            left = Expression::binary(left, op, op_token.span, right);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        let Some(op) = self.peek_kind().and_then(UnaryOperatorKind::from_token) else {
            return self.parse_postfix();
        };

        self.enter()?;
        let op_span = self.bump().map(|t| t.span).unwrap_or(Span::empty(self.end));
        let operand = self.parse_unary()?;
        self.leave();

        Ok(Expression::unary(op, op_span, operand))
    }

    /// Field selection, method calls, indexing, global calls and message
    /// construction applied to a primary expression.
    fn parse_postfix(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_primary()?;
        let mut chain = 0;

        loop {
            match self.peek_kind() {
                Some(TokenKind::Dot) => {
                    self.bump();
                    let field = self.parse_identifier()?;
                    expr = if self.at(TokenKind::LParen) {
                        let (args, close) = self.parse_arguments()?;
                        Expression::Call(Call {
                            span: expr.span().join(close),
                            target: Some(Box::new(expr)),
                            function: field,
                            args,
                        })
                    } else {
                        Expression::MemberAccess(MemberAccess {
                            operand: Box::new(expr),
                            field,
                        })
                    };
                }
                Some(TokenKind::LBracket) => {
                    self.bump();
                    let index = self.parse_expression()?;
                    let close = self.expect(TokenKind::RBracket)?;
                    expr = Expression::Index(Index {
                        span: expr.span().join(close.span),
                        operand: Box::new(expr),
                        index: Box::new(index),
                    });
                }
                Some(TokenKind::LParen) => match expr {
                    Expression::Identifier(function) => {
                        let (args, close) = self.parse_arguments()?;
                        expr = Expression::Call(Call {
                            span: function.span.join(close),
                            target: None,
                            function,
                            args,
                        });
                    }
                    other => {
                        expr = other;
                        break;
                    }
                },
                Some(TokenKind::LBrace) => {
                    let Some(type_path) = type_path(&expr) else {
                        break;
                    };
                    expr = self.parse_message(type_path)?;
                }
                _ => break,
            }

            chain += 1;
            self.check_depth(chain)?;
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        let Some(token) = self.peek().copied() else {
            return Err(self.unexpected(OPERAND_START));
        };

        match token.kind {
            TokenKind::Int
            | TokenKind::UInt
            | TokenKind::Float
            | TokenKind::String
            | TokenKind::Bytes
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null => {
                self.bump();
                let value = decode_literal(&token)?;
                Ok(Expression::literal(value, token.span))
            }
            TokenKind::Identifier => {
                self.bump();
                Ok(Expression::identifier(token.text(), token.span))
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expression()?;
                let close = self.expect(TokenKind::RParen)?;
                Ok(Expression::Parenthesized(Parenthesized {
                    span: token.span.join(close.span),
                    inner: Box::new(inner),
                }))
            }
            TokenKind::LBracket => {
                self.bump();
                let (elements, close) = self.parse_list_items(TokenKind::RBracket, |state| state.parse_expression())?;
                Ok(Expression::List(List {
                    span: token.span.join(close),
                    elements,
                }))
            }
            TokenKind::LBrace => {
                self.bump();
                let (entries, close) = self.parse_list_items(TokenKind::RBrace, |state| {
                    let key = state.parse_expression()?;
                    state.expect(TokenKind::Colon)?;
                    let value = state.parse_expression()?;
                    Ok(MapEntry { key, value })
                })?;
                Ok(Expression::Map(Map {
                    span: token.span.join(close),
                    entries,
                }))
            }
            _ => Err(self.unexpected(OPERAND_START)),
        }
    }

    // ========================================
    // Helpers
    // ========================================

    fn parse_identifier(&mut self) -> Result<Identifier, ParseError> {
        let token = self.expect(TokenKind::Identifier)?;
        Ok(Identifier::new(token.text(), token.span))
    }

    /// `( a, b )` with no trailing comma. Returns the span of the `)`.
    fn parse_arguments(&mut self) -> Result<(Vec<Expression>, Span), ParseError> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();

        if let Some(close) = self.eat(TokenKind::RParen) {
            return Ok((args, close.span));
        }

        loop {
            args.push(self.parse_expression()?);
            if self.eat(TokenKind::Comma).is_some() {
                continue;
            }
            let close = self.expect_closing(TokenKind::RParen)?;
            return Ok((args, close.span));
        }
    }

    /// Comma-separated items up to `close`, allowing a trailing comma. The
    /// opening delimiter has already been consumed.
    fn parse_list_items<T>(
        &mut self,
        close: TokenKind,
        mut item: impl FnMut(&mut Self) -> Result<T, ParseError>,
    ) -> Result<(Vec<T>, Span), ParseError> {
        let mut items = Vec::new();

        loop {
            if let Some(token) = self.eat(close) {
                return Ok((items, token.span));
            }
            items.push(item(self)?);
            if self.eat(TokenKind::Comma).is_none() {
                let token = self.expect_closing(close)?;
                return Ok((items, token.span));
            }
        }
    }

    /// Expects `close` after a list item, reporting that a comma would also
    /// have been accepted.
    fn expect_closing(&mut self, close: TokenKind) -> Result<Token<'a>, ParseError> {
        if self.at(close) {
            self.expect(close)
        } else {
            Err(self.unexpected(&[TokenKind::Comma, close]))
        }
    }

    /// `a.b.Type{field: value, ...}`; the path has already been parsed.
    fn parse_message(&mut self, type_path: Vec<Identifier>) -> Result<Expression, ParseError> {
        let start = type_path
            .first()
            .map(|segment| segment.span)
            .unwrap_or_else(|| self.current_span());
        self.expect(TokenKind::LBrace)?;

        let (fields, close) = self.parse_list_items(TokenKind::RBrace, |state| {
            let name = state.parse_identifier()?;
            state.expect(TokenKind::Colon)?;
            let value = state.parse_expression()?;
            Ok(MessageField { name, value })
        })?;

        Ok(Expression::Message(Message {
            span: start.join(close),
            type_path,
            fields,
        }))
    }
}

/// The dotted identifier path an expression spells, if it is nothing but
/// identifiers and field selections.
fn type_path(expr: &Expression) -> Option<Vec<Identifier>> {
    match expr {
        Expression::Identifier(ident) => Some(vec![ident.clone()]),
        Expression::MemberAccess(access) => {
            let mut path = type_path(&access.operand)?;
            path.push(access.field.clone());
            Some(path)
        }
        _ => None,
    }
}

fn decode_literal(token: &Token<'_>) -> Result<LiteralValue, ParseError> {
    let invalid = |reason: String| ParseError::InvalidLiteral {
        span: token.span,
        reason,
    };
    let text = token.text();

    match token.kind {
        TokenKind::Int => literals::decode_int(&text).map(LiteralValue::Int).map_err(invalid),
        TokenKind::UInt => literals::decode_uint(&text).map(LiteralValue::UInt).map_err(invalid),
        TokenKind::Float => literals::decode_float(&text).map(LiteralValue::Float).map_err(invalid),
        TokenKind::String => literals::decode_string(token.value)
            .map(LiteralValue::String)
            .map_err(invalid),
        TokenKind::Bytes => literals::decode_bytes(token.value)
            .map(LiteralValue::Bytes)
            .map_err(invalid),
        TokenKind::True => Ok(LiteralValue::Bool(true)),
        TokenKind::False => Ok(LiteralValue::Bool(false)),
        TokenKind::Null => Ok(LiteralValue::Null),
        other => Err(invalid(format!("{} is not a literal", other))),
    }
}
