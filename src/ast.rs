//! # CEL Abstract Syntax Tree
//!
//! This module defines the token vocabulary produced by the lexer and the
//! expression tree produced by the parser.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens and the keyword table
//! - **[operators]** - Binary/unary operators and the precedence table
//! - **[expressions]** - Expression nodes (literals, access, calls, operators)
//!
//! ## Spans
//!
//! Every node exposes exactly one [`Span`](crate::Span). Leaf nodes and nodes
//! delimited by brackets (`[...]`, `{...}`, `(...)`, calls) store the span they
//! were parsed from. Operator nodes derive theirs by joining their first and
//! last child, so a rewritten tree keeps accurate locations without extra
//! bookkeeping.
//!
//! ## Precedence
//!
//! From tightest to loosest:
//!
//! | Level | Operators |
//! |-------|-----------|
//! | Call (1) | `a.b`, `a[b]`, `f(x)` |
//! | Unary (2) | `!a`, `-a` |
//! | Multiplicative (3) | `*` `/` `%` |
//! | Additive (4) | `+` `-` |
//! | Relation (5) | `==` `!=` `<` `<=` `>` `>=` `in` |
//! | And (6) | `&&` |
//! | Or (7) | `\|\|` |
//! | Conditional (8) | `a ? b : c` |
//!
//! ## Example
//!
//! ```text
//! account.balance >= amount ? "ok" : "declined"
//! ```
pub mod expressions;
pub mod operators;
pub mod tokens;

pub use expressions::{
    Binary, Call, Conditional, Expression, Identifier, Index, List, Literal, LiteralValue, Map,
    MapEntry, MemberAccess, Message, MessageField, Parenthesized, Unary,
};
pub use operators::{
    Associativity, BinaryOperator, BinaryOperatorKind, Precedence, UnaryOperator,
    UnaryOperatorKind,
};
pub use tokens::{Token, TokenKind};
