use std::fmt;

use crate::ast::TokenKind;
use crate::span::Span;

/// Binding strength. Lower values bind tighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precedence {
    Call = 1,
    Unary = 2,
    Multiplicative = 3,
    Additive = 4,
    Relation = 5,
    And = 6,
    Or = 7,
    Conditional = 8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
}

impl Precedence {
    pub fn associativity(self) -> Associativity {
        match self {
            Precedence::Unary | Precedence::Conditional => Associativity::Right,
            _ => Associativity::Left,
        }
    }

    /// The next-tighter level, used as the ceiling for the right operand of a
    /// left-associative operator.
    pub fn tighter(self) -> Precedence {
        match self {
            Precedence::Call | Precedence::Unary => Precedence::Call,
            Precedence::Multiplicative => Precedence::Unary,
            Precedence::Additive => Precedence::Multiplicative,
            Precedence::Relation => Precedence::Additive,
            Precedence::And => Precedence::Relation,
            Precedence::Or => Precedence::And,
            Precedence::Conditional => Precedence::Or,
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperatorKind {
    // Arithmetic
    /// Addition or concatenation (`+`)
    Plus,
    /// Subtraction (`-`)
    Minus,
    /// Multiplication (`*`)
    Multiply,
    /// Division (`/`)
    Divide,
    /// Remainder (`%`)
    Modulo,

    // Relations
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// Membership (`in`)
    In,

    // Logical, evaluated with short-circuiting
    /// `&&`
    And,
    /// `||`
    Or,
}

impl BinaryOperatorKind {
    pub const ALL: [BinaryOperatorKind; 14] = [
        BinaryOperatorKind::Plus,
        BinaryOperatorKind::Minus,
        BinaryOperatorKind::Multiply,
        BinaryOperatorKind::Divide,
        BinaryOperatorKind::Modulo,
        BinaryOperatorKind::Equal,
        BinaryOperatorKind::NotEqual,
        BinaryOperatorKind::Less,
        BinaryOperatorKind::LessEqual,
        BinaryOperatorKind::Greater,
        BinaryOperatorKind::GreaterEqual,
        BinaryOperatorKind::In,
        BinaryOperatorKind::And,
        BinaryOperatorKind::Or,
    ];

    pub fn from_token(kind: TokenKind) -> Option<Self> {
        let op = match kind {
            TokenKind::Plus => BinaryOperatorKind::Plus,
            TokenKind::Minus => BinaryOperatorKind::Minus,
            TokenKind::Star => BinaryOperatorKind::Multiply,
            TokenKind::Slash => BinaryOperatorKind::Divide,
            TokenKind::Percent => BinaryOperatorKind::Modulo,
            TokenKind::Equal => BinaryOperatorKind::Equal,
            TokenKind::NotEqual => BinaryOperatorKind::NotEqual,
            TokenKind::Less => BinaryOperatorKind::Less,
            TokenKind::LessEqual => BinaryOperatorKind::LessEqual,
            TokenKind::Greater => BinaryOperatorKind::Greater,
            TokenKind::GreaterEqual => BinaryOperatorKind::GreaterEqual,
            TokenKind::In => BinaryOperatorKind::In,
            TokenKind::And => BinaryOperatorKind::And,
            TokenKind::Or => BinaryOperatorKind::Or,
            _ => return None,
        };
        Some(op)
    }

    pub fn precedence(self) -> Precedence {
        match self {
            BinaryOperatorKind::Multiply | BinaryOperatorKind::Divide | BinaryOperatorKind::Modulo => {
                Precedence::Multiplicative
            }
            BinaryOperatorKind::Plus | BinaryOperatorKind::Minus => Precedence::Additive,
            BinaryOperatorKind::Equal
            | BinaryOperatorKind::NotEqual
            | BinaryOperatorKind::Less
            | BinaryOperatorKind::LessEqual
            | BinaryOperatorKind::Greater
            | BinaryOperatorKind::GreaterEqual
            | BinaryOperatorKind::In => Precedence::Relation,
            BinaryOperatorKind::And => Precedence::And,
            BinaryOperatorKind::Or => Precedence::Or,
        }
    }

    /// `&&` and `||` are handled by the evaluator, never by the dispatch table.
    pub fn is_short_circuit(self) -> bool {
        matches!(self, BinaryOperatorKind::And | BinaryOperatorKind::Or)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperatorKind::Plus => "+",
            BinaryOperatorKind::Minus => "-",
            BinaryOperatorKind::Multiply => "*",
            BinaryOperatorKind::Divide => "/",
            BinaryOperatorKind::Modulo => "%",
            BinaryOperatorKind::Equal => "==",
            BinaryOperatorKind::NotEqual => "!=",
            BinaryOperatorKind::Less => "<",
            BinaryOperatorKind::LessEqual => "<=",
            BinaryOperatorKind::Greater => ">",
            BinaryOperatorKind::GreaterEqual => ">=",
            BinaryOperatorKind::In => "in",
            BinaryOperatorKind::And => "&&",
            BinaryOperatorKind::Or => "||",
        }
    }
}

impl fmt::Display for BinaryOperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperatorKind {
    /// Logical not (`!`)
    Not,
    /// Arithmetic negation (`-`)
    Negate,
}

impl UnaryOperatorKind {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Bang => Some(UnaryOperatorKind::Not),
            TokenKind::Minus => Some(UnaryOperatorKind::Negate),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOperatorKind::Not => "!",
            UnaryOperatorKind::Negate => "-",
        }
    }
}

impl fmt::Display for UnaryOperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A binary operator together with the span of its token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryOperator {
    pub kind: BinaryOperatorKind,
    pub span: Span,
}

/// A prefix operator together with the span of its token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnaryOperator {
    pub kind: UnaryOperatorKind,
    pub span: Span,
}
