use std::fmt;

use crate::ast::{BinaryOperator, BinaryOperatorKind, UnaryOperator, UnaryOperatorKind};
use crate::span::Span;

/// The value of a literal, already decoded from its source text.
#[derive(Debug, Clone)]
pub enum LiteralValue {
    Bool(bool),
    Bytes(Vec<u8>),
    Float(f64),
    Int(i64),
    UInt(u64),
    Null,
    String(String),
}

impl PartialEq for LiteralValue {
    fn eq(&self, other: &Self) -> bool {
        use LiteralValue::*;
        match (self, other) {
            (Bool(a), Bool(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            // Structural comparison: NaN literals are equal to themselves
            (Float(a), Float(b)) => a.to_bits() == b.to_bits(),
            (Int(a), Int(b)) => a == b,
            (UInt(a), UInt(b)) => a == b,
            (Null, Null) => true,
            (String(a), String(b)) => a == b,
            _ => false,
        }
    }
}

/// Literal value
///
/// # Examples
/// ```text
/// 42   42u   3.14   "text"   b"bytes"   true   null
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub span: Span,
    pub value: LiteralValue,
}

/// A bare name: a variable reference, a function name, a field name or one
/// segment of a message type path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub span: Span,
    pub name: String,
}

impl Identifier {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Identifier {
            span,
            name: name.into(),
        }
    }
}

/// Field selection
///
/// # Example
/// ```text
/// account.balance
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MemberAccess {
    pub operand: Box<Expression>,
    pub field: Identifier,
}

/// Index access
///
/// # Examples
/// ```text
/// items[0]
/// headers["content-type"]
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    pub span: Span,
    pub operand: Box<Expression>,
    pub index: Box<Expression>,
}

/// Function call, either global (`size(x)`) or receiver-style (`x.size()`).
///
/// For receiver-style calls the receiver is `target`; at dispatch time it is
/// passed as the first argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub span: Span,
    pub target: Option<Box<Expression>>,
    pub function: Identifier,
    pub args: Vec<Expression>,
}

/// List literal
///
/// # Example
/// ```text
/// [1, 2, 3]
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    pub span: Span,
    pub elements: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    pub key: Expression,
    pub value: Expression,
}

/// Map literal
///
/// # Example
/// ```text
/// {"a": 1, "b": 2}
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Map {
    pub span: Span,
    pub entries: Vec<MapEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageField {
    pub name: Identifier,
    pub value: Expression,
}

/// Message constructor
///
/// # Example
/// ```text
/// acme.Account{balance: 500, owner: "ada"}
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub span: Span,
    pub type_path: Vec<Identifier>,
    pub fields: Vec<MessageField>,
}

impl Message {
    /// The dotted type name, e.g. `acme.Account`.
    pub fn type_name(&self) -> String {
        let segments: Vec<&str> = self.type_path.iter().map(|s| s.name.as_str()).collect();
        segments.join(".")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Unary {
    pub op: UnaryOperator,
    pub operand: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binary {
    pub left: Box<Expression>,
    pub op: BinaryOperator,
    pub right: Box<Expression>,
}

/// Ternary conditional
///
/// # Example
/// ```text
/// age >= 18 ? "adult" : "minor"
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    pub condition: Box<Expression>,
    pub then: Box<Expression>,
    pub otherwise: Box<Expression>,
}

/// A parenthesized expression. Kept in the tree so spans include the
/// parentheses; the optimizer unwraps it.
#[derive(Debug, Clone, PartialEq)]
pub struct Parenthesized {
    pub span: Span,
    pub inner: Box<Expression>,
}

/// A node of the abstract syntax tree.
///
/// The tree owns its children and is never mutated after parsing; rewrites
/// build new nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Literal),
    Identifier(Identifier),
    MemberAccess(MemberAccess),
    Index(Index),
    Call(Call),
    List(List),
    Map(Map),
    Message(Message),
    Unary(Unary),
    Binary(Binary),
    Conditional(Conditional),
    Parenthesized(Parenthesized),
}

impl Expression {
    pub fn literal(value: LiteralValue, span: Span) -> Self {
        Expression::Literal(Literal { span, value })
    }

    pub fn identifier(name: impl Into<String>, span: Span) -> Self {
        Expression::Identifier(Identifier::new(name, span))
    }

    pub fn unary(kind: UnaryOperatorKind, op_span: Span, operand: Expression) -> Self {
        Expression::Unary(Unary {
            op: UnaryOperator {
                kind,
                span: op_span,
            },
            operand: Box::new(operand),
        })
    }

    pub fn binary(left: Expression, kind: BinaryOperatorKind, op_span: Span, right: Expression) -> Self {
        Expression::Binary(Binary {
            left: Box::new(left),
            op: BinaryOperator {
                kind,
                span: op_span,
            },
            right: Box::new(right),
        })
    }

    pub fn conditional(condition: Expression, then: Expression, otherwise: Expression) -> Self {
        Expression::Conditional(Conditional {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    /// The source range this node covers.
    pub fn span(&self) -> Span {
        match self {
            Expression::Literal(node) => node.span,
            Expression::Identifier(node) => node.span,
            Expression::MemberAccess(node) => node.operand.span().join(node.field.span),
            Expression::Index(node) => node.span,
            Expression::Call(node) => node.span,
            Expression::List(node) => node.span,
            Expression::Map(node) => node.span,
            Expression::Message(node) => node.span,
            Expression::Unary(node) => node.op.span.join(node.operand.span()),
            Expression::Binary(node) => node.left.span().join(node.right.span()),
            Expression::Conditional(node) => node.condition.span().join(node.otherwise.span()),
            Expression::Parenthesized(node) => node.span,
        }
    }

    /// Direct child expressions in source order.
    pub fn children(&self) -> Vec<&Expression> {
        match self {
            Expression::Literal(_) | Expression::Identifier(_) => Vec::new(),
            Expression::MemberAccess(node) => vec![&*node.operand],
            Expression::Index(node) => vec![&*node.operand, &*node.index],
            Expression::Call(node) => node
                .target
                .iter()
                .map(|t| &**t)
                .chain(node.args.iter())
                .collect(),
            Expression::List(node) => node.elements.iter().collect(),
            Expression::Map(node) => node
                .entries
                .iter()
                .flat_map(|e| [&e.key, &e.value])
                .collect(),
            Expression::Message(node) => node.fields.iter().map(|f| &f.value).collect(),
            Expression::Unary(node) => vec![&*node.operand],
            Expression::Binary(node) => vec![&*node.left, &*node.right],
            Expression::Conditional(node) => vec![&*node.condition, &*node.then, &*node.otherwise],
            Expression::Parenthesized(node) => vec![&*node.inner],
        }
    }

    /// Rebuilds this node with every direct child replaced by `f(child)`.
    pub fn map_children(self, f: &mut impl FnMut(Expression) -> Expression) -> Expression {
        let mut apply = |boxed: Box<Expression>| Box::new(f(*boxed));
        match self {
            leaf @ (Expression::Literal(_) | Expression::Identifier(_)) => leaf,
            Expression::MemberAccess(node) => Expression::MemberAccess(MemberAccess {
                operand: apply(node.operand),
                field: node.field,
            }),
            Expression::Index(node) => {
                let operand = apply(node.operand);
                let index = apply(node.index);
                Expression::Index(Index {
                    span: node.span,
                    operand,
                    index,
                })
            }
            Expression::Call(node) => {
                let target = node.target.map(&mut apply);
                let args = node.args.into_iter().map(|a| *apply(Box::new(a))).collect();
                Expression::Call(Call {
                    span: node.span,
                    target,
                    function: node.function,
                    args,
                })
            }
            Expression::List(node) => Expression::List(List {
                span: node.span,
                elements: node
                    .elements
                    .into_iter()
                    .map(|e| *apply(Box::new(e)))
                    .collect(),
            }),
            Expression::Map(node) => Expression::Map(Map {
                span: node.span,
                entries: node
                    .entries
                    .into_iter()
                    .map(|entry| MapEntry {
                        key: *apply(Box::new(entry.key)),
                        value: *apply(Box::new(entry.value)),
                    })
                    .collect(),
            }),
            Expression::Message(node) => Expression::Message(Message {
                span: node.span,
                type_path: node.type_path,
                fields: node
                    .fields
                    .into_iter()
                    .map(|field| MessageField {
                        name: field.name,
                        value: *apply(Box::new(field.value)),
                    })
                    .collect(),
            }),
            Expression::Unary(node) => Expression::Unary(Unary {
                op: node.op,
                operand: apply(node.operand),
            }),
            Expression::Binary(node) => {
                let left = apply(node.left);
                let right = apply(node.right);
                Expression::Binary(Binary {
                    left,
                    op: node.op,
                    right,
                })
            }
            Expression::Conditional(node) => {
                let condition = apply(node.condition);
                let then = apply(node.then);
                let otherwise = apply(node.otherwise);
                Expression::Conditional(Conditional {
                    condition,
                    then,
                    otherwise,
                })
            }
            Expression::Parenthesized(node) => Expression::Parenthesized(Parenthesized {
                span: node.span,
                inner: apply(node.inner),
            }),
        }
    }

    pub fn as_literal(&self) -> Option<&LiteralValue> {
        match self {
            Expression::Literal(literal) => Some(&literal.value),
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Expression::Literal(_))
    }

    pub fn as_bool_literal(&self) -> Option<bool> {
        match self.as_literal() {
            Some(LiteralValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Number of nodes in this subtree.
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(|c| c.node_count()).sum::<usize>()
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Bool(b) => write!(f, "{}", b),
            LiteralValue::Bytes(bytes) => {
                f.write_str("b\"")?;
                for byte in bytes {
                    match byte {
                        b'"' => f.write_str("\\\"")?,
                        b'\\' => f.write_str("\\\\")?,
                        0x20..=0x7e => write!(f, "{}", *byte as char)?,
                        _ => write!(f, "\\x{:02x}", byte)?,
                    }
                }
                f.write_str("\"")
            }
            LiteralValue::Float(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e16 {
                    write!(f, "{:.1}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            LiteralValue::Int(n) => write!(f, "{}", n),
            LiteralValue::UInt(n) => write!(f, "{}u", n),
            LiteralValue::Null => f.write_str("null"),
            LiteralValue::String(s) => write!(f, "{:?}", s),
        }
    }
}

/// Renders the tree back to CEL source with explicit structure.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(node) => write!(f, "{}", node.value),
            Expression::Identifier(node) => f.write_str(&node.name),
            Expression::MemberAccess(node) => write!(f, "{}.{}", node.operand, node.field.name),
            Expression::Index(node) => write!(f, "{}[{}]", node.operand, node.index),
            Expression::Call(node) => {
                if let Some(target) = &node.target {
                    write!(f, "{}.", target)?;
                }
                write!(f, "{}(", node.function.name)?;
                write_separated(f, &node.args)?;
                f.write_str(")")
            }
            Expression::List(node) => {
                f.write_str("[")?;
                write_separated(f, &node.elements)?;
                f.write_str("]")
            }
            Expression::Map(node) => {
                f.write_str("{")?;
                for (i, entry) in node.entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", entry.key, entry.value)?;
                }
                f.write_str("}")
            }
            Expression::Message(node) => {
                write!(f, "{}{{", node.type_name())?;
                for (i, field) in node.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", field.name.name, field.value)?;
                }
                f.write_str("}")
            }
            Expression::Unary(node) => {
                let operand = node.operand.to_string();
                // `-` directly before a digit or another `-` lexes as part of a
                // negative literal.
                let separate = node.op.kind == UnaryOperatorKind::Negate
                    && operand.starts_with(|c: char| c == '-' || c.is_ascii_digit());
                if separate {
                    write!(f, "{} {}", node.op.kind, operand)
                } else {
                    write!(f, "{}{}", node.op.kind, operand)
                }
            }
            Expression::Binary(node) => {
                write!(f, "({} {} {})", node.left, node.op.kind, node.right)
            }
            Expression::Conditional(node) => write!(
                f,
                "({} ? {} : {})",
                node.condition, node.then, node.otherwise
            ),
            Expression::Parenthesized(node) => write!(f, "({})", node.inner),
        }
    }
}

fn write_separated(f: &mut fmt::Formatter<'_>, items: &[Expression]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}
