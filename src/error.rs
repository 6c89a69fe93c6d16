//! Error types for every stage of the pipeline.
//!
//! The lexer never fails, so there is no lex error. Parse errors abort with no
//! partial tree, evaluation errors abort the running evaluation, and
//! configuration errors are raised while a [`Runtime`](crate::Runtime) is being
//! built, never during evaluation.

use thiserror::Error;

use crate::ast::TokenKind;
use crate::span::Span;
use crate::value::ValueKind;

/// Any error produced while taking source text all the way to a value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("environment error: {0}")]
    Environment(#[from] EnvironmentError),
}

/// Out-of-range absolute read on an [`Input`](crate::input::Input).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("offset {offset} is out of bounds for input of length {len}")]
    OutOfBounds { offset: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unexpected {found} `{text}` at {span}{}", expected_suffix(.expected))]
    UnexpectedToken {
        found: TokenKind,
        text: String,
        span: Span,
        expected: Vec<TokenKind>,
    },

    #[error("unexpected end of input at {position}{}", expected_suffix(.expected))]
    UnexpectedEndOfFile {
        position: usize,
        expected: Vec<TokenKind>,
    },

    #[error("invalid literal at {span}: {reason}")]
    InvalidLiteral { span: Span, reason: String },

    #[error("expression nesting exceeds the limit of {limit} at {span}")]
    NestingTooDeep { span: Span, limit: usize },
}

impl ParseError {
    /// Where in the source the error was detected.
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::InvalidLiteral { span, .. }
            | ParseError::NestingTooDeep { span, .. } => *span,
            ParseError::UnexpectedEndOfFile { position, .. } => Span::empty(*position),
        }
    }
}

fn expected_suffix(expected: &[TokenKind]) -> String {
    match expected {
        [] => String::new(),
        [only] => format!(", expected {}", only),
        _ => {
            let names: Vec<String> = expected.iter().map(|k| k.to_string()).collect();
            format!(", expected one of {}", names.join(", "))
        }
    }
}

/// A bug in operator/function registration or dispatch.
///
/// Handlers assume the operand kinds they were registered for. When that
/// assumption is violated the handler reports an `InternalError`; it is never
/// caused by user input and callers should treat it as fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    pub message: String,
}

impl InternalError {
    pub fn new(message: impl Into<String>) -> Self {
        InternalError {
            message: message.into(),
        }
    }
}

/// Errors raised while evaluating an expression. Every variant carries the
/// span of the expression that failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("no such variable `{name}` at {span}")]
    NoSuchVariable { name: String, span: Span },

    #[error("no such function `{name}` at {span}")]
    NoSuchFunction { name: String, span: Span },

    #[error("no overload of `{name}` for ({}) at {span}; valid signatures: {}", kinds_list(.arguments), .signatures.join(", "))]
    NoSuchOverload {
        name: String,
        arguments: Vec<ValueKind>,
        signatures: Vec<String>,
        span: Span,
    },

    #[error("no such key {key} at {span}")]
    NoSuchKey { key: String, span: Span },

    #[error("no such message type `{type_name}` at {span}")]
    NoSuchType { type_name: String, span: Span },

    #[error("division by zero at {span}")]
    DivisionByZero { span: Span },

    #[error("cannot convert {from} to {to} at {span}: {reason}")]
    TypeConversion {
        from: ValueKind,
        to: ValueKind,
        reason: String,
        span: Span,
    },

    #[error("unsupported operation at {span}: {reason}")]
    UnsupportedOperation { reason: String, span: Span },

    #[error("condition must be bool, found {found} at {span}")]
    InvalidConditionType { found: ValueKind, span: Span },

    #[error("cannot construct message `{type_name}` at {span}: {reason}")]
    MessageConstruction {
        type_name: String,
        reason: String,
        span: Span,
    },

    #[error("arithmetic overflow in `{operator}` at {span}")]
    Overflow { operator: String, span: Span },

    #[error("index {index} out of bounds for list of length {len} at {span}")]
    IndexOutOfBounds { index: i128, len: usize, span: Span },

    #[error("expression nesting exceeds the limit of {limit} at {span}")]
    ExpressionTooDeep { limit: usize, span: Span },

    #[error("{error} at {span}")]
    Internal { error: InternalError, span: Span },
}

impl EvaluationError {
    pub fn span(&self) -> Span {
        match self {
            EvaluationError::NoSuchVariable { span, .. }
            | EvaluationError::NoSuchFunction { span, .. }
            | EvaluationError::NoSuchOverload { span, .. }
            | EvaluationError::NoSuchKey { span, .. }
            | EvaluationError::NoSuchType { span, .. }
            | EvaluationError::DivisionByZero { span }
            | EvaluationError::TypeConversion { span, .. }
            | EvaluationError::UnsupportedOperation { span, .. }
            | EvaluationError::InvalidConditionType { span, .. }
            | EvaluationError::MessageConstruction { span, .. }
            | EvaluationError::Overflow { span, .. }
            | EvaluationError::IndexOutOfBounds { span, .. }
            | EvaluationError::ExpressionTooDeep { span, .. }
            | EvaluationError::Internal { span, .. } => *span,
        }
    }

    /// True for dispatch bugs that user input can never trigger.
    pub fn is_internal(&self) -> bool {
        matches!(self, EvaluationError::Internal { .. })
    }

    pub fn internal(message: impl Into<String>, span: Span) -> Self {
        EvaluationError::Internal {
            error: InternalError::new(message),
            span,
        }
    }

    pub fn unsupported(reason: impl Into<String>, span: Span) -> Self {
        EvaluationError::UnsupportedOperation {
            reason: reason.into(),
            span,
        }
    }

    pub fn overflow(operator: impl Into<String>, span: Span) -> Self {
        EvaluationError::Overflow {
            operator: operator.into(),
            span,
        }
    }

    pub fn conversion(from: ValueKind, to: ValueKind, reason: impl Into<String>, span: Span) -> Self {
        EvaluationError::TypeConversion {
            from,
            to,
            reason: reason.into(),
            span,
        }
    }
}

fn kinds_list(kinds: &[ValueKind]) -> String {
    let names: Vec<String> = kinds.iter().map(|k| k.to_string()).collect();
    names.join(", ")
}

/// Raised eagerly while a runtime is being built from its extensions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("function signature `{signature}` is registered twice")]
    ConflictingFunctionSignature { signature: String },

    #[error("operator signature `{signature}` is registered twice")]
    ConflictingOperatorSignature { signature: String },

    #[error("misconfigured runtime: {reason}")]
    Misconfiguration { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvironmentError {
    #[error("no value resolver accepts host values of type `{type_name}` (binding `{name}`)")]
    IncompatibleValueType { name: String, type_name: String },
}

/// A problem with one field handed to a host message constructor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("missing required field `{field}`")]
    Missing { field: String },

    #[error("field `{field}` should be {expected}, found {found}")]
    Mistyped {
        field: String,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("field `{field}` is invalid: {reason}")]
    Invalid { field: String, reason: String },
}
