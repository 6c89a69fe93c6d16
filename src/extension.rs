//! The extension boundary.
//!
//! Everything the evaluator can call - operators, functions, message
//! constructors and host-value resolvers - arrives through an [`Extension`].
//! The [`RuntimeBuilder`](crate::RuntimeBuilder) flattens all registered
//! extensions into read-only dispatch tables once, at build time.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::ast::{BinaryOperatorKind, UnaryOperatorKind};
use crate::error::EvaluationError;
use crate::message::MessageType;
use crate::span::Span;
use crate::value::{Value, ValueKind};

/// Implementation of one overload. Receives the span of the call site and the
/// already-evaluated arguments (receiver first for method-style calls).
pub type Handler = Arc<dyn Fn(Span, &[Value]) -> Result<Value, EvaluationError> + Send + Sync>;

pub fn handler<F>(f: F) -> Handler
where
    F: Fn(Span, &[Value]) -> Result<Value, EvaluationError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// One exact argument-kind signature of a function.
#[derive(Clone)]
pub struct Overload {
    pub arguments: Vec<ValueKind>,
    pub handler: Handler,
}

impl fmt::Debug for Overload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overload")
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

/// A named function with all its overloads.
///
/// Functions are idempotent unless declared otherwise; a function whose result
/// can change between calls with the same arguments (a clock, a random source)
/// must call [`Function::non_idempotent`] so results involving it are never
/// memoized.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub idempotent: bool,
    pub overloads: Vec<Overload>,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Function {
            name: name.into(),
            idempotent: true,
            overloads: Vec::new(),
        }
    }

    pub fn non_idempotent(mut self) -> Self {
        self.idempotent = false;
        self
    }

    pub fn overload<F>(mut self, arguments: impl Into<Vec<ValueKind>>, f: F) -> Self
    where
        F: Fn(Span, &[Value]) -> Result<Value, EvaluationError> + Send + Sync + 'static,
    {
        self.overloads.push(Overload {
            arguments: arguments.into(),
            handler: handler(f),
        });
        self
    }
}

/// Overloads of one binary operator keyed by `(left, right)` operand kinds.
#[derive(Clone)]
pub struct BinaryOperatorOverload {
    pub operator: BinaryOperatorKind,
    pub overloads: Vec<(ValueKind, ValueKind, Handler)>,
}

impl BinaryOperatorOverload {
    pub fn new(operator: BinaryOperatorKind) -> Self {
        BinaryOperatorOverload {
            operator,
            overloads: Vec::new(),
        }
    }

    pub fn overload<F>(mut self, left: ValueKind, right: ValueKind, f: F) -> Self
    where
        F: Fn(Span, &[Value]) -> Result<Value, EvaluationError> + Send + Sync + 'static,
    {
        self.overloads.push((left, right, handler(f)));
        self
    }

    /// Registers one shared handler for several operand pairs.
    pub fn overload_all(mut self, pairs: &[(ValueKind, ValueKind)], h: Handler) -> Self {
        for (left, right) in pairs {
            self.overloads.push((*left, *right, h.clone()));
        }
        self
    }
}

impl fmt::Debug for BinaryOperatorOverload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<(ValueKind, ValueKind)> =
            self.overloads.iter().map(|(l, r, _)| (*l, *r)).collect();
        f.debug_struct("BinaryOperatorOverload")
            .field("operator", &self.operator)
            .field("overloads", &pairs)
            .finish()
    }
}

/// Overloads of one prefix operator keyed by operand kind.
#[derive(Clone)]
pub struct UnaryOperatorOverload {
    pub operator: UnaryOperatorKind,
    pub overloads: Vec<(ValueKind, Handler)>,
}

impl UnaryOperatorOverload {
    pub fn new(operator: UnaryOperatorKind) -> Self {
        UnaryOperatorOverload {
            operator,
            overloads: Vec::new(),
        }
    }

    pub fn overload<F>(mut self, operand: ValueKind, f: F) -> Self
    where
        F: Fn(Span, &[Value]) -> Result<Value, EvaluationError> + Send + Sync + 'static,
    {
        self.overloads.push((operand, handler(f)));
        self
    }
}

impl fmt::Debug for UnaryOperatorOverload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds: Vec<ValueKind> = self.overloads.iter().map(|(k, _)| *k).collect();
        f.debug_struct("UnaryOperatorOverload")
            .field("operator", &self.operator)
            .field("overloads", &kinds)
            .finish()
    }
}

/// Converts a host value into a [`Value`].
///
/// Resolvers receive the host value type-erased and return `None` for types
/// they do not handle, letting the next resolver in the chain try.
pub trait ValueResolver: Send + Sync {
    fn resolve(&self, raw: &dyn Any) -> Option<Value>;
}

/// A bundle of functions, operators, message types and resolvers.
///
/// Every method defaults to contributing nothing.
pub trait Extension {
    /// Used in logs and configuration errors.
    fn name(&self) -> &str;

    fn functions(&self) -> Vec<Function> {
        Vec::new()
    }

    fn binary_operator_overloads(&self) -> Vec<BinaryOperatorOverload> {
        Vec::new()
    }

    fn unary_operator_overloads(&self) -> Vec<UnaryOperatorOverload> {
        Vec::new()
    }

    fn message_types(&self) -> Vec<MessageType> {
        Vec::new()
    }

    fn value_resolvers(&self) -> Vec<Arc<dyn ValueResolver>> {
        Vec::new()
    }
}
