//! The standard library extension.
//!
//! Registers the built-in operators (arithmetic, comparison, equality,
//! membership, time arithmetic and the prefix operators) and the core CEL
//! functions. [`Runtime::builder`](crate::Runtime::builder) installs it by
//! default.
pub mod functions;
pub mod operators;
pub mod time;

use crate::error::EvaluationError;
use crate::extension::{BinaryOperatorOverload, Extension, Function, UnaryOperatorOverload};
use crate::span::Span;
use crate::value::{Value, ValueKind};

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardLibrary;

impl Extension for StandardLibrary {
    fn name(&self) -> &str {
        "std"
    }

    fn functions(&self) -> Vec<Function> {
        functions::all()
    }

    fn binary_operator_overloads(&self) -> Vec<BinaryOperatorOverload> {
        operators::binary()
    }

    fn unary_operator_overloads(&self) -> Vec<UnaryOperatorOverload> {
        operators::unary()
    }
}

/// The error a handler reports when dispatch hands it operands it was not
/// registered for.
pub(crate) fn operand_mismatch(name: &str, args: &[Value], span: Span) -> EvaluationError {
    let kinds: Vec<&str> = args.iter().map(|a| a.kind()).map(ValueKind::name).collect();
    EvaluationError::internal(
        format!("`{}` handler received ({})", name, kinds.join(", ")),
        span,
    )
}
