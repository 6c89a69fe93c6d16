//! Exact-signature dispatch tables.
//!
//! Both registries are append-only while a runtime is being built and
//! read-only afterwards. Lookup matches the runtime kinds of the operands
//! exactly; there is no implicit widening, so `1 + 1u` finds no overload.

use std::collections::HashMap;

use crate::ast::{BinaryOperatorKind, UnaryOperatorKind};
use crate::error::{ConfigurationError, EvaluationError};
use crate::extension::{BinaryOperatorOverload, Function, Handler, UnaryOperatorOverload};
use crate::span::Span;
use crate::value::ValueKind;

fn function_signature(name: &str, arguments: &[ValueKind]) -> String {
    let kinds: Vec<&str> = arguments.iter().map(|k| k.name()).collect();
    format!("{}({})", name, kinds.join(", "))
}

fn binary_signature(op: BinaryOperatorKind, left: ValueKind, right: ValueKind) -> String {
    format!("{} {} {}", left, op, right)
}

fn unary_signature(op: UnaryOperatorKind, operand: ValueKind) -> String {
    format!("{}{}", op, operand)
}

struct FunctionEntry {
    idempotent: bool,
    overloads: HashMap<Vec<ValueKind>, Handler>,
    /// Registration order, for stable error messages.
    signatures: Vec<Vec<ValueKind>>,
}

/// A function overload found by [`FunctionRegistry::lookup`].
pub struct ResolvedFunction<'r> {
    pub handler: &'r Handler,
    pub idempotent: bool,
}

#[derive(Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionEntry>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every overload of `function`.
    ///
    /// Overloads of an already-known name are merged in. A signature that is
    /// already present, or an idempotence flag that disagrees with earlier
    /// registrations of the same name, is rejected.
    pub fn register(&mut self, function: Function) -> Result<(), ConfigurationError> {
        let entry = self
            .functions
            .entry(function.name.clone())
            .or_insert_with(|| FunctionEntry {
                idempotent: function.idempotent,
                overloads: HashMap::new(),
                signatures: Vec::new(),
            });

        if entry.idempotent != function.idempotent {
            return Err(ConfigurationError::Misconfiguration {
                reason: format!(
                    "function `{}` is registered as both idempotent and non-idempotent",
                    function.name
                ),
            });
        }

        for overload in function.overloads {
            if entry.overloads.contains_key(&overload.arguments) {
                return Err(ConfigurationError::ConflictingFunctionSignature {
                    signature: function_signature(&function.name, &overload.arguments),
                });
            }
            entry.signatures.push(overload.arguments.clone());
            entry.overloads.insert(overload.arguments, overload.handler);
        }

        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Registered function names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// The argument kinds of every overload of `name`, in registration order.
    pub fn overloads(&self, name: &str) -> &[Vec<ValueKind>] {
        self.functions
            .get(name)
            .map(|entry| entry.signatures.as_slice())
            .unwrap_or_default()
    }

    /// All registered signatures of `name`, rendered like `size(string)`.
    pub fn signatures(&self, name: &str) -> Vec<String> {
        self.functions
            .get(name)
            .map(|entry| {
                entry
                    .signatures
                    .iter()
                    .map(|args| function_signature(name, args))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn lookup(
        &self,
        name: &str,
        arguments: &[ValueKind],
        span: Span,
    ) -> Result<ResolvedFunction<'_>, EvaluationError> {
        let entry = self
            .functions
            .get(name)
            .ok_or_else(|| EvaluationError::NoSuchFunction {
                name: name.to_string(),
                span,
            })?;

        match entry.overloads.get(arguments) {
            Some(handler) => Ok(ResolvedFunction {
                handler,
                idempotent: entry.idempotent,
            }),
            None => Err(EvaluationError::NoSuchOverload {
                name: name.to_string(),
                arguments: arguments.to_vec(),
                signatures: self.signatures(name),
                span,
            }),
        }
    }
}

#[derive(Default)]
pub struct OperatorRegistry {
    binary: HashMap<(BinaryOperatorKind, ValueKind, ValueKind), Handler>,
    unary: HashMap<(UnaryOperatorKind, ValueKind), Handler>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_binary(&mut self, overloads: BinaryOperatorOverload) -> Result<(), ConfigurationError> {
        let op = overloads.operator;
        if op.is_short_circuit() {
            return Err(ConfigurationError::Misconfiguration {
                reason: format!("`{}` is evaluated with short-circuiting and cannot be overloaded", op),
            });
        }

        for (left, right, handler) in overloads.overloads {
            let key = (op, left, right);
            if self.binary.contains_key(&key) {
                return Err(ConfigurationError::ConflictingOperatorSignature {
                    signature: binary_signature(op, left, right),
                });
            }
            self.binary.insert(key, handler);
        }
        Ok(())
    }

    pub fn register_unary(&mut self, overloads: UnaryOperatorOverload) -> Result<(), ConfigurationError> {
        let op = overloads.operator;
        for (operand, handler) in overloads.overloads {
            let key = (op, operand);
            if self.unary.contains_key(&key) {
                return Err(ConfigurationError::ConflictingOperatorSignature {
                    signature: unary_signature(op, operand),
                });
            }
            self.unary.insert(key, handler);
        }
        Ok(())
    }

    pub fn binary_len(&self) -> usize {
        self.binary.len()
    }

    pub fn unary_len(&self) -> usize {
        self.unary.len()
    }

    pub fn binary_signatures(&self, op: BinaryOperatorKind) -> Vec<String> {
        let mut pairs: Vec<(ValueKind, ValueKind)> = self
            .binary
            .keys()
            .filter(|(o, _, _)| *o == op)
            .map(|(_, l, r)| (*l, *r))
            .collect();
        pairs.sort();
        pairs
            .into_iter()
            .map(|(l, r)| binary_signature(op, l, r))
            .collect()
    }

    pub fn unary_signatures(&self, op: UnaryOperatorKind) -> Vec<String> {
        let mut kinds: Vec<ValueKind> = self
            .unary
            .keys()
            .filter(|(o, _)| *o == op)
            .map(|(_, k)| *k)
            .collect();
        kinds.sort();
        kinds.into_iter().map(|k| unary_signature(op, k)).collect()
    }

    pub fn lookup_binary(
        &self,
        op: BinaryOperatorKind,
        left: ValueKind,
        right: ValueKind,
        span: Span,
    ) -> Result<&Handler, EvaluationError> {
        self.binary
            .get(&(op, left, right))
            .ok_or_else(|| EvaluationError::NoSuchOverload {
                name: op.to_string(),
                arguments: vec![left, right],
                signatures: self.binary_signatures(op),
                span,
            })
    }

    pub fn lookup_unary(
        &self,
        op: UnaryOperatorKind,
        operand: ValueKind,
        span: Span,
    ) -> Result<&Handler, EvaluationError> {
        self.unary
            .get(&(op, operand))
            .ok_or_else(|| EvaluationError::NoSuchOverload {
                name: op.to_string(),
                arguments: vec![operand],
                signatures: self.unary_signatures(op),
                span,
            })
    }
}
