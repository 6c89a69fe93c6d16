//! The evaluation runtime.
//!
//! A [`Runtime`] is assembled once from a set of [`Extension`]s and is
//! read-only afterwards, so a single instance can serve any number of
//! evaluations, from any number of threads. Each evaluation gets its own
//! [`Environment`].
//!
//! # Examples
//!
//! ```
//! use cel_lang::{Parser, Runtime, Value};
//!
//! let runtime = Runtime::builder().build().unwrap();
//! let expr = Parser::new().parse("size(name) > 3").unwrap();
//!
//! let mut env = runtime.environment();
//! env.add("name", "Ada Lovelace");
//!
//! let receipt = runtime.run(&expr, &env).unwrap();
//! assert_eq!(receipt.value, Value::Bool(true));
//! assert!(receipt.idempotent);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::DEFAULT_MAX_DEPTH;
use crate::ast::Expression;
use crate::environment::Environment;
use crate::error::{ConfigurationError, Error, EvaluationError};
use crate::evaluator::Evaluator;
use crate::extension::{Extension, ValueResolver};
use crate::message::MessageType;
use crate::parser::Parser;
use crate::registry::{FunctionRegistry, OperatorRegistry};
use crate::stdlib::StandardLibrary;
use crate::value::Value;

/// The outcome of a successful evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub value: Value,
    /// False when any function invoked along the way was declared
    /// non-idempotent. Such results must not be memoized.
    pub idempotent: bool,
}

/// Flattened extension tables plus evaluation limits.
pub struct Runtime {
    functions: FunctionRegistry,
    operators: OperatorRegistry,
    message_types: HashMap<String, MessageType>,
    resolvers: Vec<Arc<dyn ValueResolver>>,
    max_depth: usize,
}

impl Runtime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// A fresh environment whose resolver chain holds every extension
    /// resolver.
    pub fn environment(&self) -> Environment {
        Environment::with_resolvers(self.resolvers.clone())
    }

    /// Evaluates `expression` against `environment`.
    pub fn run(&self, expression: &Expression, environment: &Environment) -> Result<Receipt, EvaluationError> {
        let mut evaluator = Evaluator::new(self);
        let value = evaluator.evaluate(expression, environment)?;

        Ok(Receipt {
            value,
            idempotent: evaluator.is_idempotent(),
        })
    }

    /// Parses `source` with a default [`Parser`] and evaluates it.
    pub fn evaluate(&self, source: &str, environment: &Environment) -> Result<Receipt, Error> {
        let expression = Parser::new().parse(source)?;
        Ok(self.run(&expression, environment)?)
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn operators(&self) -> &OperatorRegistry {
        &self.operators
    }

    pub fn message_type(&self, type_name: &str) -> Option<&MessageType> {
        self.message_types.get(type_name)
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("functions", &self.functions.len())
            .field("binary_operators", &self.operators.binary_len())
            .field("unary_operators", &self.operators.unary_len())
            .field("message_types", &self.message_types.len())
            .field("resolvers", &self.resolvers.len())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

/// Collects extensions and flattens them into a [`Runtime`].
///
/// The standard library is included unless
/// [`without_standard_library`](RuntimeBuilder::without_standard_library) is
/// called. Registration fails fast: the first conflicting signature aborts
/// [`build`](RuntimeBuilder::build).
pub struct RuntimeBuilder {
    extensions: Vec<Box<dyn Extension>>,
    standard_library: bool,
    max_depth: usize,
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        RuntimeBuilder {
            extensions: Vec::new(),
            standard_library: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn extension(mut self, extension: impl Extension + 'static) -> Self {
        self.extensions.push(Box::new(extension));
        self
    }

    pub fn without_standard_library(mut self) -> Self {
        self.standard_library = false;
        self
    }

    /// Maximum nesting depth the evaluator will descend before failing with
    /// [`EvaluationError::ExpressionTooDeep`].
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn build(self) -> Result<Runtime, ConfigurationError> {
        let mut functions = FunctionRegistry::new();
        let mut operators = OperatorRegistry::new();
        let mut message_types: HashMap<String, MessageType> = HashMap::new();
        let mut resolvers: Vec<Arc<dyn ValueResolver>> = Vec::new();

        let mut extensions: Vec<Box<dyn Extension>> = Vec::with_capacity(self.extensions.len() + 1);
        if self.standard_library {
            extensions.push(Box::new(StandardLibrary));
        }
        extensions.extend(self.extensions);

        for extension in &extensions {
            let extension_functions = extension.functions();
            let binary = extension.binary_operator_overloads();
            let unary = extension.unary_operator_overloads();
            let types = extension.message_types();
            let extension_resolvers = extension.value_resolvers();

            debug!(
                extension = extension.name(),
                functions = extension_functions.len(),
                binary_operators = binary.len(),
                unary_operators = unary.len(),
                message_types = types.len(),
                resolvers = extension_resolvers.len(),
                "registering extension"
            );

            for function in extension_functions {
                functions.register(function)?;
            }
            for overloads in binary {
                operators.register_binary(overloads)?;
            }
            for overloads in unary {
                operators.register_unary(overloads)?;
            }
            for message_type in types {
                let path = message_type.type_path().to_string();
                if message_types.contains_key(&path) {
                    return Err(ConfigurationError::Misconfiguration {
                        reason: format!(
                            "message type `{}` is registered twice (second time by extension `{}`)",
                            path,
                            extension.name()
                        ),
                    });
                }
                message_types.insert(path, message_type);
            }
            resolvers.extend(extension_resolvers);
        }

        debug!(
            extensions = extensions.len(),
            functions = functions.len(),
            binary_overloads = operators.binary_len(),
            unary_overloads = operators.unary_len(),
            message_types = message_types.len(),
            max_depth = self.max_depth,
            "runtime built"
        );

        Ok(Runtime {
            functions,
            operators,
            message_types,
            resolvers,
            max_depth: self.max_depth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::Function;
    use crate::value::ValueKind;

    struct Clock;

    impl Extension for Clock {
        fn name(&self) -> &str {
            "clock"
        }

        fn functions(&self) -> Vec<Function> {
            vec![
                Function::new("now")
                    .non_idempotent()
                    .overload(Vec::<ValueKind>::new(), |_, _| Ok(Value::Int(1_700_000_000))),
            ]
        }
    }

    struct Sizer;

    impl Extension for Sizer {
        fn name(&self) -> &str {
            "sizer"
        }

        fn functions(&self) -> Vec<Function> {
            vec![Function::new("size").overload(vec![ValueKind::String], |_, _| Ok(Value::Int(0)))]
        }
    }

    #[test]
    fn test_runtime_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Runtime>();
    }

    #[test]
    fn test_standard_library_is_installed_by_default() {
        let runtime = Runtime::builder().build().unwrap();
        assert!(runtime.functions().contains("size"));
        assert!(runtime.operators().binary_len() > 0);

        let bare = Runtime::builder().without_standard_library().build().unwrap();
        assert!(bare.functions().is_empty());
        assert_eq!(bare.operators().binary_len(), 0);
    }

    #[test]
    fn test_receipt_tracks_idempotence() {
        let runtime = Runtime::builder().extension(Clock).build().unwrap();
        let env = runtime.environment();

        let pure = runtime.evaluate("1 + 1", &env).unwrap();
        assert!(pure.idempotent);

        let impure = runtime.evaluate("now() > 0", &env).unwrap();
        assert_eq!(impure.value, Value::Bool(true));
        assert!(!impure.idempotent);
    }

    #[test]
    fn test_conflicting_extension_fails_build() {
        let err = Runtime::builder().extension(Sizer).build().unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::ConflictingFunctionSignature {
                signature: "size(string)".into()
            }
        );
    }

    #[test]
    fn test_duplicate_message_type_is_misconfiguration() {
        struct Types;
        impl Extension for Types {
            fn name(&self) -> &str {
                "types"
            }
            fn message_types(&self) -> Vec<MessageType> {
                vec![MessageType::new("acme.Point", |_| Ok(Value::Null))]
            }
        }

        let err = Runtime::builder().extension(Types).extension(Types).build().unwrap_err();
        assert!(matches!(err, ConfigurationError::Misconfiguration { .. }));
    }
}
