//! # cel-lang
//!
//! An embeddable implementation of the Common Expression Language: a
//! lossless lexer, a precedence-climbing parser, a pluggable AST optimizer
//! and a tree-walking evaluator whose functions, operators and message
//! types all come from [`Extension`]s.
//!
//! ```
//! use cel_lang::{Optimizer, Parser, Runtime, Value};
//!
//! let runtime = Runtime::builder().build().unwrap();
//! let expr = Optimizer::new().optimize(Parser::new().parse("x > 1 && true").unwrap());
//!
//! let mut env = runtime.environment();
//! env.add("x", 2i64);
//! assert_eq!(runtime.run(&expr, &env).unwrap().value, Value::Bool(true));
//! ```

pub mod ast;
#[cfg(feature = "cli")]
pub mod cli;
pub mod environment;
pub mod error;
mod evaluator;
pub mod extension;
pub mod input;
pub mod lexer;
pub mod message;
pub mod optimizer;
pub mod output;
pub mod parser;
pub mod registry;
pub mod runtime;
pub mod span;
pub mod stdlib;
pub mod value;

/// Nesting limit shared by the parser, the optimizer and the evaluator.
pub const DEFAULT_MAX_DEPTH: usize = 128;

pub use ast::{Expression, Token, TokenKind};
pub use environment::Environment;
pub use error::{
    ConfigurationError, EnvironmentError, Error, EvaluationError, FieldError, InputError,
    InternalError, ParseError,
};
pub use extension::{
    BinaryOperatorOverload, Extension, Function, Handler, UnaryOperatorOverload, ValueResolver,
    handler,
};
pub use lexer::{Lexer, tokenize};
pub use message::{FromCelFields, MessageFields, MessageResolver, MessageType, ToCelValue};
pub use optimizer::{Optimizer, Pass};
pub use output::{to_json, to_json_pretty};
pub use parser::Parser;
pub use registry::{FunctionRegistry, OperatorRegistry};
pub use runtime::{Receipt, Runtime, RuntimeBuilder};
pub use span::Span;
pub use stdlib::StandardLibrary;
pub use value::{MapKey, MessageValue, Value, ValueKind};
