//! CLI support for cel-lang
//!
//! The `cel` binary is a thin shell over these functions, so other tools can
//! embed the same evaluate/inspect behavior without spawning a process.

mod eval;
mod inspect;

pub use eval::{EvalOptions, EvalOutput, execute_eval, optimizer_for};
pub use inspect::{render_ast, render_tokens};

use std::io;

use thiserror::Error;

use crate::error::{ConfigurationError, EnvironmentError, EvaluationError, ParseError};

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("runtime configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("cannot bind variable: {0}")]
    Environment(#[from] EnvironmentError),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("variables must be a JSON object, found {0}")]
    VariablesNotAnObject(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
