//! Evaluate a CEL expression against JSON variables

use tracing::debug;

use super::CliError;
use crate::optimizer::{ConstantFolding, Optimizer};
use crate::output::{to_json, to_json_pretty};
use crate::{Parser, Runtime, Value};

/// Options for the eval command
#[derive(Debug, Clone, Default)]
pub struct EvalOptions {
    /// The CEL expression to evaluate
    pub expression: String,
    /// A JSON object whose members become variables
    pub variables: Option<String>,
    /// Run the default optimizer passes before evaluating
    pub optimize: bool,
    /// Also fold constant sub-expressions
    pub fold: bool,
    /// Pretty-print the output
    pub pretty: bool,
}

/// Result of an eval operation
#[derive(Debug, Clone)]
pub struct EvalOutput {
    pub value: Value,
    pub idempotent: bool,
    /// The value rendered as JSON
    pub rendered: String,
}

/// The optimizer the `--optimize`/`--fold` flags ask for, if any.
pub fn optimizer_for(optimize: bool, fold: bool) -> Option<Optimizer> {
    match (optimize, fold) {
        (_, true) => Some(Optimizer::new().with_pass(ConstantFolding::new())),
        (true, false) => Some(Optimizer::new()),
        (false, false) => None,
    }
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Execute a cel eval operation
pub fn execute_eval(options: &EvalOptions) -> Result<EvalOutput, CliError> {
    let runtime = Runtime::builder().build()?;
    let mut env = runtime.environment();

    if let Some(variables) = &options.variables {
        let json: serde_json::Value = serde_json::from_str(variables)?;
        let serde_json::Value::Object(members) = json else {
            return Err(CliError::VariablesNotAnObject(json_kind(&json)));
        };
        for (name, value) in &members {
            env.add_raw(name.as_str(), value)?;
        }
    }

    let mut expr = Parser::new().parse(&options.expression)?;
    if let Some(optimizer) = optimizer_for(options.optimize, options.fold) {
        expr = optimizer.optimize(expr);
        debug!(optimized = %expr, "expression optimized");
    }

    let receipt = runtime.run(&expr, &env)?;
    let rendered = if options.pretty {
        to_json_pretty(&receipt.value)
    } else {
        to_json(&receipt.value)
    };

    Ok(EvalOutput {
        value: receipt.value,
        idempotent: receipt.idempotent,
        rendered,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(expression: &str, variables: Option<&str>) -> EvalOptions {
        EvalOptions {
            expression: expression.to_string(),
            variables: variables.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_eval_with_variables() {
        let output = execute_eval(&options(
            "account.balance >= 100 ? 'ok' : 'low'",
            Some(r#"{"account": {"balance": 250}}"#),
        ))
        .unwrap();
        assert_eq!(output.rendered, r#""ok""#);
        assert!(output.idempotent);
    }

    #[test]
    fn test_eval_folds_before_running() {
        let mut opts = options("[1 + 2, 'a' + 'b']", None);
        opts.fold = true;
        let output = execute_eval(&opts).unwrap();
        assert_eq!(output.rendered, r#"[3,"ab"]"#);
    }

    #[test]
    fn test_variables_must_be_an_object() {
        let err = execute_eval(&options("1", Some("[1, 2]"))).unwrap_err();
        assert!(matches!(err, CliError::VariablesNotAnObject("an array")));
    }

    #[test]
    fn test_errors_are_reported_by_stage() {
        assert!(matches!(
            execute_eval(&options("1 +", None)),
            Err(CliError::Parse(_))
        ));
        assert!(matches!(
            execute_eval(&options("x / 0", Some(r#"{"x": 5}"#))),
            Err(CliError::Evaluation(_))
        ));
    }
}
