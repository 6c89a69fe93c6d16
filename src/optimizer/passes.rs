use tracing::warn;

use crate::ast::{BinaryOperatorKind, Expression, LiteralValue, UnaryOperatorKind};
use crate::environment::Environment;
use crate::error::ConfigurationError;
use crate::runtime::Runtime;

use super::Pass;

/// `e && true → e`, `e && false → false`, `e || true → true`,
/// `e || false → e`, and the same with the constant on the left.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortCircuit;

impl Pass for ShortCircuit {
    fn name(&self) -> &'static str {
        "short-circuit"
    }

    fn apply(&self, expr: &Expression) -> Option<Expression> {
        let Expression::Binary(node) = expr else {
            return None;
        };
        let absorbing = match node.op.kind {
            BinaryOperatorKind::And => false,
            BinaryOperatorKind::Or => true,
            _ => return None,
        };

        let (constant, other) = match (node.left.as_bool_literal(), node.right.as_bool_literal()) {
            (Some(b), _) => (b, &node.right),
            (None, Some(b)) => (b, &node.left),
            (None, None) => return None,
        };

        if constant == absorbing {
            Some(Expression::literal(LiteralValue::Bool(absorbing), expr.span()))
        } else {
            Some(Expression::clone(other))
        }
    }
}

/// `(e) → e`. Grouping is already encoded in the tree shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnwrapParentheses;

impl Pass for UnwrapParentheses {
    fn name(&self) -> &'static str {
        "unwrap-parentheses"
    }

    fn apply(&self, expr: &Expression) -> Option<Expression> {
        match expr {
            Expression::Parenthesized(node) => Some(Expression::clone(&node.inner)),
            _ => None,
        }
    }
}

/// Evaluates unary and binary nodes whose operands are all literals.
///
/// Folding only happens when the result has a literal spelling; evaluation
/// errors such as division by zero leave the node for the runtime to report.
pub struct ConstantFolding {
    runtime: Option<Runtime>,
}

impl Default for ConstantFolding {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstantFolding {
    /// Folds with the standard library. If the library fails to build the
    /// error is logged and the pass never fires; use [`ConstantFolding::try_new`]
    /// to handle it instead.
    pub fn new() -> Self {
        match Self::try_new() {
            Ok(pass) => pass,
            Err(error) => {
                warn!(%error, "standard library failed to build, constant folding disabled");
                ConstantFolding { runtime: None }
            }
        }
    }

    pub fn try_new() -> Result<Self, ConfigurationError> {
        Ok(ConstantFolding {
            runtime: Some(Runtime::builder().build()?),
        })
    }

    /// Folds with a caller-supplied runtime, e.g. one carrying extra
    /// operator overloads.
    pub fn with_runtime(runtime: Runtime) -> Self {
        ConstantFolding {
            runtime: Some(runtime),
        }
    }
}

impl Pass for ConstantFolding {
    fn name(&self) -> &'static str {
        "constant-folding"
    }

    fn apply(&self, expr: &Expression) -> Option<Expression> {
        let foldable = match expr {
            Expression::Unary(node) => node.operand.is_literal(),
            Expression::Binary(node) => node.left.is_literal() && node.right.is_literal(),
            _ => false,
        };
        if !foldable {
            return None;
        }

        let runtime = self.runtime.as_ref()?;
        let receipt = runtime.run(expr, &Environment::new()).ok()?;
        let literal = receipt.value.to_literal()?;
        Some(Expression::literal(literal, expr.span()))
    }
}

/// Arithmetic and concatenation identities: `e + 0`, `0 + e`, `e - 0`,
/// `e * 1`, `1 * e`, `e / 1`, `e + ""` and `"" + e` become `e`; `e * 0` and
/// `0 * e` become `0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityElimination;

impl Pass for IdentityElimination {
    fn name(&self) -> &'static str {
        "identity-elimination"
    }

    fn apply(&self, expr: &Expression) -> Option<Expression> {
        let Expression::Binary(node) = expr else {
            return None;
        };
        let left = node.left.as_literal();
        let right = node.right.as_literal();
        let zero = Some(&LiteralValue::Int(0));
        let one = Some(&LiteralValue::Int(1));
        let empty = |lit: Option<&LiteralValue>| matches!(lit, Some(LiteralValue::String(s)) if s.is_empty());

        let keep_left = Some(Expression::clone(&node.left));
        let keep_right = Some(Expression::clone(&node.right));

        match node.op.kind {
            BinaryOperatorKind::Plus if right == zero || empty(right) => keep_left,
            BinaryOperatorKind::Plus if left == zero || empty(left) => keep_right,
            BinaryOperatorKind::Minus if right == zero => keep_left,
            BinaryOperatorKind::Multiply if right == one => keep_left,
            BinaryOperatorKind::Multiply if left == one => keep_right,
            BinaryOperatorKind::Multiply if left == zero || right == zero => {
                Some(Expression::literal(LiteralValue::Int(0), expr.span()))
            }
            BinaryOperatorKind::Divide if right == one => keep_left,
            _ => None,
        }
    }
}

/// `!!e → e` and `--e → e`. Both operators must be the same kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleNegation;

impl Pass for DoubleNegation {
    fn name(&self) -> &'static str {
        "double-negation"
    }

    fn apply(&self, expr: &Expression) -> Option<Expression> {
        let Expression::Unary(outer) = expr else {
            return None;
        };
        let Expression::Unary(inner) = &*outer.operand else {
            return None;
        };

        let same = outer.op.kind == inner.op.kind
            && matches!(outer.op.kind, UnaryOperatorKind::Not | UnaryOperatorKind::Negate);
        same.then(|| Expression::clone(&inner.operand))
    }
}

/// `true ? a : b → a` and `false ? a : b → b`. The condition must already be
/// a boolean literal.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionalSimplification;

impl Pass for ConditionalSimplification {
    fn name(&self) -> &'static str {
        "conditional-simplification"
    }

    fn apply(&self, expr: &Expression) -> Option<Expression> {
        let Expression::Conditional(node) = expr else {
            return None;
        };
        match node.condition.as_bool_literal()? {
            true => Some(Expression::clone(&node.then)),
            false => Some(Expression::clone(&node.otherwise)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::value::Value;

    fn apply(pass: &dyn Pass, source: &str) -> Option<String> {
        let expr = Parser::new().parse(source).unwrap();
        pass.apply(&expr).map(|e| e.to_string())
    }

    #[test]
    fn test_short_circuit_forms() {
        assert_eq!(apply(&ShortCircuit, "a && true"), Some("a".into()));
        assert_eq!(apply(&ShortCircuit, "a && false"), Some("false".into()));
        assert_eq!(apply(&ShortCircuit, "true || a"), Some("true".into()));
        assert_eq!(apply(&ShortCircuit, "false || a"), Some("a".into()));
        assert_eq!(apply(&ShortCircuit, "a || b"), None);
    }

    #[test]
    fn test_fallible_constructor_folds_with_the_standard_library() {
        let pass = ConstantFolding::try_new().unwrap();
        assert!(pass.runtime.is_some());
        assert_eq!(apply(&pass, "2 * 21"), Some("42".into()));
        assert!(ConstantFolding::new().runtime.is_some());
    }

    #[test]
    fn test_constant_folding() {
        let folded = ConstantFolding::new()
            .apply(&Parser::new().parse("2 * 3").unwrap())
            .unwrap();
        assert_eq!(folded.as_literal().map(Value::from), Some(Value::Int(6)));

        assert_eq!(apply(&ConstantFolding::new(), "1 / 0"), None);
        assert_eq!(apply(&ConstantFolding::new(), "x + 1"), None);
        assert_eq!(apply(&ConstantFolding::new(), "'a' + 'b'"), Some("\"ab\"".into()));
    }

    #[test]
    fn test_identity_elimination() {
        assert_eq!(apply(&IdentityElimination, "x + 0"), Some("x".into()));
        assert_eq!(apply(&IdentityElimination, "'' + s"), Some("s".into()));
        assert_eq!(apply(&IdentityElimination, "x * 0"), Some("0".into()));
        assert_eq!(apply(&IdentityElimination, "x - 1"), None);
        assert_eq!(apply(&IdentityElimination, "x + 0.0"), None);
    }

    #[test]
    fn test_double_negation_requires_matching_operators() {
        assert_eq!(apply(&DoubleNegation, "!!x"), Some("x".into()));
        assert_eq!(apply(&DoubleNegation, "--x"), Some("x".into()));
        assert_eq!(apply(&DoubleNegation, "-(-x)"), None);
        assert_eq!(apply(&DoubleNegation, "!-x"), None);
    }

    #[test]
    fn test_conditional_simplification() {
        assert_eq!(apply(&ConditionalSimplification, "true ? a : b"), Some("a".into()));
        assert_eq!(apply(&ConditionalSimplification, "false ? a : b"), Some("b".into()));
        assert_eq!(apply(&ConditionalSimplification, "c ? a : b"), None);
    }
}
