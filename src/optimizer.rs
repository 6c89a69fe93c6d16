//! AST rewriting to a per-node fixpoint.
//!
//! An [`Optimizer`] owns an ordered list of [`Pass`]es. Traversal is bottom
//! up: children are optimized first, then each pass is tried in order
//! against the rebuilt node. The first pass that produces a different node
//! wins, and the replacement is optimized again from scratch. A node is done
//! when no pass changes it.
//!
//! Every pass must preserve the result of any expression that evaluates
//! without error, and must shrink the tree so the rewrite loop terminates.
//!
//! # Examples
//!
//! ```
//! use cel_lang::{Optimizer, Parser};
//! use cel_lang::optimizer::ConstantFolding;
//!
//! let expr = Parser::new().parse("(1 + 2 * 3) > x").unwrap();
//! let optimized = Optimizer::new().with_pass(ConstantFolding::new()).optimize(expr);
//! assert_eq!(optimized.to_string(), "(7 > x)");
//! ```
mod passes;

use std::fmt;

use tracing::debug;

use crate::DEFAULT_MAX_DEPTH;
use crate::ast::Expression;

pub use passes::{
    ConditionalSimplification, ConstantFolding, DoubleNegation, IdentityElimination, ShortCircuit,
    UnwrapParentheses,
};

/// A single rewrite rule.
pub trait Pass: Send + Sync {
    /// Used in logs.
    fn name(&self) -> &'static str;

    /// Returns a replacement for `expr`, or `None` to leave it alone. The
    /// children of `expr` have already been optimized.
    fn apply(&self, expr: &Expression) -> Option<Expression>;
}

pub struct Optimizer {
    passes: Vec<Box<dyn Pass>>,
    max_depth: usize,
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Optimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Optimizer")
            .field("passes", &self.pass_names())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl Optimizer {
    /// The always-safe defaults: short-circuit simplification and
    /// parenthesis unwrapping.
    pub fn new() -> Self {
        Optimizer::empty()
            .with_pass(ShortCircuit)
            .with_pass(UnwrapParentheses)
    }

    /// No passes at all; `optimize` returns its input.
    pub fn empty() -> Self {
        Optimizer {
            passes: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// The defaults plus every optional pass.
    pub fn all() -> Self {
        Optimizer::new()
            .with_pass(ConstantFolding::new())
            .with_pass(IdentityElimination)
            .with_pass(DoubleNegation)
            .with_pass(ConditionalSimplification)
    }

    pub fn with_pass(mut self, pass: impl Pass + 'static) -> Self {
        self.add_pass(pass);
        self
    }

    pub fn add_pass(&mut self, pass: impl Pass + 'static) -> &mut Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Subtrees nested deeper than this are returned unchanged.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Rewrites `expr` until a whole traversal changes nothing.
    ///
    /// Nodes at or below `max_depth` are skipped on each traversal. A rewrite
    /// that lifts such a node above the limit makes it reachable, so the
    /// traversal repeats and the result is stable under a second `optimize`.
    pub fn optimize(&self, mut expr: Expression) -> Expression {
        if self.passes.is_empty() {
            return expr;
        }
        loop {
            let next = self.optimize_node(expr.clone(), 0);
            if next == expr {
                return next;
            }
            expr = next;
        }
    }

    fn optimize_node(&self, mut expr: Expression, depth: usize) -> Expression {
        if depth >= self.max_depth {
            return expr;
        }

        loop {
            expr = expr.map_children(&mut |child| self.optimize_node(child, depth + 1));
            match self.rewrite_once(&expr) {
                Some(replacement) => expr = replacement,
                None => return expr,
            }
        }
    }

    /// The first pass that actually changes `expr`.
    fn rewrite_once(&self, expr: &Expression) -> Option<Expression> {
        self.passes.iter().find_map(|pass| {
            let replacement = pass.apply(expr).filter(|r| r != expr)?;
            debug!(
                pass = pass.name(),
                span = %expr.span(),
                before = %expr,
                after = %replacement,
                "optimizer pass applied"
            );
            Some(replacement)
        })
    }
}
