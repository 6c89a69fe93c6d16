//! Token and AST listings for the `tokens` and `parse` commands

use std::fmt::Write;

use crate::ast::Expression;
use crate::lexer::Lexer;

/// One line per token: span, kind and the exact source text.
pub fn render_tokens(source: &str) -> String {
    let mut out = String::new();
    for token in Lexer::new(source) {
        let _ = writeln!(
            out,
            "{:<10} {:<24} {:?}",
            token.span.to_string(),
            token.kind.to_string(),
            token.text()
        );
    }
    out
}

fn describe(expr: &Expression) -> String {
    match expr {
        Expression::Literal(node) => format!("Literal {}", node.value),
        Expression::Identifier(node) => format!("Identifier {}", node.name),
        Expression::MemberAccess(node) => format!("MemberAccess .{}", node.field.name),
        Expression::Index(_) => "Index".to_string(),
        Expression::Call(node) if node.target.is_some() => format!("Call .{}()", node.function.name),
        Expression::Call(node) => format!("Call {}()", node.function.name),
        Expression::List(node) => format!("List [{}]", node.elements.len()),
        Expression::Map(node) => format!("Map {{{}}}", node.entries.len()),
        Expression::Message(node) => format!("Message {}", node.type_name()),
        Expression::Unary(node) => format!("Unary {}", node.op.kind),
        Expression::Binary(node) => format!("Binary {}", node.op.kind),
        Expression::Conditional(_) => "Conditional".to_string(),
        Expression::Parenthesized(_) => "Parenthesized".to_string(),
    }
}

fn render_node(expr: &Expression, indent: usize, out: &mut String) {
    let _ = writeln!(out, "{:indent$}{} @ {}", "", describe(expr), expr.span(), indent = indent * 2);
    for child in expr.children() {
        render_node(child, indent + 1, out);
    }
}

/// An indented tree, one node per line, with spans.
pub fn render_ast(expr: &Expression) -> String {
    let mut out = String::new();
    render_node(expr, 0, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parser;

    #[test]
    fn test_render_ast() {
        let expr = Parser::new().parse("a.b + 1").unwrap();
        assert_eq!(
            render_ast(&expr),
            "Binary + @ 0..7\n  MemberAccess .b @ 0..3\n    Identifier a @ 0..1\n  Literal 1 @ 6..7\n"
        );
    }

    #[test]
    fn test_render_tokens_keeps_trivia() {
        let listing = render_tokens("1 // one");
        assert_eq!(listing.lines().count(), 3);
        assert!(listing.contains("comment"));
    }
}
