//! Node factory for building replacement subtrees
//!
//! Produces green nodes shaped exactly like the parser's output, so a
//! rewritten tree can be walked with the same typed wrappers as a parsed one.

use rowan::{GreenNode, GreenToken, NodeOrToken};

use super::CsSyntaxKind;

type GreenElement = NodeOrToken<GreenNode, GreenToken>;

fn token(kind: CsSyntaxKind, text: &str) -> GreenElement {
    NodeOrToken::Token(GreenToken::new(kind.into(), text))
}

fn node(kind: CsSyntaxKind, children: Vec<GreenElement>) -> GreenNode {
    GreenNode::new(kind.into(), children)
}

/// Quote and escape `value` as a regular C# string literal
pub fn escape_string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\0' => out.push_str("\\0"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0B}' => out.push_str("\\v"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// `LiteralExpression` holding a regular string literal with value `value`
pub fn string_literal(value: &str) -> GreenNode {
    node(
        CsSyntaxKind::LiteralExpression,
        vec![token(CsSyntaxKind::StringLit, &escape_string_literal(value))],
    )
}

/// `IdentifierName`, prefixed with `@` when `name` is a keyword
pub fn identifier_name(name: &str) -> GreenNode {
    let text = if CsSyntaxKind::from_keyword(name).is_some() {
        format!("@{name}")
    } else {
        name.to_string()
    };
    node(
        CsSyntaxKind::IdentifierName,
        vec![token(CsSyntaxKind::Ident, &text)],
    )
}

/// Positional `Argument` wrapping `expression`
pub fn argument(expression: GreenNode) -> GreenNode {
    node(CsSyntaxKind::Argument, vec![NodeOrToken::Node(expression)])
}

fn argument_list(arguments: Vec<GreenNode>) -> GreenNode {
    let mut children = vec![token(CsSyntaxKind::LParen, "(")];
    for (i, arg) in arguments.into_iter().enumerate() {
        if i > 0 {
            children.push(token(CsSyntaxKind::Comma, ","));
            children.push(token(CsSyntaxKind::Whitespace, " "));
        }
        children.push(NodeOrToken::Node(arg));
    }
    children.push(token(CsSyntaxKind::RParen, ")"));
    node(CsSyntaxKind::ArgumentList, children)
}

/// `nameof(name)`
pub fn nameof_expression(name: &str) -> GreenNode {
    node(
        CsSyntaxKind::NameofExpression,
        vec![
            token(CsSyntaxKind::Ident, "nameof"),
            NodeOrToken::Node(argument_list(vec![argument(identifier_name(name))])),
        ],
    )
}

/// `string.Format("template", nameof(name))`
pub fn string_format_invocation(template: &str, name: &str) -> GreenNode {
    let callee = node(
        CsSyntaxKind::MemberAccessExpression,
        vec![
            NodeOrToken::Node(node(
                CsSyntaxKind::PredefinedTypeExpression,
                vec![token(CsSyntaxKind::PredefinedTypeKw, "string")],
            )),
            token(CsSyntaxKind::Dot, "."),
            NodeOrToken::Node(identifier_name("Format")),
        ],
    );
    node(
        CsSyntaxKind::InvocationExpression,
        vec![
            NodeOrToken::Node(callee),
            NodeOrToken::Node(argument_list(vec![
                argument(string_literal(template)),
                argument(nameof_expression(name)),
            ])),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::{CsSyntaxNode, parse_csharp};
    use crate::semantic::unescape_string_literal;

    fn text(green: GreenNode) -> String {
        CsSyntaxNode::new_root(green).text().to_string()
    }

    #[test]
    fn test_escape_round_trips_through_unescape() {
        for value in ["plain", "tab\there", "quote \" and \\ slash", "line\r\nbreak", "nul\0"] {
            let literal = escape_string_literal(value);
            assert_eq!(unescape_string_literal(&literal).as_deref(), Some(value));
        }
    }

    #[test]
    fn test_nameof_text_and_keyword_escaping() {
        assert_eq!(text(nameof_expression("paramName")), "nameof(paramName)");
        assert_eq!(text(nameof_expression("class")), "nameof(@class)");
    }

    #[test]
    fn test_string_format_text() {
        assert_eq!(
            text(string_format_invocation("{0} cannot be null!", "p")),
            "string.Format(\"{0} cannot be null!\", nameof(p))"
        );
    }

    #[test]
    fn test_factory_output_matches_parser_shape() {
        let built = CsSyntaxNode::new_root(string_format_invocation("{0}", "p"));
        let parsed = parse_csharp("x = string.Format(\"{0}\", nameof(p));");
        let invocation = parsed
            .syntax()
            .descendants()
            .find(|n| n.kind() == CsSyntaxKind::InvocationExpression)
            .unwrap();

        let shape = |n: &CsSyntaxNode| -> Vec<CsSyntaxKind> {
            n.descendants().map(|d| d.kind()).collect()
        };
        assert_eq!(shape(&built), shape(&invocation));
    }
}
