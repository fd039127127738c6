//! Replaces a parameter-name literal with `nameof(..)`
//!
//! The replacement is built bottom-up on the construction's green node and
//! spliced into the root once, so every untouched subtree is shared with the
//! input tree.

use rowan::{GreenNode, NodeOrToken, TextRange, TextSize};

use sharplint_core::Result;
use sharplint_core::cst::ast::{Argument, AstNode, LiteralExpression, ObjectCreationExpression};
use sharplint_core::cst::{CsSyntaxNode, factory};
use sharplint_core::semantic::SemanticQueries;

/// Rewrite the literal at `location` into `nameof(..)`
///
/// When the construction also passes a literal message mentioning the name,
/// the message becomes `string.Format("..{0}..", nameof(..))`. Returns
/// `Ok(None)` whenever the tree no longer has the expected shape at
/// `location`.
pub fn rewrite<Q>(
    queries: &Q,
    root: &CsSyntaxNode,
    location: TextRange,
) -> Result<Option<CsSyntaxNode>>
where
    Q: SemanticQueries + ?Sized,
{
    let Some(literal) = expression_at(root, location.start()) else {
        return Ok(None);
    };
    if literal.text_range() != location
        || LiteralExpression::cast(literal.clone()).is_none_or(|lit| !lit.is_string())
    {
        tracing::debug!("No string literal at {:?}, skipping rewrite", location);
        return Ok(None);
    }

    let Some(creation) = literal.ancestors().find_map(ObjectCreationExpression::cast) else {
        return Ok(None);
    };
    let (Some(list), arguments) = (creation.argument_list(), creation.arguments()) else {
        return Ok(None);
    };
    let Some(name_arg) = arguments.first() else {
        return Ok(None);
    };
    if name_arg.expression().as_ref() != Some(&literal) {
        return Ok(None);
    }

    let name = match queries.constant_string_value(&literal)? {
        Some(value) if is_identifier(&value) => value,
        _ => return Ok(None),
    };

    let Some(new_name_arg) =
        replace_expression(name_arg, &literal, factory::nameof_expression(&name))
    else {
        return Ok(None);
    };
    let mut list_green = list
        .syntax()
        .green()
        .replace_child(name_arg.syntax().index(), NodeOrToken::Node(new_name_arg));

    if let [_, message_arg] = arguments.as_slice()
        && let Some(message_expr) = message_arg.expression()
        && let Some(template) = message_template(queries, &message_expr, &name)?
        && let Some(new_message_arg) = replace_expression(
            message_arg,
            &message_expr,
            factory::string_format_invocation(&template, &name),
        )
    {
        list_green = list_green.replace_child(
            message_arg.syntax().index(),
            NodeOrToken::Node(new_message_arg),
        );
    }

    let creation_green = creation
        .syntax()
        .green()
        .replace_child(list.syntax().index(), NodeOrToken::Node(list_green));
    let new_root = creation.syntax().replace_with(creation_green);
    Ok(Some(CsSyntaxNode::new_root(new_root)))
}

/// Innermost expression node starting exactly at `offset`
fn expression_at(root: &CsSyntaxNode, offset: TextSize) -> Option<CsSyntaxNode> {
    if offset >= root.text_range().end() {
        return None;
    }
    let token = root.token_at_offset(offset).right_biased()?;
    token
        .parent_ancestors()
        .take_while(|node| node.text_range().start() == offset)
        .find(|node| node.kind().is_expression())
}

/// `argument` with `expr` swapped for `replacement`
fn replace_expression(
    argument: &Argument,
    expr: &CsSyntaxNode,
    replacement: GreenNode,
) -> Option<GreenNode> {
    if expr.parent().as_ref() != Some(argument.syntax()) {
        return None;
    }
    Some(
        argument
            .syntax()
            .green()
            .replace_child(expr.index(), NodeOrToken::Node(replacement)),
    )
}

/// Template for `string.Format`, or `None` when the message should stay as is
fn message_template<Q>(
    queries: &Q,
    message_expr: &CsSyntaxNode,
    name: &str,
) -> Result<Option<String>>
where
    Q: SemanticQueries + ?Sized,
{
    if LiteralExpression::cast(message_expr.clone()).is_none_or(|lit| !lit.is_string()) {
        return Ok(None);
    }
    let Some(message) = queries.constant_string_value(message_expr)? else {
        return Ok(None);
    };
    Ok(format_template(&message, name))
}

/// Replace every space-separated word equal to `name` with `{0}`
///
/// Returns `None` if the message has a quote or brace, or no word matches.
pub fn format_template(message: &str, name: &str) -> Option<String> {
    if !message.contains(name) || message.contains(['"', '{', '}']) {
        return None;
    }
    let mut replaced = false;
    let template = message
        .split(' ')
        .map(|word| {
            if word == name {
                replaced = true;
                "{0}"
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    replaced.then_some(template)
}

fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    chars
        .next()
        .is_some_and(|first| first == '_' || first.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharplint_core::SemanticModel;
    use sharplint_core::cst::CsSyntaxKind;

    fn first_string_literal(root: &CsSyntaxNode) -> TextRange {
        root.descendants()
            .find(|n| {
                LiteralExpression::cast(n.clone()).is_some_and(|lit| lit.is_string())
            })
            .map(|n| n.text_range())
            .unwrap()
    }

    fn rewritten(source: &str) -> Option<String> {
        let model = SemanticModel::new(source, "Test.cs");
        let root = model.syntax();
        let range = first_string_literal(&root);
        rewrite(&model, &root, range)
            .unwrap()
            .map(|node| node.text().to_string())
    }

    #[test]
    fn test_single_argument_becomes_nameof() {
        assert_eq!(
            rewritten(r#"throw new ArgumentNullException("paramName");"#).as_deref(),
            Some("throw new ArgumentNullException(nameof(paramName));")
        );
    }

    #[test]
    fn test_message_becomes_string_format() {
        assert_eq!(
            rewritten(r#"throw new ArgumentNullException("paramName", "paramName cannot be null!");"#)
                .as_deref(),
            Some(
                r#"throw new ArgumentNullException(nameof(paramName), string.Format("{0} cannot be null!", nameof(paramName)));"#
            )
        );
    }

    #[test]
    fn test_every_matching_word_is_replaced() {
        // `p,` is not the word `p` and stays as written
        assert_eq!(
            rewritten(r#"throw new E("p", "p is p, not  p");"#).as_deref(),
            Some(r#"throw new E(nameof(p), string.Format("{0} is p, not  {0}", nameof(p)));"#)
        );
    }

    #[test]
    fn test_message_left_alone_when_unsafe() {
        for (source, expected) in [
            (
                r#"throw new E("p", "\"p\" is null");"#,
                r#"throw new E(nameof(p), "\"p\" is null");"#,
            ),
            (
                r#"throw new E("p", "{p} is null");"#,
                r#"throw new E(nameof(p), "{p} is null");"#,
            ),
            (
                r#"throw new E("p", "p: value is null");"#,
                r#"throw new E(nameof(p), "p: value is null");"#,
            ),
            (
                r#"throw new E("p", "value is null");"#,
                r#"throw new E(nameof(p), "value is null");"#,
            ),
            (
                r#"throw new E("p", message);"#,
                r#"throw new E(nameof(p), message);"#,
            ),
            (
                r#"throw new E("p", "p is null", inner);"#,
                r#"throw new E(nameof(p), "p is null", inner);"#,
            ),
        ] {
            assert_eq!(rewritten(source).as_deref(), Some(expected), "for {source}");
        }
    }

    #[test]
    fn test_template_is_escaped() {
        assert_eq!(
            rewritten(r#"throw new E("p", @"p is\null");"#).as_deref(),
            Some(r#"throw new E(nameof(p), string.Format("{0} is\\null", nameof(p)));"#)
        );
    }

    #[test]
    fn test_keyword_name_gets_verbatim_prefix() {
        assert_eq!(
            rewritten(r#"throw new E(@"class");"#).as_deref(),
            Some("throw new E(nameof(@class));")
        );
    }

    #[test]
    fn test_trivia_is_preserved() {
        let source = "throw new E( /* name */ \"p\" ,\n    \"p is null\" );";
        assert_eq!(
            rewritten(source).as_deref(),
            Some(
                "throw new E( /* name */ nameof(p) ,\n    string.Format(\"{0} is null\", nameof(p)) );"
            )
        );
    }

    #[test]
    fn test_rewritten_tree_is_well_formed() {
        let source = r#"throw new E("p", "p is null");"#;
        let model = SemanticModel::new(source, "Test.cs");
        let root = model.syntax();
        let new_root = rewrite(&model, &root, first_string_literal(&root))
            .unwrap()
            .unwrap();
        let reparsed = sharplint_core::cst::parse_csharp(&new_root.text().to_string());
        assert!(!reparsed.has_errors());
        assert_eq!(
            new_root
                .descendants()
                .filter(|n| n.kind() == CsSyntaxKind::NameofExpression)
                .count(),
            2
        );
    }

    #[test]
    fn test_defensive_aborts() {
        let source = r#"throw new E("p", "x"); var s = "p";"#;
        let model = SemanticModel::new(source, "Test.cs");
        let root = model.syntax();
        let literal = first_string_literal(&root);

        // Range drift
        let shifted = TextRange::new(literal.start(), literal.end() - TextSize::from(1));
        assert!(rewrite(&model, &root, shifted).unwrap().is_none());

        // Not a literal
        let keyword = TextRange::new(TextSize::from(0), TextSize::from(5));
        assert!(rewrite(&model, &root, keyword).unwrap().is_none());

        // Second argument rather than first
        let second = root
            .descendants()
            .filter(|n| LiteralExpression::cast(n.clone()).is_some_and(|l| l.is_string()))
            .nth(1)
            .unwrap()
            .text_range();
        assert!(rewrite(&model, &root, second).unwrap().is_none());

        // Literal outside any construction
        let outside = root
            .descendants()
            .filter(|n| LiteralExpression::cast(n.clone()).is_some_and(|l| l.is_string()))
            .last()
            .unwrap()
            .text_range();
        assert!(rewrite(&model, &root, outside).unwrap().is_none());

        // Past the end of the file
        let end = root.text_range().end();
        assert!(rewrite(&model, &root, TextRange::empty(end)).unwrap().is_none());
    }

    #[test]
    fn test_non_identifier_literal_is_not_rewritten() {
        assert_eq!(rewritten(r#"throw new E("not a name");"#), None);
    }

    #[test]
    fn test_format_template() {
        assert_eq!(format_template("p is null", "p").as_deref(), Some("{0} is null"));
        assert_eq!(format_template("pp is null", "p"), None);
        assert_eq!(format_template("x {p}", "p"), None);
        assert_eq!(format_template("say \"p\"", "p"), None);
    }
}
