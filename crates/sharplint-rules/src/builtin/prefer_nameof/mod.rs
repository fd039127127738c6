//! `readability/prefer-nameof`
//!
//! Flags null guards that name the guarded parameter with a string literal:
//!
//! ```csharp
//! if (name == null) throw new ArgumentNullException("name");
//! ```
//!
//! and offers to replace the literal with `nameof(name)`. The literal goes
//! stale silently when the parameter is renamed; `nameof` does not.

mod matcher;
mod rewriter;

pub use matcher::{Finding, TypeMatchPolicy, match_throw, match_throw_with_policy};
pub use rewriter::{format_template, rewrite};

use std::ops::Range;

use sharplint_core::cst::CsSyntaxKind;
use sharplint_core::{CodeSuggestion, Diagnostic, DiagnosticCategory, Result, Severity};

use crate::registry::{RuleContext, RuleDefinition, RuleMetadata};

/// Rule ID for the nameof rewrite
pub const PREFER_NAMEOF: &str = "readability/prefer-nameof";

/// Option selecting the [`TypeMatchPolicy`]
pub const TYPE_IDENTITY_OPTION: &str = "typeIdentity";

const FIX_MESSAGE: &str = "Replace string with nameof expression";

pub fn metadata() -> RuleMetadata {
    RuleMetadata {
        id: PREFER_NAMEOF,
        name: "Prefer nameof",
        description: "Detects string literals naming a parameter in an ArgumentNullException \
                      null guard and replaces them with nameof expressions",
        severity: Severity::Info,
        category: DiagnosticCategory::Readability,
        tags: vec!["readability", "refactoring", "nameof"],
        recommended: true,
        fixable: true,
    }
}

pub fn definition() -> RuleDefinition {
    RuleDefinition::new(metadata(), check)
}

pub fn diagnostic_message(parameter_name: &str) -> String {
    format!(
        "String literal '{parameter_name}' can be replaced with a self-reference to {parameter_name}"
    )
}

/// Run the rule over one file
pub fn check(ctx: &RuleContext<'_>) -> Result<Vec<Diagnostic>> {
    let model = ctx.model;
    let policy = TypeMatchPolicy::from_option(ctx.string_option(TYPE_IDENTITY_OPTION));
    let root = model.syntax();
    let mut diagnostics = Vec::new();

    for throw in root
        .descendants()
        .filter(|node| node.kind() == CsSyntaxKind::ThrowStatement)
    {
        let Some(finding) = match_throw_with_policy(model, &throw, policy)? else {
            continue;
        };

        let location =
            model
                .source_map
                .range_to_location(finding.location, &model.source, &model.source_file);
        let mut diagnostic = Diagnostic::new(
            PREFER_NAMEOF,
            ctx.severity,
            diagnostic_message(&finding.parameter_name),
            location,
        )
        .with_category(DiagnosticCategory::Readability)
        .with_source("sharplint");

        match rewrite(model, &root, finding.location)? {
            Some(new_root) => {
                let new_text = new_root.text().to_string();
                if let Some((range, replacement)) = minimal_edit(&model.source, &new_text) {
                    let fix_location = model.source_map.span_to_location(
                        range,
                        &model.source,
                        &model.source_file,
                    );
                    diagnostic = diagnostic.with_suggestion(CodeSuggestion::safe(
                        FIX_MESSAGE,
                        replacement,
                        fix_location,
                    ));
                }
            }
            None => tracing::debug!(
                "No rewrite available for '{}' at {}",
                finding.parameter_name,
                diagnostic.location
            ),
        }

        diagnostics.push(diagnostic);
    }

    Ok(diagnostics)
}

/// Single edit turning `old` into `new`: strip the common prefix and suffix
///
/// Returns the byte range in `old` and its replacement, or `None` when the
/// texts are equal.
pub fn minimal_edit(old: &str, new: &str) -> Option<(Range<usize>, String)> {
    if old == new {
        return None;
    }

    let prefix = old
        .char_indices()
        .zip(new.chars())
        .find(|((_, a), b)| a != b)
        .map(|((idx, _), _)| idx)
        .unwrap_or_else(|| old.len().min(new.len()));

    let max_suffix = old.len().min(new.len()) - prefix;
    let suffix = old[prefix..]
        .chars()
        .rev()
        .zip(new[prefix..].chars().rev())
        .take_while(|(a, b)| a == b)
        .map(|(a, _)| a.len_utf8())
        .scan(0usize, |total, len| {
            *total += len;
            (*total <= max_suffix).then_some(*total)
        })
        .last()
        .unwrap_or(0);

    let range = prefix..old.len() - suffix;
    let replacement = new[prefix..new.len() - suffix].to_string();
    Some((range, replacement))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharplint_core::SemanticModel;

    fn run(source: &str, options: Option<serde_json::Value>) -> Vec<Diagnostic> {
        let model = SemanticModel::new(source, "Guards.cs");
        let ctx = RuleContext {
            model: &model,
            severity: Severity::Info,
            options: options.as_ref(),
        };
        check(&ctx).unwrap()
    }

    fn apply(source: &str, diagnostic: &Diagnostic) -> String {
        let suggestion = &diagnostic.suggestions[0];
        let mut text = source.to_string();
        text.replace_range(suggestion.location.byte_range(), &suggestion.replacement);
        text
    }

    const TWO_ARGS: &str = r#"using System;

public class Service
{
    public void Configure(string paramName)
    {
        if (paramName == null)
            throw new ArgumentNullException("paramName", "paramName cannot be null!");
    }
}
"#;

    #[test]
    fn test_metadata() {
        let meta = metadata();
        assert_eq!(meta.id, "readability/prefer-nameof");
        assert_eq!(meta.severity, Severity::Info);
        assert_eq!(meta.category, DiagnosticCategory::Readability);
        assert!(meta.recommended);
    }

    #[test]
    fn test_diagnostic_and_fix_for_two_arguments() {
        let diagnostics = run(TWO_ARGS, None);
        assert_eq!(diagnostics.len(), 1);
        let diagnostic = &diagnostics[0];
        assert_eq!(
            diagnostic.message,
            "String literal 'paramName' can be replaced with a self-reference to paramName"
        );
        assert_eq!(diagnostic.location.line, 8);
        assert_eq!(diagnostic.location.length, "\"paramName\"".len());
        assert_eq!(diagnostic.suggestions.len(), 1);
        assert_eq!(diagnostic.suggestions[0].message, FIX_MESSAGE);
        assert!(diagnostic.has_safe_fixes());

        let fixed = apply(TWO_ARGS, diagnostic);
        assert!(fixed.contains(
            r#"throw new ArgumentNullException(nameof(paramName), string.Format("{0} cannot be null!", nameof(paramName)));"#
        ));
    }

    #[test]
    fn test_fix_is_idempotent() {
        let diagnostics = run(TWO_ARGS, None);
        let fixed = apply(TWO_ARGS, &diagnostics[0]);
        assert!(run(&fixed, None).is_empty());
    }

    #[test]
    fn test_quote_in_message_keeps_message() {
        let source = TWO_ARGS.replace(
            r#""paramName cannot be null!""#,
            r#""paramName \"cannot\" be null!""#,
        );
        let diagnostics = run(&source, None);
        assert_eq!(diagnostics.len(), 1);
        let fixed = apply(&source, &diagnostics[0]);
        assert!(fixed.contains(
            r#"throw new ArgumentNullException(nameof(paramName), "paramName \"cannot\" be null!");"#
        ));
    }

    #[test]
    fn test_configured_severity_is_used() {
        let model = SemanticModel::new(TWO_ARGS, "Guards.cs");
        let ctx = RuleContext {
            model: &model,
            severity: Severity::Error,
            options: None,
        };
        let diagnostics = check(&ctx).unwrap();
        assert_eq!(diagnostics[0].severity, Severity::Error);
    }

    #[test]
    fn test_qualified_option() {
        let source = "namespace Acme.System { class ArgumentNullException { public ArgumentNullException(string s) { } } class C { void M(string p) { if (p == null) throw new ArgumentNullException(\"p\"); } } }";
        assert_eq!(run(source, None).len(), 1);
        let options = serde_json::json!({ "typeIdentity": "qualified" });
        assert!(run(source, Some(options)).is_empty());
    }

    #[test]
    fn test_minimal_edit() {
        assert_eq!(minimal_edit("abc", "abc"), None);
        assert_eq!(
            minimal_edit("f(\"p\");", "f(nameof(p));"),
            Some((2..5, "nameof(p)".to_string()))
        );
        assert_eq!(minimal_edit("aXa", "aa"), Some((1..2, String::new())));
        assert_eq!(minimal_edit("aa", "aXa"), Some((1..1, "X".to_string())));
        assert_eq!(minimal_edit("é1", "é2"), Some((2..3, "2".to_string())));
    }
}
