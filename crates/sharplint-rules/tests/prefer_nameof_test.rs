//! End-to-end tests for `readability/prefer-nameof`
//!
//! This test suite covers:
//! - Findings on realistic files with guards and look-alikes
//! - Fix-all output, idempotence and formatting preservation
//! - Configuration loaded from disk driving the engine

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use sharplint_core::{ConfigLoader, FixConfig, SemanticModel, Severity, SharplintConfig};
use sharplint_rules::prefer_nameof::{self, PREFER_NAMEOF};
use sharplint_rules::{RuleEngine, init_builtin_rules};

const SERVICE: &str = r#"using System;
using System.Collections.Generic;

namespace Shop.Orders
{
    public sealed class OrderService
    {
        private readonly IDictionary<string, Order> _orders;

        public OrderService(IDictionary<string, Order> orders)
        {
            if (orders == null)
            {
                // keep this comment
                throw new ArgumentNullException("orders");
            }
            _orders = orders;
        }

        public Order Find(string id, string region)
        {
            if (null == id) throw new ArgumentNullException("id", "id must be provided");
            if (region == null) throw new ArgumentException("region");
            if (id.Length == 0) throw new ArgumentNullException("id");
            return _orders[id];
        }

        public void Cancel(Order @order, string reason)
        {
            if (@order == null)
                throw new System.ArgumentNullException(@"order", "\"order\" was null");
            if (reason == null) throw new ArgumentNullException(nameof(reason));
        }
    }

    public sealed class Order { }
}
"#;

const SERVICE_FIXED: &str = r#"using System;
using System.Collections.Generic;

namespace Shop.Orders
{
    public sealed class OrderService
    {
        private readonly IDictionary<string, Order> _orders;

        public OrderService(IDictionary<string, Order> orders)
        {
            if (orders == null)
            {
                // keep this comment
                throw new ArgumentNullException(nameof(orders));
            }
            _orders = orders;
        }

        public Order Find(string id, string region)
        {
            if (null == id) throw new ArgumentNullException(nameof(id), string.Format("{0} must be provided", nameof(id)));
            if (region == null) throw new ArgumentException("region");
            if (id.Length == 0) throw new ArgumentNullException("id");
            return _orders[id];
        }

        public void Cancel(Order @order, string reason)
        {
            if (@order == null)
                throw new System.ArgumentNullException(nameof(order), "\"order\" was null");
            if (reason == null) throw new ArgumentNullException(nameof(reason));
        }
    }

    public sealed class Order { }
}
"#;

fn engine(config: SharplintConfig) -> RuleEngine {
    RuleEngine::new(init_builtin_rules().unwrap(), config)
}

#[test]
fn test_service_file_is_parsed_cleanly() {
    let model = SemanticModel::new(SERVICE, "OrderService.cs");
    assert!(model.parse_errors.is_empty(), "{:?}", model.parse_errors);
    assert_eq!(model.syntax().text().to_string(), SERVICE);
}

#[test]
fn test_findings_on_service_file() {
    let diagnostics = engine(SharplintConfig::default())
        .lint_source(SERVICE, Path::new("OrderService.cs"))
        .unwrap();

    let summary: Vec<(usize, &str)> = diagnostics
        .iter()
        .map(|d| (d.location.line, d.message.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (
                15,
                "String literal 'orders' can be replaced with a self-reference to orders"
            ),
            (
                22,
                "String literal 'id' can be replaced with a self-reference to id"
            ),
            (
                31,
                "String literal 'order' can be replaced with a self-reference to order"
            ),
        ]
    );
    assert!(diagnostics.iter().all(|d| d.rule_id == PREFER_NAMEOF));
    assert!(diagnostics.iter().all(|d| d.severity == Severity::Info));
    assert!(diagnostics.iter().all(|d| d.has_safe_fixes()));
}

#[test]
fn test_fix_all_output_and_idempotence() {
    let engine = engine(SharplintConfig::default());
    let outcome = engine
        .fix_source(SERVICE, Path::new("OrderService.cs"), &FixConfig::safe_only())
        .unwrap();
    assert_eq!(outcome.content, SERVICE_FIXED);
    assert_eq!(outcome.applied, 3);
    assert!(outcome.errors.is_empty());

    let again = engine
        .fix_source(&outcome.content, Path::new("OrderService.cs"), &FixConfig::safe_only())
        .unwrap();
    assert_eq!(again.applied, 0);
    assert_eq!(again.content, SERVICE_FIXED);
}

#[test]
fn test_rewrite_api_directly() {
    let model = SemanticModel::new(SERVICE, "OrderService.cs");
    let root = model.syntax();
    let throw = root
        .descendants()
        .filter(|n| n.kind() == sharplint_core::cst::CsSyntaxKind::ThrowStatement)
        .nth(1)
        .unwrap();

    let finding = prefer_nameof::match_throw(&model, &throw).unwrap().unwrap();
    assert_eq!(finding.parameter_name, "id");

    let rewritten = prefer_nameof::rewrite(&model, &root, finding.location)
        .unwrap()
        .unwrap();
    let text = rewritten.text().to_string();
    assert!(text.contains(
        r#"throw new ArgumentNullException(nameof(id), string.Format("{0} must be provided", nameof(id)));"#
    ));
    // Only one guard changes per rewrite
    assert!(text.contains(r#"throw new ArgumentNullException("orders");"#));
}

#[test]
fn test_config_file_drives_severity() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join(".sharplintrc.json"),
        r#"{
            // JSONC comments are allowed
            "linter": { "rules": { "readability/prefer-nameof": "error" } },
        }"#,
    )
    .unwrap();
    let file = temp.path().join("OrderService.cs");
    fs::write(&file, SERVICE).unwrap();

    let config = ConfigLoader::load(None, Some(temp.path())).unwrap();
    let report = engine(config).lint_files(&[file]).unwrap();
    assert_eq!(report.diagnostic_count(), 3);
    assert!(report.has_severity_at_least(Severity::Error));
}
