//! Integration tests for the sharplint CLI
//!
//! These tests verify the CLI behavior end-to-end

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const GUARD: &str = r#"using System;

public class Account
{
    public void Deposit(string owner, string currency)
    {
        if (owner == null) throw new ArgumentNullException("owner");
        if (currency == null)
            throw new ArgumentNullException("currency", "currency is required");
    }
}
"#;

/// Helper function to create a test CLI command
#[allow(deprecated)]
fn cli() -> Command {
    Command::cargo_bin("sharplint").unwrap()
}

/// Temporary project with one C# file containing two guards
fn create_test_project() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("src")).unwrap();
    fs::write(temp_dir.path().join("src/Account.cs"), GUARD).unwrap();
    temp_dir
}

fn write_config(dir: &Path, content: &str) {
    fs::write(dir.join(".sharplintrc.json"), content).unwrap();
}

#[test]
fn test_help_command() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("nameof"))
        .stdout(predicate::str::contains("lint"))
        .stdout(predicate::str::contains("rules"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_command() {
    cli()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(VERSION));

    cli()
        .args(["version", "--detailed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Build information:"));
}

#[test]
fn test_lint_reports_findings() {
    let project = create_test_project();

    cli()
        .args(["lint", "--format", "compact"])
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "info[readability/prefer-nameof] String literal 'owner' can be replaced with a self-reference to owner",
        ))
        .stdout(predicate::str::contains("'currency'"))
        .stdout(predicate::str::contains("1 files, 2 issues"));
}

#[test]
fn test_lint_human_output_shows_code_frame() {
    let project = create_test_project();

    cli()
        .arg("lint")
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("[readability/prefer-nameof]"))
        .stdout(predicate::str::contains(
            r#"throw new ArgumentNullException("owner");"#,
        ))
        .stdout(predicate::str::contains("Safe fix"))
        .stdout(predicate::str::contains("Files checked: 1"));
}

#[test]
fn test_lint_error_severity_fails() {
    let project = create_test_project();
    write_config(
        project.path(),
        r#"{ "linter": { "rules": { "readability/prefer-nameof": "error" } } }"#,
    );

    cli()
        .args(["lint", "--format", "compact"])
        .arg(project.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("error[readability/prefer-nameof]"));
}

#[test]
fn test_error_on_warnings() {
    let project = create_test_project();
    write_config(
        project.path(),
        r#"{ "linter": { "rules": { "readability/prefer-nameof": "warn" } } }"#,
    );

    cli()
        .args(["lint", "--format", "compact"])
        .arg(project.path())
        .assert()
        .success();

    cli()
        .args(["lint", "--format", "compact", "--error-on-warnings"])
        .arg(project.path())
        .assert()
        .failure();
}

#[test]
fn test_rule_turned_off_in_config() {
    let project = create_test_project();
    write_config(
        project.path(),
        r#"{
            // disabled for this project
            "linter": { "rules": { "readability/prefer-nameof": "off" } }
        }"#,
    );

    cli()
        .args(["lint", "--format", "compact"])
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1 files checked, no issues"));
}

#[test]
fn test_min_severity_filters_output() {
    let project = create_test_project();

    cli()
        .args(["lint", "--format", "compact", "--min-severity", "warning"])
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("no issues"));
}

#[test]
fn test_write_applies_fixes() {
    let project = create_test_project();
    let file = project.path().join("src/Account.cs");

    cli()
        .args(["lint", "--write"])
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied 2 fixes"));

    let fixed = fs::read_to_string(&file).unwrap();
    assert!(fixed.contains("if (owner == null) throw new ArgumentNullException(nameof(owner));"));
    assert!(fixed.contains(
        r#"throw new ArgumentNullException(nameof(currency), string.Format("{0} is required", nameof(currency)));"#
    ));

    // A second run finds nothing left to fix
    cli()
        .args(["lint", "--format", "compact"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("no issues"));
}

#[test]
fn test_dry_run_shows_diff_without_writing() {
    let project = create_test_project();
    let file = project.path().join("src/Account.cs");

    cli()
        .args(["lint", "--dry-run"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"-        if (owner == null) throw new ArgumentNullException("owner");"#,
        ))
        .stdout(predicate::str::contains(
            "+        if (owner == null) throw new ArgumentNullException(nameof(owner));",
        ))
        .stdout(predicate::str::contains("Would apply 2 fixes (dry run)"));

    assert_eq!(fs::read_to_string(&file).unwrap(), GUARD);
}

#[test]
fn test_unsafe_flag_with_dry_run() {
    let project = create_test_project();
    let file = project.path().join("src/Account.cs");

    cli()
        .args(["lint", "--dry-run", "--unsafe"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Would apply 2 fixes (dry run)"));

    assert_eq!(fs::read_to_string(&file).unwrap(), GUARD);
}

#[test]
fn test_write_and_dry_run_conflict() {
    let project = create_test_project();

    cli()
        .args(["lint", "--write", "--dry-run"])
        .arg(project.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_json_output() {
    let project = create_test_project();

    let output = cli()
        .args(["lint", "--format", "json"])
        .arg(project.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["files_checked"], 1);
    assert_eq!(json["summary"]["info"], 2);
    let diagnostics = json["diagnostics"].as_array().unwrap();
    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics[0]["rule_id"], "readability/prefer-nameof");
    assert_eq!(diagnostics[0]["location"]["line"], 7);
    assert_eq!(
        diagnostics[0]["suggestions"][0]["replacement"],
        "nameof(owner)"
    );
}

#[test]
fn test_github_output() {
    let project = create_test_project();

    cli()
        .args(["lint", "--format", "github"])
        .arg(project.path().join("src/Account.cs"))
        .assert()
        .success()
        .stdout(predicate::str::contains("::notice file="))
        .stdout(predicate::str::contains(",line=7,"))
        .stdout(predicate::str::contains(
            "title=readability/prefer-nameof::String literal 'owner'",
        ));
}

#[test]
fn test_exclude_pattern() {
    let project = create_test_project();

    cli()
        .args(["lint", "--exclude", "**/src/**"])
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No C# files found"));
}

#[test]
fn test_missing_path_fails() {
    let project = TempDir::new().unwrap();

    cli()
        .arg("lint")
        .arg(project.path().join("Missing.cs"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_rules_list_command() {
    cli()
        .args(["rules", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("readability/prefer-nameof"))
        .stdout(predicate::str::contains("Total: 1 rules"));

    cli()
        .args(["rules", "--detailed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Autofix: available"));

    cli()
        .args(["rules", "--category", "style"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No rules found"));
}

#[test]
fn test_rules_explain_command() {
    cli()
        .args(["rules", "explain", "readability/prefer-nameof"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rule: readability/prefer-nameof"))
        .stdout(predicate::str::contains("Category: readability"));

    cli()
        .args(["rules", "explain", "style/unknown"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Rule 'style/unknown' not found."));
}

#[test]
fn test_config_init_command() {
    let temp_dir = TempDir::new().unwrap();

    cli()
        .args(["config", "init"])
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Created configuration file: .sharplintrc.json",
        ));
    assert!(temp_dir.path().join(".sharplintrc.json").exists());

    cli()
        .args(["config", "init"])
        .current_dir(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    cli()
        .args(["config", "init", "--force", "--with-examples"])
        .current_dir(temp_dir.path())
        .assert()
        .success();

    cli()
        .args(["config", "validate"])
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("readability/prefer-nameof"));
}

#[test]
fn test_config_init_toml() {
    let temp_dir = TempDir::new().unwrap();

    cli()
        .args(["config", "init", "--format", "toml"])
        .current_dir(temp_dir.path())
        .assert()
        .success();

    let path = temp_dir.path().join(".sharplintrc.toml");
    cli()
        .args(["config", "validate"])
        .arg(&path)
        .assert()
        .success();
}

#[test]
fn test_config_validate_rejects_bad_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bad.json");
    fs::write(&path, r#"{ "files": { "include": ["["] } }"#).unwrap();

    cli()
        .args(["config", "validate"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration validation failed"));
}

#[test]
fn test_config_show_and_schema() {
    let temp_dir = TempDir::new().unwrap();

    cli()
        .args(["config", "show"])
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"recommended\": true"));

    cli()
        .args(["config", "schema"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SharplintConfig"));
}

#[test]
fn test_shell_completion() {
    cli()
        .args(["--generate-completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sharplint"));
}
