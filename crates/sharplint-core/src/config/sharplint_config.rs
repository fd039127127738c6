//! Configuration types for sharplint

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::diagnostics::Severity;
use crate::error::SharplintError;

/// Top-level configuration file contents
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SharplintConfig {
    /// JSON schema reference for editor support
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Linter configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linter: Option<LinterConfiguration>,

    /// File discovery configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<FilesConfiguration>,
}

/// Linter configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LinterConfiguration {
    #[schemars(description = "Enable or disable the linter")]
    pub enabled: Option<bool>,

    #[schemars(description = "Rule severity configuration, keyed by rule id")]
    pub rules: Option<RulesConfiguration>,
}

/// Rules configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RulesConfiguration {
    /// Enable all recommended rules
    #[schemars(description = "Enable all recommended rules")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended: Option<bool>,

    /// Per-rule settings such as `"readability/prefer-nameof": "warn"`
    #[serde(flatten)]
    pub rules: BTreeMap<String, RuleSetting>,
}

/// Rule severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    /// Disable the rule
    Off,
    Info,
    Warn,
    Error,
}

impl RuleSeverity {
    /// Diagnostic severity for an enabled rule, `None` for `off`
    pub fn to_severity(self) -> Option<Severity> {
        match self {
            RuleSeverity::Off => None,
            RuleSeverity::Info => Some(Severity::Info),
            RuleSeverity::Warn => Some(Severity::Warning),
            RuleSeverity::Error => Some(Severity::Error),
        }
    }
}

/// Rule-specific configuration with options
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RuleConfig {
    #[schemars(description = "Override the default severity for this rule")]
    pub severity: Option<RuleSeverity>,

    #[schemars(description = "Custom options for this rule")]
    pub options: Option<serde_json::Value>,
}

/// Either a bare severity or a full rule configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(untagged)]
pub enum RuleSetting {
    Severity(RuleSeverity),
    Config(RuleConfig),
}

impl RuleSetting {
    pub fn severity(&self) -> Option<RuleSeverity> {
        match self {
            RuleSetting::Severity(severity) => Some(*severity),
            RuleSetting::Config(config) => config.severity,
        }
    }

    pub fn options(&self) -> Option<&serde_json::Value> {
        match self {
            RuleSetting::Severity(_) => None,
            RuleSetting::Config(config) => config.options.as_ref(),
        }
    }
}

/// Files configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FilesConfiguration {
    #[schemars(description = "Glob patterns for files to include")]
    pub include: Option<Vec<String>>,

    #[schemars(description = "Glob patterns for files to exclude")]
    pub exclude: Option<Vec<String>>,
}

impl Default for SharplintConfig {
    fn default() -> Self {
        Self {
            schema: None,
            linter: Some(LinterConfiguration::default()),
            files: Some(FilesConfiguration::default()),
        }
    }
}

impl Default for LinterConfiguration {
    fn default() -> Self {
        Self {
            enabled: Some(true),
            rules: Some(RulesConfiguration::default()),
        }
    }
}

impl Default for RulesConfiguration {
    fn default() -> Self {
        Self {
            recommended: Some(true),
            rules: BTreeMap::new(),
        }
    }
}

impl Default for FilesConfiguration {
    fn default() -> Self {
        Self {
            include: Some(vec!["**/*.cs".to_string()]),
            exclude: Some(vec!["**/bin/**".to_string(), "**/obj/**".to_string()]),
        }
    }
}

impl SharplintConfig {
    /// Get linter configuration with defaults
    pub fn linter_config(&self) -> LinterConfiguration {
        self.linter.clone().unwrap_or_default()
    }

    /// Get files configuration with defaults
    pub fn files_config(&self) -> FilesConfiguration {
        self.files.clone().unwrap_or_default()
    }

    pub fn linter_enabled(&self) -> bool {
        self.linter
            .as_ref()
            .and_then(|linter| linter.enabled)
            .unwrap_or(true)
    }

    /// Whether rules marked recommended run without explicit configuration
    pub fn recommended_enabled(&self) -> bool {
        self.linter
            .as_ref()
            .and_then(|linter| linter.rules.as_ref())
            .and_then(|rules| rules.recommended)
            .unwrap_or(true)
    }

    /// The configured setting for a rule, if any
    pub fn rule_setting(&self, rule_id: &str) -> Option<&RuleSetting> {
        self.linter
            .as_ref()
            .and_then(|linter| linter.rules.as_ref())
            .and_then(|rules| rules.rules.get(rule_id))
    }

    /// Ids of every rule mentioned in the configuration
    pub fn configured_rule_ids(&self) -> Vec<&str> {
        self.linter
            .as_ref()
            .and_then(|linter| linter.rules.as_ref())
            .map(|rules| rules.rules.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Check glob patterns and rule option shapes
    pub fn validate(&self) -> Result<(), SharplintError> {
        let files = self.files_config();
        for pattern in files
            .include
            .iter()
            .flatten()
            .chain(files.exclude.iter().flatten())
        {
            glob::Pattern::new(pattern).map_err(|e| {
                SharplintError::config_error(format!("Invalid glob pattern '{pattern}': {e}"))
            })?;
        }

        for rule_id in self.configured_rule_ids() {
            if let Some(options) = self.rule_setting(rule_id).and_then(RuleSetting::options) {
                if !options.is_object() {
                    return Err(SharplintError::config_error(format!(
                        "Options for rule '{rule_id}' must be an object"
                    )));
                }
            }
        }

        Ok(())
    }

    /// JSON schema for configuration files
    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(SharplintConfig)).unwrap_or_default()
    }
}
