//! Built-in rules for C# linting

use sharplint_core::Result;

use crate::registry::RuleRegistry;

pub mod prefer_nameof;

/// Register every built-in rule
///
/// Called once at start-up by the CLI and by `init_builtin_rules`.
pub fn register_builtin_rules(registry: &mut RuleRegistry) -> Result<()> {
    registry.register_rule(prefer_nameof::definition())?;
    Ok(())
}
