//! Configuration system for sharplint
//!
//! Configuration files are discovered by walking up from the working
//! directory. JSON files may contain comments and trailing commas.
//!
//! ## Configuration Files
//!
//! Searched in this order in every directory:
//! - `.sharplintrc.json`
//! - `.sharplintrc.jsonc`
//! - `.sharplintrc.toml`
//! - `sharplint.json`
//!
//! ## Example Configuration
//!
//! ```jsonc
//! {
//!   "linter": {
//!     "enabled": true,
//!     "rules": {
//!       "recommended": true,
//!       // plain severity
//!       "readability/prefer-nameof": "warn",
//!     }
//!   },
//!   "files": {
//!     "include": ["**/*.cs"],
//!     "exclude": ["**/bin/**", "**/obj/**"]
//!   }
//! }
//! ```
//!
//! A rule entry can also carry options:
//!
//! ```jsonc
//! {
//!   "linter": {
//!     "rules": {
//!       "readability/prefer-nameof": {
//!         "severity": "error",
//!         "options": { "typeIdentity": "qualified" }
//!       }
//!     }
//!   }
//! }
//! ```

mod loader;
mod sharplint_config;

pub use loader::ConfigLoader;
pub use sharplint_config::{
    FilesConfiguration, LinterConfiguration, RuleConfig, RuleSetting, RuleSeverity,
    RulesConfiguration, SharplintConfig,
};
