//! Configuration file discovery and loading

use super::SharplintConfig;
use crate::error::SharplintError;
use crate::result::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file names in priority order
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".sharplintrc.json",
    ".sharplintrc.jsonc",
    ".sharplintrc.toml",
    "sharplint.json",
];

/// Configuration loader for discovering and loading config files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Auto-discover a config file by traversing upward from `start_path`
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path.canonicalize().map_err(|e| {
            SharplintError::config_error(format!(
                "Invalid path '{}': {e}",
                start_path.display()
            ))
        })?;

        loop {
            for filename in CONFIG_FILE_NAMES {
                let config_path = current.join(filename);
                if config_path.is_file() {
                    tracing::debug!("Found config: {}", config_path.display());
                    return Ok(Some(config_path));
                }
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Load configuration from a specific file
    ///
    /// `.toml` files are read as TOML; anything else as JSON with comments.
    pub fn load_from_file(path: &Path) -> Result<SharplintConfig> {
        let content = fs::read_to_string(path).map_err(|e| SharplintError::io_error(path, e))?;
        let config = Self::parse(&content, path)?;
        config.validate()?;
        Ok(config)
    }

    fn parse(content: &str, path: &Path) -> Result<SharplintConfig> {
        let is_toml = path.extension().and_then(|e| e.to_str()) == Some("toml");
        let parsed = if is_toml {
            toml::from_str(content).map_err(|e| e.to_string())
        } else {
            json5::from_str(content).map_err(|e| e.to_string())
        };
        parsed.map_err(|e| {
            SharplintError::config_error(format!(
                "Failed to load config from '{}': {e}",
                path.display()
            ))
        })
    }

    /// Load config from an explicit path, or auto-discover it
    ///
    /// Without an explicit path and without a discovered file the
    /// defaults are used.
    pub fn load(custom_path: Option<&Path>, start_dir: Option<&Path>) -> Result<SharplintConfig> {
        if let Some(path) = custom_path {
            if !path.exists() {
                return Err(SharplintError::config_error(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Self::load_from_file(path);
        }

        let search_dir = start_dir.unwrap_or_else(|| Path::new("."));
        match Self::auto_discover(search_dir)? {
            Some(path) => {
                tracing::info!("Using config {}", path.display());
                Self::load_from_file(&path)
            }
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(SharplintConfig::default())
            }
        }
    }
}
