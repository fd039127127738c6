//! File discovery for C# linting
//!
//! Walks a root directory and keeps the files that match the configured
//! include patterns and none of the exclude or ignore-file patterns.

use crate::config::SharplintConfig;
use crate::{Result, SharplintError};
use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Ignore file read from the discovery root
pub const IGNORE_FILE_NAME: &str = ".sharplintignore";

/// Trait for file discovery functionality
pub trait FileDiscovery {
    /// Discover source files below the root
    fn discover_files(&self, config: &SharplintConfig) -> Result<Vec<PathBuf>>;

    /// Check if a single file passes the include and exclude patterns
    fn should_include(&self, path: &Path, config: &SharplintConfig) -> bool;
}

/// Default implementation of file discovery
#[derive(Debug, Clone)]
pub struct DefaultFileDiscovery {
    /// Root directory for file discovery
    pub root_dir: PathBuf,
}

struct CompiledPatterns {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl DefaultFileDiscovery {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    fn compile(&self, config: &SharplintConfig) -> Result<CompiledPatterns> {
        let files = config.files_config();
        let include = compile_patterns(files.include.as_deref().unwrap_or(&[]))?;
        let mut exclude = compile_patterns(files.exclude.as_deref().unwrap_or(&[]))?;
        exclude.extend(self.load_ignore_patterns());
        Ok(CompiledPatterns { include, exclude })
    }

    /// Patterns from `.sharplintignore`, converted from gitignore style
    fn load_ignore_patterns(&self) -> Vec<Pattern> {
        let ignore_path = self.root_dir.join(IGNORE_FILE_NAME);
        if !ignore_path.is_file() {
            return Vec::new();
        }
        match std::fs::read_to_string(&ignore_path) {
            Ok(content) => {
                let patterns: Vec<Pattern> = content
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty() && !line.starts_with('#'))
                    .filter_map(|line| Pattern::new(&ignore_line_to_glob(line)).ok())
                    .collect();
                debug!("Loaded {} patterns from {}", patterns.len(), IGNORE_FILE_NAME);
                patterns
            }
            Err(e) => {
                warn!("Failed to read {}: {}", ignore_path.display(), e);
                Vec::new()
            }
        }
    }

    fn relative<'a>(&self, path: &'a Path) -> std::borrow::Cow<'a, str> {
        path.strip_prefix(&self.root_dir)
            .unwrap_or(path)
            .to_string_lossy()
    }

    fn matches(&self, path: &Path, patterns: &CompiledPatterns) -> bool {
        let relative = self.relative(path);
        let relative = relative.replace('\\', "/");
        let included = if patterns.include.is_empty() {
            has_cs_extension(path)
        } else {
            patterns.include.iter().any(|p| p.matches(&relative))
        };
        included && !patterns.exclude.iter().any(|p| p.matches(&relative))
    }
}

impl FileDiscovery for DefaultFileDiscovery {
    fn discover_files(&self, config: &SharplintConfig) -> Result<Vec<PathBuf>> {
        info!("Discovering C# files in {}", self.root_dir.display());
        if !self.root_dir.exists() {
            return Err(SharplintError::io_error(
                &self.root_dir,
                std::io::Error::new(std::io::ErrorKind::NotFound, "directory not found"),
            ));
        }

        let patterns = self.compile(config)?;
        let mut files: Vec<PathBuf> = WalkDir::new(&self.root_dir)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .filter(|path| self.matches(path, &patterns))
            .collect();

        files.sort();
        info!("Discovered {} C# files", files.len());
        debug!("Files: {:?}", files);
        Ok(files)
    }

    fn should_include(&self, path: &Path, config: &SharplintConfig) -> bool {
        self.compile(config)
            .map(|patterns| self.matches(path, &patterns))
            .unwrap_or(false)
    }
}

/// Expand command-line paths into source files
///
/// Directories are walked with the configured patterns; files named
/// explicitly are always linted.
pub fn discover_paths(paths: &[PathBuf], config: &SharplintConfig) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            files.extend(DefaultFileDiscovery::new(path).discover_files(config)?);
        } else {
            return Err(SharplintError::io_error(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "path not found"),
            ));
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| {
                SharplintError::config_error(format!("Invalid glob pattern '{p}': {e}"))
            })
        })
        .collect()
}

fn ignore_line_to_glob(line: &str) -> String {
    let line = line.trim_start_matches('/');
    if let Some(dir) = line.strip_suffix('/') {
        format!("**/{dir}/**")
    } else if !line.contains('/') {
        format!("**/{line}")
    } else {
        line.to_string()
    }
}

fn has_cs_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("cs"))
}
