//! Error types and handling for sharplint operations

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for sharplint operations
#[derive(Debug, Error)]
pub enum SharplintError {
    /// C# syntax that could not be parsed
    #[error("Parse error: {message} at {location}")]
    ParseError {
        message: String,
        location: Box<crate::diagnostics::Location>,
    },

    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Rule registration or execution errors
    #[error("Rule error in '{rule_id}': {message}")]
    RuleError { rule_id: String, message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Autofix engine errors
    #[error("Autofix error: {message}")]
    AutofixError { message: String },

    /// The host asked the analysis to stop
    #[error("Operation cancelled")]
    Cancelled,

    /// Generic internal errors
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Config,
    Rule,
    Io,
    Autofix,
    Cancelled,
    Internal,
}

impl SharplintError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            SharplintError::ParseError { .. } => ErrorKind::Parse,
            SharplintError::ConfigError { .. } => ErrorKind::Config,
            SharplintError::RuleError { .. } => ErrorKind::Rule,
            SharplintError::IoError { .. } => ErrorKind::Io,
            SharplintError::AutofixError { .. } => ErrorKind::Autofix,
            SharplintError::Cancelled => ErrorKind::Cancelled,
            SharplintError::InternalError { .. } => ErrorKind::Internal,
        }
    }

    /// Check if this error is recoverable (can continue processing other files)
    ///
    /// Cancellation is never recoverable: it must stop the whole run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Parse | ErrorKind::Rule | ErrorKind::Io
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, SharplintError::Cancelled)
    }

    /// Create a parse error
    pub fn parse_error(message: impl Into<String>, location: crate::diagnostics::Location) -> Self {
        Self::ParseError {
            message: message.into(),
            location: Box::new(location),
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a rule error
    pub fn rule_error(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RuleError {
            rule_id: rule_id.into(),
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    /// Create an autofix error
    pub fn autofix_error(message: impl Into<String>) -> Self {
        Self::AutofixError {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for SharplintError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            path: PathBuf::new(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(SharplintError::Cancelled.kind(), ErrorKind::Cancelled);
        assert_eq!(
            SharplintError::config_error("bad").kind(),
            ErrorKind::Config
        );
        assert_eq!(
            SharplintError::rule_error("readability/prefer-nameof", "boom").to_string(),
            "Rule error in 'readability/prefer-nameof': boom"
        );
    }

    #[test]
    fn test_recoverability() {
        assert!(!SharplintError::Cancelled.is_recoverable());
        assert!(SharplintError::Cancelled.is_cancelled());
        assert!(SharplintError::rule_error("r", "m").is_recoverable());
        assert!(!SharplintError::internal_error("m").is_recoverable());
        let io = SharplintError::io_error(
            "a.cs",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(io.is_recoverable());
        assert!(io.to_string().contains("a.cs"));
    }
}
