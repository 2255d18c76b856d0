//! Custom error types for repogate.
//!
//! Violations found by a gate are *not* errors: they are collected into a
//! [`GateReport`](crate::gates::GateReport). This module covers the failures
//! that stop a gate from completing its checks at all, such as a key
//! artifact that cannot be decoded or a configuration file that does not
//! parse.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for repogate operations
#[derive(Error, Debug)]
pub enum GateError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Failed to load configuration
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfig { field: String, reason: String },

    // =========================================================================
    // Content Errors
    // =========================================================================
    /// A key artifact is not valid UTF-8, so it cannot be searched
    #[error("{} is not valid UTF-8 (strict decoding required)", path.display())]
    Undecodable { path: PathBuf },

    /// Reading a file failed
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// Directory traversal failed
    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    /// Regex compilation error
    #[error(transparent)]
    Regex(#[from] regex::Error),
}

impl GateError {
    // =========================================================================
    // Constructor helpers
    // =========================================================================

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            path: None,
        }
    }

    /// Create a configuration error with path
    pub fn config_with_path(message: impl Into<String>, path: PathBuf) -> Self {
        Self::Config {
            message: message.into(),
            path: Some(path),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an IO error bound to the file that caused it
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    // =========================================================================
    // Classification helpers
    // =========================================================================

    /// Check if this error comes from configuration rather than repository content
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Config { .. } | Self::InvalidConfig { .. } | Self::Regex(_)
        )
    }

    /// Get error code for exit status.
    ///
    /// Gates only define `0` and `1`, so every error fails with `1`.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

/// Type alias for repogate results
pub type Result<T> = std::result::Result<T, GateError>;

/// Extension trait for attaching a path to IO results
pub trait IoResultExt<T> {
    fn with_path(self, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_path(self, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|e| GateError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GateError::Undecodable {
            path: PathBuf::from("docs/agent/product.md"),
        };
        assert!(err.to_string().contains("docs/agent/product.md"));
        assert!(err.to_string().contains("UTF-8"));
    }

    #[test]
    fn test_is_config() {
        assert!(GateError::config("bad").is_config());
        assert!(GateError::invalid_config("ledger.statuses", "empty").is_config());
        assert!(!GateError::Undecodable {
            path: PathBuf::from("a")
        }
        .is_config());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(GateError::config("test").exit_code(), 1);
        assert_eq!(
            GateError::Undecodable {
                path: PathBuf::from("a")
            }
            .exit_code(),
            1
        );
    }

    #[test]
    fn test_config_with_path() {
        let path = PathBuf::from("/test/repogate.json");
        let err = GateError::config_with_path("failed to parse", path.clone());
        if let GateError::Config {
            message,
            path: opt_path,
        } = err
        {
            assert_eq!(message, "failed to parse");
            assert_eq!(opt_path, Some(path));
        } else {
            panic!("Wrong error variant");
        }
    }

    #[test]
    fn test_with_path_extension() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "access denied",
        ));

        let err = result.with_path("scripts/task_gate.py").unwrap_err();
        assert!(matches!(err, GateError::Io { .. }));
        assert!(err.to_string().contains("scripts/task_gate.py"));
        assert!(err.to_string().contains("access denied"));
    }

    #[test]
    fn test_error_from_regex() {
        let re_err = regex::Regex::new("(").unwrap_err();
        let err: GateError = re_err.into();
        assert!(matches!(err, GateError::Regex(_)));
        assert!(err.is_config());
    }
}
