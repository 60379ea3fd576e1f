//! Error types and handling for the CLI
//!
//! This module provides error types and utilities for handling
//! various failure modes in the CLI application.

use std::io;
use std::path::PathBuf;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from wikimap-core library
    #[error("{0}")]
    Core(#[from] wikimap_core::Error),

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Invalid file format
    #[error("Invalid file format for {}: expected {}", path.display(), expected)]
    InvalidFormat { path: PathBuf, expected: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument combination
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// Mapping name that matches no file
    #[error("Mapping '{}' not found", name)]
    MappingNotFound { name: String },

    /// A mapping document that would not run cleanly
    #[error("Validation failed: {} problem(s) found", count)]
    ValidationFailed { count: usize },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::Core(_) => 2,
            Self::FileNotFound { .. } => 3,
            Self::InvalidFormat { .. } => 4,
            Self::Config(_) => 5,
            Self::InvalidArgs(_) => 6,
            Self::MappingNotFound { .. } => 7,
            Self::ValidationFailed { .. } => 8,
            Self::Json(_) => 12,
            Self::Yaml(_) => 13,
            Self::Other { .. } => 99,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::InvalidArgs(_))
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    if use_color {
        use colored::Colorize;
        format!("{} {}", "Error:".red().bold(), error)
    } else {
        format!("Error: {}", error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_per_kind() {
        assert_eq!(Error::config("x").exit_code(), 5);
        assert_eq!(Error::MappingNotFound { name: "m".into() }.exit_code(), 7);
        assert_eq!(Error::ValidationFailed { count: 2 }.exit_code(), 8);
        assert_eq!(Error::other("x").exit_code(), 99);
        assert_eq!(
            Error::Core(wikimap_core::Error::unknown_block_type("upper")).exit_code(),
            2
        );
    }

    #[test]
    fn test_core_errors_display_unwrapped() {
        let err = Error::from(wikimap_core::Error::unknown_block_type("upper"));
        assert_eq!(err.to_string(), "Unknown block type: upper");
    }

    #[test]
    fn test_format_error_plain() {
        let err = Error::FileNotFound {
            path: PathBuf::from("missing.json"),
        };
        assert_eq!(format_error(&err, false), "Error: File not found: missing.json");
        assert!(!err.should_show_help());
        assert!(Error::invalid_args("bad").should_show_help());
    }
}
