//! Error types for the Wikimap core library
//!
//! Construction-time problems (an unregistered block type, a config that does
//! not fit its block type) are errors. Problems found while running a chain are
//! never errors: they degrade to pass-through and surface as
//! [`Diagnostic`](crate::transformer::Diagnostic) values instead.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for Wikimap operations
#[derive(Error, Debug)]
pub enum Error {
    /// A block type name that is not in the registry
    #[error("Unknown block type: {type_name}")]
    UnknownBlockType { type_name: String },

    /// A block config that does not fit its block type
    #[error("Invalid configuration for {block_type} block: {message}")]
    InvalidBlockConfig {
        block_type: String,
        message: String,
    },

    /// A block id that is not part of the mapping entry
    #[error("Block not found: {id}")]
    BlockNotFound { id: String },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an unknown block type error
    pub fn unknown_block_type(type_name: impl Into<String>) -> Self {
        Self::UnknownBlockType {
            type_name: type_name.into(),
        }
    }

    /// Create an invalid block config error
    pub fn invalid_config(block_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidBlockConfig {
            block_type: block_type.into(),
            message: message.into(),
        }
    }
}

/// Severity levels for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational, no action required
    Info,
    /// Warning, the block did not do what its config asks for
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}
