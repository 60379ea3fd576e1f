//! Shared utilities for command handlers

use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;
use wikimap_core::MappingDocument;

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|s| s.to_str())
}

/// Read a JSON, YAML or TOML file into a JSON value.
///
/// The format is picked from the extension; anything unrecognized is parsed
/// as JSON.
pub fn read_structured(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = content.len(), "Read input file");

    let invalid = |expected: &str| Error::InvalidFormat {
        path: path.to_path_buf(),
        expected: expected.to_string(),
    };

    match extension(path) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content).map_err(|_| invalid("YAML")),
        Some("toml") => toml::from_str(&content).map_err(|_| invalid("TOML")),
        _ => serde_json::from_str(&content).map_err(|_| invalid("JSON")),
    }
}

/// Load a mapping document from JSON or YAML
pub fn load_mapping_document(path: &Path) -> Result<MappingDocument> {
    let value = read_structured(path)?;
    if !value.is_object() {
        return Err(Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "a mapping document object".to_string(),
        });
    }
    Ok(MappingDocument::from_value(value)?)
}

/// Serialize for a `--save-to` target: YAML for `.yaml`/`.yml`, pretty JSON otherwise
pub fn serialize_for_path<T: Serialize>(value: &T, path: &Path) -> Result<String> {
    match extension(path) {
        Some("yaml") | Some("yml") => Ok(serde_yaml::to_string(value)?),
        _ => Ok(serde_json::to_string_pretty(value)?),
    }
}

/// Write `value` to `path`, creating parent directories
pub fn save_to<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let content = serialize_for_path(value, path)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, content)?;
    debug!(path = %path.display(), "Saved output");
    Ok(())
}
