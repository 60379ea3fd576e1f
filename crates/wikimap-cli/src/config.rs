//! Configuration management for the CLI
//!
//! This module handles loading configuration from:
//! - Default values
//! - Configuration files (YAML/JSON/TOML)
//! - The `WIKIMAP_CONFIG` environment variable and `--config`

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File names searched in the working directory and home directory
const CONFIG_FILE_NAMES: [&str; 6] = [
    ".wikimap.yaml",
    ".wikimap.json",
    ".wikimap.toml",
    "wikimap.yaml",
    "wikimap.json",
    "wikimap.toml",
];

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Path settings
    pub paths: PathConfig,

    /// Mapping application settings
    pub apply: ApplyConfig,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format
    pub format: String,

    /// Use colored output by default
    pub color: bool,

    /// Show progress indicators
    pub progress: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: Option<String>,

    /// Log format (compact, full, json)
    pub format: String,

    /// Log file path
    pub file: Option<PathBuf>,
}

/// Path configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Directory searched for mapping documents given by name
    pub mappings_dir: PathBuf,

    /// Cache directory
    pub cache_dir: PathBuf,
}

/// Settings for applying mappings to items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplyConfig {
    /// Leave out values whose display string is empty
    pub skip_empty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "human".to_string(),
            color: true,
            progress: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            format: "compact".to_string(),
            file: None,
        }
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        let home_dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let config_dir = dirs::config_dir()
            .map(|d| d.join("wikimap"))
            .unwrap_or_else(|| home_dir.join(".config").join("wikimap"));

        Self {
            mappings_dir: config_dir.join("mappings"),
            cache_dir: dirs::cache_dir()
                .map(|d| d.join("wikimap"))
                .unwrap_or_else(|| home_dir.join(".cache").join("wikimap")),
        }
    }
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self { skip_empty: true }
    }
}

/// Serialization format, picked from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Json,
    Yaml,
    Toml,
}

impl FileFormat {
    fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("toml") => FileFormat::Toml,
            _ => FileFormat::Json,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;

        let config = match FileFormat::for_path(path) {
            FileFormat::Yaml => serde_yaml::from_str(&content)?,
            FileFormat::Toml => toml::from_str(&content)
                .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))?,
            FileFormat::Json => serde_json::from_str(&content)?,
        };

        tracing::debug!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                    }
                }
            }
        }

        // Return default config if no config file found
        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        if let Some(path) = file {
            Self::from_file(path)
        } else {
            Self::load()
        }
    }

    /// Configuration file paths checked by [`Config::load`], in order
    pub fn default_config_paths() -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = CONFIG_FILE_NAMES.iter().map(PathBuf::from).collect();

        if let Some(config_dir) = dirs::config_dir() {
            let wikimap_dir = config_dir.join("wikimap");
            paths.push(wikimap_dir.join("config.yaml"));
            paths.push(wikimap_dir.join("config.json"));
            paths.push(wikimap_dir.join("config.toml"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".wikimap.yaml"));
            paths.push(home_dir.join(".wikimap.json"));
            paths.push(home_dir.join(".wikimap.toml"));
        }

        paths
    }

    /// Default location for `config init`
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("wikimap").join("config.yaml"))
    }

    /// Serialize in the format matching `path`'s extension
    pub fn to_string_for(&self, path: &Path) -> Result<String> {
        Ok(match FileFormat::for_path(path) {
            FileFormat::Yaml => serde_yaml::to_string(self)?,
            FileFormat::Toml => toml::to_string_pretty(self)
                .map_err(|e| Error::config(format!("Failed to serialize as TOML: {}", e)))?,
            FileFormat::Json => serde_json::to_string_pretty(self)?,
        })
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_string_for(path)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Resolve a mapping argument to a file.
    ///
    /// Existing paths are used as given; anything else is looked up in
    /// `paths.mappings_dir` with `.json`, `.yaml` or `.yml` appended.
    pub fn resolve_mapping(&self, name_or_path: &str) -> Result<PathBuf> {
        let direct = Path::new(name_or_path);
        if direct.is_file() {
            return Ok(direct.to_path_buf());
        }

        ["json", "yaml", "yml"]
            .iter()
            .map(|ext| self.paths.mappings_dir.join(format!("{}.{}", name_or_path, ext)))
            .find(|p| p.is_file())
            .ok_or_else(|| Error::MappingNotFound {
                name: name_or_path.to_string(),
            })
    }
}

/// Builder for creating configurations programmatically
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new config builder
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Set the mappings directory
    pub fn mappings_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.paths.mappings_dir = dir.into();
        self
    }

    /// Keep or skip empty values when applying mappings
    pub fn skip_empty(mut self, skip_empty: bool) -> Self {
        self.config.apply.skip_empty = skip_empty;
        self
    }

    /// Set the log file
    pub fn log_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.config.logging.file = Some(file.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
