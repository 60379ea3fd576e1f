//! Core types for the block transformation system
//!
//! This module defines block types, their typed configurations, the block
//! itself, trace steps and the diagnostics a chain run reports.
//!
//! Copyright (c) 2025 Wikimap Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result, Severity};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Closed set of block types the registry knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockType {
    Prefix,
    Suffix,
    FindReplace,
    Compose,
    Regex,
}

impl BlockType {
    /// Every block type, in registry order
    pub const ALL: [BlockType; 5] = [
        BlockType::Prefix,
        BlockType::Suffix,
        BlockType::FindReplace,
        BlockType::Compose,
        BlockType::Regex,
    ];

    /// Wire name used in mapping documents
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Prefix => "prefix",
            BlockType::Suffix => "suffix",
            BlockType::FindReplace => "findReplace",
            BlockType::Compose => "compose",
            BlockType::Regex => "regex",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        BlockType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::unknown_block_type(s))
    }
}

/// Config for [`BlockType::Prefix`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefixConfig {
    pub text: String,
}

/// Config for [`BlockType::Suffix`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuffixConfig {
    pub text: String,
}

/// Config for [`BlockType::FindReplace`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FindReplaceConfig {
    /// Literal text to look for
    pub find: String,
    /// Literal replacement text
    pub replace: String,
    pub case_sensitive: bool,
    pub use_whole_word: bool,
}

/// Config for [`BlockType::Compose`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComposeConfig {
    /// Template with `{{value}}`, `{{field:<path>}}` and `{{wikidata:<QID>}}` tokens
    pub pattern: String,
    /// Record that `{{field:...}}` tokens resolve against; falls back to the
    /// source record handed to the chain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_data: Option<Value>,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            pattern: "{{value}}".to_string(),
            source_data: None,
        }
    }
}

/// Config for [`BlockType::Regex`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegexConfig {
    pub pattern: String,
    /// Flag letters; only `g`, `i`, `m`, `s` and `u` are honored
    pub flags: String,
    /// Replacement text, `$1` style back-references allowed
    pub replacement: String,
}

impl Default for RegexConfig {
    fn default() -> Self {
        Self {
            pattern: String::new(),
            flags: "g".to_string(),
            replacement: String::new(),
        }
    }
}

/// Typed block configuration, one variant per block type
#[derive(Debug, Clone, PartialEq)]
pub enum BlockConfig {
    Prefix(PrefixConfig),
    Suffix(SuffixConfig),
    FindReplace(FindReplaceConfig),
    Compose(ComposeConfig),
    Regex(RegexConfig),
    /// A block loaded from a document whose type this build does not know.
    /// Kept verbatim so it survives a load/export cycle.
    Unsupported { type_name: String, raw: Value },
    /// A registered type whose stored config does not fit it. Kept verbatim
    /// and passed through until an edit makes it valid.
    Invalid {
        block_type: BlockType,
        raw: Value,
        reason: String,
    },
}

impl BlockConfig {
    /// Default configuration for a block type
    pub fn default_for(block_type: BlockType) -> Self {
        match block_type {
            BlockType::Prefix => BlockConfig::Prefix(PrefixConfig::default()),
            BlockType::Suffix => BlockConfig::Suffix(SuffixConfig::default()),
            BlockType::FindReplace => BlockConfig::FindReplace(FindReplaceConfig::default()),
            BlockType::Compose => BlockConfig::Compose(ComposeConfig::default()),
            BlockType::Regex => BlockConfig::Regex(RegexConfig::default()),
        }
    }

    /// Build a typed config from a raw JSON object, defaults filling the gaps
    pub fn from_value(block_type: BlockType, raw: &Value) -> Result<Self> {
        Self::default_for(block_type).merge(raw)
    }

    /// Build a config from a type name that may not be registered.
    ///
    /// Unknown names become [`BlockConfig::Unsupported`] instead of failing.
    pub fn from_parts(type_name: &str, raw: &Value) -> Result<Self> {
        match type_name.parse::<BlockType>() {
            Ok(block_type) => Self::from_value(block_type, raw),
            Err(_) => Ok(BlockConfig::Unsupported {
                type_name: type_name.to_string(),
                raw: if raw.is_null() { Value::Object(Map::new()) } else { raw.clone() },
            }),
        }
    }

    /// Lenient form of [`BlockConfig::from_parts`] used when importing documents.
    ///
    /// A config that does not fit its type becomes [`BlockConfig::Invalid`]
    /// rather than an error.
    pub fn load(type_name: &str, raw: &Value) -> Self {
        match Self::from_parts(type_name, raw) {
            Ok(config) => config,
            Err(e) => {
                let reason = match e {
                    Error::InvalidBlockConfig { message, .. } => message,
                    other => other.to_string(),
                };
                match type_name.parse::<BlockType>() {
                    Ok(block_type) => BlockConfig::Invalid {
                        block_type,
                        raw: raw.clone(),
                        reason,
                    },
                    Err(_) => BlockConfig::Unsupported {
                        type_name: type_name.to_string(),
                        raw: raw.clone(),
                    },
                }
            }
        }
    }

    /// The registered type, or `None` for unsupported blocks
    pub fn block_type(&self) -> Option<BlockType> {
        match self {
            BlockConfig::Prefix(_) => Some(BlockType::Prefix),
            BlockConfig::Suffix(_) => Some(BlockType::Suffix),
            BlockConfig::FindReplace(_) => Some(BlockType::FindReplace),
            BlockConfig::Compose(_) => Some(BlockType::Compose),
            BlockConfig::Regex(_) => Some(BlockType::Regex),
            BlockConfig::Invalid { block_type, .. } => Some(*block_type),
            BlockConfig::Unsupported { .. } => None,
        }
    }

    /// Type name as written in documents
    pub fn type_name(&self) -> &str {
        match self {
            BlockConfig::Unsupported { type_name, .. } => type_name,
            other => other.block_type().map(|t| t.as_str()).unwrap_or_default(),
        }
    }

    /// Serialize the inner config as a JSON object
    pub fn to_value(&self) -> Value {
        let value = match self {
            BlockConfig::Prefix(c) => serde_json::to_value(c),
            BlockConfig::Suffix(c) => serde_json::to_value(c),
            BlockConfig::FindReplace(c) => serde_json::to_value(c),
            BlockConfig::Compose(c) => serde_json::to_value(c),
            BlockConfig::Regex(c) => serde_json::to_value(c),
            BlockConfig::Unsupported { raw, .. } | BlockConfig::Invalid { raw, .. } => {
                return raw.clone()
            }
        };
        // Plain structs of strings, bools and JSON values always serialize
        value.unwrap_or_else(|_| Value::Object(Map::new()))
    }

    /// Merge a partial config over this one.
    ///
    /// `patch` must be a JSON object (or null, which changes nothing); keys it
    /// carries replace the current values and the result is re-validated
    /// against the block type. Null-valued keys keep the current value.
    pub fn merge(&self, patch: &Value) -> Result<Self> {
        let patch = match patch {
            Value::Null => return Ok(self.clone()),
            Value::Object(map) => map,
            other => {
                return Err(Error::invalid_config(
                    self.type_name(),
                    format!("config must be an object, got {}", json_kind(other)),
                ))
            }
        };

        let mut merged = match self.to_value() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in patch.iter().filter(|(_, v)| !v.is_null()) {
            merged.insert(key.clone(), value.clone());
        }
        let merged = Value::Object(merged);

        let invalid = |e: serde_json::Error| Error::invalid_config(self.type_name(), e.to_string());
        Ok(match self {
            BlockConfig::Prefix(_) => BlockConfig::Prefix(serde_json::from_value(merged).map_err(invalid)?),
            BlockConfig::Suffix(_) => BlockConfig::Suffix(serde_json::from_value(merged).map_err(invalid)?),
            BlockConfig::FindReplace(_) => {
                BlockConfig::FindReplace(serde_json::from_value(merged).map_err(invalid)?)
            }
            BlockConfig::Compose(_) => BlockConfig::Compose(serde_json::from_value(merged).map_err(invalid)?),
            BlockConfig::Regex(_) => BlockConfig::Regex(serde_json::from_value(merged).map_err(invalid)?),
            BlockConfig::Unsupported { type_name, .. } => BlockConfig::Unsupported {
                type_name: type_name.clone(),
                raw: merged,
            },
            BlockConfig::Invalid { block_type, .. } => BlockConfig::from_value(*block_type, &merged)?,
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Generate a fresh block identifier
pub fn generate_block_id() -> String {
    format!("block_{}", Uuid::new_v4().simple())
}

/// One configured transformation step owned by a mapping entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBlock", into = "RawBlock")]
pub struct TransformationBlock {
    /// Opaque identifier, stable across reorderings
    pub id: String,
    pub config: BlockConfig,
    /// Position hint; blocks without one sort as 0
    pub order: Option<i64>,
}

impl TransformationBlock {
    /// Create a block with a fresh id and no order
    pub fn new(config: BlockConfig) -> Self {
        Self {
            id: generate_block_id(),
            config,
            order: None,
        }
    }

    /// Set the order
    pub fn with_order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    /// Set the id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn block_type(&self) -> Option<BlockType> {
        self.config.block_type()
    }

    pub fn type_name(&self) -> &str {
        self.config.type_name()
    }

    /// Order used for sorting
    pub fn effective_order(&self) -> i64 {
        self.order.unwrap_or(0)
    }

    /// Merge an edit into the block's config, keeping id and order
    pub fn update_config(&mut self, patch: &Value) -> Result<()> {
        self.config = self.config.merge(patch)?;
        Ok(())
    }
}

/// Wire shape of a block: `{id?, type, config, order?}`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    config: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    order: Option<i64>,
}

impl TryFrom<RawBlock> for TransformationBlock {
    type Error = Error;

    fn try_from(raw: RawBlock) -> Result<Self> {
        let config = BlockConfig::from_parts(&raw.block_type, &raw.config)?;
        Ok(Self {
            id: raw.id.unwrap_or_else(generate_block_id),
            config,
            order: raw.order,
        })
    }
}

impl From<TransformationBlock> for RawBlock {
    fn from(block: TransformationBlock) -> Self {
        Self {
            id: Some(block.id),
            block_type: block.config.type_name().to_string(),
            config: block.config.to_value(),
            order: block.order,
        }
    }
}

/// One entry of a chain trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationStep {
    /// Value after this step
    pub value: String,
    /// Block that produced the value; `None` for the initial value
    pub block_id: Option<String>,
}

impl TransformationStep {
    pub fn initial(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            block_id: None,
        }
    }

    pub fn from_block(value: impl Into<String>, block_id: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            block_id: Some(block_id.into()),
        }
    }
}

/// What went wrong (or was adjusted) inside a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    /// Regex pattern failed to compile; value passed through
    InvalidPattern,
    /// Regex flags outside `gimsu` were ignored
    DroppedFlags,
    /// Block type is not registered; value passed through
    UnsupportedBlockType,
    /// Stored config does not fit the block type; value passed through
    InvalidConfig,
}

/// Structured report of a degraded block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub block_id: String,
    pub block_type: String,
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
}

/// Context a chain run threads through every block
#[derive(Debug, Clone, Default)]
pub struct TransformationContext<'a> {
    /// Record `{{field:...}}` tokens resolve against when the block has none
    pub source_data: Option<&'a Value>,
    /// Diagnostics reported so far, in block order
    pub diagnostics: Vec<Diagnostic>,
}

impl<'a> TransformationContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(source_data: &'a Value) -> Self {
        Self {
            source_data: Some(source_data),
            diagnostics: Vec::new(),
        }
    }

    /// Record a diagnostic for `block` and mirror it to the log
    pub fn report(
        &mut self,
        block: &TransformationBlock,
        kind: DiagnosticKind,
        severity: Severity,
        message: impl Into<String>,
    ) {
        let message = message.into();
        match severity {
            Severity::Warning => log::warn!("Block '{}' ({}): {}", block.id, block.type_name(), message),
            Severity::Info => log::info!("Block '{}' ({}): {}", block.id, block.type_name(), message),
        }
        self.diagnostics.push(Diagnostic {
            block_id: block.id.clone(),
            block_type: block.type_name().to_string(),
            severity,
            kind,
            message,
        });
    }
}
