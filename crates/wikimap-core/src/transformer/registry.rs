//! Block registry
//!
//! Static metadata for every block type: label, icon, description and the
//! default configuration new blocks start from.
//!
//! Copyright (c) 2025 Wikimap Team
//! Licensed under the Apache-2.0 license

use crate::error::Result;
use super::types::{BlockConfig, BlockType, TransformationBlock};
use serde::Serialize;
use serde_json::Value;

/// Declarative description of a block type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDescriptor {
    pub block_type: BlockType,
    pub name: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
}

impl BlockDescriptor {
    /// A fresh copy of this type's default config
    pub fn default_config(&self) -> BlockConfig {
        BlockConfig::default_for(self.block_type)
    }
}

static DESCRIPTORS: [BlockDescriptor; 5] = [
    BlockDescriptor {
        block_type: BlockType::Prefix,
        name: "Add Prefix",
        icon: "⬅️",
        description: "Add text before the value",
    },
    BlockDescriptor {
        block_type: BlockType::Suffix,
        name: "Add Suffix",
        icon: "➡️",
        description: "Add text after the value",
    },
    BlockDescriptor {
        block_type: BlockType::FindReplace,
        name: "Find & Replace",
        icon: "🔍",
        description: "Replace every occurrence of a piece of text",
    },
    BlockDescriptor {
        block_type: BlockType::Compose,
        name: "Compose",
        icon: "🧩",
        description: "Build a new value from a template with field references",
    },
    BlockDescriptor {
        block_type: BlockType::Regex,
        name: "Regular Expression",
        icon: "⚙️",
        description: "Rewrite the value with a regular expression",
    },
];

/// All registered block types, in display order
pub fn descriptors() -> &'static [BlockDescriptor] {
    &DESCRIPTORS
}

/// Descriptor for a registered type
pub fn descriptor(block_type: BlockType) -> &'static BlockDescriptor {
    // DESCRIPTORS holds one entry per BlockType::ALL member, in the same order
    let index = BlockType::ALL
        .iter()
        .position(|t| *t == block_type)
        .unwrap_or_default();
    &DESCRIPTORS[index]
}

/// Descriptor for a type name, failing for unregistered names
pub fn lookup(type_name: &str) -> Result<&'static BlockDescriptor> {
    let block_type: BlockType = type_name.parse()?;
    Ok(descriptor(block_type))
}

/// Default config for a type name
pub fn get_default_config(type_name: &str) -> Result<BlockConfig> {
    Ok(lookup(type_name)?.default_config())
}

/// Create a block of the named type with `overrides` merged over the defaults.
///
/// The block gets a fresh id and no order.
pub fn create_block(type_name: &str, overrides: Option<&Value>) -> Result<TransformationBlock> {
    let descriptor = lookup(type_name)?;
    let config = match overrides {
        Some(patch) => descriptor.default_config().merge(patch)?,
        None => descriptor.default_config(),
    };
    tracing::debug!(block_type = type_name, "Created transformation block");
    Ok(TransformationBlock::new(config))
}

/// Human label for a block; unsupported blocks show their raw type name
pub fn label_for(block: &TransformationBlock) -> String {
    match block.block_type() {
        Some(block_type) => descriptor(block_type).name.to_string(),
        None => format!("Unsupported ({})", block.type_name()),
    }
}
