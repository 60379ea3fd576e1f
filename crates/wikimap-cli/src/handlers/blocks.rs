//! Blocks command handler

use crate::cli::{BlocksArgs, OutputFormat};
use crate::error::Result;
use crate::output::{descriptor_rows, OutputWriter};
use serde_json::{json, Value};
use wikimap_core::{descriptors, BlockDescriptor, BlockType};

/// Handle the blocks command
pub fn handle_blocks(args: BlocksArgs, output: &mut OutputWriter) -> Result<()> {
    let selected: Vec<BlockDescriptor> = match &args.block_type {
        Some(name) => {
            let block_type: BlockType = name.parse()?;
            descriptors()
                .iter()
                .filter(|d| d.block_type == block_type)
                .copied()
                .collect()
        }
        None => descriptors().to_vec(),
    };

    if output.format() == OutputFormat::Human {
        output.table(
            &["Type", "Name", "Description", "Default config"],
            descriptor_rows(&selected),
        )
    } else {
        let listing: Vec<Value> = selected.iter().map(describe).collect();
        output.data(&listing)
    }
}

fn describe(descriptor: &BlockDescriptor) -> Value {
    json!({
        "type": descriptor.block_type.as_str(),
        "name": descriptor.name,
        "icon": descriptor.icon,
        "description": descriptor.description,
        "defaultConfig": descriptor.default_config().to_value(),
    })
}
