//! Chain executor
//!
//! Runs an ordered list of blocks over a value and records the value after
//! every block. Blocks are sorted by `order` (missing orders count as 0) with
//! ties kept in their original positions.
//!
//! Copyright (c) 2025 Wikimap Team
//! Licensed under the Apache-2.0 license

use super::applicator::apply_transformation;
use super::types::{Diagnostic, TransformationBlock, TransformationContext, TransformationStep};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of running a chain: one step per block after the initial value,
/// plus whatever the blocks reported along the way
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainTrace {
    pub steps: Vec<TransformationStep>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl ChainTrace {
    /// Value after the last block (the initial value for an empty chain)
    pub fn final_value(&self) -> &str {
        self.steps.last().map(|s| s.value.as_str()).unwrap_or_default()
    }

    /// Trace length, initial step included
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == crate::error::Severity::Warning)
    }
}

/// Blocks in execution order. The input is not modified.
pub fn sort_blocks(blocks: &[TransformationBlock]) -> Vec<&TransformationBlock> {
    let mut sorted: Vec<&TransformationBlock> = blocks.iter().collect();
    // sort_by_key is stable, equal orders keep their input positions
    sorted.sort_by_key(|b| b.effective_order());
    sorted
}

/// Run `blocks` over `initial_value`.
///
/// The first trace step is the untouched initial value with no block id; each
/// following step holds the output of one block in execution order. `source`
/// is the record `{{field:...}}` tokens resolve against when a compose block
/// carries none of its own.
#[tracing::instrument(skip_all, fields(blocks = blocks.len()))]
pub fn apply_transformation_chain(
    initial_value: &str,
    blocks: &[TransformationBlock],
    source: Option<&Value>,
) -> ChainTrace {
    let mut context = TransformationContext {
        source_data: source,
        diagnostics: Vec::new(),
    };

    let mut steps = Vec::with_capacity(blocks.len() + 1);
    steps.push(TransformationStep::initial(initial_value));

    let mut current = initial_value.to_string();
    for block in sort_blocks(blocks) {
        current = apply_transformation(&current, block, &mut context);
        tracing::trace!(block_id = %block.id, block_type = block.type_name(), value = %current, "Applied block");
        steps.push(TransformationStep::from_block(current.clone(), block.id.clone()));
    }

    if !context.diagnostics.is_empty() {
        tracing::debug!(count = context.diagnostics.len(), "Chain finished with diagnostics");
    }

    ChainTrace {
        steps,
        diagnostics: context.diagnostics,
    }
}

/// Reusable chain of blocks, kept sorted on insertion
#[derive(Debug, Clone, Default)]
pub struct TransformationChain {
    blocks: Vec<TransformationBlock>,
}

impl TransformationChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a block to the chain
    pub fn add_block(mut self, block: TransformationBlock) -> Self {
        self.blocks.push(block);
        self.blocks.sort_by_key(|b| b.effective_order());
        self
    }

    /// Add multiple blocks to the chain
    pub fn add_blocks<I>(mut self, blocks: I) -> Self
    where
        I: IntoIterator<Item = TransformationBlock>,
    {
        self.blocks.extend(blocks);
        self.blocks.sort_by_key(|b| b.effective_order());
        self
    }

    pub fn blocks(&self) -> &[TransformationBlock] {
        &self.blocks
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Run the chain and return the full trace
    pub fn run(&self, value: &str, source: Option<&Value>) -> ChainTrace {
        apply_transformation_chain(value, &self.blocks, source)
    }

    /// Run the chain and return only the final value
    pub fn transform(&self, value: &str, source: Option<&Value>) -> String {
        self.run(value, source).final_value().to_string()
    }
}

impl From<Vec<TransformationBlock>> for TransformationChain {
    fn from(blocks: Vec<TransformationBlock>) -> Self {
        Self::new().add_blocks(blocks)
    }
}
