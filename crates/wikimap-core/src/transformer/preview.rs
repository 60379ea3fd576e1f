//! Preview builder
//!
//! Turns a chain trace into the labeled, step-by-step structure an editor
//! shows next to a mapping.
//!
//! Copyright (c) 2025 Wikimap Team
//! Licensed under the Apache-2.0 license

use super::pipeline::apply_transformation_chain;
use super::registry::label_for;
use super::types::{Diagnostic, TransformationBlock};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Label of the first preview step
pub const ORIGINAL_LABEL: &str = "Original";

/// One labeled value state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewStep {
    pub index: usize,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_type: Option<String>,
    pub value: String,
    /// Whether this step's block altered the value
    pub changed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResult {
    pub steps: Vec<PreviewStep>,
    pub final_value: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl PreviewResult {
    /// Steps whose block changed the value
    pub fn changed_steps(&self) -> impl Iterator<Item = &PreviewStep> {
        self.steps.iter().filter(|s| s.changed)
    }
}

/// Build a preview of `blocks` applied to `value`.
///
/// An empty value produces no steps and an empty final value without running
/// the chain.
pub fn build_preview(value: &str, blocks: &[TransformationBlock], source: Option<&Value>) -> PreviewResult {
    if value.is_empty() {
        return PreviewResult::default();
    }

    let trace = apply_transformation_chain(value, blocks, source);
    let by_id: HashMap<&str, &TransformationBlock> = blocks.iter().map(|b| (b.id.as_str(), b)).collect();

    let mut steps = Vec::with_capacity(trace.steps.len());
    let mut previous: Option<&str> = None;
    for (index, step) in trace.steps.iter().enumerate() {
        let block = step.block_id.as_deref().and_then(|id| by_id.get(id).copied());
        let label = match block {
            Some(block) => label_for(block),
            None => ORIGINAL_LABEL.to_string(),
        };
        steps.push(PreviewStep {
            index,
            label,
            block_id: step.block_id.clone(),
            block_type: block.map(|b| b.type_name().to_string()),
            value: step.value.clone(),
            changed: previous.is_some_and(|p| p != step.value),
        });
        previous = Some(step.value.as_str());
    }

    let final_value = steps
        .last()
        .map(|s| s.value.clone())
        .unwrap_or_else(|| value.to_string());

    PreviewResult {
        steps,
        final_value,
        diagnostics: trace.diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transformer::registry::create_block;
    use serde_json::json;

    #[test]
    fn test_empty_value_short_circuits() {
        let blocks = vec![create_block("prefix", Some(&json!({"text": "x"}))).unwrap()];
        let preview = build_preview("", &blocks, None);
        assert!(preview.steps.is_empty());
        assert_eq!(preview.final_value, "");
    }

    #[test]
    fn test_labels_and_changes() {
        let blocks = vec![
            create_block("prefix", Some(&json!({"text": "Dr. "}))).unwrap(),
            create_block("suffix", None).unwrap(),
        ];
        let preview = build_preview("Smith", &blocks, None);

        assert_eq!(preview.steps.len(), 3);
        assert_eq!(preview.steps[0].label, ORIGINAL_LABEL);
        assert!(preview.steps[0].block_id.is_none());
        assert!(!preview.steps[0].changed);

        assert_eq!(preview.steps[1].label, "Add Prefix");
        assert_eq!(preview.steps[1].block_type.as_deref(), Some("prefix"));
        assert!(preview.steps[1].changed);

        assert_eq!(preview.steps[2].label, "Add Suffix");
        assert!(!preview.steps[2].changed);

        assert_eq!(preview.final_value, "Dr. Smith");
        assert_eq!(preview.changed_steps().count(), 1);
    }

    #[test]
    fn test_empty_chain_preview() {
        let preview = build_preview("value", &[], None);
        assert_eq!(preview.steps.len(), 1);
        assert_eq!(preview.final_value, "value");
    }

    #[test]
    fn test_serialized_shape() {
        let preview = build_preview("v", &[], None);
        let json = serde_json::to_value(&preview).unwrap();
        assert_eq!(
            json,
            json!({
                "steps": [{"index": 0, "label": "Original", "value": "v", "changed": false}],
                "finalValue": "v"
            })
        );
    }
}
