//! Mapping entries and exported mapping documents
//!
//! A [`MappingEntry`] ties one Omeka S property key (e.g. `dcterms:creator`) to
//! a Wikidata property and owns the block chain that rewrites its values. A
//! [`MappingDocument`] is the JSON file users export and re-import: blocks are
//! written as bare `{type, config}` pairs in execution order, and get fresh ids
//! and positional orders when loaded back.
//!
//! Copyright (c) 2025 Wikimap Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::field_path::display_string;
use crate::transformer::{
    apply_transformation_chain, build_preview, create_block, sort_blocks, ChainTrace, Diagnostic,
    PreviewResult, TransformationBlock,
};
use crate::transformer::types::{generate_block_id, BlockConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

/// Version string written into exported documents
pub const MAPPING_FORMAT_VERSION: &str = "1.0";

/// Target Wikidata property of a mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikidataProperty {
    /// Property id, e.g. `P50`
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
}

/// One Omeka key mapped to a Wikidata property, with its block chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<WikidataProperty>,
    #[serde(default)]
    pub blocks: Vec<TransformationBlock>,
}

impl MappingEntry {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            property: None,
            blocks: Vec::new(),
        }
    }

    pub fn with_property(mut self, property: WikidataProperty) -> Self {
        self.property = Some(property);
        self
    }

    /// Append a block. Blocks without an order are placed after the current last block.
    pub fn add_block(&mut self, mut block: TransformationBlock) -> &TransformationBlock {
        if block.order.is_none() {
            block.order = Some(self.next_order());
        }
        self.blocks.push(block);
        let last = self.blocks.len() - 1;
        &self.blocks[last]
    }

    /// Create a block from the registry and append it
    pub fn add_block_of_type(&mut self, type_name: &str, overrides: Option<&Value>) -> Result<&TransformationBlock> {
        let block = create_block(type_name, overrides)?;
        Ok(self.add_block(block))
    }

    pub fn block(&self, id: &str) -> Option<&TransformationBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }

    /// Merge an edit into a block's config
    pub fn update_block(&mut self, id: &str, patch: &Value) -> Result<()> {
        let block = self
            .blocks
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| Error::BlockNotFound { id: id.to_string() })?;
        block.update_config(patch)
    }

    /// Remove a block and return it
    pub fn remove_block(&mut self, id: &str) -> Result<TransformationBlock> {
        let index = self
            .blocks
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| Error::BlockNotFound { id: id.to_string() })?;
        Ok(self.blocks.remove(index))
    }

    /// Move a block to `to_index` in execution order.
    ///
    /// Every block is renumbered `1..=n` afterwards; ids do not change. An index
    /// past the end moves the block last.
    pub fn move_block(&mut self, id: &str, to_index: usize) -> Result<()> {
        let mut ordered: Vec<TransformationBlock> =
            sort_blocks(&self.blocks).into_iter().cloned().collect();
        let from = ordered
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| Error::BlockNotFound { id: id.to_string() })?;

        let moved = ordered.remove(from);
        let to_index = to_index.min(ordered.len());
        ordered.insert(to_index, moved);
        renumber(&mut ordered);
        self.blocks = ordered;
        Ok(())
    }

    /// Blocks in execution order
    pub fn sorted_blocks(&self) -> Vec<&TransformationBlock> {
        sort_blocks(&self.blocks)
    }

    /// Run the entry's chain over `value`
    pub fn run(&self, value: &str, source: Option<&Value>) -> ChainTrace {
        apply_transformation_chain(value, &self.blocks, source)
    }

    /// Preview the entry's chain over `value`
    pub fn preview(&self, value: &str, source: Option<&Value>) -> PreviewResult {
        build_preview(value, &self.blocks, source)
    }

    fn next_order(&self) -> i64 {
        self.blocks
            .iter()
            .map(TransformationBlock::effective_order)
            .max()
            .map_or(1, |max| max + 1)
    }
}

fn renumber(blocks: &mut [TransformationBlock]) {
    for (position, block) in blocks.iter_mut().enumerate() {
        block.order = Some(position as i64 + 1);
    }
}

/// The values one mapping produced for an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyResult {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<WikidataProperty>,
    pub values: Vec<AppliedValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedValue {
    /// Display string taken from the item
    pub original: String,
    /// Value after the chain ran
    pub value: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Exported set of mappings
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MappingDocument {
    /// Carried through untouched
    pub version: String,
    pub exported_at: Option<DateTime<Utc>>,
    pub mappings: Vec<MappingEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentWire {
    #[serde(default)]
    version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exported_at: Option<DateTime<Utc>>,
    #[serde(default)]
    mappings: Vec<EntryWire>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EntryWire {
    key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    property: Option<WikidataProperty>,
    #[serde(default)]
    blocks: Vec<BlockWire>,
}

/// Exported block: `{type, config}`. `order` is only read, to sort older
/// documents that still carry it.
#[derive(Debug, Serialize, Deserialize)]
struct BlockWire {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    config: Value,
    #[serde(default, skip_serializing)]
    order: Option<i64>,
}

impl MappingDocument {
    pub fn new(mappings: Vec<MappingEntry>) -> Self {
        Self {
            version: MAPPING_FORMAT_VERSION.to_string(),
            exported_at: None,
            mappings,
        }
    }

    pub fn entry(&self, key: &str) -> Option<&MappingEntry> {
        self.mappings.iter().find(|m| m.key == key)
    }

    pub fn entry_mut(&mut self, key: &str) -> Option<&mut MappingEntry> {
        self.mappings.iter_mut().find(|m| m.key == key)
    }

    /// Add an entry, replacing any existing entry for the same key
    pub fn insert_entry(&mut self, entry: MappingEntry) {
        match self.entry_mut(&entry.key) {
            Some(existing) => *existing = entry,
            None => self.mappings.push(entry),
        }
    }

    /// All blocks across every entry
    pub fn blocks(&self) -> impl Iterator<Item = &TransformationBlock> {
        self.mappings.iter().flat_map(|m| m.blocks.iter())
    }

    /// Export to a JSON value, stamping `exportedAt` with the current time
    pub fn to_value(&self) -> Result<Value> {
        let wire = DocumentWire {
            version: if self.version.is_empty() {
                MAPPING_FORMAT_VERSION.to_string()
            } else {
                self.version.clone()
            },
            exported_at: Some(Utc::now()),
            mappings: self
                .mappings
                .iter()
                .map(|entry| EntryWire {
                    key: entry.key.clone(),
                    property: entry.property.clone(),
                    blocks: entry
                        .sorted_blocks()
                        .into_iter()
                        .map(|block| BlockWire {
                            block_type: block.type_name().to_string(),
                            config: block.config.to_value(),
                            order: None,
                        })
                        .collect(),
                })
                .collect(),
        };
        Ok(serde_json::to_value(wire)?)
    }

    /// Export as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_value()?)?)
    }

    /// Import from a JSON value.
    ///
    /// Blocks are ordered by any `order` they carry, then renumbered `1..n`.
    /// Unknown block types load as unsupported blocks and configs that do not
    /// fit their type load as invalid blocks; both pass values through.
    pub fn from_value(value: Value) -> Result<Self> {
        let wire: DocumentWire = serde_json::from_value(value)?;
        let mut mappings = Vec::with_capacity(wire.mappings.len());

        for entry in wire.mappings {
            let mut blocks: Vec<TransformationBlock> = entry
                .blocks
                .into_iter()
                .map(|b| TransformationBlock {
                    id: generate_block_id(),
                    config: BlockConfig::load(&b.block_type, &b.config),
                    order: b.order,
                })
                .collect();

            blocks.sort_by_key(TransformationBlock::effective_order);
            renumber(&mut blocks);

            mappings.push(MappingEntry {
                key: entry.key,
                property: entry.property,
                blocks,
            });
        }

        log::debug!("Loaded mapping document with {} mappings", mappings.len());
        Ok(Self {
            version: wire.version,
            exported_at: wire.exported_at,
            mappings,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Read a document from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::Io {
            message: format!("failed to read {}: {}", path.display(), e),
            source: e,
        })?;
        Self::from_json(&content)
    }

    /// Write the exported form to disk
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|e| Error::Io {
            message: format!("failed to write {}: {}", path.display(), e),
            source: e,
        })
    }

    /// Run every mapping whose key is present on an Omeka item.
    ///
    /// Each value of the property is turned into its display string and run
    /// through the entry's chain with the whole item as the source record. With
    /// `skip_empty`, values whose display string is empty are left out. When a
    /// key appears more than once only its first entry is applied.
    #[tracing::instrument(skip_all, fields(mappings = self.mappings.len()))]
    pub fn apply_to_item(&self, item: &Value, skip_empty: bool) -> Vec<PropertyResult> {
        let mut results = Vec::new();
        let mut seen = HashSet::new();

        for entry in &self.mappings {
            if !seen.insert(entry.key.as_str()) {
                continue;
            }
            let Some(raw) = item.get(&entry.key) else {
                continue;
            };
            let samples: Vec<&Value> = match raw {
                Value::Array(items) => items.iter().collect(),
                other => vec![other],
            };

            let values: Vec<AppliedValue> = samples
                .into_iter()
                .map(display_string)
                .filter(|original| !(skip_empty && original.is_empty()))
                .map(|original| {
                    let trace = entry.run(&original, Some(item));
                    AppliedValue {
                        value: trace.final_value().to_string(),
                        diagnostics: trace.diagnostics,
                        original,
                    }
                })
                .collect();

            if !values.is_empty() {
                results.push(PropertyResult {
                    key: entry.key.clone(),
                    property: entry.property.clone(),
                    values,
                });
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transformer::TransformationBlockBuilder;
    use serde_json::json;

    fn entry_with_three() -> (MappingEntry, Vec<String>) {
        let mut entry = MappingEntry::new("dcterms:title");
        let ids = ["<", "-", ">"]
            .iter()
            .map(|t| entry.add_block_of_type("suffix", Some(&json!({"text": t}))).unwrap().id.clone())
            .collect();
        (entry, ids)
    }

    #[test]
    fn test_add_block_appends() {
        let (entry, _) = entry_with_three();
        let orders: Vec<Option<i64>> = entry.blocks.iter().map(|b| b.order).collect();
        assert_eq!(orders, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(entry.run("", None).final_value(), "<->");
    }

    #[test]
    fn test_move_block_renumbers() {
        let (mut entry, ids) = entry_with_three();
        entry.move_block(&ids[2], 0).unwrap();

        assert_eq!(entry.run("", None).final_value(), "><-");
        let sorted: Vec<&str> = entry.sorted_blocks().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(sorted, vec![ids[2].as_str(), ids[0].as_str(), ids[1].as_str()]);
        assert_eq!(entry.blocks[0].order, Some(1));

        entry.move_block(&ids[2], 99).unwrap();
        assert_eq!(entry.run("", None).final_value(), "<->");
    }

    #[test]
    fn test_update_and_remove() {
        let (mut entry, ids) = entry_with_three();
        entry.update_block(&ids[1], &json!({"text": "+"})).unwrap();
        assert_eq!(entry.run("", None).final_value(), "<+>");

        let removed = entry.remove_block(&ids[0]).unwrap();
        assert_eq!(removed.id, ids[0]);
        assert_eq!(entry.run("", None).final_value(), "+>");

        assert!(matches!(entry.remove_block("nope"), Err(Error::BlockNotFound { .. })));
        assert!(matches!(entry.move_block("nope", 0), Err(Error::BlockNotFound { .. })));
        assert!(matches!(
            entry.update_block("nope", &json!({})),
            Err(Error::BlockNotFound { .. })
        ));
    }

    #[test]
    fn test_export_writes_type_and_config_only() {
        let mut entry = MappingEntry::new("dcterms:date");
        entry.add_block(TransformationBlockBuilder::suffix(")").order(2).build().unwrap());
        entry.add_block(TransformationBlockBuilder::prefix("(").order(1).build().unwrap());

        let exported = MappingDocument::new(vec![entry]).to_value().unwrap();
        assert_eq!(exported["version"], "1.0");
        assert!(exported["exportedAt"].is_string());
        assert_eq!(
            exported["mappings"][0]["blocks"],
            json!([
                {"type": "prefix", "config": {"text": "("}},
                {"type": "suffix", "config": {"text": ")"}}
            ])
        );
    }

    #[test]
    fn test_import_regenerates_ids_and_orders() {
        let doc = MappingDocument::from_value(json!({
            "version": "0.9-beta",
            "mappings": [{
                "key": "dcterms:creator",
                "property": {"id": "P170", "label": "creator"},
                "blocks": [
                    {"id": "old", "type": "suffix", "config": {"text": "!"}},
                    {"type": "reverse", "config": {"keep": true}}
                ]
            }]
        }))
        .unwrap();

        assert_eq!(doc.version, "0.9-beta");
        let entry = doc.entry("dcterms:creator").unwrap();
        assert_ne!(entry.blocks[0].id, "old");
        assert_eq!(entry.blocks[0].order, Some(1));
        assert_eq!(entry.blocks[1].order, Some(2));
        assert_eq!(entry.blocks[1].type_name(), "reverse");
        assert_eq!(entry.property.as_ref().map(|p| p.id.as_str()), Some("P170"));
    }

    #[test]
    fn test_import_keeps_mistyped_config_as_invalid_block() {
        let doc = MappingDocument::from_value(json!({
            "version": "1.0",
            "mappings": [{"key": "k", "blocks": [
                {"type": "findReplace", "config": {"caseSensitive": "yes", "find": "a"}},
                {"type": "suffix", "config": {"text": "!"}}
            ]}]
        }))
        .unwrap();

        let entry = doc.entry("k").unwrap();
        assert!(matches!(entry.blocks[0].config, BlockConfig::Invalid { .. }));
        assert_eq!(entry.blocks[0].type_name(), "findReplace");

        let trace = entry.run("banana", None);
        assert_eq!(trace.final_value(), "banana!");
        assert_eq!(trace.diagnostics.len(), 1);
        assert_eq!(trace.diagnostics[0].kind, crate::DiagnosticKind::InvalidConfig);

        // the raw config is exported as written
        let exported = doc.to_value().unwrap();
        assert_eq!(exported["mappings"][0]["blocks"][0]["config"]["caseSensitive"], "yes");
    }

    #[test]
    fn test_editing_invalid_block_makes_it_valid() {
        let mut doc = MappingDocument::from_value(json!({
            "mappings": [{"key": "k", "blocks": [{"type": "prefix", "config": {"text": 5}}]}]
        }))
        .unwrap();
        let entry = doc.entry_mut("k").unwrap();
        let id = entry.blocks[0].id.clone();

        assert!(entry.update_block(&id, &json!({"text": false})).is_err());
        entry.update_block(&id, &json!({"text": "> "})).unwrap();
        assert!(matches!(entry.blocks[0].config, BlockConfig::Prefix(_)));
        assert_eq!(entry.run("v", None).final_value(), "> v");
    }

    #[test]
    fn test_null_config_fields_keep_defaults() {
        let doc = MappingDocument::from_value(json!({
            "mappings": [{"key": "k", "blocks": [{"type": "findReplace", "config": {"find": "a", "replace": null}}]}]
        }))
        .unwrap();
        let entry = doc.entry("k").unwrap();
        assert!(matches!(entry.blocks[0].config, BlockConfig::FindReplace(_)));
        assert_eq!(entry.run("banana", None).final_value(), "bnn");
    }

    #[test]
    fn test_duplicate_key_applies_first_entry_only() {
        let mut first = MappingEntry::new("t");
        first.add_block(TransformationBlockBuilder::suffix("1").build().unwrap());
        let mut second = MappingEntry::new("t");
        second.add_block(TransformationBlockBuilder::suffix("2").build().unwrap());
        let doc = MappingDocument::new(vec![first, second]);

        let results = doc.apply_to_item(&json!({"t": "v"}), true);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].values[0].value, "v1");
    }

    #[test]
    fn test_apply_to_item() {
        let mut entry = MappingEntry::new("dcterms:creator");
        entry.add_block(TransformationBlockBuilder::compose("{{value}} ({{field:o:id}})").build().unwrap());
        let doc = MappingDocument::new(vec![entry, MappingEntry::new("dcterms:missing")]);

        let item = json!({
            "o:id": 7,
            "dcterms:creator": [
                {"type": "literal", "@value": "Vermeer"},
                {"type": "literal", "@value": ""}
            ]
        });

        let results = doc.apply_to_item(&item, true);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].values.len(), 1);
        assert_eq!(results[0].values[0].original, "Vermeer");
        assert_eq!(results[0].values[0].value, "Vermeer (7)");

        let results = doc.apply_to_item(&item, false);
        assert_eq!(results[0].values.len(), 2);
        assert_eq!(results[0].values[1].value, " (7)");
    }
}
