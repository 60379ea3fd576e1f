//! Builder for creating transformation blocks
//!
//! Fluent construction of typed blocks in code, without going through a JSON
//! override object. Setters that do not apply to the chosen block type are
//! reported by [`TransformationBlockBuilder::build`].
//!
//! Copyright (c) 2025 Wikimap Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use super::types::{
    generate_block_id, BlockConfig, ComposeConfig, FindReplaceConfig, PrefixConfig, RegexConfig,
    SuffixConfig, TransformationBlock,
};
use serde_json::Value;

/// Builder for creating transformation blocks
#[derive(Debug, Clone)]
pub struct TransformationBlockBuilder {
    id: Option<String>,
    order: Option<i64>,
    config: BlockConfig,
    misuse: Option<String>,
}

impl TransformationBlockBuilder {
    fn with_config(config: BlockConfig) -> Self {
        Self {
            id: None,
            order: None,
            config,
            misuse: None,
        }
    }

    /// Prefix block adding `text` before the value
    pub fn prefix(text: impl Into<String>) -> Self {
        Self::with_config(BlockConfig::Prefix(PrefixConfig { text: text.into() }))
    }

    /// Suffix block adding `text` after the value
    pub fn suffix(text: impl Into<String>) -> Self {
        Self::with_config(BlockConfig::Suffix(SuffixConfig { text: text.into() }))
    }

    /// Literal find and replace, case-insensitive unless changed
    pub fn find_replace(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self::with_config(BlockConfig::FindReplace(FindReplaceConfig {
            find: find.into(),
            replace: replace.into(),
            ..Default::default()
        }))
    }

    /// Compose block rendering `pattern`
    pub fn compose(pattern: impl Into<String>) -> Self {
        Self::with_config(BlockConfig::Compose(ComposeConfig {
            pattern: pattern.into(),
            source_data: None,
        }))
    }

    /// Regex block with the default `g` flag
    pub fn regex(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self::with_config(BlockConfig::Regex(RegexConfig {
            pattern: pattern.into(),
            replacement: replacement.into(),
            ..Default::default()
        }))
    }

    /// Set the block id instead of generating one
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the order
    pub fn order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    /// Match case exactly (find/replace only)
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        match &mut self.config {
            BlockConfig::FindReplace(config) => config.case_sensitive = case_sensitive,
            _ => self.record_misuse("case_sensitive"),
        }
        self
    }

    /// Only match whole words (find/replace only)
    pub fn whole_word(mut self, use_whole_word: bool) -> Self {
        match &mut self.config {
            BlockConfig::FindReplace(config) => config.use_whole_word = use_whole_word,
            _ => self.record_misuse("whole_word"),
        }
        self
    }

    /// Replace the flag string (regex only)
    pub fn flags(mut self, flags: impl Into<String>) -> Self {
        match &mut self.config {
            BlockConfig::Regex(config) => config.flags = flags.into(),
            _ => self.record_misuse("flags"),
        }
        self
    }

    /// Record `{{field:...}}` tokens resolve against (compose only)
    pub fn source_data(mut self, source_data: Value) -> Self {
        match &mut self.config {
            BlockConfig::Compose(config) => config.source_data = Some(source_data),
            _ => self.record_misuse("source_data"),
        }
        self
    }

    fn record_misuse(&mut self, setter: &str) {
        if self.misuse.is_none() {
            self.misuse = Some(format!("'{}' does not apply to this block type", setter));
        }
    }

    /// Build the transformation block
    pub fn build(self) -> Result<TransformationBlock> {
        if let Some(message) = self.misuse {
            return Err(Error::invalid_config(self.config.type_name(), message));
        }

        Ok(TransformationBlock {
            id: self.id.unwrap_or_else(generate_block_id),
            config: self.config,
            order: self.order,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_fields() {
        let block = TransformationBlockBuilder::find_replace(" ", "_")
            .id("spaces")
            .order(3)
            .case_sensitive(true)
            .whole_word(true)
            .build()
            .unwrap();

        assert_eq!(block.id, "spaces");
        assert_eq!(block.order, Some(3));
        match block.config {
            BlockConfig::FindReplace(config) => {
                assert!(config.case_sensitive);
                assert!(config.use_whole_word);
            }
            other => panic!("unexpected config: {:?}", other),
        }
    }

    #[test]
    fn test_builder_generates_id() {
        let block = TransformationBlockBuilder::prefix("a").build().unwrap();
        assert!(block.id.starts_with("block_"));
        assert!(block.order.is_none());
    }

    #[test]
    fn test_mismatched_setter_fails_build() {
        let err = TransformationBlockBuilder::prefix("a").flags("i").build().unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidBlockConfig { ref block_type, .. } if block_type == "prefix"
        ));
    }
}
