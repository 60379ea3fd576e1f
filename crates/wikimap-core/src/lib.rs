//! Wikimap Core - Value transformation engine for Omeka S to Wikidata mappings
//!
//! This crate holds the part of the mapper that does not depend on any UI:
//! block chains that rewrite a field value step by step, the resolver that pulls
//! display strings out of nested Omeka S records, and the exported mapping
//! document format.
//!
//! # Main Components
//!
//! - **Error Handling**: Construction errors using `thiserror`; run-time
//!   degradations surface as [`Diagnostic`] values
//! - **Transformer**: Block registry, applicators, chain executor and previews
//! - **Field Paths**: Dot-separated lookups into nested records
//! - **Mappings**: Mapping entries, documents and item application
//!
//! # Example
//!
//! ```
//! use wikimap_core::{apply_transformation_chain, create_block, Result};
//! use serde_json::json;
//!
//! fn example() -> Result<()> {
//!     let blocks = vec![
//!         create_block("compose", Some(&json!({"pattern": "{{value}} ({{field:date}})"})))?,
//!     ];
//!     let record = json!({"date": "1642"});
//!     let trace = apply_transformation_chain("The Night Watch", &blocks, Some(&record));
//!     assert_eq!(trace.final_value(), "The Night Watch (1642)");
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub mod error;
pub mod field_path;
pub mod mapping;
pub mod transformer;

// Re-export main types for convenience
pub use error::{Error, Result, Severity};
pub use field_path::{display_string, extract_display_value, lookup_path, resolve_field_path};
pub use mapping::{
    AppliedValue, MappingDocument, MappingEntry, PropertyResult, WikidataProperty,
    MAPPING_FORMAT_VERSION,
};
pub use transformer::{
    apply_transformation, apply_transformation_chain, build_preview, create_block, descriptors,
    get_default_config, BlockConfig, BlockDescriptor, BlockType, ChainTrace, Diagnostic,
    DiagnosticKind, PreviewResult, PreviewStep, TransformationBlock, TransformationBlockBuilder,
    TransformationChain, TransformationStep,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
