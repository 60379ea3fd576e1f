//! Block transformation system for rewriting Omeka S values before they go to Wikidata
//!
//! A mapping entry owns an ordered chain of small text-rewrite blocks (prefix,
//! suffix, find/replace, template composition, regex). Running the chain over
//! a value yields every intermediate value, so an editor can show what each
//! block did.
//!
//! # Module Organization
//!
//! - [`types`] - Block types, typed configs, trace steps and diagnostics
//! - [`registry`] - Labels, icons and default configs per block type
//! - [`applicator`] - One pure function per block type and the dispatcher
//! - [`pipeline`] - Chain execution and traces
//! - [`preview`] - Labeled step-by-step previews
//! - [`builder`] - Fluent builder for blocks
//!
//! # Examples
//!
//! ```
//! use wikimap_core::transformer::{apply_transformation_chain, TransformationBlockBuilder};
//!
//! let blocks = vec![
//!     TransformationBlockBuilder::prefix("Dr. ").order(1).build().unwrap(),
//!     TransformationBlockBuilder::suffix(", PhD").order(2).build().unwrap(),
//! ];
//!
//! let trace = apply_transformation_chain("John Smith", &blocks, None);
//! assert_eq!(trace.final_value(), "Dr. John Smith, PhD");
//! assert_eq!(trace.len(), 3);
//! ```
//!
//! Copyright (c) 2025 Wikimap Team
//! Licensed under the Apache-2.0 license

// Core types
pub mod types;

// Block metadata and construction
pub mod registry;

// Per-type block functions
pub mod applicator;

// Chain execution
pub mod pipeline;

// UI-facing previews
pub mod preview;

// Block builder API
pub mod builder;


pub use applicator::apply_transformation;
pub use builder::TransformationBlockBuilder;
pub use pipeline::{apply_transformation_chain, sort_blocks, ChainTrace, TransformationChain};
pub use preview::{build_preview, PreviewResult, PreviewStep};
pub use registry::{create_block, descriptors, get_default_config, label_for, BlockDescriptor};
pub use types::{
    BlockConfig, BlockType, Diagnostic, DiagnosticKind, TransformationBlock, TransformationContext,
    TransformationStep,
};
