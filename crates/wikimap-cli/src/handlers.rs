//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand.

mod apply;
mod blocks;
mod completions;
mod config;
mod preview;
mod resolve;
mod utils;
mod validate;

pub use apply::handle_apply;
pub use blocks::handle_blocks;
pub use completions::handle_completions;
pub use config::handle_config;
pub use preview::handle_preview;
pub use resolve::handle_resolve;
pub use validate::handle_validate;
