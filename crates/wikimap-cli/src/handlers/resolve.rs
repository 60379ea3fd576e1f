//! Resolve command handler

use crate::cli::{OutputFormat, ResolveArgs};
use crate::error::Result;
use crate::output::OutputWriter;
use serde::Serialize;
use tracing::debug;
use wikimap_core::{display_string, lookup_path, resolve_field_path};

use super::utils::read_structured;

/// Outcome of resolving one path
#[derive(Debug, Serialize)]
struct Resolution<'a> {
    path: &'a str,
    found: bool,
    value: String,
}

/// Handle the resolve command
pub fn handle_resolve(args: ResolveArgs, output: &mut OutputWriter) -> Result<()> {
    let record = read_structured(&args.record)?;
    let node = lookup_path(&record, &args.path);
    debug!(path = %args.path, found = node.is_some(), "Resolved field path");

    let value = if args.display {
        node.map(display_string).unwrap_or_default()
    } else {
        resolve_field_path(&record, &args.path)
    };

    if output.format() != OutputFormat::Human {
        return output.data(&Resolution {
            path: &args.path,
            found: node.is_some(),
            value,
        });
    }

    if node.is_none() {
        output.warning(&format!("No value at '{}'", args.path))?;
        return Ok(());
    }
    output.writeln(&value)
}
