//! Preview command handler

use crate::cli::PreviewArgs;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use serde_json::{json, Value};
use std::path::Path;
use tracing::{debug, info, instrument};
use wikimap_core::{build_preview, MappingDocument, TransformationBlock};

use super::utils::{read_structured, save_to};

/// Handle the preview command
#[instrument(skip(output), fields(blocks = %args.blocks.display()))]
pub fn handle_preview(args: PreviewArgs, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details("preview_command", &args.blocks.display().to_string());
    info!("Starting preview operation");

    let blocks = {
        let _load_timer = Timer::new("block_loading");
        load_blocks(&args.blocks)?
    };
    debug!(count = blocks.len(), "Loaded blocks");

    let source = match &args.source {
        Some(path) => Some(read_structured(path)?),
        None => None,
    };

    let progress = output.spinner("Running blocks...");
    let preview = build_preview(&args.value, &blocks, source.as_ref());
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    info!(
        steps = preview.steps.len(),
        diagnostics = preview.diagnostics.len(),
        "Preview completed"
    );

    output.preview(&preview)?;

    if let Some(output_file) = args.output_file {
        save_to(&preview, &output_file)?;
        output.success(&format!("✓ Preview saved to {}", output_file.display()))?;
    }

    Ok(())
}

/// Load the blocks to preview.
///
/// Accepts a list of exported blocks (`{type, config}`) or a single mapping
/// entry with a `blocks` list. Both go through the mapping importer so block
/// ids and orders are assigned the same way as for full documents.
fn load_blocks(path: &Path) -> Result<Vec<TransformationBlock>> {
    let value = read_structured(path)?;
    blocks_from_value(value, path)
}

fn blocks_from_value(value: Value, path: &Path) -> Result<Vec<TransformationBlock>> {
    let entry = match value {
        Value::Array(blocks) => json!({"key": "preview", "blocks": blocks}),
        Value::Object(map) if map.contains_key("mappings") => {
            return Err(Error::invalid_args(format!(
                "{} is a full mapping document; pass a single entry or use `wikimap apply`",
                path.display()
            )));
        }
        Value::Object(mut map) if map.contains_key("blocks") => {
            map.entry("key").or_insert_with(|| json!("preview"));
            Value::Object(map)
        }
        _ => {
            return Err(Error::InvalidFormat {
                path: path.to_path_buf(),
                expected: "a list of blocks or a mapping entry".to_string(),
            })
        }
    };

    let document = MappingDocument::from_value(json!({ "mappings": [entry] }))?;
    Ok(document
        .mappings
        .into_iter()
        .next()
        .map(|entry| entry.blocks)
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> &'static Path {
        Path::new("chain.json")
    }

    #[test]
    fn test_blocks_from_list_keep_order() {
        let blocks = blocks_from_value(
            json!([
                {"type": "suffix", "config": {"text": "!"}, "order": 2},
                {"type": "prefix", "config": {"text": "> "}, "order": 1}
            ]),
            path(),
        )
        .unwrap();

        let preview = build_preview("hi", &blocks, None);
        assert_eq!(preview.final_value, "> hi!");
        assert_eq!(blocks[0].order, Some(1));
    }

    #[test]
    fn test_blocks_from_entry() {
        let blocks = blocks_from_value(
            json!({"key": "dcterms:title", "blocks": [{"type": "upper", "config": {}}]}),
            path(),
        )
        .unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].type_name(), "upper");
    }

    #[test]
    fn test_rejects_documents_and_scalars() {
        let err = blocks_from_value(json!({"mappings": []}), path()).unwrap_err();
        assert!(err.should_show_help());

        let err = blocks_from_value(json!("prefix"), path()).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat { .. }));
    }

    #[test]
    fn test_mistyped_config_previews_as_pass_through() {
        let blocks = blocks_from_value(
            json!([
                {"type": "prefix", "config": {"text": 5}},
                {"type": "suffix", "config": {"text": "!"}}
            ]),
            path(),
        )
        .unwrap();

        let preview = build_preview("hi", &blocks, None);
        assert_eq!(preview.final_value, "hi!");
        assert_eq!(preview.diagnostics.len(), 1);
        assert_eq!(preview.diagnostics[0].kind, wikimap_core::DiagnosticKind::InvalidConfig);
    }
}
