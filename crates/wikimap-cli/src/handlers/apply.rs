//! Apply command handler

use crate::cli::{ApplyArgs, OutputFormat};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, instrument};
use wikimap_core::{display_string, PropertyResult, Severity};

use super::utils::{load_mapping_document, read_structured, save_to};

/// Mapped values for one Omeka S item
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResult {
    /// `o:id` of the item, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// `o:title` of the item, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub properties: Vec<PropertyResult>,
}

impl ItemResult {
    fn heading(&self, position: usize) -> String {
        match (&self.title, &self.id) {
            (Some(title), Some(id)) => format!("{} (#{})", title, display_string(id)),
            (Some(title), None) => title.clone(),
            (None, Some(id)) => format!("Item #{}", display_string(id)),
            (None, None) => format!("Item {}", position + 1),
        }
    }

    fn warnings(&self) -> usize {
        self.properties
            .iter()
            .flat_map(|p| &p.values)
            .flat_map(|v| &v.diagnostics)
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }
}

/// Handle the apply command
#[instrument(skip(config, output), fields(mapping = %args.mapping))]
pub fn handle_apply(args: ApplyArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let timer = Timer::with_details("apply_command", &args.mapping);

    let mapping_path = config.resolve_mapping(&args.mapping)?;
    output.info(&format!("Using mapping {}", mapping_path.display()))?;
    let document = load_mapping_document(&mapping_path)?;

    let items = load_items(&args.items)?;
    let skip_empty = config.apply.skip_empty && !args.keep_empty;
    debug!(items = items.len(), skip_empty, "Applying mapping");

    let progress = output.progress_bar(items.len() as u64, "Applying mapping");
    let mut results = Vec::with_capacity(items.len());
    for item in &items {
        results.push(ItemResult {
            id: item.get("o:id").cloned(),
            title: item.get("o:title").and_then(Value::as_str).map(str::to_string),
            properties: document.apply_to_item(item, skip_empty),
        });
        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let warnings: usize = results.iter().map(ItemResult::warnings).sum();
    crate::log_with_request_id!(
        info,
        items = results.len(),
        warnings = warnings,
        elapsed_ms = timer.elapsed().as_millis() as u64,
        "Applied mapping"
    );

    if output.format() == OutputFormat::Human {
        for (position, result) in results.iter().enumerate() {
            output.section(&result.heading(position))?;
            output.property_results(&result.properties)?;
        }
        if warnings > 0 {
            output.warning(&format!(
                "{} value(s) passed through blocks that could not run",
                warnings
            ))?;
        }
    } else {
        output.data(&results)?;
    }

    if let Some(path) = args.save_to {
        save_to(&results, &path)?;
        output.success(&format!("✓ Results saved to {}", path.display()))?;
    }

    Ok(())
}

/// Items file: a single item object or an array of them
fn load_items(path: &Path) -> Result<Vec<Value>> {
    match read_structured(path)? {
        Value::Array(items) => Ok(items),
        item @ Value::Object(_) => Ok(vec![item]),
        _ => Err(Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "an Omeka S item or an array of items".to_string(),
        }),
    }
}
