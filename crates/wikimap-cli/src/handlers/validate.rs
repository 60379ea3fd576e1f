//! Validate command handler
//!
//! Dry-runs every mapping entry so regex patterns, flags and unsupported
//! block types are reported before the mapping is applied to real items.

use crate::cli::{OutputFormat, ValidateArgs};
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, instrument};
use wikimap_core::{Diagnostic, MappingDocument, Severity};

use super::utils::load_mapping_document;

/// Value fed through each chain; diagnostics do not depend on it
const SAMPLE_VALUE: &str = "sample";

/// A diagnostic together with the mapping entry it came from
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub key: String,
    #[serde(flatten)]
    pub diagnostic: Diagnostic,
}

/// Summary of a validation run
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub mappings: usize,
    pub blocks: usize,
    /// Keys that appear more than once; only the first entry is ever applied
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub duplicate_keys: Vec<String>,
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    /// Problems that make the mapping behave differently from its config
    pub fn problem_count(&self) -> usize {
        self.duplicate_keys.len()
            + self
                .findings
                .iter()
                .filter(|f| f.diagnostic.severity == Severity::Warning)
                .count()
    }
}

/// Dry-run every entry of `document`
pub fn validate_document(document: &MappingDocument) -> ValidationReport {
    let mut report = ValidationReport {
        mappings: document.mappings.len(),
        blocks: document.blocks().count(),
        ..ValidationReport::default()
    };

    let mut seen = HashSet::new();
    for entry in &document.mappings {
        if !seen.insert(entry.key.as_str()) && !report.duplicate_keys.contains(&entry.key) {
            report.duplicate_keys.push(entry.key.clone());
        }

        let trace = entry.run(SAMPLE_VALUE, None);
        report
            .findings
            .extend(trace.diagnostics.into_iter().map(|diagnostic| Finding {
                key: entry.key.clone(),
                diagnostic,
            }));
    }

    report
}

/// Handle the validate command
#[instrument(skip(output), fields(mapping = %args.mapping.display()))]
pub fn handle_validate(args: ValidateArgs, output: &mut OutputWriter) -> Result<()> {
    output.info(&format!("Validating mapping: {}", args.mapping.display()))?;

    let document = load_mapping_document(&args.mapping)?;
    let report = validate_document(&document);
    let problems = report.problem_count();
    info!(
        mappings = report.mappings,
        blocks = report.blocks,
        findings = report.findings.len(),
        problems,
        "Validation finished"
    );

    if output.format() == OutputFormat::Human {
        write_report_human(&report, output)?;
    } else {
        output.data(&report)?;
    }

    if problems == 0 {
        output.success(&format!(
            "✓ {} mapping(s) with {} block(s) are valid",
            report.mappings, report.blocks
        ))?;
        Ok(())
    } else if args.strict {
        output.error("✗ Mapping validation failed")?;
        Err(Error::ValidationFailed { count: problems })
    } else {
        output.warning(&format!(
            "{} problem(s) found; affected blocks will pass values through unchanged",
            problems
        ))?;
        Ok(())
    }
}

fn write_report_human(report: &ValidationReport, output: &mut OutputWriter) -> Result<()> {
    for key in &report.duplicate_keys {
        output.warning(&format!("Mapping key '{}' appears more than once", key))?;
    }

    let mut keys: Vec<&str> = Vec::new();
    for finding in &report.findings {
        if !keys.contains(&finding.key.as_str()) {
            keys.push(&finding.key);
        }
    }

    for key in keys {
        let diagnostics: Vec<Diagnostic> = report
            .findings
            .iter()
            .filter(|f| f.key == key)
            .map(|f| f.diagnostic.clone())
            .collect();
        output.section(key)?;
        output.diagnostics(&diagnostics)?;
    }

    Ok(())
}
