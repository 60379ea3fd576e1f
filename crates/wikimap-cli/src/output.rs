//! Output formatting and writing utilities
//!
//! This module provides utilities for formatting and writing output
//! in various formats (JSON, YAML, human-readable), with dedicated human
//! renderings for previews, applied mappings and block diagnostics.

use crate::cli::OutputFormat;
use crate::error::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::{self, IsTerminal, Write};
use std::time::Duration;
use tracing::{debug, trace};
use wikimap_core::{BlockDescriptor, Diagnostic, PreviewResult, PropertyResult, Severity};

/// Trait for formatting output with specialized support for common types
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format a step-by-step preview of a block chain
    fn format_preview(&self, preview: &PreviewResult) -> Result<String>;

    /// Format the values produced by applying a mapping to one item
    fn format_property_results(&self, results: &[PropertyResult]) -> Result<String>;

    /// Format diagnostics reported by degraded blocks
    fn format_diagnostics(&self, diagnostics: &[Diagnostic]) -> Result<String>;
}

impl OutputFormat {
    fn machine<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
            OutputFormat::JsonPretty | OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
        }
    }
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        // Human falls back to pretty JSON for values without a dedicated layout
        self.machine(value)
    }

    fn format_preview(&self, preview: &PreviewResult) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_preview_human(preview)),
            _ => self.machine(preview),
        }
    }

    fn format_property_results(&self, results: &[PropertyResult]) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_property_results_human(results)),
            _ => self.machine(results),
        }
    }

    fn format_diagnostics(&self, diagnostics: &[Diagnostic]) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_diagnostics_human(diagnostics)),
            _ => self.machine(diagnostics),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    show_progress: bool,
    quiet: bool,
    verbose: u8,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool, verbose: u8) -> Self {
        Self {
            format,
            use_color,
            show_progress: !quiet && io::stdout().is_terminal(),
            quiet,
            verbose,
            writer: Box::new(io::stdout()),
        }
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(
        format: OutputFormat,
        use_color: bool,
        quiet: bool,
        verbose: u8,
        writer: Box<dyn Write>,
    ) -> Self {
        Self {
            format,
            use_color,
            show_progress: false, // No progress bars with custom writers
            quiet,
            verbose,
            writer,
        }
    }

    /// Get the output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Turn progress indicators off, e.g. when the config file disables them
    pub fn disable_progress(&mut self) {
        self.show_progress = false;
    }

    /// Write raw output
    pub fn write(&mut self, content: &str) -> Result<()> {
        write!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        debug!("Output info: {}", message);

        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write an error message
    pub fn error(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.red().to_string())
        } else {
            self.writeln(&format!("ERROR: {}", message))
        }
    }

    /// Write a section header
    pub fn section(&mut self, title: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        self.writeln("")?;
        if self.use_color {
            self.writeln(&format!("═══ {} ═══", title).bright_blue().to_string())
        } else {
            self.writeln(&format!("=== {} ===", title))
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let formatted = self.format.format(value)?;
        trace!(bytes = formatted.len(), "Outputting data");
        self.emit(&formatted)
    }

    /// Write a chain preview
    pub fn preview(&mut self, preview: &PreviewResult) -> Result<()> {
        let formatted = self.format.format_preview(preview)?;
        self.emit(&formatted)
    }

    /// Write the results of applying a mapping to one item
    pub fn property_results(&mut self, results: &[PropertyResult]) -> Result<()> {
        let formatted = self.format.format_property_results(results)?;
        self.emit(&formatted)
    }

    /// Write block diagnostics
    pub fn diagnostics(&mut self, diagnostics: &[Diagnostic]) -> Result<()> {
        let formatted = self.format.format_diagnostics(diagnostics)?;
        self.emit(&formatted)
    }

    fn emit(&mut self, formatted: &str) -> Result<()> {
        if self.format == OutputFormat::Human {
            self.writeln(formatted.trim_end())
        } else if formatted.ends_with('\n') {
            // YAML already ends its document with a newline
            self.write(formatted)
        } else {
            self.writeln(formatted)
        }
    }

    /// Create a progress bar for long operations
    pub fn progress_bar(&self, length: u64, message: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new(length);
        pb.set_style(default_progress_style());
        pb.set_message(message.to_string());
        Some(pb)
    }

    /// Create a spinner for indeterminate progress
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(default_spinner_style());
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }

    /// Write debug information if verbose mode is enabled
    pub fn debug(&mut self, message: &str) -> Result<()> {
        if self.verbose == 0 || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "DEBUG:".dimmed(), message.dimmed()))
        } else {
            self.writeln(&format!("DEBUG: {}", message))
        }
    }

    /// Write a table (for human format)
    pub fn table(&mut self, headers: &[&str], rows: Vec<Vec<String>>) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        // Column widths in characters, not bytes; labels contain `&` and icons
        let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.chars().count());
                }
            }
        }

        let header_row = headers
            .iter()
            .enumerate()
            .map(|(i, h)| pad(h, widths[i]))
            .collect::<Vec<_>>()
            .join(" │ ");
        let header_row = header_row.trim_end();

        if self.use_color {
            self.writeln(&header_row.bold().to_string())?;
        } else {
            self.writeln(header_row)?;
        }

        let separator = widths
            .iter()
            .map(|w| "─".repeat(*w))
            .collect::<Vec<_>>()
            .join("─┼─");
        self.writeln(&separator)?;

        for row in rows {
            let row_str = row
                .iter()
                .enumerate()
                .map(|(i, cell)| match widths.get(i) {
                    Some(width) => pad(cell, *width),
                    None => cell.clone(),
                })
                .collect::<Vec<_>>()
                .join(" │ ");
            self.writeln(row_str.trim_end())?;
        }

        Ok(())
    }
}

fn pad(cell: &str, width: usize) -> String {
    let fill = width.saturating_sub(cell.chars().count());
    format!("{}{}", cell, " ".repeat(fill))
}

/// Helper function to create a progress bar style
pub fn default_progress_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

/// Helper function to create a spinner style
pub fn default_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// One row per block type for the `blocks` table
pub fn descriptor_rows(descriptors: &[BlockDescriptor]) -> Vec<Vec<String>> {
    descriptors
        .iter()
        .map(|d| {
            vec![
                d.block_type.as_str().to_string(),
                d.name.to_string(),
                d.description.to_string(),
                d.default_config().to_value().to_string(),
            ]
        })
        .collect()
}

/// Quote a value so surrounding whitespace and empty strings stay visible
fn quoted(value: &str) -> String {
    format!("\"{}\"", value)
}

fn severity_icon(severity: Severity) -> &'static str {
    match severity {
        Severity::Warning => "⚠️",
        Severity::Info => "ℹ️",
    }
}

/// Format a preview for human reading
fn format_preview_human(preview: &PreviewResult) -> String {
    let mut output = String::new();

    output.push_str("═══ Preview ═══\n\n");

    if preview.steps.is_empty() {
        output.push_str("(empty value, nothing to preview)\n");
        return output;
    }

    let label_width = preview
        .steps
        .iter()
        .map(|s| s.label.chars().count())
        .max()
        .unwrap_or(0);

    for step in &preview.steps {
        let marker = if step.index == 0 {
            " "
        } else if step.changed {
            "*"
        } else {
            "="
        };
        output.push_str(&format!(
            "{:>2}. {} {} {}\n",
            step.index,
            pad(&step.label, label_width),
            marker,
            quoted(&step.value)
        ));
    }

    output.push_str(&format!("\n✅ Result: {}\n", quoted(&preview.final_value)));

    if !preview.diagnostics.is_empty() {
        output.push('\n');
        output.push_str(&format_diagnostics_human(&preview.diagnostics));
    }

    output
}

/// Format applied mapping values for human reading
fn format_property_results_human(results: &[PropertyResult]) -> String {
    let mut output = String::new();

    if results.is_empty() {
        output.push_str("No mapped values found\n");
        return output;
    }

    for result in results {
        match &result.property {
            Some(property) => output.push_str(&format!(
                "📍 {} → {} ({})\n",
                result.key, property.id, property.label
            )),
            None => output.push_str(&format!("📍 {} (no property)\n", result.key)),
        }

        for value in &result.values {
            if value.original == value.value {
                output.push_str(&format!("  • {}\n", quoted(&value.value)));
            } else {
                output.push_str(&format!(
                    "  • {} → {}\n",
                    quoted(&value.original),
                    quoted(&value.value)
                ));
            }
            for diagnostic in &value.diagnostics {
                output.push_str(&format!(
                    "    {} {}\n",
                    severity_icon(diagnostic.severity),
                    diagnostic.message
                ));
            }
        }
    }

    output
}

/// Format diagnostics for human reading
fn format_diagnostics_human(diagnostics: &[Diagnostic]) -> String {
    let mut output = String::new();

    if diagnostics.is_empty() {
        output.push_str("✅ All blocks ran cleanly\n");
        return output;
    }

    output.push_str(&format!("🔍 Diagnostics - {} Issue(s)\n", diagnostics.len()));
    for diagnostic in diagnostics {
        output.push_str(&format!(
            "  {} [{}] {} ({}): {}\n",
            severity_icon(diagnostic.severity),
            diagnostic.severity,
            diagnostic.block_id,
            diagnostic.block_type,
            diagnostic.message
        ));
    }

    output
}
