//! Output formatting and writing utilities
//!
//! This module provides utilities for formatting and writing output
//! in various formats (JSON, YAML, human-readable) with specialized
//! rendering for compatibility results, mapping validations, optimization
//! summaries and progress indicators.

use crate::cli::OutputFormat;
use crate::error::Result;
use colored::Colorize;
use fieldmap_core::compatibility::{CompatibilityResult, CompatibilityStatus, MappingOutcome, MappingValidation};
use fieldmap_core::optimization::{Impact, OptimizationSummary, Recommendation};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fmt::Write as _;
use std::io::{self, IsTerminal, Write};
use tracing::trace;

/// Trait for formatting output with specialized support for common types
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format the classification of one kind pair
    fn format_compatibility(&self, result: &CompatibilityResult) -> Result<String>;

    /// Format per-mapping validation outcomes
    fn format_validations(&self, validations: &[MappingValidation]) -> Result<String>;

    /// Format an optimization summary with its recommendations
    fn format_optimization_summary(&self, summary: &OptimizationSummary) -> Result<String>;
}

impl OutputFormat {
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        Ok(match self {
            OutputFormat::Json => serde_json::to_string(value)?,
            OutputFormat::JsonPretty | OutputFormat::Human => serde_json::to_string_pretty(value)?,
            OutputFormat::Yaml => serde_yaml::to_string(value)?,
        })
    }
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        self.serialize(value)
    }

    fn format_compatibility(&self, result: &CompatibilityResult) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_compatibility_human(result)),
            _ => self.serialize(result),
        }
    }

    fn format_validations(&self, validations: &[MappingValidation]) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_validations_human(validations)),
            _ => self.serialize(validations),
        }
    }

    fn format_optimization_summary(&self, summary: &OptimizationSummary) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_optimization_summary_human(summary)),
            _ => self.serialize(summary),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    show_progress: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self {
            format,
            use_color,
            show_progress: !quiet && io::stderr().is_terminal(),
            quiet,
            writer: Box::new(io::stdout()),
        }
    }

    /// Create an output writer with a custom writer
    #[cfg(test)]
    pub fn with_writer(format: OutputFormat, use_color: bool, quiet: bool, writer: Box<dyn Write>) -> Self {
        Self {
            format,
            use_color,
            show_progress: false,
            quiet,
            writer,
        }
    }

    /// Get the output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Whether human-readable output is being produced
    pub fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Turn progress indicators off regardless of the terminal
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
        if self.quiet || !self.is_human() {
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
        if self.quiet || !self.is_human() {
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
        if !self.is_human() {
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
        if !self.is_human() {
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
        if self.quiet || !self.is_human() {
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
        self.writeln(formatted.trim_end())
    }

    /// Write a compatibility result
    pub fn compatibility(&mut self, result: &CompatibilityResult) -> Result<()> {
        let formatted = self.format.format_compatibility(result)?;
        self.writeln(formatted.trim_end())
    }

    /// Write mapping validations
    pub fn validations(&mut self, validations: &[MappingValidation]) -> Result<()> {
        let formatted = self.format.format_validations(validations)?;
        self.writeln(formatted.trim_end())
    }

    /// Write an optimization summary
    pub fn optimization_summary(&mut self, summary: &OptimizationSummary) -> Result<()> {
        let formatted = self.format.format_optimization_summary(summary)?;
        self.writeln(formatted.trim_end())
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

    /// Write a table (for human format)
    pub fn table(&mut self, headers: &[&str], rows: Vec<Vec<String>>) -> Result<()> {
        if self.quiet || !self.is_human() {
            return Ok(());
        }

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
            .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
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
                    Some(width) => format!("{:width$}", cell, width = width),
                    None => cell.clone(),
                })
                .collect::<Vec<_>>()
                .join(" │ ");
            self.writeln(row_str.trim_end())?;
        }

        Ok(())
    }
}

/// Helper function to create a progress bar style
pub fn default_progress_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

fn status_label(status: CompatibilityStatus) -> &'static str {
    match status {
        CompatibilityStatus::Compatible => "compatible",
        CompatibilityStatus::RequiresTransformation => "requires transformation",
        CompatibilityStatus::Incompatible => "incompatible",
    }
}

/// Format a compatibility result for human reading
fn format_compatibility_human(result: &CompatibilityResult) -> String {
    let icon = match result.status {
        CompatibilityStatus::Compatible => "✅",
        CompatibilityStatus::RequiresTransformation => "🔄",
        CompatibilityStatus::Incompatible => "❌",
    };
    let mut output = format!("{} {}\n", icon, status_label(result.status));
    if let Some(id) = &result.transformation_id {
        let _ = writeln!(output, "  Transformation: {}", id);
    }
    let _ = writeln!(output, "  {}", result.message);
    output
}

/// Format mapping validations for human reading
fn format_validations_human(validations: &[MappingValidation]) -> String {
    let invalid = validations.iter().filter(|v| !v.is_valid()).count();
    let mut output = if invalid == 0 {
        format!("✅ All {} mapping(s) are valid\n\n", validations.len())
    } else {
        format!("❌ {} of {} mapping(s) are invalid\n\n", invalid, validations.len())
    };

    for validation in validations {
        let (icon, detail) = match &validation.outcome {
            MappingOutcome::Checked(result) => {
                let icon = if result.is_mappable() { "✓" } else { "✗" };
                let detail = match &result.transformation_id {
                    Some(id) => format!("{} via {}", status_label(result.status), id),
                    None if result.is_mappable() => status_label(result.status).to_string(),
                    None => result.message.clone(),
                };
                (icon, detail)
            }
            MappingOutcome::UnknownSourceField => ("✗", "unknown source field".to_string()),
            MappingOutcome::UnknownDestinationField => ("✗", "unknown destination field".to_string()),
        };
        let _ = writeln!(
            output,
            "  {} {} ← {}: {}",
            icon, validation.destination_field_id, validation.source_field_id, detail
        );
    }
    output
}

fn impact_icon(impact: Impact) -> &'static str {
    match impact {
        Impact::High => "🔴",
        Impact::Medium => "🟡",
        Impact::Low => "🟢",
    }
}

fn format_recommendation(recommendation: &Recommendation) -> String {
    let mut line = format!("  {} {}", impact_icon(recommendation.impact), recommendation.description);
    if let (Some(current), Some(suggested)) = (recommendation.current_value, recommendation.suggested_value) {
        let _ = write!(line, " ({} → {})", current, suggested);
    }
    line
}

/// Format an optimization summary for human reading
fn format_optimization_summary_human(summary: &OptimizationSummary) -> String {
    let overall = &summary.overall_performance;
    let mut output = String::new();

    output.push_str("📊 Cache Performance:\n");
    let _ = writeln!(output, "  Transformations analyzed: {}", overall.transformations_analyzed);
    let _ = writeln!(output, "  Average improvement: {:.2}%", overall.average_improvement);
    if let Some(best) = &overall.best_transformation_name {
        let _ = writeln!(output, "  Best: {} ({:.2}%)", best, overall.best_improvement);
    }
    if let Some(worst) = &overall.worst_transformation_name {
        let _ = writeln!(output, "  Worst: {}", worst);
    }

    let stats = &summary.cache_stats;
    output.push_str("\n🗄️  Cache:\n");
    let _ = writeln!(output, "  Entries: {}/{}", stats.size, stats.capacity);
    let _ = writeln!(
        output,
        "  Hits: {}  Misses: {}  Hit rate: {:.1}%",
        stats.hits,
        stats.misses,
        stats.hit_rate * 100.0
    );

    if summary.recommendations.is_empty() {
        output.push_str("\n✅ No recommendations\n");
    } else {
        let _ = writeln!(output, "\n💡 Recommendations ({}):", summary.recommendations.len());
        for recommendation in &summary.recommendations {
            output.push_str(&format_recommendation(recommendation));
            output.push('\n');
        }
    }
    output
}
