//! Export of benchmark results and optimization summaries
//!
//! JSON exports are envelopes that can be loaded back with [`load_export`];
//! CSV exports are flat, one row per benchmark run.

use crate::benchmark::BenchmarkResult;
use crate::optimization::OptimizationSummary;
use crate::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

const CSV_HEADER: [&str; 9] = [
    "Transformation",
    "Source Kind",
    "Target Kind",
    "Iterations",
    "Total Time (ms)",
    "Average Time (ms)",
    "Cached",
    "Samples",
    "Failures",
];

/// Export file format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(Error::configuration(format!(
                "unknown export format '{}', expected json or csv",
                other
            ))),
        }
    }
}

/// Options for [`export_results`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub include_timestamp: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Json,
            include_timestamp: true,
        }
    }
}

/// JSON export envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkExport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub benchmark_results: Vec<BenchmarkResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimization_summary: Option<OptimizationSummary>,
}

impl BenchmarkExport {
    pub fn new(results: &[BenchmarkResult], summary: Option<&OptimizationSummary>) -> Self {
        Self {
            timestamp: None,
            benchmark_results: results.to_vec(),
            optimization_summary: summary.cloned(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn to_json(&self) -> Result<String> {
        let mut value = serde_json::to_value(self)?;
        // RFC 3339 with millisecond precision rather than chrono's default nanoseconds
        if let (Some(timestamp), Some(object)) = (self.timestamp, value.as_object_mut()) {
            object.insert(
                "timestamp".to_string(),
                timestamp.to_rfc3339_opts(SecondsFormat::Millis, true).into(),
            );
        }
        Ok(serde_json::to_string_pretty(&value)?)
    }
}

/// Render results (and optionally a summary) in the requested format
///
/// The summary is only part of JSON exports.
pub fn export_results(
    results: &[BenchmarkResult],
    summary: Option<&OptimizationSummary>,
    options: ExportOptions,
) -> Result<String> {
    match options.format {
        ExportFormat::Json => {
            let mut export = BenchmarkExport::new(results, summary);
            if options.include_timestamp {
                export = export.with_timestamp(Utc::now());
            }
            export.to_json()
        }
        ExportFormat::Csv => to_csv(results),
    }
}

/// Render results as CSV with a header row
///
/// Text fields are quoted, numeric fields are not; times keep two decimals.
pub fn to_csv(results: &[BenchmarkResult]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::NonNumeric)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for r in results {
        writer.write_record([
            r.transformation_name.clone(),
            r.source_kind.as_str().to_string(),
            r.target_kind.as_str().to_string(),
            r.iterations.to_string(),
            format!("{:.2}", r.total_time_ms),
            format!("{:.2}", r.average_time_ms),
            if r.with_cache { "Yes" } else { "No" }.to_string(),
            r.sample_count.to_string(),
            r.failure_count.to_string(),
        ])?;
    }
    let bytes = writer.into_inner().map_err(|e| Error::from(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| anyhow::Error::from(e).into())
}

/// File name for an export, e.g. `benchmark-20240115-093000.json`
pub fn export_file_name(base: &str, format: ExportFormat, timestamp: Option<DateTime<Utc>>) -> String {
    match timestamp {
        Some(ts) => format!("{}-{}.{}", base, ts.format("%Y%m%d-%H%M%S"), format.extension()),
        None => format!("{}.{}", base, format.extension()),
    }
}

/// Write export content to disk, creating parent directories
pub fn save_export(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    tracing::info!(path = %path.display(), bytes = content.len(), "export saved");
    Ok(())
}

/// Read a JSON export envelope back from disk
pub fn load_export(path: &Path) -> Result<BenchmarkExport> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
