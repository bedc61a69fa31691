//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand.

mod bench;
mod completions;
mod config;
mod map;
mod utils;
mod validate;

pub use bench::handle_bench;
pub use completions::handle_completions;
pub use config::handle_config;
pub use map::handle_map;
pub use validate::handle_validate;

use crate::cli::{ApplyArgs, ClassifyArgs, MatrixArgs, TransformationsArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use fieldmap_core::compatibility::{classify, compatible_kinds, CompatibilityStatus};
use fieldmap_core::{FieldKind, TransformOptions, TransformationCache, TransformationRegistry};
use serde::Serialize;
use serde_json::Value;

/// One row of the compatibility matrix
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MatrixEntry {
    source: FieldKind,
    status: CompatibilityStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    transformation_id: Option<String>,
}

/// Result of applying a transformation to one value
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApplyReport {
    from: FieldKind,
    to: FieldKind,
    status: CompatibilityStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    transformation_id: Option<String>,
    input: Value,
    output: Value,
}

fn status_text(status: CompatibilityStatus) -> &'static str {
    match status {
        CompatibilityStatus::Compatible => "compatible",
        CompatibilityStatus::RequiresTransformation => "transform",
        CompatibilityStatus::Incompatible => "incompatible",
    }
}

/// Handle the transformations command
pub async fn handle_transformations(args: TransformationsArgs, output: &mut OutputWriter) -> Result<()> {
    let registry = TransformationRegistry::with_builtins()?;
    let selected: Vec<_> = registry
        .iter()
        .filter(|t| args.from.map_or(true, |kind| t.source_kind == kind))
        .filter(|t| args.to.map_or(true, |kind| t.target_kind == kind))
        .collect();

    if !output.is_human() {
        return output.data(&selected);
    }

    output.section(&format!("Transformations ({})", selected.len()))?;
    let rows = selected
        .iter()
        .map(|t| {
            vec![
                t.id.clone(),
                t.source_kind.to_string(),
                t.target_kind.to_string(),
                format!("{:?}", t.performance_impact).to_lowercase(),
                format!("{:?}", t.estimated_complexity).to_lowercase(),
            ]
        })
        .collect();
    output.table(&["Id", "From", "To", "Impact", "Complexity"], rows)?;

    if args.examples {
        output.section("Examples")?;
        for t in &selected {
            output.writeln(&format!(
                "{}: {} → {}",
                t.id,
                serde_json::to_string(&t.example.source)?,
                serde_json::to_string(&t.example.target)?
            ))?;
        }
    }
    Ok(())
}

/// Handle the classify command
pub async fn handle_classify(args: ClassifyArgs, output: &mut OutputWriter) -> Result<()> {
    let registry = TransformationRegistry::with_builtins()?;
    let result = classify(&registry, args.dest, args.source);
    tracing::debug!(dest = %args.dest, source = %args.source, status = ?result.status, "Classified pair");
    output.compatibility(&result)
}

/// Handle the matrix command
pub async fn handle_matrix(args: MatrixArgs, output: &mut OutputWriter) -> Result<()> {
    let registry = TransformationRegistry::with_builtins()?;
    let entries: Vec<MatrixEntry> = compatible_kinds(&registry, args.dest)
        .into_iter()
        .filter(|(_, result)| !args.mappable_only || result.is_mappable())
        .map(|(source, result)| MatrixEntry {
            source,
            status: result.status,
            transformation_id: result.transformation_id,
        })
        .collect();

    if !output.is_human() {
        return output.data(&entries);
    }

    output.section(&format!("Sources for {}", args.dest.label()))?;
    let rows = entries
        .iter()
        .map(|entry| {
            vec![
                entry.source.to_string(),
                status_text(entry.status).to_string(),
                entry.transformation_id.clone().unwrap_or_default(),
            ]
        })
        .collect();
    output.table(&["Source", "Status", "Transformation"], rows)
}

/// Handle the apply command
pub async fn handle_apply(args: ApplyArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let registry = TransformationRegistry::with_builtins()?;
    let mut cache = TransformationCache::with_settings(config.cache_settings())?;
    let input = utils::parse_value_arg(&args.value);
    let options = match &args.options {
        Some(raw) => utils::parse_options(raw)?,
        None => TransformOptions::new(),
    };

    let (status, transformation_id, result) = match &args.transformation {
        Some(id) => {
            let transformation = registry
                .get(id)
                .ok_or_else(|| fieldmap_core::Error::TransformationNotFound { id: id.clone() })?;
            if transformation.source_kind != args.from || transformation.target_kind != args.to {
                return Err(Error::invalid_args(format!(
                    "transformation '{}' converts {} to {}, not {} to {}",
                    id, transformation.source_kind, transformation.target_kind, args.from, args.to
                )));
            }
            let result = registry.try_apply_by_id(&mut cache, id, &input, &options)?;
            (CompatibilityStatus::RequiresTransformation, Some(id.clone()), result)
        }
        None => {
            let compatibility = classify(&registry, args.to, args.from);
            let result = match compatibility.status {
                CompatibilityStatus::Incompatible => {
                    return Err(Error::Incompatible {
                        message: compatibility.message,
                    })
                }
                CompatibilityStatus::Compatible => input.clone(),
                CompatibilityStatus::RequiresTransformation => {
                    registry.apply(&mut cache, args.from, args.to, &input, &options)
                }
            };
            (compatibility.status, compatibility.transformation_id, result)
        }
    };

    let report = ApplyReport {
        from: args.from,
        to: args.to,
        status,
        transformation_id,
        input,
        output: result,
    };

    if !output.is_human() {
        return output.data(&report);
    }
    if let Some(id) = &report.transformation_id {
        output.info(&format!("Applied {}", id))?;
    }
    output.writeln(&serde_json::to_string_pretty(&report.output)?)
}
