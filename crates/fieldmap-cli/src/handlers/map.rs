//! Map command handler

use super::utils::{load_mapping_config, read_structured, JsonFileSchemaProvider};
use super::validate::resolve_schema;
use crate::cli::MapArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use fieldmap_core::{MappingEngine, TransformationCache, TransformationRegistry};
use serde_json::{Map, Value};

/// Handle the map command
pub async fn handle_map(args: MapArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let mapping = load_mapping_config(&args.mapping_config)?;
    let provider = JsonFileSchemaProvider::new(&args.source_schema, args.destination_schema.clone());
    let schema = resolve_schema(&provider, &mapping)?;

    let raw: Value = read_structured(&args.record)?;
    let record: Map<String, Value> = match raw {
        Value::Object(record) => record,
        _ => {
            return Err(Error::InvalidFormat {
                path: args.record.clone(),
                expected: "a JSON object keyed by source field id".to_string(),
            })
        }
    };

    let registry = TransformationRegistry::with_builtins()?;
    let mut cache = TransformationCache::with_settings(config.cache_settings())?;
    let engine = MappingEngine::new(&registry, &schema.sources, &schema.destinations, &mapping.mappings);
    let mapped = engine.map_record(&mut cache, &record);

    tracing::info!(
        values = mapped.values.len(),
        issues = mapped.issues.len(),
        "Mapped record"
    );

    if !output.is_human() {
        return output.data(&mapped);
    }

    output.section("Mapped values")?;
    output.writeln(&serde_json::to_string_pretty(&mapped.values)?)?;
    for issue in &mapped.issues {
        output.warning(&format!("{} ← {}: {}", issue.destination_field_id, issue.source_field_id, issue.message))?;
    }
    Ok(())
}
