//! Validate command handler

use super::utils::{load_mapping_config, JsonFileSchemaProvider};
use crate::cli::ValidateArgs;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use fieldmap_core::compatibility::validate_mappings;
use fieldmap_core::mapping::{missing_required, MappingConfig, SchemaProvider};
use fieldmap_core::{DestinationField, FieldSet, SourceField, TransformationRegistry};
use tracing::{debug, info, instrument, warn};

/// Source and destination field sets resolved for one mapping configuration
pub(super) struct ResolvedSchema {
    pub sources: FieldSet<SourceField>,
    pub destinations: FieldSet<DestinationField>,
}

/// Fetch both field sets through a schema provider
pub(super) fn resolve_schema(provider: &dyn SchemaProvider, config: &MappingConfig) -> Result<ResolvedSchema> {
    let sources = provider
        .fetch_source_fields(&config.source_database_id)
        .map_err(|e| Error::storage("Failed to fetch source fields", e))?;
    let destinations = provider
        .fetch_destination_schema()
        .map_err(|e| Error::storage("Failed to fetch destination schema", e))?;
    debug!(
        sources = sources.len(),
        destinations = destinations.len(),
        "Resolved field sets"
    );
    Ok(ResolvedSchema {
        sources: FieldSet::new("source", sources)?,
        destinations: FieldSet::new("destination", destinations)?,
    })
}

/// Handle the validate command
#[instrument(skip(args, output), fields(config = %args.mapping_config.display()))]
pub async fn handle_validate(args: ValidateArgs, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details("validate_command", &args.mapping_config.display().to_string());

    let config = load_mapping_config(&args.mapping_config)?;
    let provider = JsonFileSchemaProvider::new(&args.source_schema, args.destination_schema.clone());
    let schema = resolve_schema(&provider, &config)?;
    let registry = TransformationRegistry::with_builtins()?;

    info!(mappings = config.mappings.len(), "Validating mapping configuration");
    output.info(&format!("Validating {} ({})", config.name, config.id))?;

    let validations = validate_mappings(&registry, &schema.sources, &schema.destinations, &config.mappings);
    output.validations(&validations)?;

    for field in missing_required(&schema.destinations, &config.mappings) {
        warn!(field = %field.field.id, "Required destination field is not mapped");
        output.warning(&format!("Required field '{}' has no mapping", field.field.name))?;
    }

    let invalid = validations.iter().filter(|v| !v.is_valid()).count();
    if invalid > 0 {
        return Err(Error::ValidationFailed {
            invalid,
            total: validations.len(),
        });
    }
    Ok(())
}
