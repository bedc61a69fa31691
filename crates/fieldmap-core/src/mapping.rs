//! Mapping configurations and record mapping
//!
//! A [`MappingConfig`] pairs destination fields with source fields, optionally
//! naming the transformation to use. [`MappingEngine`] runs such a configuration
//! over one source record. Problems are reported per field and never abort the
//! record.

use crate::cache::TransformationCache;
use crate::compatibility::{check_mapping, CompatibilityStatus};
use crate::transformer::{TransformOptions, TransformationRegistry};
use crate::types::{DestinationField, FieldSet, SourceField};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One destination field fed by one source field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    #[serde(alias = "caseStudyFieldId")]
    pub destination_field_id: String,
    #[serde(alias = "notionFieldId")]
    pub source_field_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformation_options: Option<TransformOptions>,
}

impl FieldMapping {
    pub fn new(destination_field_id: impl Into<String>, source_field_id: impl Into<String>) -> Self {
        Self {
            destination_field_id: destination_field_id.into(),
            source_field_id: source_field_id.into(),
            transformation_id: None,
            transformation_options: None,
        }
    }

    /// Use an explicit transformation instead of the one registered for the kind pair
    pub fn with_transformation(mut self, id: impl Into<String>) -> Self {
        self.transformation_id = Some(id.into());
        self
    }

    pub fn with_options(mut self, options: TransformOptions) -> Self {
        self.transformation_options = Some(options);
        self
    }
}

/// A saved mapping between a source database and the destination schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingConfig {
    pub id: String,
    pub name: String,
    #[serde(alias = "notionDatabaseId")]
    pub source_database_id: String,
    #[serde(default)]
    pub mappings: Vec<FieldMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gallery_item_count: Option<u32>,
    #[serde(default)]
    pub has_completed_onboarding: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MappingConfig {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        source_database_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            source_database_id: source_database_id.into(),
            mappings: Vec::new(),
            gallery_item_count: None,
            has_completed_onboarding: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_mappings(mut self, mappings: Vec<FieldMapping>) -> Self {
        self.mappings = mappings;
        self
    }

    /// Refresh the modification timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Why a mapped field produced no value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// The record has no value for the source field
    MissingSourceValue,
    /// The mapping references a field id not present in its field set
    UnknownField,
    /// The kinds cannot be mapped, or the named transformation does not fit
    Incompatible,
}

/// A per-field problem found while mapping a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingIssue {
    pub destination_field_id: String,
    pub source_field_id: String,
    pub kind: IssueKind,
    pub message: String,
}

/// Destination values produced from one source record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedRecord {
    pub values: Map<String, Value>,
    pub issues: Vec<MappingIssue>,
}

/// Runs a list of mappings over source records
pub struct MappingEngine<'a> {
    registry: &'a TransformationRegistry,
    sources: &'a FieldSet<SourceField>,
    destinations: &'a FieldSet<DestinationField>,
    mappings: &'a [FieldMapping],
}

impl<'a> MappingEngine<'a> {
    pub fn new(
        registry: &'a TransformationRegistry,
        sources: &'a FieldSet<SourceField>,
        destinations: &'a FieldSet<DestinationField>,
        mappings: &'a [FieldMapping],
    ) -> Self {
        Self {
            registry,
            sources,
            destinations,
            mappings,
        }
    }

    /// Map one record keyed by source field id
    pub fn map_record(&self, cache: &mut TransformationCache, record: &Map<String, Value>) -> MappedRecord {
        let mut mapped = MappedRecord::default();
        let empty = TransformOptions::new();

        for mapping in self.mappings {
            let issue = |kind: IssueKind, message: String| MappingIssue {
                destination_field_id: mapping.destination_field_id.clone(),
                source_field_id: mapping.source_field_id.clone(),
                kind,
                message,
            };

            let (source, dest) = match (
                self.sources.get(&mapping.source_field_id),
                self.destinations.get(&mapping.destination_field_id),
            ) {
                (Some(source), Some(dest)) => (source, dest),
                (None, _) => {
                    let message = format!("Unknown source field '{}'", mapping.source_field_id);
                    mapped.issues.push(issue(IssueKind::UnknownField, message));
                    continue;
                }
                (_, None) => {
                    let message = format!("Unknown destination field '{}'", mapping.destination_field_id);
                    mapped.issues.push(issue(IssueKind::UnknownField, message));
                    continue;
                }
            };

            let compatibility = check_mapping(
                self.registry,
                source.field.kind,
                dest.field.kind,
                mapping.transformation_id.as_deref(),
            );
            if compatibility.status == CompatibilityStatus::Incompatible {
                mapped.issues.push(issue(IssueKind::Incompatible, compatibility.message));
                continue;
            }

            let value = match record.get(&mapping.source_field_id) {
                Some(value) if !value.is_null() => value,
                _ => {
                    let message = format!("No value for source field '{}'", mapping.source_field_id);
                    mapped.issues.push(issue(IssueKind::MissingSourceValue, message));
                    continue;
                }
            };

            let options = mapping.transformation_options.as_ref().unwrap_or(&empty);
            let result = match compatibility.transformation_id.as_deref() {
                Some(id) => self.registry.apply_by_id(cache, id, value, options),
                None => value.clone(),
            };
            mapped.values.insert(dest.field.id.clone(), result);
        }

        mapped
    }
}

/// Required destination fields that no mapping feeds
pub fn missing_required<'a>(
    destinations: &'a FieldSet<DestinationField>,
    mappings: &[FieldMapping],
) -> Vec<&'a DestinationField> {
    destinations
        .iter()
        .filter(|dest| dest.field.required)
        .filter(|dest| !mappings.iter().any(|m| m.destination_field_id == dest.field.id))
        .collect()
}

/// Source of field definitions (the data source and the destination schema)
pub trait SchemaProvider {
    /// Fields of a source database
    fn fetch_source_fields(&self, source_id: &str) -> anyhow::Result<Vec<SourceField>>;

    /// The destination schema
    fn fetch_destination_schema(&self) -> anyhow::Result<Vec<DestinationField>>;
}

/// Persistence for mapping configurations
pub trait MappingStore {
    fn save(&mut self, config: &MappingConfig) -> anyhow::Result<()>;

    /// Load a configuration by id; `None` when it does not exist
    fn load(&self, id: &str) -> anyhow::Result<Option<MappingConfig>>;
}
