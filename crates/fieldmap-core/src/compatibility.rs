//! Compatibility matrix between source and destination field kinds
//!
//! A source kind feeds a destination kind either directly (equal kinds or the
//! direct-compatibility table), through a registered transformation, or not at
//! all. Classification never fails: a pair with no path is simply
//! [`CompatibilityStatus::Incompatible`].

use crate::mapping::FieldMapping;
use crate::transformer::{Transformation, TransformationRegistry};
use crate::types::{DestinationField, FieldKind, FieldSet, SourceField};
use serde::{Deserialize, Serialize};

/// How a source kind relates to a destination kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompatibilityStatus {
    Compatible,
    RequiresTransformation,
    Incompatible,
}

/// Classification of one destination/source pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityResult {
    pub status: CompatibilityStatus,
    /// Set only for [`CompatibilityStatus::RequiresTransformation`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformation_id: Option<String>,
    pub message: String,
}

impl CompatibilityResult {
    fn compatible() -> Self {
        Self {
            status: CompatibilityStatus::Compatible,
            transformation_id: None,
            message: "Fields are directly compatible".to_string(),
        }
    }

    fn requires(transformation: &Transformation) -> Self {
        Self {
            status: CompatibilityStatus::RequiresTransformation,
            transformation_id: Some(transformation.id.clone()),
            message: format!(
                "Requires transformation from {} to {} ({})",
                transformation.source_kind, transformation.target_kind, transformation.name
            ),
        }
    }

    fn incompatible(message: String) -> Self {
        Self {
            status: CompatibilityStatus::Incompatible,
            transformation_id: None,
            message,
        }
    }

    pub fn is_mappable(&self) -> bool {
        self.status != CompatibilityStatus::Incompatible
    }
}

/// Source kinds a destination kind accepts without transformation, besides itself
///
/// Text and rich text are not interchangeable here: `rich_text_to_text` and
/// `text_to_rich_text` own those pairs.
pub fn direct_sources(dest: FieldKind) -> &'static [FieldKind] {
    use FieldKind::*;
    match dest {
        Title => &[Text, RichText],
        Text | RichText => &[Title],
        CreatedTime | LastEditedTime => &[Date],
        CreatedBy | LastEditedBy => &[Person],
        Status => &[Select],
        Number | Checkbox | Select | MultiSelect | Date | Person | Url | Email | PhoneNumber
        | Files | Image | Formula | Relation | Rollup => &[],
    }
}

/// Whether `source` values can be stored in a `dest` field unchanged
pub fn is_directly_compatible(dest: FieldKind, source: FieldKind) -> bool {
    dest == source || direct_sources(dest).contains(&source)
}

/// Classify a destination/source kind pair
pub fn classify(
    registry: &TransformationRegistry,
    dest: FieldKind,
    source: FieldKind,
) -> CompatibilityResult {
    if is_directly_compatible(dest, source) {
        return CompatibilityResult::compatible();
    }
    match registry.find(source, dest) {
        Some(transformation) => CompatibilityResult::requires(transformation),
        None => CompatibilityResult::incompatible(format!(
            "{} cannot be mapped to {}",
            source.label(),
            dest.label()
        )),
    }
}

/// Classify every source kind against one destination kind
pub fn compatible_kinds(
    registry: &TransformationRegistry,
    dest: FieldKind,
) -> Vec<(FieldKind, CompatibilityResult)> {
    FieldKind::ALL
        .iter()
        .map(|&source| (source, classify(registry, dest, source)))
        .collect()
}

/// Whether some registered transformation converts `source` into `dest`
pub fn can_be_transformed(registry: &TransformationRegistry, source: FieldKind, dest: FieldKind) -> bool {
    !available_transformations(registry, source, dest).is_empty()
}

/// Transformations declared for converting `source` into `dest`
pub fn available_transformations(
    registry: &TransformationRegistry,
    source: FieldKind,
    dest: FieldKind,
) -> Vec<&Transformation> {
    registry.available(source, dest)
}

/// Source fields grouped by how they relate to one destination field
#[derive(Debug, Default)]
pub struct RecommendedFields<'a> {
    pub directly_compatible: Vec<&'a SourceField>,
    pub requires_transformation: Vec<&'a SourceField>,
    pub incompatible: Vec<&'a SourceField>,
}

/// Partition source fields by their compatibility with a destination field
pub fn recommended_fields<'a>(
    registry: &TransformationRegistry,
    sources: &'a FieldSet<SourceField>,
    dest: &DestinationField,
) -> RecommendedFields<'a> {
    let mut recommended = RecommendedFields::default();
    for source in sources.iter() {
        let bucket = match classify(registry, dest.field.kind, source.field.kind).status {
            CompatibilityStatus::Compatible => &mut recommended.directly_compatible,
            CompatibilityStatus::RequiresTransformation => &mut recommended.requires_transformation,
            CompatibilityStatus::Incompatible => &mut recommended.incompatible,
        };
        bucket.push(source);
    }
    recommended
}

/// Outcome of validating one mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MappingOutcome {
    Checked(CompatibilityResult),
    UnknownSourceField,
    UnknownDestinationField,
}

/// Validation of one mapping entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingValidation {
    pub source_field_id: String,
    pub destination_field_id: String,
    #[serde(flatten)]
    pub outcome: MappingOutcome,
}

impl MappingValidation {
    pub fn is_valid(&self) -> bool {
        matches!(&self.outcome, MappingOutcome::Checked(result) if result.is_mappable())
    }
}

/// Validate a list of mappings against the source and destination field sets
///
/// A mapping that names an explicit transformation is checked against that
/// transformation's kinds; others are classified by kind pair. Unknown field
/// ids are reported per mapping.
pub fn validate_mappings(
    registry: &TransformationRegistry,
    sources: &FieldSet<SourceField>,
    dests: &FieldSet<DestinationField>,
    mappings: &[FieldMapping],
) -> Vec<MappingValidation> {
    mappings
        .iter()
        .map(|mapping| {
            let outcome = match (
                sources.get(&mapping.source_field_id),
                dests.get(&mapping.destination_field_id),
            ) {
                (None, _) => MappingOutcome::UnknownSourceField,
                (_, None) => MappingOutcome::UnknownDestinationField,
                (Some(source), Some(dest)) => MappingOutcome::Checked(check_mapping(
                    registry,
                    source.field.kind,
                    dest.field.kind,
                    mapping.transformation_id.as_deref(),
                )),
            };
            MappingValidation {
                source_field_id: mapping.source_field_id.clone(),
                destination_field_id: mapping.destination_field_id.clone(),
                outcome,
            }
        })
        .collect()
}

pub(crate) fn check_mapping(
    registry: &TransformationRegistry,
    source: FieldKind,
    dest: FieldKind,
    transformation_id: Option<&str>,
) -> CompatibilityResult {
    let Some(id) = transformation_id else {
        return classify(registry, dest, source);
    };
    match registry.get(id) {
        Some(t) if t.source_kind == source && t.target_kind == dest => CompatibilityResult::requires(t),
        Some(t) => CompatibilityResult::incompatible(format!(
            "Transformation '{}' converts {} to {}, not {} to {}",
            id, t.source_kind, t.target_kind, source, dest
        )),
        None => CompatibilityResult::incompatible(format!("Unknown transformation '{}'", id)),
    }
}
