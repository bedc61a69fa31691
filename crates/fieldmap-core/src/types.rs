//! Core types and data structures for the Fieldmap engine
//!
//! This module defines the closed set of field kinds and the field records that
//! flow through the compatibility matrix, the transformation registry and the
//! mapping engine.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// The closed set of value shapes a field can hold
///
/// Every consumer matches on this enum exhaustively, so adding a kind forces the
/// compatibility table, the sample generator and the labels to be updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    RichText,
    Title,
    Number,
    Date,
    Checkbox,
    Select,
    MultiSelect,
    Url,
    Email,
    PhoneNumber,
    Person,
    Files,
    Image,
    Formula,
    Relation,
    Rollup,
    CreatedTime,
    CreatedBy,
    LastEditedTime,
    LastEditedBy,
    Status,
}

impl FieldKind {
    /// Every field kind, in declaration order
    pub const ALL: [FieldKind; 22] = [
        FieldKind::Text,
        FieldKind::RichText,
        FieldKind::Title,
        FieldKind::Number,
        FieldKind::Date,
        FieldKind::Checkbox,
        FieldKind::Select,
        FieldKind::MultiSelect,
        FieldKind::Url,
        FieldKind::Email,
        FieldKind::PhoneNumber,
        FieldKind::Person,
        FieldKind::Files,
        FieldKind::Image,
        FieldKind::Formula,
        FieldKind::Relation,
        FieldKind::Rollup,
        FieldKind::CreatedTime,
        FieldKind::CreatedBy,
        FieldKind::LastEditedTime,
        FieldKind::LastEditedBy,
        FieldKind::Status,
    ];

    /// Canonical snake_case name, as used in serialized data
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::RichText => "rich_text",
            FieldKind::Title => "title",
            FieldKind::Number => "number",
            FieldKind::Date => "date",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Select => "select",
            FieldKind::MultiSelect => "multi_select",
            FieldKind::Url => "url",
            FieldKind::Email => "email",
            FieldKind::PhoneNumber => "phone_number",
            FieldKind::Person => "person",
            FieldKind::Files => "files",
            FieldKind::Image => "image",
            FieldKind::Formula => "formula",
            FieldKind::Relation => "relation",
            FieldKind::Rollup => "rollup",
            FieldKind::CreatedTime => "created_time",
            FieldKind::CreatedBy => "created_by",
            FieldKind::LastEditedTime => "last_edited_time",
            FieldKind::LastEditedBy => "last_edited_by",
            FieldKind::Status => "status",
        }
    }

    /// Human-readable label for display
    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::Text => "Text",
            FieldKind::RichText => "Rich text",
            FieldKind::Title => "Title",
            FieldKind::Number => "Number",
            FieldKind::Date => "Date",
            FieldKind::Checkbox => "Checkbox",
            FieldKind::Select => "Select",
            FieldKind::MultiSelect => "Multi-select",
            FieldKind::Url => "URL",
            FieldKind::Email => "Email",
            FieldKind::PhoneNumber => "Phone number",
            FieldKind::Person => "Person",
            FieldKind::Files => "Files",
            FieldKind::Image => "Image",
            FieldKind::Formula => "Formula",
            FieldKind::Relation => "Relation",
            FieldKind::Rollup => "Rollup",
            FieldKind::CreatedTime => "Created time",
            FieldKind::CreatedBy => "Created by",
            FieldKind::LastEditedTime => "Last edited time",
            FieldKind::LastEditedBy => "Last edited by",
            FieldKind::Status => "Status",
        }
    }

    /// Parse a Notion property type name
    ///
    /// Notion calls person properties `people`; every other property type uses
    /// the kind's own name. Unknown property types are rejected rather than
    /// treated as text.
    pub fn from_notion_property_type(property_type: &str) -> Result<Self> {
        match property_type {
            "people" => Ok(FieldKind::Person),
            other => other.parse(),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        FieldKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::UnknownFieldKind { name: s.to_string() })
    }
}

/// Coarse performance class of a transformation, shown to users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceImpact {
    Low,
    Medium,
    High,
}

/// Author-declared computational complexity of a transformation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl Complexity {
    /// Numeric weight used by cost/benefit ranking (1..=3)
    pub fn weight(&self) -> u8 {
        match self {
            Complexity::Low => 1,
            Complexity::Medium => 2,
            Complexity::High => 3,
        }
    }
}

/// Shared shape of source and destination fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Identifier, unique within its field set
    pub id: String,

    /// Display name
    pub name: String,

    /// Value shape
    #[serde(rename = "type", alias = "kind")]
    pub kind: FieldKind,

    /// Whether a value must be provided
    #[serde(default)]
    pub required: bool,

    /// Optional description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Field {
    /// Create an optional field with no description
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            required: false,
            description: None,
        }
    }

    /// Mark the field as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A field provided by the external data source (a Notion database property)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceField {
    #[serde(flatten)]
    pub field: Field,

    /// Raw property type reported by the data source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
}

impl SourceField {
    pub fn new(field: Field) -> Self {
        Self {
            field,
            property_type: None,
        }
    }

    /// Build a source field from a data-source property, validating its type
    pub fn from_property(
        id: impl Into<String>,
        name: impl Into<String>,
        property_type: &str,
    ) -> Result<Self> {
        let kind = FieldKind::from_notion_property_type(property_type)?;
        Ok(Self {
            field: Field::new(id, name, kind),
            property_type: Some(property_type.to_string()),
        })
    }
}

impl AsRef<Field> for SourceField {
    fn as_ref(&self) -> &Field {
        &self.field
    }
}

/// Sections of the case-study page a destination field belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStudySection {
    Hero,
    MainInfo,
    Gallery,
}

/// A field of the fixed destination schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationField {
    #[serde(flatten)]
    pub field: Field,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<CaseStudySection>,

    /// Maximum length for text values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl DestinationField {
    pub fn new(field: Field) -> Self {
        Self {
            field,
            section: None,
            max_length: None,
        }
    }

    pub fn in_section(mut self, section: CaseStudySection) -> Self {
        self.section = Some(section);
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }
}

impl AsRef<Field> for DestinationField {
    fn as_ref(&self) -> &Field {
        &self.field
    }
}

/// An immutable set of fields with unique ids
///
/// An empty set is valid and simply means there is nothing to map.
#[derive(Debug, Clone)]
pub struct FieldSet<T> {
    fields: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T: AsRef<Field>> FieldSet<T> {
    /// Build a field set, rejecting duplicate ids
    ///
    /// `set` names the set in error messages ("source", "destination").
    pub fn new(set: &str, fields: Vec<T>) -> Result<Self> {
        let mut index = HashMap::with_capacity(fields.len());
        for (position, field) in fields.iter().enumerate() {
            let id = &field.as_ref().id;
            if index.insert(id.clone(), position).is_some() {
                return Err(Error::DuplicateField {
                    id: id.clone(),
                    set: set.to_string(),
                });
            }
        }
        Ok(Self { fields, index })
    }

    /// An empty field set
    pub fn empty() -> Self {
        Self {
            fields: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Look up a field by id
    pub fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|&position| &self.fields[position])
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// The fixed case-study destination schema
pub fn case_study_schema() -> Vec<DestinationField> {
    vec![
        DestinationField::new(Field::new("hero_image", "Hero image/video", FieldKind::Image).required())
            .in_section(CaseStudySection::Hero),
        DestinationField::new(Field::new("project_name", "Project name", FieldKind::Text).required())
            .in_section(CaseStudySection::MainInfo),
        DestinationField::new(Field::new("tagline", "Tagline", FieldKind::Text))
            .in_section(CaseStudySection::MainInfo)
            .with_max_length(120),
        DestinationField::new(Field::new("description", "Description", FieldKind::RichText).required())
            .in_section(CaseStudySection::MainInfo),
        DestinationField::new(Field::new("services", "Services", FieldKind::MultiSelect))
            .in_section(CaseStudySection::MainInfo),
        DestinationField::new(Field::new("gallery", "Image/video gallery", FieldKind::Files))
            .in_section(CaseStudySection::Gallery),
    ]
}
