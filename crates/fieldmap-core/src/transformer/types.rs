//! Core types for the value transformation system
//!
//! This module defines the transformation record, its option bag, and the
//! errors a transformation function may report.
//!
//! Copyright (c) 2025 Fieldmap Team
//! Licensed under the Apache-2.0 license

use crate::types::{Complexity, FieldKind, PerformanceImpact};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Errors a transformation function can report
///
/// Malformed *values* never produce an error; transformations degrade to an
/// empty or default output instead. Errors are reserved for option bags that are
/// structurally wrong and for failures of user-registered functions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformationError {
    /// An option is present but has the wrong type
    #[error("Invalid option '{option}': expected {expected}")]
    InvalidOption { option: String, expected: String },

    /// The function rejected the input
    #[error("Cannot transform value: {message}")]
    Rejected { message: String },
}

impl TransformationError {
    /// Attach the id of the transformation that failed
    pub fn into_error(self, id: impl Into<String>) -> crate::Error {
        crate::Error::Transformation {
            id: id.into(),
            source: self,
        }
    }
}

/// Result alias for transformation functions
pub type TransformResult<T> = std::result::Result<T, TransformationError>;

/// A pure value transformation
pub type TransformFn = fn(&Value, &TransformOptions) -> TransformResult<Value>;

/// Options passed to a transformation
///
/// Absent options and an empty option bag are equivalent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransformOptions(Map<String, Value>);

impl TransformOptions {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build options from a JSON value; anything but an object yields empty options
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::new(),
        }
    }

    /// Set an option, returning the updated bag
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Raw option value, treating `null` as absent
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// String option with a default
    pub fn str_or<'a>(&'a self, key: &str, default: &'a str) -> TransformResult<&'a str> {
        match self.get(key) {
            None => Ok(default),
            Some(Value::String(s)) => Ok(s.as_str()),
            Some(_) => Err(invalid_option(key, "string")),
        }
    }

    /// Boolean option with a default
    pub fn bool_or(&self, key: &str, default: bool) -> TransformResult<bool> {
        match self.get(key) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(invalid_option(key, "boolean")),
        }
    }

    /// Non-negative integer option with a default
    pub fn index_or(&self, key: &str, default: usize) -> TransformResult<usize> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value
                .as_u64()
                .map(|n| n as usize)
                .ok_or_else(|| invalid_option(key, "non-negative integer")),
        }
    }

    /// Arbitrary JSON option with a default
    pub fn value_or(&self, key: &str, default: Value) -> Value {
        self.get(key).cloned().unwrap_or(default)
    }
}

impl From<Map<String, Value>> for TransformOptions {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn invalid_option(option: &str, expected: &str) -> TransformationError {
    TransformationError::InvalidOption {
        option: option.to_string(),
        expected: expected.to_string(),
    }
}

/// A documented before/after pair, used for previews and conformance tests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformExample {
    pub source: Value,
    pub target: Value,
}

/// A registered transformation between two field kinds
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transformation {
    /// Unique identifier
    pub id: String,
    pub source_kind: FieldKind,
    pub target_kind: FieldKind,
    pub name: String,
    pub description: String,
    pub performance_impact: PerformanceImpact,
    /// Declared complexity, used by cost/benefit ranking
    pub estimated_complexity: Complexity,
    /// Whether the benchmark harness includes this transformation in bulk runs
    pub benchmarkable: bool,
    #[serde(skip)]
    pub transform: TransformFn,
    pub example: TransformExample,
}

impl Transformation {
    /// Run the transformation function directly, bypassing any cache
    pub fn run(&self, value: &Value, options: &TransformOptions) -> TransformResult<Value> {
        (self.transform)(value, options)
    }
}

impl fmt::Debug for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformation")
            .field("id", &self.id)
            .field("source_kind", &self.source_kind)
            .field("target_kind", &self.target_kind)
            .field("performance_impact", &self.performance_impact)
            .field("estimated_complexity", &self.estimated_complexity)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Transformation {
    fn eq(&self, other: &Self) -> bool {
        // Function pointers are not compared
        self.id == other.id
            && self.source_kind == other.source_kind
            && self.target_kind == other.target_kind
    }
}
