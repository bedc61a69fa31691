//! Builder for creating transformations
//!
//! This module provides a fluent builder API for constructing custom
//! transformations before registering them.
//!
//! Copyright (c) 2025 Fieldmap Team
//! Licensed under the Apache-2.0 license

use super::types::{TransformExample, TransformFn, Transformation};
use crate::types::{Complexity, FieldKind, PerformanceImpact};
use crate::{Error, Result};
use serde_json::Value;

/// Builder for creating transformations
pub struct TransformationBuilder {
    id: String,
    source_kind: FieldKind,
    target_kind: FieldKind,
    name: Option<String>,
    description: String,
    performance_impact: PerformanceImpact,
    estimated_complexity: Complexity,
    benchmarkable: bool,
    transform: Option<TransformFn>,
    example: Option<TransformExample>,
}

impl TransformationBuilder {
    /// Create a new builder for a transformation between two kinds
    pub fn new(id: impl Into<String>, source_kind: FieldKind, target_kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            source_kind,
            target_kind,
            name: None,
            description: String::new(),
            performance_impact: PerformanceImpact::Low,
            estimated_complexity: Complexity::Low,
            benchmarkable: true,
            transform: None,
            example: None,
        }
    }

    /// Set the display name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the declared performance impact
    pub fn performance_impact(mut self, impact: PerformanceImpact) -> Self {
        self.performance_impact = impact;
        self
    }

    /// Set the declared complexity
    pub fn complexity(mut self, complexity: Complexity) -> Self {
        self.estimated_complexity = complexity;
        self
    }

    /// Exclude from bulk benchmark runs
    pub fn not_benchmarkable(mut self) -> Self {
        self.benchmarkable = false;
        self
    }

    /// Set the transformation function
    pub fn transform(mut self, transform: TransformFn) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Set the documented example
    pub fn example(mut self, source: Value, target: Value) -> Self {
        self.example = Some(TransformExample { source, target });
        self
    }

    /// Build the transformation
    pub fn build(self) -> Result<Transformation> {
        if self.id.trim().is_empty() {
            return Err(Error::registration(self.id, "id must not be empty"));
        }
        let name = self
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| Error::registration(&self.id, "name is required"))?;
        let transform = self
            .transform
            .ok_or_else(|| Error::registration(&self.id, "transform function is required"))?;
        let example = self
            .example
            .ok_or_else(|| Error::registration(&self.id, "example is required"))?;

        Ok(Transformation {
            id: self.id,
            source_kind: self.source_kind,
            target_kind: self.target_kind,
            name,
            description: self.description,
            performance_impact: self.performance_impact,
            estimated_complexity: self.estimated_complexity,
            benchmarkable: self.benchmarkable,
            transform,
            example,
        })
    }
}
