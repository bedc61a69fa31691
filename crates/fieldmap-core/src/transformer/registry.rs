//! Registry of transformations and the cached apply path
//!
//! The registry holds at most one transformation per `(source, target)` kind
//! pair. Pairs covered by the direct-compatibility table cannot be registered,
//! since values of those kinds are passed through unchanged. Same-kind
//! transformations (such as `files_to_file`) are allowed and are only reachable
//! through [`TransformationRegistry::apply_by_id`].
//!
//! Copyright (c) 2025 Fieldmap Team
//! Licensed under the Apache-2.0 license

use super::built_in;
use super::types::{TransformOptions, Transformation};
use crate::cache::TransformationCache;
use crate::compatibility::is_directly_compatible;
use crate::types::FieldKind;
use crate::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;

/// Characters of the input kept when logging a failed transformation
const LOG_PREVIEW_CHARS: usize = 100;

/// Lookup table of transformations by id and by kind pair
#[derive(Debug, Default, Clone)]
pub struct TransformationRegistry {
    transformations: Vec<Transformation>,
    by_id: HashMap<String, usize>,
    by_pair: HashMap<(FieldKind, FieldKind), usize>,
}

impl TransformationRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in transformation
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();
        for transformation in built_in::all() {
            registry.register(transformation)?;
        }
        Ok(registry)
    }

    /// Register a transformation
    ///
    /// Rejects duplicate ids, a second transformation for an already registered
    /// kind pair, and pairs that are directly compatible.
    pub fn register(&mut self, transformation: Transformation) -> Result<()> {
        let id = &transformation.id;
        if self.by_id.contains_key(id) {
            return Err(Error::registration(id, "id is already registered"));
        }

        let pair = (transformation.source_kind, transformation.target_kind);
        if pair.0 != pair.1 {
            if is_directly_compatible(pair.1, pair.0) {
                return Err(Error::registration(
                    id,
                    format!("{} is directly compatible with {}", pair.0, pair.1),
                ));
            }
            if let Some(existing) = self.by_pair.get(&pair) {
                return Err(Error::registration(
                    id,
                    format!(
                        "{} -> {} is already handled by '{}'",
                        pair.0, pair.1, self.transformations[*existing].id
                    ),
                ));
            }
        }

        let index = self.transformations.len();
        self.by_id.insert(id.clone(), index);
        if pair.0 != pair.1 {
            self.by_pair.insert(pair, index);
        }
        log::debug!("Registered transformation '{}' ({} -> {})", id, pair.0, pair.1);
        self.transformations.push(transformation);
        Ok(())
    }

    /// Transformation by id
    pub fn get(&self, id: &str) -> Option<&Transformation> {
        self.by_id.get(id).map(|&index| &self.transformations[index])
    }

    /// Transformation converting `source` values into `target` values
    pub fn find(&self, source: FieldKind, target: FieldKind) -> Option<&Transformation> {
        self.by_pair
            .get(&(source, target))
            .map(|&index| &self.transformations[index])
    }

    /// Every transformation declared for a kind pair, same-kind ones included
    pub fn available(&self, source: FieldKind, target: FieldKind) -> Vec<&Transformation> {
        self.transformations
            .iter()
            .filter(|t| t.source_kind == source && t.target_kind == target)
            .collect()
    }

    /// All transformations in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Transformation> {
        self.transformations.iter()
    }

    pub fn len(&self) -> usize {
        self.transformations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformations.is_empty()
    }

    /// Convert a value between two kinds
    ///
    /// Equal kinds pass the value through without touching the cache. A missing
    /// transformation or a failing one leaves the value unchanged.
    pub fn apply(
        &self,
        cache: &mut TransformationCache,
        source: FieldKind,
        target: FieldKind,
        value: &Value,
        options: &TransformOptions,
    ) -> Value {
        if source == target {
            return value.clone();
        }
        match self.find(source, target) {
            Some(transformation) => run_cached(transformation, cache, value, options),
            None => {
                log::warn!("No transformation from {} to {}; value left unchanged", source, target);
                value.clone()
            }
        }
    }

    /// Run a transformation named by id
    ///
    /// An unknown id or a failing transformation leaves the value unchanged.
    pub fn apply_by_id(
        &self,
        cache: &mut TransformationCache,
        id: &str,
        value: &Value,
        options: &TransformOptions,
    ) -> Value {
        match self.get(id) {
            Some(transformation) => run_cached(transformation, cache, value, options),
            None => {
                log::warn!("Transformation '{}' not found; value left unchanged", id);
                value.clone()
            }
        }
    }

    /// Run a transformation named by id, reporting failures instead of isolating them
    pub fn try_apply_by_id(
        &self,
        cache: &mut TransformationCache,
        id: &str,
        value: &Value,
        options: &TransformOptions,
    ) -> Result<Value> {
        let transformation = self
            .get(id)
            .ok_or_else(|| Error::TransformationNotFound { id: id.to_string() })?;
        cache
            .get_or_compute(id, value, options, || transformation.run(value, options))
            .map_err(|e| e.into_error(id))
    }
}

fn run_cached(
    transformation: &Transformation,
    cache: &mut TransformationCache,
    value: &Value,
    options: &TransformOptions,
) -> Value {
    let id = transformation.id.as_str();
    match cache.get_or_compute(id, value, options, || transformation.run(value, options)) {
        Ok(result) => result,
        Err(e) => {
            log::warn!(
                "Transformation '{}' failed on input {}: {}",
                id,
                preview(value),
                e
            );
            value.clone()
        }
    }
}

/// Truncated rendering of a value for log lines
pub(crate) fn preview(value: &Value) -> String {
    let rendered = value.to_string();
    match rendered.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &rendered[..cut]),
        None => rendered,
    }
}
