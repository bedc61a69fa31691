//! Value transformations between field kinds
//!
//! A transformation converts a value of one [`FieldKind`](crate::FieldKind) into
//! a value of another. Transformations are plain function pointers over
//! `serde_json::Value`; they are pure, deterministic and total over their source
//! kind, which is what makes their results cacheable.
//!
//! # Module Organization
//!
//! - [`types`] - Transformation record, option bag and error type
//! - [`registry`] - Registry with the cached apply path
//! - [`builder`] - Fluent builder for custom transformations
//! - [`built_in`] - The built-in transformation set
//!
//! # Examples
//!
//! ```
//! use fieldmap_core::{FieldKind, TransformOptions, TransformationCache, TransformationRegistry};
//! use serde_json::json;
//!
//! let registry = TransformationRegistry::with_builtins().unwrap();
//! let mut cache = TransformationCache::new();
//!
//! let text = registry.apply(
//!     &mut cache,
//!     FieldKind::Date,
//!     FieldKind::Text,
//!     &json!({ "start": "2023-05-15" }),
//!     &TransformOptions::new(),
//! );
//! assert_eq!(text, json!("15/05/2023"));
//! ```
//!
//! Copyright (c) 2025 Fieldmap Team
//! Licensed under the Apache-2.0 license

// Core types and error definitions
pub mod types;

// Registry and cached application
pub mod registry;

// Builder API
pub mod builder;

// Built-in transformation set
pub mod built_in;

#[cfg(test)]
mod tests;

pub use builder::TransformationBuilder;
pub use registry::TransformationRegistry;
pub use types::{
    TransformExample, TransformFn, TransformOptions, TransformResult, Transformation,
    TransformationError,
};
