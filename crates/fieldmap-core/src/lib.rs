//! Fieldmap Core - Field-mapping engine for case-study publishing
//!
//! This crate decides whether a field from a source database (Notion-style
//! property types) can feed a field of the case-study schema, converts values
//! between field kinds, caches those conversions and measures how much the
//! cache helps.
//!
//! # Main Components
//!
//! - **Type Model**: Field kinds, source and destination fields ([`types`])
//! - **Compatibility Matrix**: Classification of destination/source pairs ([`compatibility`])
//! - **Transformations**: Built-in conversions and their registry ([`transformer`])
//! - **Cache**: FIFO + TTL cache of transformation outputs ([`cache`])
//! - **Benchmarks**: Timing harness over deterministic samples ([`benchmark`])
//! - **Optimization**: Recommendations derived from benchmark results ([`optimization`])
//! - **Export**: JSON and CSV reports ([`export`])
//! - **Mapping**: Applying a saved mapping configuration to records ([`mapping`])
//!
//! # Example
//!
//! ```
//! use fieldmap_core::{classify, CompatibilityStatus, FieldKind, TransformationRegistry};
//!
//! fn example() -> fieldmap_core::Result<()> {
//!     let registry = TransformationRegistry::with_builtins()?;
//!     let result = classify(&registry, FieldKind::Text, FieldKind::RichText);
//!     assert_eq!(result.status, CompatibilityStatus::RequiresTransformation);
//!     assert_eq!(result.transformation_id.as_deref(), Some("rich_text_to_text"));
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub mod benchmark;
pub mod cache;
pub mod compatibility;
pub mod error;
pub mod export;
pub mod mapping;
pub mod optimization;
pub mod transformer;
pub mod types;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use types::{
    case_study_schema, CaseStudySection, Complexity, DestinationField, Field, FieldKind, FieldSet,
    PerformanceImpact, SourceField,
};

pub use transformer::{
    TransformExample, TransformOptions, Transformation, TransformationBuilder, TransformationError,
    TransformationRegistry,
};

pub use cache::{CacheSettings, CacheStats, SettingsUpdate, TransformationCache};

pub use compatibility::{
    classify, is_directly_compatible, CompatibilityResult, CompatibilityStatus, MappingOutcome,
    MappingValidation,
};

pub use benchmark::{
    calculate_improvement, run_all, run_benchmark, run_comparative_benchmark, BenchmarkConfig,
    BenchmarkPlan, BenchmarkProgress, BenchmarkResult, BenchmarkTask, CancellationFlag,
};

pub use optimization::{
    analyze, auto_optimize, Impact, OptimizationSummary, Recommendation, RecommendationType,
};

pub use export::{export_results, BenchmarkExport, ExportFormat, ExportOptions};

pub use mapping::{FieldMapping, MappedRecord, MappingConfig, MappingEngine, MappingStore, SchemaProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_reexports_cover_main_flow() {
        let registry = TransformationRegistry::with_builtins().unwrap();
        let mut cache = TransformationCache::new();
        let results = run_comparative_benchmark(&registry, &mut cache, "date_to_text", 2, 3).unwrap();
        let summary = analyze(&results, &cache.stats(), &cache.settings());
        assert_eq!(summary.overall_performance.transformations_analyzed, 1);
    }
}
