//! Benchmark harness for transformations
//!
//! Measures the wall-clock cost of running a transformation over a set of
//! generated samples, with and without the result cache. Runs are synchronous;
//! [`BenchmarkTask`] moves them onto tokio's blocking pool with progress
//! reporting and cooperative cancellation.

mod samples;
mod task;

pub use samples::generate_sample_data;
pub use task::{BenchmarkPlan, BenchmarkProgress, BenchmarkTask, CancellationFlag};

use crate::cache::TransformationCache;
use crate::transformer::registry::preview;
use crate::transformer::{TransformOptions, TransformationRegistry};
use crate::types::FieldKind;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Default iterations per run
pub const DEFAULT_ITERATIONS: usize = 10;

/// Default samples per iteration
pub const DEFAULT_SAMPLE_COUNT: usize = 50;

/// Parameters of one benchmark run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkConfig {
    pub transformation_id: String,
    pub iterations: usize,
    pub sample_count: usize,
    pub with_cache: bool,
}

impl BenchmarkConfig {
    pub fn new(transformation_id: impl Into<String>, with_cache: bool) -> Self {
        Self {
            transformation_id: transformation_id.into(),
            iterations: DEFAULT_ITERATIONS,
            sample_count: DEFAULT_SAMPLE_COUNT,
            with_cache,
        }
    }

    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn sample_count(mut self, sample_count: usize) -> Self {
        self.sample_count = sample_count;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(Error::InvalidBenchmark {
                transformation_id: self.transformation_id.clone(),
                message: "iterations must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Timing of one benchmark run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkResult {
    pub transformation_id: String,
    pub transformation_name: String,
    pub source_kind: FieldKind,
    pub target_kind: FieldKind,
    pub iterations: usize,
    /// Total elapsed time across all iterations, in milliseconds
    pub total_time_ms: f64,
    /// `total_time_ms / iterations`
    pub average_time_ms: f64,
    pub with_cache: bool,
    pub sample_count: usize,
    /// Sample transformations that returned an error, across all iterations
    #[serde(default)]
    pub failure_count: usize,
}

/// Run one benchmark
///
/// When `with_cache` is false the cache entries are dropped up front, lookup
/// counters kept, and the transformation is called directly. Otherwise every
/// sample goes through a cache lookup and a store on miss.
pub fn run_benchmark(
    registry: &TransformationRegistry,
    cache: &mut TransformationCache,
    config: &BenchmarkConfig,
) -> Result<BenchmarkResult> {
    execute(registry, cache, config, |_| Ok(()))
}

/// Run without and then with the cache, returning `[without, with]`
pub fn run_comparative_benchmark(
    registry: &TransformationRegistry,
    cache: &mut TransformationCache,
    transformation_id: &str,
    iterations: usize,
    sample_count: usize,
) -> Result<[BenchmarkResult; 2]> {
    let without = run_benchmark(
        registry,
        cache,
        &BenchmarkConfig::new(transformation_id, false)
            .iterations(iterations)
            .sample_count(sample_count),
    )?;
    let with = run_benchmark(
        registry,
        cache,
        &BenchmarkConfig::new(transformation_id, true)
            .iterations(iterations)
            .sample_count(sample_count),
    )?;
    Ok([without, with])
}

/// Comparative runs for every benchmarkable transformation, in registration order
pub fn run_all(
    registry: &TransformationRegistry,
    cache: &mut TransformationCache,
    iterations: usize,
    sample_count: usize,
) -> Result<Vec<BenchmarkResult>> {
    let mut results = Vec::new();
    for transformation in registry.iter().filter(|t| t.benchmarkable) {
        results.extend(run_comparative_benchmark(
            registry,
            cache,
            &transformation.id,
            iterations,
            sample_count,
        )?);
    }
    Ok(results)
}

/// Percentage of average time saved by the cache
///
/// Negative when the cached run was slower; 0 when the baseline took no time.
pub fn calculate_improvement(without_cache: &BenchmarkResult, with_cache: &BenchmarkResult) -> f64 {
    if without_cache.average_time_ms <= 0.0 {
        return 0.0;
    }
    (without_cache.average_time_ms - with_cache.average_time_ms) / without_cache.average_time_ms * 100.0
}

/// Benchmark loop shared by the synchronous and background entry points
///
/// `after_iteration` receives the number of completed iterations and may abort the run.
pub(crate) fn execute(
    registry: &TransformationRegistry,
    cache: &mut TransformationCache,
    config: &BenchmarkConfig,
    mut after_iteration: impl FnMut(usize) -> Result<()>,
) -> Result<BenchmarkResult> {
    config.validate()?;
    let transformation = registry
        .get(&config.transformation_id)
        .ok_or_else(|| Error::TransformationNotFound {
            id: config.transformation_id.clone(),
        })?;

    let span = tracing::info_span!(
        "benchmark",
        transformation = %transformation.id,
        with_cache = config.with_cache,
        iterations = config.iterations,
        samples = config.sample_count
    );
    let _guard = span.enter();

    // Entries only; lookup counters carry across runs
    if !config.with_cache {
        cache.clear_entries();
    }

    let samples = generate_sample_data(transformation.source_kind, config.sample_count);
    let options = TransformOptions::new();
    let id = transformation.id.as_str();
    let mut total_time_ms = 0.0;
    let mut failure_count = 0;

    for iteration in 0..config.iterations {
        let start = Instant::now();
        for sample in &samples {
            let outcome = if config.with_cache {
                match cache.get(id, sample, &options) {
                    Some(_) => Ok(()),
                    None => transformation
                        .run(sample, &options)
                        .map(|output| cache.set(id, sample, &options, output)),
                }
            } else {
                transformation.run(sample, &options).map(drop)
            };

            if let Err(e) = outcome {
                failure_count += 1;
                tracing::warn!(sample = %preview(sample), error = %e, "benchmark sample failed");
            }
        }
        total_time_ms += start.elapsed().as_secs_f64() * 1000.0;
        after_iteration(iteration + 1)?;
    }

    let result = BenchmarkResult {
        transformation_id: transformation.id.clone(),
        transformation_name: transformation.name.clone(),
        source_kind: transformation.source_kind,
        target_kind: transformation.target_kind,
        iterations: config.iterations,
        total_time_ms,
        average_time_ms: total_time_ms / config.iterations as f64,
        with_cache: config.with_cache,
        sample_count: config.sample_count,
        failure_count,
    };
    tracing::debug!(
        total_ms = result.total_time_ms,
        average_ms = result.average_time_ms,
        failures = result.failure_count,
        "benchmark finished"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transformer::{TransformationBuilder, TransformationError};
    use serde_json::json;

    fn result(id: &str, average: f64, with_cache: bool) -> BenchmarkResult {
        BenchmarkResult {
            transformation_id: id.to_string(),
            transformation_name: id.to_string(),
            source_kind: FieldKind::Text,
            target_kind: FieldKind::Number,
            iterations: 1,
            total_time_ms: average,
            average_time_ms: average,
            with_cache,
            sample_count: 1,
            failure_count: 0,
        }
    }

    #[test]
    fn test_run_benchmark_reports_shape() {
        let registry = TransformationRegistry::with_builtins().unwrap();
        let mut cache = TransformationCache::new();
        let config = BenchmarkConfig::new("number_to_text", false).iterations(3).sample_count(7);

        let result = run_benchmark(&registry, &mut cache, &config).unwrap();
        assert_eq!(result.transformation_id, "number_to_text");
        assert_eq!(result.source_kind, FieldKind::Number);
        assert_eq!(result.target_kind, FieldKind::Text);
        assert_eq!((result.iterations, result.sample_count, result.failure_count), (3, 7, 0));
        assert!(result.total_time_ms >= 0.0);
        assert!((result.average_time_ms - result.total_time_ms / 3.0).abs() < 1e-9);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cached_run_populates_cache() {
        let registry = TransformationRegistry::with_builtins().unwrap();
        let mut cache = TransformationCache::new();
        let config = BenchmarkConfig::new("select_to_text", true).iterations(4).sample_count(5);

        run_benchmark(&registry, &mut cache, &config).unwrap();
        let stats = cache.stats();
        assert_eq!(stats.size, 5);
        assert_eq!(stats.misses, 5);
        assert_eq!(stats.hits, 15);
    }

    #[test]
    fn test_uncached_run_drops_entries_but_keeps_counters() {
        let registry = TransformationRegistry::with_builtins().unwrap();
        let mut cache = TransformationCache::new();
        cache.set("select_to_text", &json!(1), &TransformOptions::new(), json!("1"));
        cache.get("select_to_text", &json!(1), &TransformOptions::new());

        let config = BenchmarkConfig::new("select_to_text", false).iterations(1).sample_count(2);
        run_benchmark(&registry, &mut cache, &config).unwrap();
        assert!(cache.is_empty());
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.by_transformation["select_to_text"].hits, 1);
    }

    #[test]
    fn test_run_all_keeps_counters_for_every_transformation() {
        let registry = TransformationRegistry::with_builtins().unwrap();
        let mut cache = TransformationCache::new();

        let results = run_all(&registry, &mut cache, 2, 3).unwrap();
        let stats = cache.stats();
        let benchmarked: Vec<&str> = registry
            .iter()
            .filter(|t| t.benchmarkable)
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(results.len(), benchmarked.len() * 2);
        assert_eq!(stats.by_transformation.len(), benchmarked.len());
        for id in benchmarked {
            // One lookup per sample per cached iteration
            assert_eq!(stats.by_transformation[id].lookups(), 6, "{}", id);
        }
    }

    #[test]
    fn test_invalid_config() {
        let registry = TransformationRegistry::with_builtins().unwrap();
        let mut cache = TransformationCache::new();

        let zero = BenchmarkConfig::new("select_to_text", false).iterations(0);
        assert!(matches!(
            run_benchmark(&registry, &mut cache, &zero),
            Err(Error::InvalidBenchmark { .. })
        ));

        let unknown = BenchmarkConfig::new("does_not_exist", false);
        assert!(matches!(
            run_benchmark(&registry, &mut cache, &unknown),
            Err(Error::TransformationNotFound { .. })
        ));
    }

    #[test]
    fn test_failures_are_counted() {
        let mut registry = TransformationRegistry::new();
        registry
            .register(
                TransformationBuilder::new("flaky", FieldKind::Number, FieldKind::Text)
                    .name("Flaky")
                    .transform(|value, _| match value.as_f64() {
                        Some(n) if n > 20.0 => Err(TransformationError::Rejected {
                            message: "too large".to_string(),
                        }),
                        _ => Ok(json!("ok")),
                    })
                    .example(json!(1), json!("ok"))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let mut cache = TransformationCache::new();

        // Samples 0.1, 10.6, 21.1, 31.6: two fail on each iteration
        let config = BenchmarkConfig::new("flaky", true).iterations(3).sample_count(4);
        let result = run_benchmark(&registry, &mut cache, &config).unwrap();
        assert_eq!(result.failure_count, 6);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_comparative_order() {
        let registry = TransformationRegistry::with_builtins().unwrap();
        let mut cache = TransformationCache::new();
        let [without, with] =
            run_comparative_benchmark(&registry, &mut cache, "text_to_number", 2, 10).unwrap();
        assert!(!without.with_cache);
        assert!(with.with_cache);
        assert_eq!(without.transformation_id, with.transformation_id);
    }

    #[test]
    fn test_run_all_skips_non_benchmarkable() {
        let mut registry = TransformationRegistry::new();
        for (id, benchmarkable) in [("a_to_b", true), ("c_to_d", false)] {
            let (source, target) = if benchmarkable {
                (FieldKind::Number, FieldKind::Text)
            } else {
                (FieldKind::Checkbox, FieldKind::Text)
            };
            let mut builder = TransformationBuilder::new(id, source, target)
                .name(id)
                .transform(|v, _| Ok(v.clone()))
                .example(json!(1), json!(1));
            if !benchmarkable {
                builder = builder.not_benchmarkable();
            }
            registry.register(builder.build().unwrap()).unwrap();
        }
        let mut cache = TransformationCache::new();

        let results = run_all(&registry, &mut cache, 1, 2).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.transformation_id == "a_to_b"));
    }

    #[test]
    fn test_calculate_improvement() {
        assert_eq!(calculate_improvement(&result("t", 10.0, false), &result("t", 2.5, true)), 75.0);
        assert_eq!(calculate_improvement(&result("t", 10.0, false), &result("t", 12.0, true)), -20.0);
        assert_eq!(calculate_improvement(&result("t", 0.0, false), &result("t", 1.0, true)), 0.0);
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let json = serde_json::to_value(result("text_to_number", 1.5, true)).unwrap();
        assert_eq!(json["transformationId"], json!("text_to_number"));
        assert_eq!(json["averageTimeMs"], json!(1.5));
        assert_eq!(json["sourceKind"], json!("text"));
        assert_eq!(json["withCache"], json!(true));
    }
}
