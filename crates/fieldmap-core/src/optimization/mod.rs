//! Optimization analysis of benchmark results
//!
//! Turns benchmark results and cache statistics into ranked, advisory
//! recommendations. Nothing here changes the cache except [`auto_optimize`] and
//! [`apply_recommended_settings`], and `auto_optimize` only ever grows capacity
//! and TTL.

mod analysis;

pub use analysis::{
    analyze_transformations, estimate_optimization_impact, generate_transformation_recommendations,
    identify_problem_transformations, OptimizationImpact, TransformationAnalysis,
};

use crate::benchmark::{calculate_improvement, BenchmarkResult};
use crate::cache::{CacheSettings, CacheStats, SettingsUpdate, TransformationCache};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Improvement (percent) above which caching should be prioritized
pub const PRIORITIZE_THRESHOLD: f64 = 50.0;

/// Improvement (percent) below which caching is not worth its overhead
pub const SKIP_THRESHOLD: f64 = 5.0;

/// Kinds of tuning advice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    IncreaseTtl,
    IncreaseCapacity,
    DecreaseTtl,
    DecreaseCapacity,
    PrioritizeCaching,
    SkipCaching,
    OptimizeTransformation,
    PrecalculateValues,
}

/// Expected effect of following a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Low,
    Medium,
    High,
}

/// One piece of advice
///
/// For capacity recommendations the values are entry counts; for TTL
/// recommendations they are milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationType,
    pub impact: Impact,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformation_name: Option<String>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_value: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_value: Option<u64>,
}

impl Recommendation {
    fn for_transformation(
        kind: RecommendationType,
        impact: Impact,
        id: &str,
        name: &str,
        description: String,
    ) -> Self {
        Self {
            kind,
            impact,
            transformation_id: Some(id.to_string()),
            transformation_name: Some(name.to_string()),
            description,
            current_value: None,
            suggested_value: None,
        }
    }

    fn for_cache(kind: RecommendationType, impact: Impact, description: &str, current: u64, suggested: u64) -> Self {
        Self {
            kind,
            impact,
            transformation_id: None,
            transformation_name: None,
            description: description.to_string(),
            current_value: Some(current),
            suggested_value: Some(suggested),
        }
    }
}

/// Cache improvement of one transformation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationImprovement {
    pub transformation_id: String,
    pub transformation_name: String,
    /// Percentage of average time saved by the cache
    pub improvement: f64,
}

/// Aggregate view over all analyzed transformations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallPerformance {
    pub average_improvement: f64,
    pub best_improvement: f64,
    pub best_transformation_name: Option<String>,
    pub worst_transformation_name: Option<String>,
    pub transformations_analyzed: usize,
}

/// Cache state at analysis time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSnapshot {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

/// Result of [`analyze`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationSummary {
    pub overall_performance: OverallPerformance,
    /// Per-transformation improvements, best first
    pub improvements: Vec<TransformationImprovement>,
    pub cache_stats: CacheSnapshot,
    pub recommendations: Vec<Recommendation>,
}

/// Analyze benchmark results against the current cache state
///
/// Results are grouped by transformation id; a transformation is analyzed
/// only when it has both a without-cache and a with-cache result.
///
/// Cache-wide advice needs at least one lookup. A cold cache reports a hit
/// rate of 0, which would otherwise always ask for a longer TTL; it gets no
/// cache-wide recommendations at all.
pub fn analyze(results: &[BenchmarkResult], stats: &CacheStats, settings: &CacheSettings) -> OptimizationSummary {
    let mut improvements: Vec<TransformationImprovement> = group_pairs(results)
        .into_iter()
        .map(|(without, with)| TransformationImprovement {
            transformation_id: with.transformation_id.clone(),
            transformation_name: with.transformation_name.clone(),
            improvement: calculate_improvement(without, with),
        })
        .collect();
    improvements.sort_by(|a, b| b.improvement.total_cmp(&a.improvement));

    let mut recommendations = Vec::new();
    for item in &improvements {
        if item.improvement > PRIORITIZE_THRESHOLD {
            recommendations.push(Recommendation::for_transformation(
                RecommendationType::PrioritizeCaching,
                Impact::High,
                &item.transformation_id,
                &item.transformation_name,
                format!(
                    "\"{}\" benefits greatly from caching ({:.2}% faster); prioritize it in the cache",
                    item.transformation_name, item.improvement
                ),
            ));
        } else if item.improvement < SKIP_THRESHOLD {
            recommendations.push(Recommendation::for_transformation(
                RecommendationType::SkipCaching,
                Impact::Low,
                &item.transformation_id,
                &item.transformation_name,
                format!(
                    "\"{}\" barely improves with caching ({:.2}%); consider skipping the cache for it",
                    item.transformation_name, item.improvement
                ),
            ));
        }
    }
    if stats.lookups() > 0 {
        recommendations.extend(cache_recommendations(stats, settings));
    }

    let count = improvements.len();
    let overall_performance = OverallPerformance {
        average_improvement: if count == 0 {
            0.0
        } else {
            improvements.iter().map(|i| i.improvement).sum::<f64>() / count as f64
        },
        best_improvement: improvements.first().map_or(0.0, |i| i.improvement),
        best_transformation_name: improvements.first().map(|i| i.transformation_name.clone()),
        worst_transformation_name: improvements.last().map(|i| i.transformation_name.clone()),
        transformations_analyzed: count,
    };

    tracing::debug!(
        analyzed = count,
        recommendations = recommendations.len(),
        "optimization analysis finished"
    );

    OptimizationSummary {
        overall_performance,
        improvements,
        cache_stats: CacheSnapshot {
            size: stats.size,
            capacity: settings.capacity,
            hits: stats.hits,
            misses: stats.misses,
            hit_rate: stats.hit_rate,
        },
        recommendations,
    }
}

fn cache_recommendations(stats: &CacheStats, settings: &CacheSettings) -> Vec<Recommendation> {
    let capacity = settings.capacity as f64;
    let size = stats.size as f64;
    let ttl_ms = settings.ttl.as_millis() as u64;
    let mut recommendations = Vec::new();

    if stats.hit_rate < 0.5 && size >= capacity * 0.9 {
        recommendations.push(Recommendation::for_cache(
            RecommendationType::IncreaseCapacity,
            Impact::Medium,
            "The cache is nearly full and its hit rate is low; increase its capacity",
            settings.capacity as u64,
            (capacity * 1.5).floor() as u64,
        ));
    }
    if stats.hit_rate < 0.3 {
        recommendations.push(Recommendation::for_cache(
            RecommendationType::IncreaseTtl,
            Impact::Medium,
            "The hit rate is very low; increase the TTL to keep entries longer",
            ttl_ms,
            ttl_ms.saturating_mul(2),
        ));
    }
    let shrink_to = ((size * 1.5).floor() as u64).max(100);
    if stats.hit_rate > 0.9 && size < capacity * 0.5 && shrink_to < settings.capacity as u64 {
        recommendations.push(Recommendation::for_cache(
            RecommendationType::DecreaseCapacity,
            Impact::Low,
            "The hit rate is high while less than half the capacity is used; capacity can be reduced",
            settings.capacity as u64,
            shrink_to,
        ));
    }
    recommendations
}

/// `(without_cache, with_cache)` pairs per transformation id, in first-seen order
pub(crate) fn group_pairs(results: &[BenchmarkResult]) -> Vec<(&BenchmarkResult, &BenchmarkResult)> {
    let mut ids: Vec<&str> = Vec::new();
    for result in results {
        if !ids.contains(&result.transformation_id.as_str()) {
            ids.push(&result.transformation_id);
        }
    }
    ids.into_iter()
        .filter_map(|id| {
            let mut runs = results.iter().filter(|r| r.transformation_id == id);
            let without = runs.clone().find(|r| !r.with_cache)?;
            let with = runs.find(|r| r.with_cache)?;
            Some((without, with))
        })
        .collect()
}

/// Analyze results and apply the capacity and TTL increases it recommends
///
/// Decreases are never applied. Returns the resulting settings.
pub fn auto_optimize(results: &[BenchmarkResult], cache: &mut TransformationCache) -> Result<CacheSettings> {
    let summary = analyze(results, &cache.stats(), &cache.settings());
    let mut update = SettingsUpdate::default();
    for recommendation in &summary.recommendations {
        match (recommendation.kind, recommendation.suggested_value) {
            (RecommendationType::IncreaseCapacity, Some(capacity)) => {
                update.capacity = Some(capacity as usize);
            }
            (RecommendationType::IncreaseTtl, Some(ttl_ms)) => {
                update.ttl = Some(Duration::from_millis(ttl_ms));
            }
            _ => {}
        }
    }
    tracing::info!(
        capacity = ?update.capacity,
        ttl = ?update.ttl,
        "applying automatic cache optimization"
    );
    cache.update_settings(update)
}

/// Apply an explicit settings change, typically taken from a recommendation
pub fn apply_recommended_settings(cache: &mut TransformationCache, update: SettingsUpdate) -> Result<CacheSettings> {
    cache.update_settings(update)
}
