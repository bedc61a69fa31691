//! Per-transformation cost/benefit analysis

use super::{group_pairs, Impact, Recommendation, RecommendationType};
use crate::benchmark::{calculate_improvement, BenchmarkResult};
use crate::cache::{CacheStats, LookupCounters};
use crate::transformer::TransformationRegistry;
use serde::{Deserialize, Serialize};

/// Cost/benefit figures for one transformation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationAnalysis {
    pub transformation_id: String,
    pub transformation_name: String,
    pub average_time_ms: f64,
    pub average_time_with_cache_ms: f64,
    /// Percentage of time saved by the cache
    pub time_improvement: f64,
    /// 1 (low) to 3 (high)
    pub complexity: u8,
    /// Hit rate of this transformation's cache lookups
    pub cache_efficiency: f64,
    pub cost_benefit_ratio: f64,
    pub usage_count: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Higher means more to gain from optimizing this transformation
    pub optimization_potential: f64,
}

/// Projected effect of following the recommendations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationImpact {
    /// Percent, one decimal
    pub time_reduction: f64,
    /// Percentage points of cache efficiency to gain, whole number
    pub efficiency_increase: f64,
}

/// Build an analysis for every transformation with paired results
///
/// Lookup counters come from the cache's per-transformation statistics. A
/// transformation missing from them (for example stats loaded from an older
/// export) gets a share of the unattributed global counters in proportion to
/// its share of the unattributed results.
pub fn analyze_transformations(
    registry: &TransformationRegistry,
    results: &[BenchmarkResult],
    stats: &CacheStats,
) -> Vec<TransformationAnalysis> {
    group_pairs(results)
        .into_iter()
        .map(|(without, with)| {
            let id = without.transformation_id.as_str();
            let counters = match stats.by_transformation.get(id) {
                Some(counters) => *counters,
                None => proportional_counters(id, results, stats),
            };
            let complexity = registry
                .get(id)
                .map_or(1, |t| t.estimated_complexity.weight());
            let time_improvement = calculate_improvement(without, with);
            let cache_efficiency = counters.hit_rate();
            let usage_count = counters.lookups();

            TransformationAnalysis {
                transformation_id: id.to_string(),
                transformation_name: without.transformation_name.clone(),
                average_time_ms: without.average_time_ms,
                average_time_with_cache_ms: with.average_time_ms,
                time_improvement,
                complexity,
                cache_efficiency,
                cost_benefit_ratio: time_improvement * cache_efficiency / f64::from(complexity),
                usage_count,
                cache_hits: counters.hits,
                cache_misses: counters.misses,
                optimization_potential: without.average_time_ms * usage_count as f64
                    / (cache_efficiency + 0.1),
            }
        })
        .collect()
}

fn proportional_counters(id: &str, results: &[BenchmarkResult], stats: &CacheStats) -> LookupCounters {
    let unattributed: Vec<&BenchmarkResult> = results
        .iter()
        .filter(|r| !stats.by_transformation.contains_key(&r.transformation_id))
        .collect();
    if unattributed.is_empty() {
        return LookupCounters::default();
    }
    let attributed = stats
        .by_transformation
        .values()
        .fold(LookupCounters::default(), |acc, c| LookupCounters {
            hits: acc.hits + c.hits,
            misses: acc.misses + c.misses,
        });
    let share = unattributed.iter().filter(|r| r.transformation_id == id).count() as f64
        / unattributed.len() as f64;
    LookupCounters {
        hits: (stats.hits.saturating_sub(attributed.hits) as f64 * share).round() as u64,
        misses: (stats.misses.saturating_sub(attributed.misses) as f64 * share).round() as u64,
    }
}

/// Advice targeted at individual transformations
pub fn generate_transformation_recommendations(analyses: &[TransformationAnalysis]) -> Vec<Recommendation> {
    let mut by_potential: Vec<&TransformationAnalysis> = analyses.iter().collect();
    by_potential.sort_by(|a, b| b.optimization_potential.total_cmp(&a.optimization_potential));

    let mut recommendations: Vec<Recommendation> = by_potential
        .into_iter()
        .take(3)
        .filter(|a| a.cache_efficiency < 0.7 && a.average_time_ms > 5.0)
        .map(|a| {
            let impact = if a.usage_count > 100 && a.average_time_ms > 20.0 {
                Impact::High
            } else if a.usage_count > 50 || a.average_time_ms > 10.0 {
                Impact::Medium
            } else {
                Impact::Low
            };
            Recommendation::for_transformation(
                RecommendationType::OptimizeTransformation,
                impact,
                &a.transformation_id,
                &a.transformation_name,
                format!(
                    "\"{}\" takes {:.2}ms on average with a {:.0}% cache hit rate; optimize its implementation",
                    a.transformation_name,
                    a.average_time_ms,
                    a.cache_efficiency * 100.0
                ),
            )
        })
        .collect();

    recommendations.extend(
        analyses
            .iter()
            .filter(|a| a.complexity > 2 && a.usage_count > 20 && a.cache_efficiency < 0.5)
            .map(|a| {
                Recommendation::for_transformation(
                    RecommendationType::PrecalculateValues,
                    Impact::Medium,
                    &a.transformation_id,
                    &a.transformation_name,
                    format!(
                        "\"{}\" is complex and frequently used; precalculate its common values",
                        a.transformation_name
                    ),
                )
            }),
    );

    tracing::debug!(count = recommendations.len(), "transformation recommendations generated");
    recommendations
}

/// Ids of slow, frequently used transformations the cache does not help
pub fn identify_problem_transformations(analyses: &[TransformationAnalysis]) -> Vec<String> {
    analyses
        .iter()
        .filter(|a| a.average_time_ms > 20.0 && a.cache_efficiency < 0.3 && a.usage_count > 10)
        .map(|a| a.transformation_id.clone())
        .collect()
}

/// Estimate what following the recommendations would gain
///
/// Time reduction is the mean improvement of the analyzed transformations;
/// efficiency increase is the distance from the usage-weighted hit rate to
/// 90%.
pub fn estimate_optimization_impact(analyses: &[TransformationAnalysis]) -> OptimizationImpact {
    if analyses.is_empty() {
        return OptimizationImpact {
            time_reduction: 0.0,
            efficiency_increase: 0.0,
        };
    }
    let mean_improvement =
        analyses.iter().map(|a| a.time_improvement).sum::<f64>() / analyses.len() as f64;

    let total_usage: u64 = analyses.iter().map(|a| a.usage_count).sum();
    let weighted_efficiency = if total_usage == 0 {
        0.0
    } else {
        analyses
            .iter()
            .map(|a| a.cache_efficiency * a.usage_count as f64)
            .sum::<f64>()
            / total_usage as f64
    };

    OptimizationImpact {
        time_reduction: (mean_improvement * 10.0).round() / 10.0,
        efficiency_increase: ((0.9 - weighted_efficiency).max(0.0) * 100.0).round(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::result;
    use super::*;
    use crate::benchmark::run_all;
    use crate::cache::TransformationCache;
    use std::collections::BTreeMap;

    fn analysis(id: &str, average: f64, efficiency: f64, usage: u64, complexity: u8) -> TransformationAnalysis {
        TransformationAnalysis {
            transformation_id: id.to_string(),
            transformation_name: id.to_string(),
            average_time_ms: average,
            average_time_with_cache_ms: average / 2.0,
            time_improvement: 50.0,
            complexity,
            cache_efficiency: efficiency,
            cost_benefit_ratio: 50.0 * efficiency / f64::from(complexity),
            usage_count: usage,
            cache_hits: (usage as f64 * efficiency) as u64,
            cache_misses: usage - (usage as f64 * efficiency) as u64,
            optimization_potential: average * usage as f64 / (efficiency + 0.1),
        }
    }

    #[test]
    fn test_analysis_uses_per_transformation_counters() {
        let registry = TransformationRegistry::with_builtins().unwrap();
        let results = vec![
            result("text_to_date", 10.0, false),
            result("text_to_date", 5.0, true),
        ];
        let mut by_transformation = BTreeMap::new();
        by_transformation.insert("text_to_date".to_string(), LookupCounters { hits: 3, misses: 1 });
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            size: 1,
            hit_rate: 0.75,
            capacity: 500,
            by_transformation,
        };

        let analyses = analyze_transformations(&registry, &results, &stats);
        assert_eq!(analyses.len(), 1);
        let a = &analyses[0];
        assert_eq!(a.usage_count, 4);
        assert!((a.cache_efficiency - 0.75).abs() < 1e-9);
        assert!((a.time_improvement - 50.0).abs() < 1e-9);
        let expected_ratio = 50.0 * 0.75 / f64::from(a.complexity);
        assert!((a.cost_benefit_ratio - expected_ratio).abs() < 1e-9);
    }

    #[test]
    fn test_analysis_falls_back_to_proportional_counters() {
        let registry = TransformationRegistry::with_builtins().unwrap();
        let results = vec![
            result("a", 10.0, false),
            result("a", 5.0, true),
            result("b", 10.0, false),
            result("b", 8.0, true),
        ];
        let stats = CacheStats {
            hits: 10,
            misses: 30,
            size: 5,
            hit_rate: 0.25,
            capacity: 500,
            by_transformation: BTreeMap::new(),
        };
        let analyses = analyze_transformations(&registry, &results, &stats);
        assert_eq!(analyses.len(), 2);
        assert_eq!(analyses[0].cache_hits, 5);
        assert_eq!(analyses[0].cache_misses, 15);
        // Unknown ids fall back to the lowest complexity
        assert_eq!(analyses[1].complexity, 1);
    }

    #[test]
    fn test_missing_id_gets_unattributed_share() {
        let registry = TransformationRegistry::with_builtins().unwrap();
        let results = vec![
            result("a", 10.0, false),
            result("a", 5.0, true),
            result("b", 10.0, false),
            result("b", 8.0, true),
        ];
        let mut by_transformation = BTreeMap::new();
        by_transformation.insert("a".to_string(), LookupCounters { hits: 6, misses: 2 });
        let stats = CacheStats {
            hits: 10,
            misses: 12,
            size: 5,
            hit_rate: 10.0 / 22.0,
            capacity: 500,
            by_transformation,
        };
        let analyses = analyze_transformations(&registry, &results, &stats);
        assert_eq!((analyses[0].cache_hits, analyses[0].cache_misses), (6, 2));
        assert_eq!((analyses[1].cache_hits, analyses[1].cache_misses), (4, 10));
    }

    #[test]
    fn test_analysis_after_full_benchmark_run() {
        let registry = TransformationRegistry::with_builtins().unwrap();
        let mut cache = TransformationCache::new();
        let results = run_all(&registry, &mut cache, 3, 10).unwrap();

        let analyses = analyze_transformations(&registry, &results, &cache.stats());
        assert_eq!(analyses.len() * 2, results.len());
        assert!(analyses.len() > 1);
        for a in &analyses {
            assert_eq!(a.usage_count, 30, "{}", a.transformation_id);
            assert_eq!(a.cache_hits + a.cache_misses, 30);
        }
        // Samples repeat across iterations, so every successful transformation hits
        assert!(analyses.iter().filter(|a| a.cache_hits > 0).count() > 1);
    }

    #[test]
    fn test_optimize_transformation_impact() {
        let analyses = vec![
            analysis("slow", 25.0, 0.2, 150, 2),
            analysis("busy", 6.0, 0.4, 60, 1),
            analysis("quick", 2.0, 0.1, 500, 1),
            analysis("cached", 30.0, 0.95, 200, 1),
        ];
        let recommendations = generate_transformation_recommendations(&analyses);
        let optimize: Vec<(&str, Impact)> = recommendations
            .iter()
            .filter(|r| r.kind == RecommendationType::OptimizeTransformation)
            .map(|r| (r.transformation_id.as_deref().unwrap_or(""), r.impact))
            .collect();
        // "busy" ranks fourth by potential and is left out
        assert_eq!(optimize, vec![("slow", Impact::High)]);
    }

    #[test]
    fn test_precalculate_complex_transformations() {
        let analyses = vec![
            analysis("complex", 1.0, 0.3, 30, 3),
            analysis("simple", 1.0, 0.3, 30, 1),
        ];
        let recommendations = generate_transformation_recommendations(&analyses);
        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].kind, RecommendationType::PrecalculateValues);
        assert_eq!(recommendations[0].transformation_id.as_deref(), Some("complex"));
    }

    #[test]
    fn test_problem_transformations() {
        let analyses = vec![
            analysis("problem", 25.0, 0.1, 20, 1),
            analysis("rare", 25.0, 0.1, 5, 1),
            analysis("fast", 5.0, 0.1, 50, 1),
        ];
        assert_eq!(identify_problem_transformations(&analyses), vec!["problem".to_string()]);
    }

    #[test]
    fn test_estimate_impact() {
        let analyses = vec![analysis("a", 10.0, 0.5, 10, 1), analysis("b", 10.0, 0.7, 30, 1)];
        let impact = estimate_optimization_impact(&analyses);
        assert_eq!(impact.time_reduction, 50.0);
        // Weighted efficiency is 0.65, 25 points below 0.9
        assert_eq!(impact.efficiency_increase, 25.0);

        let empty = estimate_optimization_impact(&[]);
        assert_eq!(empty.time_reduction, 0.0);
    }
}
