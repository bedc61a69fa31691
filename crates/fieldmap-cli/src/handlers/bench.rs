//! Bench command handler

use crate::cli::BenchArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use fieldmap_core::export::{export_file_name, save_export};
use fieldmap_core::optimization::{
    analyze_transformations, estimate_optimization_impact, generate_transformation_recommendations,
    identify_problem_transformations, OptimizationImpact, TransformationAnalysis,
};
use fieldmap_core::{
    analyze, auto_optimize, export_results, BenchmarkPlan, BenchmarkProgress, BenchmarkResult, BenchmarkTask,
    CacheSettings, CancellationFlag, ExportFormat, ExportOptions, OptimizationSummary, Recommendation,
    TransformationCache, TransformationRegistry,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{info, instrument, warn};

/// Everything a benchmark session produced
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BenchReport {
    results: Vec<BenchmarkResult>,
    summary: OptimizationSummary,
    transformations: Vec<TransformationAnalysis>,
    transformation_recommendations: Vec<Recommendation>,
    problem_transformations: Vec<String>,
    estimated_impact: OptimizationImpact,
    #[serde(skip_serializing_if = "Option::is_none")]
    applied_settings: Option<CacheSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    export_path: Option<PathBuf>,
}

/// Handle the bench command
#[instrument(skip_all, fields(transformation = ?args.transformation, all = args.all))]
pub async fn handle_bench(args: BenchArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::new("bench_command");
    let registry = Arc::new(TransformationRegistry::with_builtins()?);
    let cache = Arc::new(Mutex::new(TransformationCache::with_settings(config.cache_settings())?));

    let iterations = args.iterations.unwrap_or(config.benchmark.iterations);
    let samples = args.samples.unwrap_or(config.benchmark.sample_count);
    let plan = match &args.transformation {
        Some(id) => {
            if registry.get(id).is_none() {
                return Err(fieldmap_core::Error::TransformationNotFound { id: id.clone() }.into());
            }
            BenchmarkPlan::comparative(id, iterations, samples)
        }
        None => BenchmarkPlan::all(&registry, iterations, samples),
    };
    info!(runs = plan.runs.len(), iterations, samples, "Starting benchmark");
    output.info(&format!(
        "Running {} benchmark(s), {} iteration(s) of {} sample(s) each",
        plan.runs.len(),
        iterations,
        samples
    ))?;

    let results = run_plan(Arc::clone(&registry), Arc::clone(&cache), plan, output).await?;

    let mut cache = cache
        .lock()
        .map_err(|_| Error::other("benchmark cache lock poisoned"))?;
    let stats = cache.stats();
    let summary = analyze(&results, &stats, &cache.settings());
    let transformations = analyze_transformations(&registry, &results, &stats);
    let transformation_recommendations = generate_transformation_recommendations(&transformations);
    let problem_transformations = identify_problem_transformations(&transformations);
    let estimated_impact = estimate_optimization_impact(&transformations);

    let applied_settings = if args.auto_optimize {
        let settings = auto_optimize(&results, &mut cache)?;
        info!(capacity = settings.capacity, ttl = ?settings.ttl, "Cache settings optimized");
        Some(settings)
    } else {
        None
    };

    let export_path = match &args.export {
        Some(path) => {
            let format = args.format.map(ExportFormat::from).unwrap_or_else(|| infer_format(path));
            let path = resolve_export_path(path, format);
            let content = export_results(
                &results,
                Some(&summary),
                ExportOptions {
                    format,
                    include_timestamp: true,
                },
            )?;
            save_export(&path, &content)?;
            info!(path = %path.display(), %format, "Exported benchmark results");
            Some(path)
        }
        None => None,
    };

    let report = BenchReport {
        results,
        summary,
        transformations,
        transformation_recommendations,
        problem_transformations,
        estimated_impact,
        applied_settings,
        export_path,
    };
    write_report(&report, output)
}

/// Drive a benchmark task, reporting progress and honoring Ctrl-C
async fn run_plan(
    registry: Arc<TransformationRegistry>,
    cache: Arc<Mutex<TransformationCache>>,
    plan: BenchmarkPlan,
    output: &OutputWriter,
) -> Result<Vec<BenchmarkResult>> {
    let progress_bar = output.progress_bar(plan.total_iterations() as u64, "benchmarking");
    let flag = CancellationFlag::new();
    let mut task = BenchmarkTask::spawn_with_cancellation(registry, cache, plan, flag.clone());

    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling benchmark");
            flag.cancel();
        }
    });

    while let Some(event) = task.next_progress().await {
        match event {
            BenchmarkProgress::RunStarted {
                run,
                total_runs,
                transformation_id,
                with_cache,
            } => {
                if let Some(bar) = &progress_bar {
                    let mode = if with_cache { "cached" } else { "uncached" };
                    bar.set_message(format!("[{}/{}] {} ({})", run + 1, total_runs, transformation_id, mode));
                }
            }
            BenchmarkProgress::Iteration { .. } => {
                if let Some(bar) = &progress_bar {
                    bar.inc(1);
                }
            }
            BenchmarkProgress::RunFinished { result, .. } => {
                tracing::debug!(
                    transformation = %result.transformation_id,
                    with_cache = result.with_cache,
                    average_ms = result.average_time_ms,
                    "Run finished"
                );
            }
        }
    }

    let results = task.join().await;
    interrupt.abort();
    if let Some(bar) = progress_bar {
        bar.finish_and_clear();
    }
    Ok(results?)
}

fn infer_format(path: &Path) -> ExportFormat {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| ext.parse().ok())
        .unwrap_or_default()
}

/// An existing directory gets a timestamped file name inside it
fn resolve_export_path(path: &Path, format: ExportFormat) -> PathBuf {
    if path.is_dir() {
        path.join(export_file_name("fieldmap-benchmark", format, Some(chrono::Utc::now())))
    } else {
        path.to_path_buf()
    }
}

fn write_report(report: &BenchReport, output: &mut OutputWriter) -> Result<()> {
    if !output.is_human() {
        return output.data(report);
    }

    output.section("Benchmark results")?;
    let rows = report
        .results
        .iter()
        .map(|r| {
            vec![
                r.transformation_id.clone(),
                if r.with_cache { "yes" } else { "no" }.to_string(),
                format!("{:.3}", r.average_time_ms),
                format!("{:.2}", r.total_time_ms),
                r.failure_count.to_string(),
            ]
        })
        .collect();
    output.table(&["Transformation", "Cached", "Avg ms", "Total ms", "Failures"], rows)?;

    output.optimization_summary(&report.summary)?;

    if !report.problem_transformations.is_empty() {
        output.warning(&format!(
            "Transformations to review: {}",
            report.problem_transformations.join(", ")
        ))?;
    }
    for recommendation in &report.transformation_recommendations {
        output.info(&recommendation.description)?;
    }
    output.info(&format!(
        "Estimated impact: {:.1}% less time, +{:.0} points cache efficiency",
        report.estimated_impact.time_reduction, report.estimated_impact.efficiency_increase
    ))?;

    if let Some(settings) = &report.applied_settings {
        output.success(&format!(
            "✓ Cache tuned: capacity {}, TTL {}s",
            settings.capacity,
            settings.ttl.as_secs()
        ))?;
    }
    if let Some(path) = &report.export_path {
        output.success(&format!("✓ Exported results to {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{ExportFormatArg, OutputFormat};

    fn bench_args(transformation: Option<&str>) -> BenchArgs {
        BenchArgs {
            transformation: transformation.map(str::to_string),
            all: transformation.is_none(),
            iterations: Some(2),
            samples: Some(5),
            export: None,
            format: None,
            auto_optimize: false,
        }
    }

    fn writer() -> OutputWriter {
        let mut writer = OutputWriter::with_writer(OutputFormat::Json, false, true, Box::new(std::io::sink()));
        writer.disable_progress();
        writer
    }

    #[test]
    fn test_infer_format_from_extension() {
        assert_eq!(infer_format(Path::new("out/results.csv")), ExportFormat::Csv);
        assert_eq!(infer_format(Path::new("out/results.CSV")), ExportFormat::Csv);
        assert_eq!(infer_format(Path::new("out/results")), ExportFormat::Json);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unknown_transformation_is_rejected() {
        let err = handle_bench(bench_args(Some("nope")), &Config::default(), &mut writer())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Core(fieldmap_core::Error::TransformationNotFound { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_bench_exports_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.out");
        let mut args = bench_args(Some("date_to_text"));
        args.export = Some(path.clone());
        args.format = Some(ExportFormatArg::Csv);
        args.auto_optimize = true;

        handle_bench(args, &Config::default(), &mut writer()).await.unwrap();

        let csv = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("\"date\",\"text\""));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_export_into_directory_uses_timestamped_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = bench_args(Some("number_to_text"));
        args.export = Some(dir.path().to_path_buf());

        handle_bench(args, &Config::default(), &mut writer()).await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].starts_with("fieldmap-benchmark-"));
        assert!(entries[0].ends_with(".json"));
    }
}
