//! Background benchmark execution
//!
//! A [`BenchmarkTask`] runs a [`BenchmarkPlan`] on tokio's blocking pool. Progress
//! is streamed over an unbounded channel and cancellation is cooperative: the
//! flag is checked after every iteration.

use super::{execute, BenchmarkConfig, BenchmarkResult};
use crate::cache::TransformationCache;
use crate::transformer::TransformationRegistry;
use crate::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Shared cancellation signal
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Ordered list of benchmark runs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkPlan {
    pub runs: Vec<BenchmarkConfig>,
}

impl BenchmarkPlan {
    pub fn single(config: BenchmarkConfig) -> Self {
        Self { runs: vec![config] }
    }

    /// Without-cache then with-cache runs of one transformation
    pub fn comparative(transformation_id: &str, iterations: usize, sample_count: usize) -> Self {
        Self {
            runs: [false, true]
                .into_iter()
                .map(|with_cache| {
                    BenchmarkConfig::new(transformation_id, with_cache)
                        .iterations(iterations)
                        .sample_count(sample_count)
                })
                .collect(),
        }
    }

    /// Comparative runs of every benchmarkable transformation
    pub fn all(registry: &TransformationRegistry, iterations: usize, sample_count: usize) -> Self {
        Self {
            runs: registry
                .iter()
                .filter(|t| t.benchmarkable)
                .flat_map(|t| Self::comparative(&t.id, iterations, sample_count).runs)
                .collect(),
        }
    }

    /// Total iterations across all runs
    pub fn total_iterations(&self) -> usize {
        self.runs.iter().map(|run| run.iterations).sum()
    }
}

/// Progress events emitted by a running task
#[derive(Debug, Clone, PartialEq)]
pub enum BenchmarkProgress {
    RunStarted {
        run: usize,
        total_runs: usize,
        transformation_id: String,
        with_cache: bool,
    },
    Iteration {
        run: usize,
        completed: usize,
        iterations: usize,
    },
    RunFinished {
        run: usize,
        result: BenchmarkResult,
    },
}

/// A benchmark plan running in the background
pub struct BenchmarkTask {
    handle: JoinHandle<Result<Vec<BenchmarkResult>>>,
    progress: mpsc::UnboundedReceiver<BenchmarkProgress>,
    cancel: CancellationFlag,
}

impl BenchmarkTask {
    /// Start the plan on the blocking pool
    ///
    /// Must be called from within a tokio runtime. The cache lock is held for
    /// the duration of each run.
    pub fn spawn(
        registry: Arc<TransformationRegistry>,
        cache: Arc<Mutex<TransformationCache>>,
        plan: BenchmarkPlan,
    ) -> Self {
        Self::spawn_with_cancellation(registry, cache, plan, CancellationFlag::new())
    }

    /// Start the plan with an existing cancellation flag
    pub fn spawn_with_cancellation(
        registry: Arc<TransformationRegistry>,
        cache: Arc<Mutex<TransformationCache>>,
        plan: BenchmarkPlan,
        cancel: CancellationFlag,
    ) -> Self {
        let (tx, progress) = mpsc::unbounded_channel();
        let flag = cancel.clone();

        let handle = tokio::task::spawn_blocking(move || run_plan(&registry, &cache, &plan, &tx, &flag));

        Self {
            handle,
            progress,
            cancel,
        }
    }

    /// Request cancellation; the task stops after the current iteration
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_flag(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    /// Next progress event; `None` once the task has stopped sending
    pub async fn next_progress(&mut self) -> Option<BenchmarkProgress> {
        self.progress.recv().await
    }

    /// Wait for the plan to finish
    pub async fn join(self) -> Result<Vec<BenchmarkResult>> {
        self.handle.await.map_err(|e| Error::Internal {
            message: "benchmark task failed".to_string(),
            source: anyhow::Error::new(e),
        })?
    }
}

fn run_plan(
    registry: &TransformationRegistry,
    cache: &Mutex<TransformationCache>,
    plan: &BenchmarkPlan,
    tx: &mpsc::UnboundedSender<BenchmarkProgress>,
    cancel: &CancellationFlag,
) -> Result<Vec<BenchmarkResult>> {
    let total_runs = plan.runs.len();
    let mut results = Vec::with_capacity(total_runs);

    for (run, config) in plan.runs.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled {
                completed: run,
                total: total_runs,
            });
        }
        // A closed receiver only means nobody is watching
        let _ = tx.send(BenchmarkProgress::RunStarted {
            run,
            total_runs,
            transformation_id: config.transformation_id.clone(),
            with_cache: config.with_cache,
        });

        let mut guard = cache.lock().map_err(|_| Error::Internal {
            message: "cache lock poisoned".to_string(),
            source: anyhow::anyhow!("a previous benchmark panicked while holding the cache"),
        })?;
        let result = execute(registry, &mut guard, config, |completed| {
            let _ = tx.send(BenchmarkProgress::Iteration {
                run,
                completed,
                iterations: config.iterations,
            });
            if cancel.is_cancelled() {
                return Err(Error::Cancelled {
                    completed: run,
                    total: total_runs,
                });
            }
            Ok(())
        })?;
        drop(guard);

        let _ = tx.send(BenchmarkProgress::RunFinished {
            run,
            result: result.clone(),
        });
        results.push(result);
    }

    tracing::info!(runs = results.len(), "benchmark plan finished");
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared() -> (Arc<TransformationRegistry>, Arc<Mutex<TransformationCache>>) {
        (
            Arc::new(TransformationRegistry::with_builtins().unwrap()),
            Arc::new(Mutex::new(TransformationCache::new())),
        )
    }

    #[test]
    fn test_plan_all_is_comparative() {
        let registry = TransformationRegistry::with_builtins().unwrap();
        let plan = BenchmarkPlan::all(&registry, 2, 5);
        assert_eq!(plan.runs.len(), registry.len() * 2);
        assert!(!plan.runs[0].with_cache);
        assert!(plan.runs[1].with_cache);
        assert_eq!(plan.total_iterations(), registry.len() * 4);
    }

    #[tokio::test]
    async fn test_task_reports_progress() {
        let (registry, cache) = shared();
        let plan = BenchmarkPlan::comparative("text_to_number", 3, 4);
        let mut task = BenchmarkTask::spawn(registry, cache.clone(), plan);

        let mut events = Vec::new();
        while let Some(event) = task.next_progress().await {
            events.push(event);
        }
        let results = task.join().await.unwrap();

        assert_eq!(results.len(), 2);
        let iterations = events
            .iter()
            .filter(|e| matches!(e, BenchmarkProgress::Iteration { .. }))
            .count();
        assert_eq!(iterations, 6);
        assert!(matches!(events.last(), Some(BenchmarkProgress::RunFinished { run: 1, .. })));
        assert_eq!(cache.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let (registry, cache) = shared();
        let flag = CancellationFlag::new();
        flag.cancel();
        let plan = BenchmarkPlan::comparative("text_to_number", 10, 5);
        let mut task = BenchmarkTask::spawn_with_cancellation(registry, cache.clone(), plan, flag);

        assert_eq!(task.next_progress().await, None);
        match task.join().await {
            Err(Error::Cancelled { completed, total }) => assert_eq!((completed, total), (0, 2)),
            other => panic!("expected cancellation, got {:?}", other.map(|r| r.len())),
        }
        assert!(cache.lock().unwrap().is_empty());
    }
}
