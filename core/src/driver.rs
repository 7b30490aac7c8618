//! Concurrency sweep driver.
//!
//! Runs the workload at concurrency 1, 2, ..., `max_concurrency`, one trial per
//! level, on a blocking pool sized to the largest level. Store calls are
//! synchronous, so every worker occupies one pool thread for its whole run.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio::task::JoinError;
use tracing::{info, warn};

use crate::book::{Isbn, StockBook};
use crate::config::{ConfigError, WorkloadConfiguration, WorkloadParams};
use crate::generator::BookSetGenerator;
use crate::metrics::TrialMetrics;
use crate::result::WorkerRunResult;
use crate::store::{BookStore, StockManager, StoreError, StoreResult};
use crate::worker::Worker;

pub const INITIAL_ISBN: Isbn = 3_044_561;
const INITIAL_TITLE: &str = "Harry Potter and JUnit";
const INITIAL_AUTHOR: &str = "JK Unit";
const INITIAL_PRICE: f32 = 10.0;
const INITIAL_COPIES: i32 = 0;

/// The record every trial starts from.
pub fn baseline_book() -> StockBook {
    StockBook::new(INITIAL_ISBN, INITIAL_TITLE, INITIAL_AUTHOR, INITIAL_PRICE, INITIAL_COPIES)
}

/// Empties the catalog and seeds it with [`baseline_book`].
pub fn reset_store(stock_manager: &dyn StockManager) -> StoreResult<()> {
    stock_manager.remove_all_books()?;
    stock_manager.add_books(&[baseline_book()])
}

/// Results of every worker run concurrently at one level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trial {
    level: usize,
    results: Vec<WorkerRunResult>,
}

impl Trial {
    pub fn new(level: usize, results: Vec<WorkerRunResult>) -> Self {
        Self { level, results }
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn results(&self) -> &[WorkerRunResult] {
        &self.results
    }
}

/// Trials ordered by increasing concurrency level.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Sweep {
    trials: Vec<Trial>,
}

impl Sweep {
    pub fn new(trials: Vec<Trial>) -> Self {
        Self { trials }
    }

    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }
}

#[derive(Debug)]
pub enum SweepError {
    InvalidConfig(ConfigError),
    Store {
        level: usize,
        stage: &'static str,
        source: StoreError,
    },
    TaskFailed {
        level: usize,
        worker: usize,
        reason: String,
    },
    Runtime(std::io::Error),
}

impl fmt::Display for SweepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepError::InvalidConfig(err) => write!(f, "invalid workload configuration: {}", err),
            SweepError::Store { level, stage, source } => {
                write!(f, "store failed to {} before concurrency level {}: {}", stage, level, source)
            }
            SweepError::TaskFailed { level, worker, reason } => {
                write!(f, "worker {} at concurrency level {} failed: {}", worker, level, reason)
            }
            SweepError::Runtime(err) => write!(f, "failed to start worker pool: {}", err),
        }
    }
}

impl std::error::Error for SweepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SweepError::InvalidConfig(err) => Some(err),
            SweepError::Store { source, .. } => Some(source),
            SweepError::Runtime(err) => Some(err),
            SweepError::TaskFailed { .. } => None,
        }
    }
}

impl From<ConfigError> for SweepError {
    fn from(err: ConfigError) -> Self {
        SweepError::InvalidConfig(err)
    }
}

fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}

fn task_failure_reason(err: JoinError) -> String {
    if err.is_panic() {
        panic_reason(err.into_panic())
    } else {
        err.to_string()
    }
}

/// Runs concurrency sweeps with a fixed set of workload parameters.
#[derive(Debug, Clone)]
pub struct TrialDriver {
    params: WorkloadParams,
}

impl TrialDriver {
    pub fn new(params: WorkloadParams) -> Self {
        Self { params }
    }

    /// Runs levels `1..=max_concurrency` against the given store and returns one trial per level.
    ///
    /// Blocks the calling thread; must not be called from inside an async runtime.
    pub fn run_sweep(
        &self,
        book_store: Arc<dyn BookStore>,
        stock_manager: Arc<dyn StockManager>,
        max_concurrency: usize,
    ) -> Result<Sweep, SweepError> {
        if max_concurrency == 0 {
            return Err(ConfigError::NoConcurrency.into());
        }
        self.params.validate()?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(max_concurrency)
            .thread_name("stockbench-worker")
            .enable_all()
            .build()
            .map_err(SweepError::Runtime)?;

        let generator = Arc::new(BookSetGenerator::new(INITIAL_ISBN));
        let configuration = WorkloadConfiguration::new(self.params.clone(), book_store, stock_manager, generator)?;

        let outcome = self.run_levels(&runtime, &configuration, max_concurrency);

        // Every task has been joined by now; this only releases the pool threads.
        runtime.shutdown_background();
        outcome
    }

    fn run_levels(
        &self,
        runtime: &tokio::runtime::Runtime,
        configuration: &WorkloadConfiguration,
        max_concurrency: usize,
    ) -> Result<Sweep, SweepError> {
        let mut trials = Vec::with_capacity(max_concurrency);
        for level in 1..=max_concurrency {
            trials.push(self.run_trial(runtime, configuration, level)?);
        }
        Ok(Sweep::new(trials))
    }

    fn run_trial(
        &self,
        runtime: &tokio::runtime::Runtime,
        configuration: &WorkloadConfiguration,
        level: usize,
    ) -> Result<Trial, SweepError> {
        let stock_manager = configuration.stock_manager();
        reset_store(stock_manager).map_err(|source| SweepError::Store {
            level,
            stage: "reset",
            source,
        })?;

        info!(level, "starting trial");
        let handles: Vec<_> = (0..level)
            .map(|index| {
                let worker = self.worker(configuration.clone(), index);
                runtime.spawn_blocking(move || worker.run())
            })
            .collect();
        let joined = runtime.block_on(join_all(handles));

        let mut results = Vec::with_capacity(level);
        for (worker, outcome) in joined.into_iter().enumerate() {
            match outcome {
                Ok(result) => results.push(result),
                Err(err) => {
                    let reason = task_failure_reason(err);
                    warn!(level, worker, %reason, "worker task failed");
                    return Err(SweepError::TaskFailed { level, worker, reason });
                }
            }
        }

        stock_manager.remove_all_books().map_err(|source| SweepError::Store {
            level,
            stage: "clear",
            source,
        })?;

        let trial = Trial::new(level, results);
        let metrics = TrialMetrics::from_trial(&trial);
        info!(
            level,
            throughput = metrics.throughput,
            latency = metrics.latency,
            customer_success_ratio = metrics.customer_success_ratio,
            "trial finished"
        );
        Ok(trial)
    }

    fn worker(&self, configuration: WorkloadConfiguration, index: usize) -> Worker {
        match self.params.seed {
            Some(seed) => Worker::with_seed(configuration, seed.wrapping_add(index as u64)),
            None => Worker::new(configuration),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CertainBookStore;
    use anyhow::Result;

    #[test]
    fn test_reset_store_seeds_baseline() -> Result<()> {
        let store = CertainBookStore::new();
        store.add_books(&[StockBook::new(1, "a", "b", 1.0, 1)])?;
        reset_store(&store)?;
        assert_eq!(store.len(), 1);
        assert_eq!(store.stock_book(INITIAL_ISBN), Some(baseline_book()));
        assert_eq!(baseline_book().num_copies, 0);
        Ok(())
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let store = Arc::new(CertainBookStore::new());
        let err = TrialDriver::new(WorkloadParams::default())
            .run_sweep(store.clone(), store, 0)
            .unwrap_err();
        assert!(matches!(err, SweepError::InvalidConfig(ConfigError::NoConcurrency)));
    }

    #[test]
    fn test_invalid_params_rejected_before_running() {
        let store = Arc::new(CertainBookStore::new());
        let params = WorkloadParams {
            percent_rare_stock_manager_interaction: 80.0,
            percent_frequent_stock_manager_interaction: 80.0,
            ..WorkloadParams::default()
        };
        let err = TrialDriver::new(params).run_sweep(store.clone(), store.clone(), 2).unwrap_err();
        assert!(matches!(err, SweepError::InvalidConfig(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_panic_reason_formats() {
        assert_eq!(panic_reason(Box::new("boom")), "boom");
        assert_eq!(panic_reason(Box::new(String::from("bang"))), "bang");
        assert_eq!(panic_reason(Box::new(7_u8)), "worker panicked");
    }

    #[test]
    fn test_error_display_names_worker() {
        let err = SweepError::TaskFailed {
            level: 3,
            worker: 1,
            reason: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "worker 1 at concurrency level 3 failed: boom");
    }
}
