use serde::{Deserialize, Serialize};

/// Outcome of one worker's measurement phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRunResult {
    successful_interactions: usize,
    elapsed_time_in_nanos: u64,
    total_runs: usize,
    successful_frequent_book_store_interactions: usize,
    total_frequent_book_store_interactions: usize,
}

impl WorkerRunResult {
    pub fn new(
        successful_interactions: usize,
        elapsed_time_in_nanos: u64,
        total_runs: usize,
        successful_frequent_book_store_interactions: usize,
        total_frequent_book_store_interactions: usize,
    ) -> Self {
        Self {
            successful_interactions,
            elapsed_time_in_nanos,
            total_runs,
            successful_frequent_book_store_interactions,
            total_frequent_book_store_interactions,
        }
    }

    pub fn successful_interactions(&self) -> usize {
        self.successful_interactions
    }

    pub fn elapsed_time_in_nanos(&self) -> u64 {
        self.elapsed_time_in_nanos
    }

    pub fn total_runs(&self) -> usize {
        self.total_runs
    }

    pub fn successful_frequent_book_store_interactions(&self) -> usize {
        self.successful_frequent_book_store_interactions
    }

    pub fn total_frequent_book_store_interactions(&self) -> usize {
        self.total_frequent_book_store_interactions
    }

    /// Successful interactions per second for this worker alone; zero when nothing was timed.
    pub fn throughput(&self) -> f64 {
        if self.elapsed_time_in_nanos == 0 {
            return 0.0;
        }
        self.successful_interactions as f64 * 1e9 / self.elapsed_time_in_nanos as f64
    }
}
