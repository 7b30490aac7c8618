//! Reduction of trials and sweeps into the throughput and latency series.

use serde::{Deserialize, Serialize};

use crate::driver::{Sweep, Trial};

/// Aggregate numbers for one concurrency level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialMetrics {
    pub level: usize,
    /// Sum of each worker's own successful-interactions-per-second rate.
    pub throughput: f64,
    /// Mean measurement-phase duration per worker, in seconds.
    pub latency: f64,
    /// Share of customer purchases that the store accepted; `None` when there were none.
    pub customer_success_ratio: Option<f64>,
}

impl TrialMetrics {
    pub fn from_trial(trial: &Trial) -> Self {
        let results = trial.results();
        let throughput = results.iter().map(|result| result.throughput()).sum();
        let latency = if results.is_empty() {
            0.0
        } else {
            let total_nanos: f64 = results.iter().map(|result| result.elapsed_time_in_nanos() as f64).sum();
            total_nanos / (results.len() as f64 * 1e9)
        };

        let attempted: usize = results
            .iter()
            .map(|result| result.total_frequent_book_store_interactions())
            .sum();
        let succeeded: usize = results
            .iter()
            .map(|result| result.successful_frequent_book_store_interactions())
            .sum();
        let customer_success_ratio = (attempted > 0).then(|| succeeded as f64 / attempted as f64);

        Self {
            level: trial.level(),
            throughput,
            latency,
            customer_success_ratio,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub concurrency: usize,
    pub value: f64,
}

/// The two reportable series of one sweep, in increasing level order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepSeries {
    pub label: String,
    pub throughput: Vec<SeriesPoint>,
    pub latency: Vec<SeriesPoint>,
}

impl SweepSeries {
    pub fn from_sweep(label: impl Into<String>, sweep: &Sweep) -> Self {
        let mut metrics: Vec<TrialMetrics> = sweep.trials().iter().map(TrialMetrics::from_trial).collect();
        metrics.sort_by_key(|m| m.level);
        Self {
            label: label.into(),
            throughput: metrics
                .iter()
                .map(|m| SeriesPoint {
                    concurrency: m.level,
                    value: m.throughput,
                })
                .collect(),
            latency: metrics
                .iter()
                .map(|m| SeriesPoint {
                    concurrency: m.level,
                    value: m.latency,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::WorkerRunResult;

    fn result(successful: usize, nanos: u64) -> WorkerRunResult {
        WorkerRunResult::new(successful, nanos, successful, 0, 0)
    }

    #[test]
    fn test_throughput_sums_per_worker_rates() {
        let trial = Trial::new(2, vec![result(100, 1_000_000_000), result(50, 500_000_000)]);
        let metrics = TrialMetrics::from_trial(&trial);
        assert!((metrics.throughput - 200.0).abs() < 1e-9);
        assert!((metrics.latency - 0.75).abs() < 1e-12);
        assert_eq!(metrics.level, 2);
        assert_eq!(metrics.customer_success_ratio, None);
    }

    #[test]
    fn test_zero_elapsed_contributes_nothing() {
        let trial = Trial::new(1, vec![result(0, 0)]);
        let metrics = TrialMetrics::from_trial(&trial);
        assert_eq!(metrics.throughput, 0.0);
        assert_eq!(metrics.latency, 0.0);
    }

    #[test]
    fn test_empty_trial() {
        let metrics = TrialMetrics::from_trial(&Trial::new(1, Vec::new()));
        assert_eq!(metrics.throughput, 0.0);
        assert_eq!(metrics.latency, 0.0);
    }

    #[test]
    fn test_customer_success_ratio() {
        let trial = Trial::new(
            2,
            vec![
                WorkerRunResult::new(5, 10, 10, 3, 4),
                WorkerRunResult::new(5, 10, 10, 1, 4),
            ],
        );
        assert_eq!(TrialMetrics::from_trial(&trial).customer_success_ratio, Some(0.5));
    }

    #[test]
    fn test_series_from_sweep_ordered_by_level() {
        let sweep = Sweep::new(vec![
            Trial::new(1, vec![result(10, 1_000_000_000)]),
            Trial::new(2, vec![result(10, 1_000_000_000), result(30, 2_000_000_000)]),
        ]);
        let series = SweepSeries::from_sweep("local", &sweep);
        assert_eq!(series.label, "local");
        let levels: Vec<usize> = series.throughput.iter().map(|p| p.concurrency).collect();
        assert_eq!(levels, vec![1, 2]);
        assert!((series.throughput[1].value - 25.0).abs() < 1e-9);
        assert!((series.latency[1].value - 1.5).abs() < 1e-12);
    }
}
