pub mod book;
pub mod config;
pub mod driver;
pub mod generator;
pub mod metrics;
pub mod report;
pub mod result;
pub mod store;
pub mod worker;

pub use config::{BenchConfig, LeastCopiesOrder, WorkloadConfiguration, WorkloadParams};
pub use driver::{Sweep, SweepError, Trial, TrialDriver};
pub use metrics::{SweepSeries, TrialMetrics};
pub use result::WorkerRunResult;
pub use store::{BookStore, CertainBookStore, StockManager, StoreError};
