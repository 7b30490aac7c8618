//! Workload parameters and the per-worker configuration bundle.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::generator::BookSetGenerator;
use crate::store::{BookStore, StockManager};

pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// How the replenishment interaction orders the catalog before picking the
/// books with the least copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeastCopiesOrder {
    /// Compare the decimal strings of the copy counts, so "10" sorts before "2".
    /// Matches the ordering existing result sets were produced with.
    #[default]
    Lexicographic,
    Numeric,
}

/// Tuning knobs shared by every worker of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadParams {
    pub percent_rare_stock_manager_interaction: f32,
    pub percent_frequent_stock_manager_interaction: f32,
    pub warm_up_runs: usize,
    pub actual_runs: usize,
    pub num_books_to_add: usize,
    pub num_books_with_least_copies: usize,
    pub num_book_copies_to_buy: i32,
    pub num_editor_picks_to_get: usize,
    pub least_copies_order: LeastCopiesOrder,
    /// Base seed for the per-worker RNG; worker `i` of a level uses `seed + i`.
    pub seed: Option<u64>,
}

impl Default for WorkloadParams {
    fn default() -> Self {
        Self {
            percent_rare_stock_manager_interaction: 10.0,
            percent_frequent_stock_manager_interaction: 30.0,
            warm_up_runs: 100,
            actual_runs: 500,
            num_books_to_add: 5,
            num_books_with_least_copies: 5,
            num_book_copies_to_buy: 1,
            num_editor_picks_to_get: 10,
            least_copies_order: LeastCopiesOrder::default(),
            seed: None,
        }
    }
}

/// A configuration value that can never produce a meaningful run.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    PercentOutOfRange { field: &'static str, value: f32 },
    PercentBudgetExceeded { total: f32 },
    NegativeCopies(i32),
    NoEditorPicks,
    NoConcurrency,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::PercentOutOfRange { field, value } => {
                write!(f, "{} must be within [0, 100], got {}", field, value)
            }
            ConfigError::PercentBudgetExceeded { total } => write!(
                f,
                "rare and frequent stock manager percentages add up to {}, which exceeds 100",
                total
            ),
            ConfigError::NegativeCopies(value) => {
                write!(f, "num_book_copies_to_buy must not be negative, got {}", value)
            }
            ConfigError::NoEditorPicks => write!(f, "num_editor_picks_to_get must be at least 1"),
            ConfigError::NoConcurrency => write!(f, "max_concurrency must be at least 1"),
        }
    }
}

impl std::error::Error for ConfigError {}

fn check_percent(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(ConfigError::PercentOutOfRange { field, value });
    }
    Ok(())
}

impl WorkloadParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_percent(
            "percent_rare_stock_manager_interaction",
            self.percent_rare_stock_manager_interaction,
        )?;
        check_percent(
            "percent_frequent_stock_manager_interaction",
            self.percent_frequent_stock_manager_interaction,
        )?;
        let total = self.percent_rare_stock_manager_interaction + self.percent_frequent_stock_manager_interaction;
        if total > 100.0 {
            return Err(ConfigError::PercentBudgetExceeded { total });
        }
        if self.num_book_copies_to_buy < 0 {
            return Err(ConfigError::NegativeCopies(self.num_book_copies_to_buy));
        }
        if self.num_editor_picks_to_get == 0 {
            return Err(ConfigError::NoEditorPicks);
        }
        Ok(())
    }
}

/// Everything a single worker needs: parameters plus handles to the shared collaborators.
#[derive(Clone)]
pub struct WorkloadConfiguration {
    params: WorkloadParams,
    book_store: Arc<dyn BookStore>,
    stock_manager: Arc<dyn StockManager>,
    generator: Arc<BookSetGenerator>,
}

impl WorkloadConfiguration {
    pub fn new(
        params: WorkloadParams,
        book_store: Arc<dyn BookStore>,
        stock_manager: Arc<dyn StockManager>,
        generator: Arc<BookSetGenerator>,
    ) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            params,
            book_store,
            stock_manager,
            generator,
        })
    }

    pub fn params(&self) -> &WorkloadParams {
        &self.params
    }

    pub fn book_store(&self) -> &dyn BookStore {
        self.book_store.as_ref()
    }

    pub fn stock_manager(&self) -> &dyn StockManager {
        self.stock_manager.as_ref()
    }

    pub fn generator(&self) -> &BookSetGenerator {
        &self.generator
    }
}

impl fmt::Debug for WorkloadConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkloadConfiguration")
            .field("params", &self.params)
            .field("latest_isbn", &self.generator.latest_isbn())
            .finish_non_exhaustive()
    }
}

/// On-disk sweep configuration (`stockbench.toml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub max_concurrency: usize,
    pub workload: WorkloadParams,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            workload: WorkloadParams::default(),
        }
    }
}

impl BenchConfig {
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let config: BenchConfig = toml::from_str(raw).context("parse benchmark configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("load {}", path.display()))
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("serialize benchmark configuration")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::NoConcurrency);
        }
        self.workload.validate()
    }
}
