//! The per-client workload runner.
//!
//! A [`Worker`] repeatedly picks one of three weighted interactions and runs it
//! against the store collaborators: a warm-up phase whose outcomes are thrown
//! away, then a timed measurement phase that produces a [`WorkerRunResult`].

use std::collections::HashSet;
use std::fmt;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::book::{BookCopy, Isbn, StockBook};
use crate::config::{LeastCopiesOrder, WorkloadConfiguration, WorkloadParams};
use crate::result::WorkerRunResult;
use crate::store::StoreResult;

/// The three interaction kinds a worker chooses between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interaction {
    /// New stock acquisition.
    RareStockManager,
    /// Stock replenishment of the books with the least copies.
    FrequentStockManager,
    /// Customer purchase of editor picks.
    FrequentBookStore,
}

impl Interaction {
    /// Maps a draw from `[0, 100)` onto an interaction using the configured weights.
    pub fn choose(choice: f32, params: &WorkloadParams) -> Self {
        let rare = params.percent_rare_stock_manager_interaction;
        let frequent = params.percent_frequent_stock_manager_interaction;
        if choice < rare {
            Interaction::RareStockManager
        } else if choice < rare + frequent {
            Interaction::FrequentStockManager
        } else {
            Interaction::FrequentBookStore
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Interaction::RareStockManager => "rare_stock_manager",
            Interaction::FrequentStockManager => "frequent_stock_manager",
            Interaction::FrequentBookStore => "frequent_book_store",
        }
    }
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct Worker {
    configuration: WorkloadConfiguration,
    rng: StdRng,
    num_successful_frequent_book_store_interaction: usize,
    num_total_frequent_book_store_interaction: usize,
}

impl Worker {
    pub fn new(configuration: WorkloadConfiguration) -> Self {
        Self::with_rng(configuration, StdRng::from_entropy())
    }

    pub fn with_seed(configuration: WorkloadConfiguration, seed: u64) -> Self {
        Self::with_rng(configuration, StdRng::seed_from_u64(seed))
    }

    fn with_rng(configuration: WorkloadConfiguration, rng: StdRng) -> Self {
        Self {
            configuration,
            rng,
            num_successful_frequent_book_store_interaction: 0,
            num_total_frequent_book_store_interaction: 0,
        }
    }

    /// Runs warm-up then measurement and consumes the worker.
    pub fn run(mut self) -> WorkerRunResult {
        let warm_up_runs = self.configuration.params().warm_up_runs;
        let actual_runs = self.configuration.params().actual_runs;

        for _ in 0..warm_up_runs {
            let choice = self.next_choice();
            self.run_interaction(choice);
        }

        self.num_successful_frequent_book_store_interaction = 0;
        self.num_total_frequent_book_store_interaction = 0;

        let mut successful_interactions = 0;
        let start = Instant::now();
        for _ in 0..actual_runs {
            let choice = self.next_choice();
            if self.run_interaction(choice) {
                successful_interactions += 1;
            }
        }
        let elapsed = start.elapsed();

        WorkerRunResult::new(
            successful_interactions,
            u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX),
            actual_runs,
            self.num_successful_frequent_book_store_interaction,
            self.num_total_frequent_book_store_interaction,
        )
    }

    fn next_choice(&mut self) -> f32 {
        self.rng.gen_range(0.0..100.0)
    }

    /// Runs the interaction selected by `choice`; `true` when the store accepted it.
    fn run_interaction(&mut self, choice: f32) -> bool {
        let interaction = Interaction::choose(choice, self.configuration.params());
        if interaction == Interaction::FrequentBookStore {
            self.num_total_frequent_book_store_interaction += 1;
        }

        match self.dispatch(interaction) {
            Ok(()) => {
                if interaction == Interaction::FrequentBookStore {
                    self.num_successful_frequent_book_store_interaction += 1;
                }
                true
            }
            Err(err) => {
                debug!(%interaction, error = %err, "interaction rejected by store");
                false
            }
        }
    }

    fn dispatch(&mut self, interaction: Interaction) -> StoreResult<()> {
        match interaction {
            Interaction::RareStockManager => self.run_rare_stock_manager_interaction(),
            Interaction::FrequentStockManager => self.run_frequent_stock_manager_interaction(),
            Interaction::FrequentBookStore => self.run_frequent_book_store_interaction(),
        }
    }

    /// New stock acquisition: add freshly generated books the catalog does not know yet.
    fn run_rare_stock_manager_interaction(&self) -> StoreResult<()> {
        let stock_manager = self.configuration.stock_manager();
        let catalog = stock_manager.get_books()?;
        let generated = self
            .configuration
            .generator()
            .next_set_of_stock_books(self.configuration.params().num_books_to_add);
        let books_to_add = filter_new_books(&catalog, generated);
        stock_manager.add_books(&books_to_add)
    }

    /// Stock replenishment: top up the books with the fewest copies.
    fn run_frequent_stock_manager_interaction(&self) -> StoreResult<()> {
        let params = self.configuration.params();
        let stock_manager = self.configuration.stock_manager();
        let catalog = stock_manager.get_books()?;
        let copies: HashSet<BookCopy> =
            select_least_copies(catalog, params.num_books_with_least_copies, params.least_copies_order)
                .into_iter()
                .map(|isbn| BookCopy::new(isbn, params.num_book_copies_to_buy))
                .collect();
        stock_manager.add_copies(&copies)
    }

    /// Customer interaction: buy a random handful of the editor picks.
    fn run_frequent_book_store_interaction(&mut self) -> StoreResult<()> {
        let num_editor_picks = self.configuration.params().num_editor_picks_to_get;
        let num_copies = self.configuration.params().num_book_copies_to_buy;
        let num_to_pick = self.rng.gen_range(1..=num_editor_picks);

        let book_store = self.configuration.book_store();
        let editor_picks = book_store.get_editor_picks(num_editor_picks)?;
        let isbns: HashSet<Isbn> = editor_picks.iter().map(|book| book.isbn).collect();
        let sampled = self
            .configuration
            .generator()
            .sample_from_set_of_isbns(&isbns, num_to_pick);

        let books = book_store.get_books(&sampled)?;
        let to_buy: HashSet<BookCopy> = books.iter().map(|book| BookCopy::new(book.isbn, num_copies)).collect();
        book_store.buy_books(&to_buy)
    }
}

/// Generated books whose ISBN is not already in `catalog`.
pub fn filter_new_books(catalog: &[StockBook], generated: Vec<StockBook>) -> Vec<StockBook> {
    let existing: HashSet<Isbn> = catalog.iter().map(|book| book.isbn).collect();
    generated
        .into_iter()
        .filter(|book| !existing.contains(&book.isbn))
        .collect()
}

/// ISBNs of the first `num_books` books after ordering `catalog` by copies in stock.
///
/// Returns the whole catalog when it has no more than `num_books` entries.
pub fn select_least_copies(mut catalog: Vec<StockBook>, num_books: usize, order: LeastCopiesOrder) -> Vec<Isbn> {
    match order {
        LeastCopiesOrder::Lexicographic => catalog.sort_by_cached_key(|book| book.num_copies.to_string()),
        LeastCopiesOrder::Numeric => catalog.sort_by_key(|book| book.num_copies),
    }
    catalog.into_iter().take(num_books).map(|book| book.isbn).collect()
}

#[cfg(test)]
mod worker_test;
