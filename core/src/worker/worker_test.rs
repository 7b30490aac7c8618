#[cfg(test)]
mod tests {
    use crate::{
        book::{BookCopy, Isbn, StockBook},
        config::{LeastCopiesOrder, WorkloadConfiguration, WorkloadParams},
        driver::{INITIAL_ISBN, reset_store},
        generator::BookSetGenerator,
        store::{BookStore, CertainBookStore, StockManager, StoreResult},
        worker::{Interaction, Worker, filter_new_books, select_least_copies},
    };
    use anyhow::Result;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    /// Stock manager with a fixed catalog that records every submission.
    #[derive(Default)]
    struct RecordingStockManager {
        catalog: Vec<StockBook>,
        added: Mutex<Vec<Vec<Isbn>>>,
        copies: Mutex<Vec<HashSet<BookCopy>>>,
    }

    impl StockManager for RecordingStockManager {
        fn get_books(&self) -> StoreResult<Vec<StockBook>> {
            Ok(self.catalog.clone())
        }

        fn add_books(&self, books: &[StockBook]) -> StoreResult<()> {
            self.added.lock().unwrap().push(books.iter().map(|b| b.isbn).collect());
            Ok(())
        }

        fn add_copies(&self, copies: &HashSet<BookCopy>) -> StoreResult<()> {
            self.copies.lock().unwrap().push(copies.clone());
            Ok(())
        }

        fn remove_all_books(&self) -> StoreResult<()> {
            Ok(())
        }
    }

    fn params(rare: f32, frequent: f32, warm_up_runs: usize, actual_runs: usize) -> WorkloadParams {
        WorkloadParams {
            percent_rare_stock_manager_interaction: rare,
            percent_frequent_stock_manager_interaction: frequent,
            warm_up_runs,
            actual_runs,
            seed: Some(42),
            ..WorkloadParams::default()
        }
    }

    fn configuration(params: WorkloadParams, store: &Arc<CertainBookStore>) -> Result<WorkloadConfiguration> {
        Ok(WorkloadConfiguration::new(
            params,
            store.clone(),
            store.clone(),
            Arc::new(BookSetGenerator::new(INITIAL_ISBN)),
        )?)
    }

    fn book(isbn: Isbn, copies: i32) -> StockBook {
        StockBook::new(isbn, format!("title{isbn}"), "author", 10.0, copies).with_editor_pick(true)
    }

    #[test]
    fn test_choose_respects_weights() {
        let p = params(10.0, 30.0, 0, 0);
        assert_eq!(Interaction::choose(0.0, &p), Interaction::RareStockManager);
        assert_eq!(Interaction::choose(9.99, &p), Interaction::RareStockManager);
        assert_eq!(Interaction::choose(10.0, &p), Interaction::FrequentStockManager);
        assert_eq!(Interaction::choose(39.9, &p), Interaction::FrequentStockManager);
        assert_eq!(Interaction::choose(40.0, &p), Interaction::FrequentBookStore);
        assert_eq!(Interaction::choose(99.99, &p), Interaction::FrequentBookStore);

        let all_customers = params(0.0, 0.0, 0, 0);
        assert_eq!(Interaction::choose(0.0, &all_customers), Interaction::FrequentBookStore);
    }

    #[test]
    fn test_select_least_copies_lexicographic_quirk() {
        let catalog = vec![book(1, 10), book(2, 2), book(3, 0), book(4, 33)];
        assert_eq!(
            select_least_copies(catalog.clone(), 2, LeastCopiesOrder::Lexicographic),
            vec![3, 1]
        );
        assert_eq!(select_least_copies(catalog, 2, LeastCopiesOrder::Numeric), vec![3, 2]);
    }

    #[test]
    fn test_select_least_copies_bounded_by_catalog() {
        let catalog: Vec<StockBook> = (1..=4).map(|isbn| book(isbn, isbn)).collect();
        for k in 0..8 {
            let picked = select_least_copies(catalog.clone(), k, LeastCopiesOrder::Lexicographic);
            assert_eq!(picked.len(), k.min(catalog.len()));
        }
    }

    #[test]
    fn test_filter_new_books_drops_collisions() {
        let catalog = vec![book(5, 1), book(6, 1)];
        let generated = vec![book(4, 10), book(5, 10), book(7, 10)];
        let isbns: Vec<Isbn> = filter_new_books(&catalog, generated).iter().map(|b| b.isbn).collect();
        assert_eq!(isbns, vec![4, 7]);
    }

    #[test]
    fn test_replenishment_scenario() -> Result<()> {
        let store = Arc::new(CertainBookStore::new());
        reset_store(store.as_ref())?;

        let mut p = params(0.0, 100.0, 0, 50);
        p.num_books_with_least_copies = 1;
        p.num_book_copies_to_buy = 5;
        let result = Worker::new(configuration(p, &store)?).run();

        assert_eq!(result.successful_interactions(), 50);
        assert_eq!(result.total_runs(), 50);
        assert_eq!(result.total_frequent_book_store_interactions(), 0);
        let seeded = store.stock_book(INITIAL_ISBN).expect("baseline book present");
        assert_eq!(seeded.num_copies % 5, 0);
        assert_eq!(seeded.num_copies, 250);
        Ok(())
    }

    #[test]
    fn test_acquisition_scenario_grows_catalog() -> Result<()> {
        let store = Arc::new(CertainBookStore::new());
        reset_store(store.as_ref())?;
        let before = store.len();

        let mut p = params(100.0, 0.0, 0, 20);
        p.num_books_to_add = 3;
        let result = Worker::new(configuration(p, &store)?).run();

        assert_eq!(result.successful_interactions(), 20);
        assert_eq!(store.len() - before, 60);
        Ok(())
    }

    #[test]
    fn test_acquisition_never_submits_existing_isbn() -> Result<()> {
        let stock_manager = Arc::new(RecordingStockManager {
            catalog: (1..=4).map(|isbn| book(isbn, 1)).collect(),
            ..RecordingStockManager::default()
        });
        let mut p = params(100.0, 0.0, 0, 3);
        p.num_books_to_add = 2;
        let config = WorkloadConfiguration::new(
            p,
            Arc::new(CertainBookStore::new()),
            stock_manager.clone(),
            Arc::new(BookSetGenerator::new(0)),
        )?;
        Worker::new(config).run();

        let added = stock_manager.added.lock().unwrap();
        assert_eq!(added.len(), 3);
        let submitted: Vec<Isbn> = added.iter().flatten().copied().collect();
        assert_eq!(submitted, vec![5, 6]);
        Ok(())
    }

    #[test]
    fn test_replenishment_submits_min_of_catalog_and_request() -> Result<()> {
        for (requested, expected) in [(5, 3), (2, 2), (0, 0)] {
            let stock_manager = Arc::new(RecordingStockManager {
                catalog: vec![book(1, 4), book(2, 1), book(3, 9)],
                ..RecordingStockManager::default()
            });
            let mut p = params(0.0, 100.0, 0, 4);
            p.num_books_with_least_copies = requested;
            let config = WorkloadConfiguration::new(
                p,
                Arc::new(CertainBookStore::new()),
                stock_manager.clone(),
                Arc::new(BookSetGenerator::new(0)),
            )?;
            Worker::new(config).run();

            let copies = stock_manager.copies.lock().unwrap();
            assert_eq!(copies.len(), 4);
            assert!(copies.iter().all(|batch| batch.len() == expected));
        }
        Ok(())
    }

    #[test]
    fn test_customer_purchases_are_tracked_separately() -> Result<()> {
        let store = Arc::new(CertainBookStore::new());
        store.add_books(&(1..=10).map(|isbn| book(isbn, 1_000)).collect::<Vec<_>>())?;

        let result = Worker::with_seed(configuration(params(0.0, 0.0, 10, 40), &store)?, 9).run();

        assert_eq!(result.total_frequent_book_store_interactions(), 40);
        assert_eq!(result.successful_frequent_book_store_interactions(), 40);
        assert_eq!(result.successful_interactions(), 40);
        let remaining: i32 = StockManager::get_books(store.as_ref())?.iter().map(|b| b.num_copies).sum();
        assert!(remaining < 10_000);
        Ok(())
    }

    #[test]
    fn test_rejected_purchases_count_as_failures() -> Result<()> {
        let store = Arc::new(CertainBookStore::new());
        store.add_books(&[book(1, 0), book(2, 0)])?;

        let result = Worker::new(configuration(params(0.0, 0.0, 5, 25), &store)?).run();

        assert_eq!(result.successful_interactions(), 0);
        assert_eq!(result.successful_frequent_book_store_interactions(), 0);
        assert_eq!(result.total_frequent_book_store_interactions(), 25);
        assert!(store.get_editor_picks(2)?.len() == 2);
        Ok(())
    }

    #[test]
    fn test_warm_up_counters_are_discarded() -> Result<()> {
        let store = Arc::new(CertainBookStore::new());
        store.add_books(&[book(1, 1_000)])?;

        let result = Worker::new(configuration(params(0.0, 0.0, 30, 0), &store)?).run();

        assert_eq!(result.total_runs(), 0);
        assert_eq!(result.successful_interactions(), 0);
        assert_eq!(result.total_frequent_book_store_interactions(), 0);
        assert_eq!(result.successful_frequent_book_store_interactions(), 0);
        assert_eq!(store.stock_book(1).map(|b| b.num_copies), Some(970));
        Ok(())
    }

    #[test]
    fn test_result_bounded_by_actual_runs() -> Result<()> {
        let store = Arc::new(CertainBookStore::new());
        reset_store(store.as_ref())?;

        let result = Worker::with_seed(configuration(params(10.0, 30.0, 20, 60), &store)?, 1).run();

        assert!(result.successful_interactions() <= 60);
        assert!(result.total_frequent_book_store_interactions() <= 60);
        assert!(
            result.successful_frequent_book_store_interactions() <= result.total_frequent_book_store_interactions()
        );
        Ok(())
    }
}
