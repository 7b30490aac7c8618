//! In-process store used by the CLI sweep and the test-suite.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rand::seq::SliceRandom;
use rustc_hash::FxHashMap;

use super::{BookStore, StockManager, StoreError, StoreResult};
use crate::book::{Book, BookCopy, Isbn, StockBook};

/// Thread-safe catalog implementing both store capabilities.
///
/// Every operation takes the catalog lock once, validates the whole batch and
/// only then applies it, so a rejected call leaves the catalog untouched.
#[derive(Debug, Default)]
pub struct CertainBookStore {
    books: Mutex<FxHashMap<Isbn, StockBook>>,
}

impl CertainBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn catalog(&self) -> MutexGuard<'_, FxHashMap<Isbn, StockBook>> {
        self.books.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.catalog().len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog().is_empty()
    }

    /// Copy of a single record, mostly useful for assertions.
    pub fn stock_book(&self, isbn: Isbn) -> Option<StockBook> {
        self.catalog().get(&isbn).cloned()
    }
}

fn validate_isbn(isbn: Isbn) -> StoreResult<()> {
    if isbn <= 0 {
        return Err(StoreError::InvalidIsbn(isbn));
    }
    Ok(())
}

fn validate_book(book: &StockBook) -> StoreResult<()> {
    validate_isbn(book.isbn)?;
    let reason = if book.title.is_empty() {
        Some("empty title")
    } else if book.author.is_empty() {
        Some("empty author")
    } else if book.price < 0.0 {
        Some("negative price")
    } else if book.num_copies < 0 {
        Some("negative copies")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(StoreError::InvalidBook {
            isbn: book.isbn,
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

fn validate_copy(copy: &BookCopy, catalog: &FxHashMap<Isbn, StockBook>) -> StoreResult<()> {
    validate_isbn(copy.isbn)?;
    if !catalog.contains_key(&copy.isbn) {
        return Err(StoreError::NotInStock(copy.isbn));
    }
    if copy.num_copies <= 0 {
        return Err(StoreError::InvalidCopies {
            isbn: copy.isbn,
            num_copies: copy.num_copies,
        });
    }
    Ok(())
}

impl StockManager for CertainBookStore {
    fn get_books(&self) -> StoreResult<Vec<StockBook>> {
        Ok(self.catalog().values().cloned().collect())
    }

    fn add_books(&self, books: &[StockBook]) -> StoreResult<()> {
        let mut catalog = self.catalog();
        let mut batch = HashSet::with_capacity(books.len());
        for book in books {
            validate_book(book)?;
            if catalog.contains_key(&book.isbn) || !batch.insert(book.isbn) {
                return Err(StoreError::DuplicateIsbn(book.isbn));
            }
        }
        for book in books {
            catalog.insert(book.isbn, book.clone());
        }
        Ok(())
    }

    fn add_copies(&self, copies: &HashSet<BookCopy>) -> StoreResult<()> {
        let mut catalog = self.catalog();
        for copy in copies {
            validate_copy(copy, &catalog)?;
        }
        for copy in copies {
            if let Some(book) = catalog.get_mut(&copy.isbn) {
                book.num_copies = book.num_copies.saturating_add(copy.num_copies);
            }
        }
        Ok(())
    }

    fn remove_all_books(&self) -> StoreResult<()> {
        self.catalog().clear();
        Ok(())
    }
}

impl BookStore for CertainBookStore {
    fn get_editor_picks(&self, count: usize) -> StoreResult<Vec<Book>> {
        let catalog = self.catalog();
        let mut picks: Vec<&StockBook> = catalog.values().filter(|book| book.editor_pick).collect();
        picks.shuffle(&mut rand::thread_rng());
        Ok(picks.into_iter().take(count).map(StockBook::to_book).collect())
    }

    fn get_books(&self, isbns: &HashSet<Isbn>) -> StoreResult<Vec<Book>> {
        let catalog = self.catalog();
        isbns
            .iter()
            .map(|isbn| {
                validate_isbn(*isbn)?;
                catalog
                    .get(isbn)
                    .map(StockBook::to_book)
                    .ok_or(StoreError::NotInStock(*isbn))
            })
            .collect()
    }

    fn buy_books(&self, copies: &HashSet<BookCopy>) -> StoreResult<()> {
        let mut catalog = self.catalog();
        for copy in copies {
            validate_copy(copy, &catalog)?;
        }

        let mut missing = Vec::new();
        for copy in copies {
            if let Some(book) = catalog.get_mut(&copy.isbn)
                && book.num_copies < copy.num_copies
            {
                book.num_sale_misses += i64::from(copy.num_copies - book.num_copies);
                missing.push(copy.isbn);
            }
        }
        if !missing.is_empty() {
            missing.sort_unstable();
            return Err(StoreError::InsufficientCopies { isbns: missing });
        }

        for copy in copies {
            if let Some(book) = catalog.get_mut(&copy.isbn) {
                book.num_copies -= copy.num_copies;
            }
        }
        Ok(())
    }
}
