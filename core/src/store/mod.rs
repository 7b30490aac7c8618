//! Store capabilities consumed by the workload engine.
//!
//! The engine only talks to these two traits. Any backend (the in-process
//! [`CertainBookStore`], or a client reaching a remote service) can be swept as
//! long as it rejects invalid operations with a [`StoreError`].

use std::collections::HashSet;
use std::fmt;

use crate::book::{Book, BookCopy, Isbn, StockBook};

mod memory;

pub use memory::CertainBookStore;

/// A business-rule rejection raised by a store collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    InvalidIsbn(Isbn),
    DuplicateIsbn(Isbn),
    NotInStock(Isbn),
    InvalidBook { isbn: Isbn, reason: String },
    InvalidCopies { isbn: Isbn, num_copies: i32 },
    InsufficientCopies { isbns: Vec<Isbn> },
    InvalidArgument(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::InvalidIsbn(isbn) => write!(f, "ISBN {} is invalid", isbn),
            StoreError::DuplicateIsbn(isbn) => write!(f, "ISBN {} is duplicated", isbn),
            StoreError::NotInStock(isbn) => write!(f, "ISBN {} is not available", isbn),
            StoreError::InvalidBook { isbn, reason } => write!(f, "book {} is invalid: {}", isbn, reason),
            StoreError::InvalidCopies { isbn, num_copies } => {
                write!(f, "invalid number of copies {} for ISBN {}", num_copies, isbn)
            }
            StoreError::InsufficientCopies { isbns } => {
                write!(f, "not enough copies in stock for ISBNs {:?}", isbns)
            }
            StoreError::InvalidArgument(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for StoreError {}

pub type StoreResult<T> = Result<T, StoreError>;

/// Customer-facing store operations.
pub trait BookStore: Send + Sync {
    /// Up to `count` books currently flagged as editor picks.
    fn get_editor_picks(&self, count: usize) -> StoreResult<Vec<Book>>;

    /// The books matching `isbns`; fails if any ISBN is unknown.
    fn get_books(&self, isbns: &HashSet<Isbn>) -> StoreResult<Vec<Book>>;

    /// Buys every requested copy or none of them.
    fn buy_books(&self, copies: &HashSet<BookCopy>) -> StoreResult<()>;
}

/// Inventory operations used by store staff.
pub trait StockManager: Send + Sync {
    /// Snapshot of the full catalog.
    fn get_books(&self) -> StoreResult<Vec<StockBook>>;

    /// Adds new titles; fails if any ISBN already exists.
    fn add_books(&self, books: &[StockBook]) -> StoreResult<()>;

    /// Adds copies to existing titles; fails on unknown ISBNs.
    fn add_copies(&self, copies: &HashSet<BookCopy>) -> StoreResult<()>;

    /// Clears all state. Always succeeds.
    fn remove_all_books(&self) -> StoreResult<()>;
}
