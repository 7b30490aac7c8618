//! Catalog records exchanged with the store collaborators.

use serde::{Deserialize, Serialize};

pub type Isbn = i32;

/// A book as the stock manager sees it: catalog data plus inventory and rank metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockBook {
    pub isbn: Isbn,
    pub title: String,
    pub author: String,
    pub price: f32,
    pub num_copies: i32,
    pub num_sale_misses: i64,
    pub num_times_rated: i64,
    pub total_rating: i64,
    pub editor_pick: bool,
}

impl StockBook {
    pub fn new(isbn: Isbn, title: impl Into<String>, author: impl Into<String>, price: f32, num_copies: i32) -> Self {
        Self {
            isbn,
            title: title.into(),
            author: author.into(),
            price,
            num_copies,
            num_sale_misses: 0,
            num_times_rated: 0,
            total_rating: 0,
            editor_pick: false,
        }
    }

    pub fn with_editor_pick(mut self, editor_pick: bool) -> Self {
        self.editor_pick = editor_pick;
        self
    }

    /// Customer-facing view of this record.
    pub fn to_book(&self) -> Book {
        Book {
            isbn: self.isbn,
            title: self.title.clone(),
            author: self.author.clone(),
            price: self.price,
        }
    }
}

/// A book as a customer sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub isbn: Isbn,
    pub title: String,
    pub author: String,
    pub price: f32,
}

/// A quantity of copies of one ISBN, used both for purchases and replenishment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookCopy {
    pub isbn: Isbn,
    pub num_copies: i32,
}

impl BookCopy {
    pub fn new(isbn: Isbn, num_copies: i32) -> Self {
        Self { isbn, num_copies }
    }
}
