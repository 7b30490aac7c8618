//! Synthetic stock books and ISBN sampling.

use std::collections::HashSet;
use std::sync::atomic::{AtomicI32, Ordering};

use rand::Rng;
use rand::seq::SliceRandom;

use crate::book::{Isbn, StockBook};

const INITIAL_COPIES: i32 = 10;
const DEFAULT_PRICE: f32 = 10.0;
const TITLE_LEN: usize = 5;
const AUTHOR_LEN: usize = 5;
const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Hands out stock books with ISBNs above a high-water mark.
///
/// One generator is shared (by `Arc`) between every worker of a sweep; the
/// counter is the only state and is bumped atomically, so concurrent callers
/// never see overlapping ISBNs.
#[derive(Debug)]
pub struct BookSetGenerator {
    latest_isbn: AtomicI32,
}

impl BookSetGenerator {
    /// Generated ISBNs start right after `latest_isbn`.
    pub fn new(latest_isbn: Isbn) -> Self {
        Self {
            latest_isbn: AtomicI32::new(latest_isbn),
        }
    }

    pub fn latest_isbn(&self) -> Isbn {
        self.latest_isbn.load(Ordering::SeqCst)
    }

    /// `count` fresh editor-pick books with random lowercase titles and authors.
    pub fn next_set_of_stock_books(&self, count: usize) -> Vec<StockBook> {
        let mut rng = rand::thread_rng();
        (0..count)
            .map(|_| {
                let isbn = self.latest_isbn.fetch_add(1, Ordering::SeqCst) + 1;
                StockBook::new(
                    isbn,
                    random_string(&mut rng, TITLE_LEN),
                    random_string(&mut rng, AUTHOR_LEN),
                    DEFAULT_PRICE,
                    INITIAL_COPIES,
                )
                .with_editor_pick(true)
            })
            .collect()
    }

    /// `num` ISBNs chosen uniformly from `isbns`, or all of them if there are not more than `num`.
    pub fn sample_from_set_of_isbns(&self, isbns: &HashSet<Isbn>, num: usize) -> HashSet<Isbn> {
        if isbns.len() <= num {
            return isbns.clone();
        }
        let mut list: Vec<Isbn> = isbns.iter().copied().collect();
        list.shuffle(&mut rand::thread_rng());
        list.truncate(num);
        list.into_iter().collect()
    }
}

fn random_string<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}
