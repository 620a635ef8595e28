//! Receipt and category persistence.
//!
//! Stores publish a fresh snapshot on a [`tokio::sync::watch`] channel after
//! every write, so list views can follow changes without polling.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::watch;
use tracing::debug;

use crate::error::StoreError;
use crate::models::{Category, Receipt};

/// Receipt persistence. Writes are upserts keyed by `id`.
#[async_trait]
pub trait ReceiptStore: Send + Sync {
    async fn insert(&self, receipt: &Receipt) -> Result<(), StoreError>;

    async fn update(&self, receipt: &Receipt) -> Result<(), StoreError>;

    /// Remove a receipt. Unknown ids are ignored.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Receipt>, StoreError>;

    /// All receipts, newest `receipt_date` first.
    fn query_all(&self) -> ReceiptFeed;

    /// Receipts with `from <= receipt_date <= to`, newest first.
    fn query_by_date_range(&self, from: NaiveDate, to: NaiveDate) -> ReceiptFeed {
        self.query_all().with_range(from, to)
    }
}

/// Category persistence.
///
/// Method names carry a `category` suffix so a single store can implement
/// both traits without ambiguous calls.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Insert or replace by name.
    async fn insert_category(&self, category: &Category) -> Result<(), StoreError>;

    /// Remove a user category. Default categories are rejected.
    async fn delete_category(&self, name: &str) -> Result<(), StoreError>;

    async fn category_exists(&self, name: &str) -> Result<bool, StoreError>;

    /// All categories, defaults first, then by name.
    fn query_categories(&self) -> watch::Receiver<Vec<Category>>;

    /// Insert any missing default categories. Returns how many were added.
    async fn seed_defaults(&self) -> Result<usize, StoreError> {
        let mut added = 0;
        for category in Category::defaults(Utc::now()) {
            if !self.category_exists(&category.name).await? {
                self.insert_category(&category).await?;
                added += 1;
            }
        }
        if added > 0 {
            debug!("Seeded {} default categories", added);
        }
        Ok(added)
    }

    /// Add a user category by name.
    ///
    /// Returns `false` when a category of that name already exists; an
    /// existing default is never demoted.
    async fn add_category(&self, name: &str) -> Result<bool, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidCategoryName(name.to_string()));
        }
        if self.category_exists(name).await? {
            return Ok(false);
        }
        self.insert_category(&Category::new(name, Utc::now())).await?;
        Ok(true)
    }
}

/// Live view over a store's receipts, optionally limited to a date range.
#[derive(Debug, Clone)]
pub struct ReceiptFeed {
    rx: watch::Receiver<Vec<Receipt>>,
    range: Option<(NaiveDate, NaiveDate)>,
}

impl ReceiptFeed {
    pub fn new(rx: watch::Receiver<Vec<Receipt>>) -> Self {
        Self { rx, range: None }
    }

    /// Restrict to an inclusive date range.
    pub fn with_range(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.range = Some((from, to));
        self
    }

    /// Latest snapshot.
    pub fn current(&self) -> Vec<Receipt> {
        self.filter(&self.rx.borrow())
    }

    /// Wait for the next write, then return the new snapshot.
    pub async fn changed(&mut self) -> Result<Vec<Receipt>, StoreError> {
        self.rx.changed().await.map_err(|_| StoreError::Closed)?;
        let range = self.range;
        Ok(filter_range(&self.rx.borrow_and_update(), range))
    }

    fn filter(&self, receipts: &[Receipt]) -> Vec<Receipt> {
        filter_range(receipts, self.range)
    }
}

fn filter_range(receipts: &[Receipt], range: Option<(NaiveDate, NaiveDate)>) -> Vec<Receipt> {
    match range {
        Some((from, to)) => receipts
            .iter()
            .filter(|r| r.receipt_date >= from && r.receipt_date <= to)
            .cloned()
            .collect(),
        None => receipts.to_vec(),
    }
}
