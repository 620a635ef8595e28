//! In-process store, used for tests and one-off runs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::StoreError;
use crate::models::receipt::{sort_categories, sort_receipts};
use crate::models::{Category, Receipt};

use super::{CategoryStore, ReceiptFeed, ReceiptStore};

/// Ephemeral receipt and category store. Clones share the same data.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

struct Inner {
    receipts: Mutex<HashMap<String, Receipt>>,
    categories: Mutex<HashMap<String, Category>>,
    receipts_tx: watch::Sender<Vec<Receipt>>,
    categories_tx: watch::Sender<Vec<Category>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (receipts_tx, _) = watch::channel(Vec::new());
        let (categories_tx, _) = watch::channel(Vec::new());

        Self {
            inner: Arc::new(Inner {
                receipts: Mutex::new(HashMap::new()),
                categories: Mutex::new(HashMap::new()),
                receipts_tx,
                categories_tx,
            }),
        }
    }

    fn receipts(&self) -> Result<MutexGuard<'_, HashMap<String, Receipt>>, StoreError> {
        self.inner
            .receipts
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn categories(&self) -> Result<MutexGuard<'_, HashMap<String, Category>>, StoreError> {
        self.inner
            .categories
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn publish_receipts(&self, receipts: &HashMap<String, Receipt>) {
        let mut snapshot: Vec<Receipt> = receipts.values().cloned().collect();
        sort_receipts(&mut snapshot);
        self.inner.receipts_tx.send_replace(snapshot);
    }

    fn publish_categories(&self, categories: &HashMap<String, Category>) {
        let mut snapshot: Vec<Category> = categories.values().cloned().collect();
        sort_categories(&mut snapshot);
        self.inner.categories_tx.send_replace(snapshot);
    }

    fn upsert(&self, receipt: &Receipt) -> Result<(), StoreError> {
        let mut receipts = self.receipts()?;
        receipts.insert(receipt.id.clone(), receipt.clone());
        self.publish_receipts(&receipts);
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReceiptStore for MemoryStore {
    async fn insert(&self, receipt: &Receipt) -> Result<(), StoreError> {
        self.upsert(receipt)
    }

    async fn update(&self, receipt: &Receipt) -> Result<(), StoreError> {
        self.upsert(receipt)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut receipts = self.receipts()?;
        if receipts.remove(id).is_some() {
            self.publish_receipts(&receipts);
        }
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Receipt>, StoreError> {
        Ok(self.receipts()?.get(id).cloned())
    }

    fn query_all(&self) -> ReceiptFeed {
        ReceiptFeed::new(self.inner.receipts_tx.subscribe())
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn insert_category(&self, category: &Category) -> Result<(), StoreError> {
        let mut categories = self.categories()?;
        categories.insert(category.name.clone(), category.clone());
        self.publish_categories(&categories);
        Ok(())
    }

    async fn delete_category(&self, name: &str) -> Result<(), StoreError> {
        let mut categories = self.categories()?;
        match categories.get(name) {
            Some(category) if category.is_default => Err(StoreError::DefaultCategory(name.to_string())),
            Some(_) => {
                categories.remove(name);
                self.publish_categories(&categories);
                Ok(())
            }
            None => Ok(()),
        }
    }

    async fn category_exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.categories()?.contains_key(name))
    }

    fn query_categories(&self) -> watch::Receiver<Vec<Category>> {
        self.inner.categories_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExportStatus, DEFAULT_CATEGORIES, UNCATEGORIZED};
    use chrono::{NaiveDate, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn receipt_on(d: u32) -> Receipt {
        let mut receipt = Receipt::new(Utc.with_ymd_and_hms(2024, 5, d, 9, 0, 0).unwrap(), "EUR");
        receipt.receipt_date = NaiveDate::from_ymd_opt(2024, 5, d).unwrap();
        receipt
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let store = MemoryStore::new();
        let mut receipt = receipt_on(1);

        store.insert(&receipt).await.unwrap();
        receipt.export_status = ExportStatus::Exported;
        store.update(&receipt).await.unwrap();

        let loaded = store.get_by_id(&receipt.id).await.unwrap().unwrap();
        assert_eq!(loaded, receipt);
        assert_eq!(store.query_all().current().len(), 1);
    }

    #[tokio::test]
    async fn test_query_order_and_range() {
        let store = MemoryStore::new();
        for day in [3, 1, 20] {
            store.insert(&receipt_on(day)).await.unwrap();
        }

        let dates: Vec<u32> = store
            .query_all()
            .current()
            .iter()
            .map(|r| chrono::Datelike::day(&r.receipt_date))
            .collect();
        assert_eq!(dates, vec![20, 3, 1]);

        let ranged = store
            .query_by_date_range(
                NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
            )
            .current();
        assert_eq!(ranged.len(), 2);
    }

    #[tokio::test]
    async fn test_feed_sees_writes() {
        let store = MemoryStore::new();
        let mut feed = store.query_all();
        let receipt = receipt_on(2);

        store.insert(&receipt).await.unwrap();
        assert_eq!(feed.changed().await.unwrap().len(), 1);

        store.delete(&receipt.id).await.unwrap();
        assert!(feed.changed().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_unknown_id() {
        let store = MemoryStore::new();
        store.delete("missing").await.unwrap();
        assert!(store.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_seed_defaults_once() {
        let store = MemoryStore::new();

        assert_eq!(store.seed_defaults().await.unwrap(), DEFAULT_CATEGORIES.len());
        assert_eq!(store.seed_defaults().await.unwrap(), 0);

        let categories = store.query_categories().borrow().clone();
        assert_eq!(categories.len(), DEFAULT_CATEGORIES.len());
        assert!(categories.iter().all(|c| c.is_default));
    }

    #[tokio::test]
    async fn test_default_category_protected() {
        let store = MemoryStore::new();
        store.seed_defaults().await.unwrap();

        let err = store.delete_category(UNCATEGORIZED).await.unwrap_err();
        assert!(matches!(err, StoreError::DefaultCategory(_)));
        assert!(store.category_exists(UNCATEGORIZED).await.unwrap());
    }

    #[tokio::test]
    async fn test_add_and_remove_user_category() {
        let store = MemoryStore::new();
        store.seed_defaults().await.unwrap();

        assert!(store.add_category("  Books ").await.unwrap());
        assert!(!store.add_category("Books").await.unwrap());
        assert!(!store.add_category("Fuel").await.unwrap());
        assert!(matches!(
            store.add_category("   ").await,
            Err(StoreError::InvalidCategoryName(_))
        ));

        let names: Vec<String> = store
            .query_categories()
            .borrow()
            .iter()
            .map(|c| c.name.clone())
            .collect();
        assert_eq!(names.last().map(String::as_str), Some("Books"));

        store.delete_category("Books").await.unwrap();
        assert!(!store.category_exists("Books").await.unwrap());
    }
}
