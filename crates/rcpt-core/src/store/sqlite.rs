//! SQLite-backed store.

use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::info;

use crate::error::StoreError;
use crate::models::receipt::{sort_categories, sort_receipts};
use crate::models::{Category, ExportStatus, Receipt};

use super::{CategoryStore, ReceiptFeed, ReceiptStore};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS receipts (
    id TEXT PRIMARY KEY,
    created_at TEXT NOT NULL,
    receipt_date TEXT NOT NULL,
    merchant TEXT,
    total_amount TEXT NOT NULL,
    vat_amount TEXT,
    currency TEXT NOT NULL,
    category TEXT NOT NULL,
    description TEXT,
    notes TEXT,
    tags TEXT NOT NULL DEFAULT '[]',
    ocr_raw_text TEXT,
    ocr_confidence REAL,
    original_uri TEXT,
    stored_uri TEXT,
    renamed_file_name TEXT,
    export_folder_uri TEXT,
    export_status TEXT NOT NULL DEFAULT 'NOT_EXPORTED',
    last_export_attempt_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_receipts_date ON receipts (receipt_date);
CREATE TABLE IF NOT EXISTS categories (
    name TEXT PRIMARY KEY,
    is_default INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);
";

const RECEIPT_COLUMNS: &str = "id, created_at, receipt_date, merchant, total_amount, vat_amount, \
     currency, category, description, notes, tags, ocr_raw_text, ocr_confidence, original_uri, \
     stored_uri, renamed_file_name, export_folder_uri, export_status, last_export_attempt_at";

/// Receipt and category store in a single SQLite database.
///
/// Clones share the connection and the change feeds. Statements run on the
/// blocking pool; snapshots are patched from the written row while the
/// connection is still locked, so feeds follow commit order.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    receipts_tx: Arc<watch::Sender<Vec<Receipt>>>,
    categories_tx: Arc<watch::Sender<Vec<Category>>>,
}

impl SqliteStore {
    /// Open (or create) the database file and its tables.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Unavailable(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        let conn = Connection::open(path)?;
        let store = Self::from_connection(conn)?;
        info!("Opened receipt database {}", path.display());
        Ok(store)
    }

    /// Database that lives only as long as the store.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;

        let receipts = load_receipts(&conn)?;
        let categories = load_categories(&conn)?;

        let (receipts_tx, _) = watch::channel(receipts);
        let (categories_tx, _) = watch::channel(categories);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            receipts_tx: Arc::new(receipts_tx),
            categories_tx: Arc::new(categories_tx),
        })
    }

    /// Run `work` against the locked connection on the blocking pool.
    async fn with_conn<T, F>(&self, work: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = lock(&conn)?;
            work(&*guard)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("database task failed: {e}")))?
    }

    async fn upsert(&self, receipt: &Receipt) -> Result<(), StoreError> {
        let tags = serde_json::to_string(&receipt.tags).map_err(|e| StoreError::Corrupt {
            id: receipt.id.clone(),
            reason: e.to_string(),
        })?;
        let receipt = receipt.clone();
        let receipts_tx = Arc::clone(&self.receipts_tx);

        self.with_conn(move |conn| {
            conn.execute(
                &format!(
                    "INSERT OR REPLACE INTO receipts ({RECEIPT_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)"
                ),
                params![
                    receipt.id,
                    receipt.created_at.to_rfc3339(),
                    receipt.receipt_date.format("%Y-%m-%d").to_string(),
                    receipt.merchant,
                    receipt.total_amount.to_string(),
                    receipt.vat_amount.map(|v| v.to_string()),
                    receipt.currency,
                    receipt.category,
                    receipt.description,
                    receipt.notes,
                    tags,
                    receipt.ocr_raw_text,
                    receipt.ocr_confidence.map(f64::from),
                    receipt.original_uri,
                    receipt.stored_uri,
                    receipt.renamed_file_name,
                    receipt.export_folder_uri,
                    receipt.export_status.as_str(),
                    receipt.last_export_attempt_at.map(|t| t.to_rfc3339()),
                ],
            )?;

            receipts_tx.send_modify(|snapshot| {
                match snapshot.iter_mut().find(|r| r.id == receipt.id) {
                    Some(existing) => *existing = receipt,
                    None => snapshot.push(receipt),
                }
                sort_receipts(snapshot);
            });
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl ReceiptStore for SqliteStore {
    async fn insert(&self, receipt: &Receipt) -> Result<(), StoreError> {
        self.upsert(receipt).await
    }

    async fn update(&self, receipt: &Receipt) -> Result<(), StoreError> {
        self.upsert(receipt).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let id = id.to_string();
        let receipts_tx = Arc::clone(&self.receipts_tx);

        self.with_conn(move |conn| {
            let removed = conn.execute("DELETE FROM receipts WHERE id = ?1", params![id])?;
            if removed > 0 {
                receipts_tx.send_modify(|snapshot| snapshot.retain(|r| r.id != id));
            }
            Ok(())
        })
        .await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Receipt>, StoreError> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {RECEIPT_COLUMNS} FROM receipts WHERE id = ?1"),
                    params![id],
                    ReceiptRow::from_row,
                )
                .optional()?;

            row.map(ReceiptRow::into_receipt).transpose()
        })
        .await
    }

    fn query_all(&self) -> ReceiptFeed {
        ReceiptFeed::new(self.receipts_tx.subscribe())
    }
}

#[async_trait]
impl CategoryStore for SqliteStore {
    async fn insert_category(&self, category: &Category) -> Result<(), StoreError> {
        let category = category.clone();
        let categories_tx = Arc::clone(&self.categories_tx);

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO categories (name, is_default, created_at) VALUES (?1, ?2, ?3)",
                params![category.name, category.is_default, category.created_at.to_rfc3339()],
            )?;

            categories_tx.send_modify(|snapshot| {
                match snapshot.iter_mut().find(|c| c.name == category.name) {
                    Some(existing) => *existing = category,
                    None => snapshot.push(category),
                }
                sort_categories(snapshot);
            });
            Ok(())
        })
        .await
    }

    async fn delete_category(&self, name: &str) -> Result<(), StoreError> {
        let name = name.to_string();
        let categories_tx = Arc::clone(&self.categories_tx);

        self.with_conn(move |conn| {
            let is_default: Option<bool> = conn
                .query_row(
                    "SELECT is_default FROM categories WHERE name = ?1",
                    params![name],
                    |row| row.get(0),
                )
                .optional()?;

            match is_default {
                Some(true) => Err(StoreError::DefaultCategory(name)),
                Some(false) => {
                    conn.execute("DELETE FROM categories WHERE name = ?1", params![name])?;
                    categories_tx.send_modify(|snapshot| snapshot.retain(|c| c.name != name));
                    Ok(())
                }
                None => Ok(()),
            }
        })
        .await
    }

    async fn category_exists(&self, name: &str) -> Result<bool, StoreError> {
        let name = name.to_string();
        self.with_conn(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM categories WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
        .await
    }

    fn query_categories(&self) -> watch::Receiver<Vec<Category>> {
        self.categories_tx.subscribe()
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, StoreError> {
    conn.lock()
        .map_err(|e| StoreError::Unavailable(format!("connection lock poisoned: {e}")))
}

/// Raw column values, decoded outside the rusqlite row callback.
struct ReceiptRow {
    id: String,
    created_at: String,
    receipt_date: String,
    merchant: Option<String>,
    total_amount: String,
    vat_amount: Option<String>,
    currency: String,
    category: String,
    description: Option<String>,
    notes: Option<String>,
    tags: String,
    ocr_raw_text: Option<String>,
    ocr_confidence: Option<f64>,
    original_uri: Option<String>,
    stored_uri: Option<String>,
    renamed_file_name: Option<String>,
    export_folder_uri: Option<String>,
    export_status: String,
    last_export_attempt_at: Option<String>,
}

impl ReceiptRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            created_at: row.get(1)?,
            receipt_date: row.get(2)?,
            merchant: row.get(3)?,
            total_amount: row.get(4)?,
            vat_amount: row.get(5)?,
            currency: row.get(6)?,
            category: row.get(7)?,
            description: row.get(8)?,
            notes: row.get(9)?,
            tags: row.get(10)?,
            ocr_raw_text: row.get(11)?,
            ocr_confidence: row.get(12)?,
            original_uri: row.get(13)?,
            stored_uri: row.get(14)?,
            renamed_file_name: row.get(15)?,
            export_folder_uri: row.get(16)?,
            export_status: row.get(17)?,
            last_export_attempt_at: row.get(18)?,
        })
    }

    fn into_receipt(self) -> Result<Receipt, StoreError> {
        let id = self.id;
        let corrupt = |field: &str, err: String| StoreError::Corrupt {
            id: id.clone(),
            reason: format!("{}: {}", field, err),
        };

        let created_at = parse_timestamp(&self.created_at).map_err(|e| corrupt("created_at", e))?;
        let receipt_date = NaiveDate::from_str(&self.receipt_date)
            .map_err(|e| corrupt("receipt_date", e.to_string()))?;
        let total_amount = Decimal::from_str(&self.total_amount)
            .map_err(|e| corrupt("total_amount", e.to_string()))?;
        let vat_amount = self
            .vat_amount
            .as_deref()
            .map(Decimal::from_str)
            .transpose()
            .map_err(|e| corrupt("vat_amount", e.to_string()))?;
        let tags: Vec<String> =
            serde_json::from_str(&self.tags).map_err(|e| corrupt("tags", e.to_string()))?;
        let export_status =
            ExportStatus::from_str(&self.export_status).map_err(|e| corrupt("export_status", e))?;
        let last_export_attempt_at = self
            .last_export_attempt_at
            .as_deref()
            .map(parse_timestamp)
            .transpose()
            .map_err(|e| corrupt("last_export_attempt_at", e))?;

        Ok(Receipt {
            id,
            created_at,
            receipt_date,
            merchant: self.merchant,
            total_amount,
            vat_amount,
            currency: self.currency,
            category: self.category,
            description: self.description,
            notes: self.notes,
            tags,
            ocr_raw_text: self.ocr_raw_text,
            ocr_confidence: self.ocr_confidence.map(|c| c as f32),
            original_uri: self.original_uri,
            stored_uri: self.stored_uri,
            renamed_file_name: self.renamed_file_name,
            export_folder_uri: self.export_folder_uri,
            export_status,
            last_export_attempt_at,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| e.to_string())
}

fn load_receipts(conn: &Connection) -> Result<Vec<Receipt>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECEIPT_COLUMNS} FROM receipts ORDER BY receipt_date DESC, created_at DESC"
    ))?;
    let rows = stmt
        .query_map([], ReceiptRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(ReceiptRow::into_receipt).collect()
}

fn load_categories(conn: &Connection) -> Result<Vec<Category>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT name, is_default, created_at FROM categories ORDER BY is_default DESC, name ASC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, bool>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(name, is_default, created_at)| {
            let created_at = parse_timestamp(&created_at).map_err(|reason| StoreError::Corrupt {
                id: name.clone(),
                reason,
            })?;
            Ok(Category {
                name,
                is_default,
                created_at,
            })
        })
        .collect()
}
