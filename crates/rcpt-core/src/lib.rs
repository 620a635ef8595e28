//! Core library for receipt capture and expense tracking.
//!
//! This crate provides:
//! - Field extraction from recognized receipt text (merchant, date, totals, VAT, currency)
//! - Deterministic file naming and Fuel/Other folder routing
//! - An export pipeline that copies receipt images and tracks export status
//! - Receipt and category stores (in-memory and SQLite) with live queries
//! - CSV reports

pub mod csv_export;
pub mod error;
pub mod export;
pub mod extraction;
pub mod models;
pub mod ocr;
pub mod storage;
pub mod store;

pub use csv_export::{export_csv_file, to_csv_string, write_csv};
pub use error::{ExportError, RcptError, RecognitionError, Result, StorageError, StoreError};
pub use export::{Capture, ExportOutcome, ExportPipeline};
pub use extraction::{ReceiptDraft, ReceiptParser};
pub use models::{Category, ExportStatus, RcptConfig, Receipt, StorageConfig};
#[cfg(feature = "native")]
pub use ocr::PureOcrRecognizer;
pub use ocr::{Recognition, Recognizer, SidecarRecognizer, TextBlock, TextElement};
pub use storage::{generate_file_name, route_folder, Bucket, SourceImage};
pub use store::{CategoryStore, MemoryStore, ReceiptFeed, ReceiptStore, SqliteStore};
