//! Data models.

pub mod config;
pub mod receipt;

pub use config::{DatabaseConfig, ExtractionConfig, ModelConfig, RcptConfig, StorageConfig};
pub use receipt::{Category, ExportStatus, Receipt, DEFAULT_CATEGORIES, UNCATEGORIZED};
