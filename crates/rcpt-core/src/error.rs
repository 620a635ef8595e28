//! Error types for the rcpt-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the rcpt library.
#[derive(Error, Debug)]
pub enum RcptError {
    /// Text recognition error.
    #[error("recognition error: {0}")]
    Recognition(#[from] RecognitionError),

    /// File storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Persistence error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Export pipeline error.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// CSV serialization error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised by a recognition backend.
#[derive(Error, Debug)]
pub enum RecognitionError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// The backend failed to recognize text.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Invalid image format or unreadable image.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// No transcript or image data could be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to reading source images and writing exported files.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Local storage export is switched off.
    #[error("Local storage is not enabled. Enable it in settings first.")]
    Disabled,

    /// The receipt has no image to export.
    #[error("No image found for this receipt")]
    NoImage,

    /// The source image could not be read.
    #[error("Failed to open source image {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source image is empty.
    #[error("No bytes copied from source {0}")]
    EmptySource(PathBuf),

    /// The custom folder no longer exists.
    #[error("Custom folder {0} is no longer accessible. Please select a new folder in settings.")]
    FolderInaccessible(PathBuf),

    /// The custom folder path is not a directory.
    #[error("Custom folder {0} is not a directory")]
    NotADirectory(PathBuf),

    /// The custom folder is read-only.
    #[error("No write permission for folder {0}. Please select a different folder.")]
    ReadOnly(PathBuf),

    /// The default folder could not be created.
    #[error("Failed to create storage directory {path}: {source}")]
    CreateFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the destination file failed.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by receipt and category stores.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying SQLite failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored row could not be decoded.
    #[error("corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },

    /// Default categories cannot be removed.
    #[error("default category '{0}' cannot be deleted")]
    DefaultCategory(String),

    /// Category names must contain visible characters.
    #[error("invalid category name: '{0}'")]
    InvalidCategoryName(String),

    /// The store lock was poisoned by a panicking writer.
    #[error("store is unavailable: {0}")]
    Unavailable(String),

    /// The store was dropped while a query was waiting for changes.
    #[error("store closed")]
    Closed,
}

/// Errors surfaced by the export pipeline.
///
/// Copy failures are not errors here: they are recorded on the receipt as a
/// `FAILED` export and reported through the pipeline outcome.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The store rejected a write.
    #[error("Failed to save receipt: {0}")]
    Store(#[from] StoreError),

    /// The file was copied but the record could not be updated.
    #[error("Copied receipt image to {path} but failed to record it: {source}")]
    Inconsistent {
        path: PathBuf,
        #[source]
        source: StoreError,
    },

    /// A background file task panicked or was cancelled.
    #[error("file task failed: {0}")]
    Task(String),
}

/// Result type for the rcpt library.
pub type Result<T> = std::result::Result<T, RcptError>;
