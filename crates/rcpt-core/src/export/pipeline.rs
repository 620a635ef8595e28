use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::error::{ExportError, StorageError};
use crate::extraction::ReceiptParser;
use crate::models::{ExportStatus, Receipt, StorageConfig};
use crate::ocr::Recognizer;
use crate::storage::{
    extension_for, generate_file_name, local_path, route_folder, write_receipt_file, Bucket,
    SourceImage, WriteReport,
};
use crate::store::ReceiptStore;

use super::{Capture, ExportOutcome};

/// Drives a receipt from capture through export.
///
/// Within save and export the order is fixed: naming, copy, then the store
/// update. The store update is the only durable commit, so an interrupted
/// copy never leaves a receipt marked `EXPORTED`.
pub struct ExportPipeline<S> {
    store: S,
}

impl<S: ReceiptStore> ExportPipeline<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Recognize an image, extract a draft and insert a `NOT_EXPORTED` receipt.
    ///
    /// Recognition failures do not fail the capture; the receipt is built from
    /// an empty draft instead.
    pub async fn capture<R: Recognizer + ?Sized>(
        &self,
        recognizer: &R,
        parser: &ReceiptParser,
        source: &SourceImage,
        captured_at: DateTime<Utc>,
    ) -> Result<Capture, ExportError> {
        let draft = parser.extract(recognizer.recognize(source).await);
        let receipt = Receipt::from_draft(
            &draft,
            Some(source.uri()),
            captured_at,
            parser.default_currency(),
        );

        self.store.insert(&receipt).await?;
        info!(
            "Captured receipt {} from {} (total: {} {})",
            receipt.id,
            source.path().display(),
            receipt.total_amount,
            receipt.currency
        );

        Ok(Capture { receipt, draft })
    }

    /// Persist edits, copying the image the first time or when its name changed.
    ///
    /// With storage disabled only the edits are written.
    pub async fn save(
        &self,
        receipt: Receipt,
        storage: &StorageConfig,
    ) -> Result<ExportOutcome, ExportError> {
        let needs_copy = storage.enabled
            && match receipt.stored_uri {
                None => receipt.original_uri.is_some(),
                Some(_) => needs_regeneration(&receipt, storage),
            };

        if needs_copy {
            return self.copy_and_record(receipt, storage).await;
        }

        self.store.update(&receipt).await?;
        debug!("Saved receipt {} without copying", receipt.id);
        Ok(ExportOutcome::Saved { receipt })
    }

    /// Explicit export action.
    ///
    /// An already exported receipt whose name and folder are unchanged is left
    /// alone unless `force` is set.
    pub async fn export(
        &self,
        mut receipt: Receipt,
        storage: &StorageConfig,
        force: bool,
    ) -> Result<ExportOutcome, ExportError> {
        if !storage.enabled {
            return self.record_failure(receipt, StorageError::Disabled).await;
        }

        if !force && receipt.stored_uri.is_some() && !needs_regeneration(&receipt, storage) {
            if receipt.export_status == ExportStatus::Exported {
                debug!("Receipt {} already exported, nothing to do", receipt.id);
                return Ok(ExportOutcome::Unchanged { receipt });
            }

            // The copy on disk is current; only the status is stale
            receipt.export_status = ExportStatus::Exported;
            receipt.last_export_attempt_at = Some(Utc::now());
            self.store.update(&receipt).await?;
            return Ok(ExportOutcome::Exported {
                receipt,
                warnings: Vec::new(),
            });
        }

        self.copy_and_record(receipt, storage).await
    }

    /// Delete a receipt and its stored copy.
    ///
    /// A stored file that cannot be removed is logged and the record is
    /// deleted anyway.
    pub async fn delete(&self, receipt: &Receipt) -> Result<(), ExportError> {
        if let Some(uri) = &receipt.stored_uri {
            match local_path(uri) {
                Some(path) => remove_stored_file(path).await,
                None => warn!("Stored copy {} is not a local file, leaving it in place", uri),
            }
        }

        self.store.delete(&receipt.id).await?;
        info!("Deleted receipt {}", receipt.id);
        Ok(())
    }

    async fn copy_and_record(
        &self,
        mut receipt: Receipt,
        storage: &StorageConfig,
    ) -> Result<ExportOutcome, ExportError> {
        // A receipt without an original can still be renamed from its stored copy
        let source = receipt
            .original_uri
            .as_deref()
            .or(receipt.stored_uri.as_deref())
            .and_then(SourceImage::from_uri);

        let Some(source) = source else {
            return self.record_failure(receipt, StorageError::NoImage).await;
        };

        let job = CopyJob {
            source,
            storage: storage.clone(),
            bucket: route_folder(&receipt.category),
            date: receipt.receipt_date,
            description: receipt.description.clone(),
            merchant: receipt.merchant.clone(),
            amount: receipt.total_amount,
        };

        let report = match tokio::task::spawn_blocking(move || job.run())
            .await
            .map_err(|e| ExportError::Task(e.to_string()))?
        {
            Ok(report) => report,
            Err(e) => return self.record_failure(receipt, e).await,
        };

        let stored = report.stored;
        let previous = receipt.stored_uri.take();

        receipt.stored_uri = Some(stored.path.to_string_lossy().into_owned());
        receipt.renamed_file_name = Some(stored.file_name.clone());
        receipt.export_folder_uri = Some(stored.folder.to_string_lossy().into_owned());
        receipt.export_status = ExportStatus::Exported;
        receipt.last_export_attempt_at = Some(Utc::now());

        self.store
            .update(&receipt)
            .await
            .map_err(|source| ExportError::Inconsistent {
                path: stored.path.clone(),
                source,
            })?;

        if let Some(old) = previous.as_deref().and_then(local_path) {
            remove_replaced_file(old, stored.path.clone()).await;
        }

        info!("Receipt {} exported to {}", receipt.id, stored.path.display());

        Ok(ExportOutcome::Exported {
            receipt,
            warnings: report.warnings,
        })
    }

    async fn record_failure(
        &self,
        mut receipt: Receipt,
        error: StorageError,
    ) -> Result<ExportOutcome, ExportError> {
        warn!("Export of receipt {} failed: {}", receipt.id, error);

        receipt.export_status = ExportStatus::Failed;
        receipt.last_export_attempt_at = Some(Utc::now());
        self.store.update(&receipt).await?;

        Ok(ExportOutcome::Failed {
            receipt,
            reason: error.to_string(),
        })
    }
}

/// Everything the blocking copy needs, detached from the receipt.
struct CopyJob {
    source: SourceImage,
    storage: StorageConfig,
    bucket: Bucket,
    date: chrono::NaiveDate,
    description: Option<String>,
    merchant: Option<String>,
    amount: Decimal,
}

impl CopyJob {
    fn run(self) -> Result<WriteReport, StorageError> {
        let bytes = self.source.read_bytes()?;
        let content_type = self.source.content_type(&bytes);
        let extension = extension_for(content_type.as_deref(), self.source.path());
        let file_name = generate_file_name(
            self.date,
            self.description.as_deref(),
            self.merchant.as_deref(),
            self.amount,
            &extension,
        );
        debug!("Generated file name: {}", file_name);

        write_receipt_file(&self.storage, self.bucket, &file_name, &bytes)
    }
}

/// Whether the stored copy no longer matches the receipt's name or folder.
fn needs_regeneration(receipt: &Receipt, storage: &StorageConfig) -> bool {
    let Some(current_name) = receipt.renamed_file_name.as_deref() else {
        return true;
    };

    if let Some(path) = receipt.stored_uri.as_deref().and_then(local_path) {
        if !path.exists() {
            debug!("Stored copy {} is missing", path.display());
            return true;
        }
    }

    let extension = Path::new(current_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("jpg");
    let expected = generate_file_name(
        receipt.receipt_date,
        receipt.description.as_deref(),
        receipt.merchant.as_deref(),
        receipt.total_amount,
        extension,
    );
    if expected != current_name {
        debug!("File name changed: {} -> {}", current_name, expected);
        return true;
    }

    let bucket = route_folder(&receipt.category);
    match receipt.export_folder_uri.as_deref() {
        Some(folder) => {
            let folder = PathBuf::from(folder);
            let in_bucket = storage.custom_folder(bucket) == Some(folder.as_path())
                || storage.default_folder(bucket) == folder;
            if !in_bucket {
                debug!("Receipt {} moved to the {} bucket", receipt.id, bucket);
            }
            !in_bucket
        }
        None => false,
    }
}

/// Remove the previous copy unless it resolves to the file just written.
///
/// An old path that no longer resolves is left alone.
async fn remove_replaced_file(old: PathBuf, new: PathBuf) {
    let result = tokio::task::spawn_blocking({
        let old = old.clone();
        move || -> std::io::Result<bool> {
            let resolved = std::fs::canonicalize(&old)?;
            if resolved == std::fs::canonicalize(&new)? {
                return Ok(false);
            }
            std::fs::remove_file(resolved)?;
            Ok(true)
        }
    })
    .await;

    match result {
        Ok(Ok(true)) => debug!("Removed previous copy {}", old.display()),
        Ok(Ok(false)) => debug!("Previous copy {} is the new copy, keeping it", old.display()),
        Ok(Err(e)) => warn!("Left previous copy {} in place: {}", old.display(), e),
        Err(e) => warn!("Left previous copy {} in place: {}", old.display(), e),
    }
}

async fn remove_stored_file(path: PathBuf) {
    let result = tokio::task::spawn_blocking({
        let path = path.clone();
        move || std::fs::remove_file(path)
    })
    .await;

    match result {
        Ok(Ok(())) => debug!("Removed stored copy {}", path.display()),
        Ok(Err(e)) => warn!("Failed to remove stored copy {}: {}", path.display(), e),
        Err(e) => warn!("Failed to remove stored copy {}: {}", path.display(), e),
    }
}
