//! Export pipeline: naming, copying and export status bookkeeping.

mod pipeline;

pub use pipeline::ExportPipeline;

use serde::Serialize;

use crate::extraction::ReceiptDraft;
use crate::models::Receipt;

/// A freshly captured receipt and the draft it was built from.
#[derive(Debug, Clone, Serialize)]
pub struct Capture {
    pub receipt: Receipt,
    pub draft: ReceiptDraft,
}

/// What a save or export did to a receipt.
///
/// Every variant carries the receipt as it was persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExportOutcome {
    /// The image was copied (or an existing copy confirmed) and the receipt
    /// is `EXPORTED`.
    Exported {
        receipt: Receipt,
        /// Non-fatal problems, e.g. a custom folder that had to be skipped.
        warnings: Vec<String>,
    },
    /// Already exported under the same name; nothing was written.
    Unchanged { receipt: Receipt },
    /// Edits persisted without touching the image.
    Saved { receipt: Receipt },
    /// The copy failed and the receipt was recorded as `FAILED`.
    Failed { receipt: Receipt, reason: String },
}

impl ExportOutcome {
    pub fn receipt(&self) -> &Receipt {
        match self {
            Self::Exported { receipt, .. }
            | Self::Unchanged { receipt }
            | Self::Saved { receipt }
            | Self::Failed { receipt, .. } => receipt,
        }
    }

    pub fn into_receipt(self) -> Receipt {
        match self {
            Self::Exported { receipt, .. }
            | Self::Unchanged { receipt }
            | Self::Saved { receipt }
            | Self::Failed { receipt, .. } => receipt,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Short user-facing summary.
    pub fn message(&self) -> String {
        match self {
            Self::Exported { receipt, .. } => match &receipt.renamed_file_name {
                Some(name) => format!("Receipt exported as {}", name),
                None => "Receipt exported".to_string(),
            },
            Self::Unchanged { .. } => "Receipt already exported".to_string(),
            Self::Saved { .. } => "Receipt saved".to_string(),
            Self::Failed { reason, .. } => format!("Export failed: {}", reason),
        }
    }

    pub fn warnings(&self) -> &[String] {
        match self {
            Self::Exported { warnings, .. } => warnings,
            _ => &[],
        }
    }
}
