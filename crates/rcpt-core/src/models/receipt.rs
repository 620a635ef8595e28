//! Receipt and category records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::extraction::ReceiptDraft;

/// Category assigned to receipts that the user has not classified yet.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Seed categories created on first run. These cannot be deleted.
pub const DEFAULT_CATEGORIES: [&str; 8] = [
    UNCATEGORIZED,
    "Fuel",
    "Lunch",
    "Dinner",
    "Hotel",
    "Transport",
    "Office Supplies",
    "Entertainment",
];

/// Export state of a receipt image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExportStatus {
    /// Initial state after capture.
    NotExported,
    /// The image was copied to a named destination.
    Exported,
    /// The last export attempt failed. Retriable.
    Failed,
}

impl ExportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotExported => "NOT_EXPORTED",
            Self::Exported => "EXPORTED",
            Self::Failed => "FAILED",
        }
    }
}

impl Default for ExportStatus {
    fn default() -> Self {
        Self::NotExported
    }
}

impl fmt::Display for ExportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOT_EXPORTED" => Ok(Self::NotExported),
            "EXPORTED" => Ok(Self::Exported),
            "FAILED" => Ok(Self::Failed),
            other => Err(format!("unknown export status: {}", other)),
        }
    }
}

/// A captured or imported receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    /// Unique identifier, generated at creation.
    pub id: String,

    /// Capture timestamp.
    pub created_at: DateTime<Utc>,

    /// Transaction date, editable by the user.
    pub receipt_date: NaiveDate,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,

    pub total_amount: Decimal,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat_amount: Option<Decimal>,

    /// ISO 4217 currency code.
    pub currency: String,

    pub category: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Recognized text at capture time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_raw_text: Option<String>,

    /// Mean recognition confidence at capture time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_confidence: Option<f32>,

    /// Source image as captured or imported. Never rewritten.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_uri: Option<String>,

    /// Location of the renamed copy written by the export pipeline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_uri: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renamed_file_name: Option<String>,

    /// Folder the copy was exported to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_folder_uri: Option<String>,

    #[serde(default)]
    pub export_status: ExportStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_export_attempt_at: Option<DateTime<Utc>>,
}

impl Receipt {
    /// Create a minimal receipt captured at `created_at`.
    pub fn new(created_at: DateTime<Utc>, currency: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at,
            receipt_date: created_at.with_timezone(&Local).date_naive(),
            merchant: None,
            total_amount: Decimal::ZERO,
            vat_amount: None,
            currency: currency.into(),
            category: UNCATEGORIZED.to_string(),
            description: None,
            notes: None,
            tags: Vec::new(),
            ocr_raw_text: None,
            ocr_confidence: None,
            original_uri: None,
            stored_uri: None,
            renamed_file_name: None,
            export_folder_uri: None,
            export_status: ExportStatus::NotExported,
            last_export_attempt_at: None,
        }
    }

    /// Build a new receipt from an extraction draft.
    ///
    /// The receipt date falls back to the capture date and the currency to
    /// `fallback_currency` when the draft has none.
    pub fn from_draft(
        draft: &ReceiptDraft,
        original_uri: Option<String>,
        created_at: DateTime<Utc>,
        fallback_currency: &str,
    ) -> Self {
        let currency = draft
            .currency
            .clone()
            .unwrap_or_else(|| fallback_currency.to_string());

        let mut receipt = Self::new(created_at, currency);
        if let Some(date) = draft.date {
            receipt.receipt_date = date;
        }
        receipt.merchant = draft.merchant.clone();
        receipt.total_amount = draft.total_amount.unwrap_or(Decimal::ZERO);
        receipt.vat_amount = draft.vat_amount;
        receipt.ocr_raw_text = Some(draft.raw_text.clone());
        receipt.ocr_confidence = Some(draft.confidence);
        receipt.original_uri = original_uri;
        receipt
    }
}

/// A user-facing expense category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Unique name, also the primary key.
    pub name: String,
    /// Seeded categories are protected from deletion.
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            is_default: false,
            created_at,
        }
    }

    pub fn default_category(name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            is_default: true,
            created_at,
        }
    }

    /// The seed set, stamped with `created_at`.
    pub fn defaults(created_at: DateTime<Utc>) -> Vec<Self> {
        DEFAULT_CATEGORIES
            .iter()
            .map(|name| Self::default_category(*name, created_at))
            .collect()
    }
}

/// Sort categories default-first, then by name.
pub fn sort_categories(categories: &mut [Category]) {
    categories.sort_by(|a, b| {
        b.is_default
            .cmp(&a.is_default)
            .then_with(|| a.name.cmp(&b.name))
    });
}

/// Sort receipts newest transaction first.
pub fn sort_receipts(receipts: &mut [Receipt]) {
    receipts.sort_by(|a, b| {
        b.receipt_date
            .cmp(&a.receipt_date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_new_receipt_defaults() {
        let receipt = Receipt::new(at(2024, 5, 1), "EUR");

        assert_eq!(receipt.category, UNCATEGORIZED);
        assert_eq!(receipt.export_status, ExportStatus::NotExported);
        assert!(receipt.stored_uri.is_none());
        assert_eq!(receipt.total_amount, Decimal::ZERO);
    }

    #[test]
    fn test_from_draft_uses_recognized_fields() {
        let draft = ReceiptDraft {
            merchant: Some("Shop X".to_string()),
            date: NaiveDate::from_ymd_opt(2024, 5, 1),
            total_amount: Some(Decimal::from_str("12.34").unwrap()),
            vat_amount: None,
            currency: Some("GBP".to_string()),
            confidence: 0.9,
            raw_text: "Shop X".to_string(),
        };

        let receipt = Receipt::from_draft(&draft, Some("/tmp/a.jpg".into()), at(2024, 6, 3), "USD");

        assert_eq!(receipt.receipt_date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(receipt.merchant.as_deref(), Some("Shop X"));
        assert_eq!(receipt.currency, "GBP");
        assert_eq!(receipt.ocr_confidence, Some(0.9));
        assert_eq!(receipt.original_uri.as_deref(), Some("/tmp/a.jpg"));
    }

    #[test]
    fn test_from_empty_draft_falls_back() {
        let created = at(2024, 6, 3);
        let receipt = Receipt::from_draft(&ReceiptDraft::empty(), None, created, "USD");

        assert_eq!(receipt.currency, "USD");
        assert_eq!(receipt.receipt_date, created.with_timezone(&Local).date_naive());
        assert_eq!(receipt.ocr_raw_text.as_deref(), Some(""));
    }

    #[test]
    fn test_export_status_names() {
        assert_eq!(ExportStatus::NotExported.to_string(), "NOT_EXPORTED");
        assert_eq!(ExportStatus::from_str("FAILED").unwrap(), ExportStatus::Failed);
        assert!(ExportStatus::from_str("DONE").is_err());

        let json = serde_json::to_string(&ExportStatus::Exported).unwrap();
        assert_eq!(json, "\"EXPORTED\"");
    }

    #[test]
    fn test_category_ordering() {
        let now = at(2024, 1, 1);
        let mut categories = vec![
            Category::new("Books", now),
            Category::default_category("Lunch", now),
            Category::new("Art", now),
            Category::default_category("Fuel", now),
        ];
        sort_categories(&mut categories);

        let names: Vec<_> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Fuel", "Lunch", "Art", "Books"]);
    }

    #[test]
    fn test_receipt_ordering_newest_first() {
        let mut a = Receipt::new(at(2024, 1, 1), "EUR");
        a.receipt_date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut b = Receipt::new(at(2024, 1, 1), "EUR");
        b.receipt_date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        let mut receipts = vec![a.clone(), b.clone()];
        sort_receipts(&mut receipts);
        assert_eq!(receipts[0].id, b.id);
        assert_eq!(receipts[1].id, a.id);
    }
}
