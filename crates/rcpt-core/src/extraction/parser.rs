//! Receipt parser turning recognized text into a draft.

use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::RecognitionError;
use crate::ocr::{Recognition, TextBlock};

use super::rules::{extract_currency, extract_date, extract_total, extract_vat, resolve_default_currency};

/// Best-effort structured guess for a new receipt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceiptDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat_amount: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    /// Mean recognition confidence (0.0 - 1.0).
    pub confidence: f32,

    /// Recognized text, passed through unchanged.
    pub raw_text: String,
}

impl ReceiptDraft {
    /// Draft used when recognition fails: nothing extracted.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Parses receipts with the rule set in [`super::rules`].
#[derive(Debug, Clone)]
pub struct ReceiptParser {
    default_currency: String,
}

impl ReceiptParser {
    /// Create a parser whose currency fallback comes from the locale.
    pub fn new() -> Self {
        Self {
            default_currency: resolve_default_currency(None),
        }
    }

    /// Set the currency used when the text names none.
    pub fn with_default_currency(mut self, currency: &str) -> Self {
        self.default_currency = resolve_default_currency(Some(currency));
        self
    }

    pub fn default_currency(&self) -> &str {
        &self.default_currency
    }

    /// Turn a recognition outcome into a draft.
    ///
    /// Recognition failures produce [`ReceiptDraft::empty`]; this never fails.
    pub fn extract(&self, recognition: Result<Recognition, RecognitionError>) -> ReceiptDraft {
        match recognition {
            Ok(recognition) => self.parse(&recognition),
            Err(e) => {
                warn!("Recognition failed, continuing with an empty draft: {}", e);
                ReceiptDraft::empty()
            }
        }
    }

    /// Extract fields from a recognition result.
    pub fn parse(&self, recognition: &Recognition) -> ReceiptDraft {
        let start = Instant::now();
        let text = recognition.raw_text.as_str();

        let total = extract_total(text);
        let draft = ReceiptDraft {
            merchant: extract_merchant(&recognition.blocks),
            date: extract_date(text),
            total_amount: total.as_ref().map(|m| m.value),
            vat_amount: extract_vat(text).map(|m| m.value),
            currency: Some(extract_currency(text, &self.default_currency)),
            confidence: recognition.mean_confidence(),
            raw_text: recognition.raw_text.clone(),
        };

        debug!(
            "Extracted draft (merchant: {:?}, total: {:?} @ {:.1}, date: {:?}) in {}us",
            draft.merchant,
            draft.total_amount,
            total.map_or(0.0, |m| m.confidence),
            draft.date,
            start.elapsed().as_micros()
        );

        draft
    }
}

impl Default for ReceiptParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Merchant: the first block with visible text, trimmed.
pub fn extract_merchant(blocks: &[TextBlock]) -> Option<String> {
    blocks
        .iter()
        .map(|b| b.text.trim())
        .find(|t| !t.is_empty())
        .map(str::to_string)
}
