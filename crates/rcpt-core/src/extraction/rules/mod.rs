//! Rule-based field extractors for receipts.

pub mod amounts;
pub mod currency;
pub mod dates;
pub mod patterns;

pub use amounts::{extract_total, extract_vat, parse_amount_token, AmountExtractor};
pub use currency::{
    currency_symbol, extract_currency, format_currency, locale_currency, resolve_default_currency,
    CurrencyExtractor,
};
pub use dates::{extract_date, DateExtractor};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;
}

/// An extracted value and how sure the rule that found it is.
#[derive(Debug, Clone)]
pub struct ExtractionMatch<T> {
    pub value: T,
    /// Confidence score (0.0 - 1.0). Labeled matches score higher than
    /// fallbacks.
    pub confidence: f32,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32) -> Self {
        Self { value, confidence }
    }
}
