//! Total and VAT amount extraction.

use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::{
    AMOUNT_LABEL, AMOUNT_WITH_CURRENCY, MWST_LABEL, NUMBER_TOKEN, SUM_LABEL, TAX_LABEL,
    TOTAL_LABEL, VAT_LABEL,
};
use super::ExtractionMatch;

/// Finds every numeric token in text.
pub struct AmountExtractor;

impl AmountExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl AmountExtractor {
    /// Every numeric token that parses as an amount, in text order.
    pub fn numbers(&self, text: &str) -> Vec<ExtractionMatch<Decimal>> {
        NUMBER_TOKEN
            .find_iter(text)
            .filter_map(|m| parse_amount_token(m.as_str()))
            .map(|amount| ExtractionMatch::new(amount, 0.5))
            .collect()
    }
}

/// Extract the receipt total.
///
/// Labeled patterns are tried in order (`total`, `amount`, `sum`, then a
/// number followed by a currency); the first one whose number parses wins.
/// Without a labeled match the largest positive number in the text is used.
pub fn extract_total(text: &str) -> Option<ExtractionMatch<Decimal>> {
    let labeled: [&Regex; 4] = [&TOTAL_LABEL, &AMOUNT_LABEL, &SUM_LABEL, &AMOUNT_WITH_CURRENCY];
    if let Some(found) = first_labeled(text, &labeled, 0.9) {
        return Some(found);
    }

    AmountExtractor::new()
        .numbers(text)
        .into_iter()
        .filter(|m| m.value > Decimal::ZERO)
        .max_by(|a, b| a.value.cmp(&b.value))
        .map(|mut m| {
            m.confidence = 0.3;
            m
        })
}

/// Extract the VAT amount from `vat`, `tax` or `mwst` labels. No fallback.
pub fn extract_vat(text: &str) -> Option<ExtractionMatch<Decimal>> {
    let labeled: [&Regex; 3] = [&VAT_LABEL, &TAX_LABEL, &MWST_LABEL];
    first_labeled(text, &labeled, 0.9)
}

fn first_labeled(text: &str, patterns: &[&Regex], confidence: f32) -> Option<ExtractionMatch<Decimal>> {
    patterns.iter().find_map(|pattern| {
        let caps = pattern.captures(text)?;
        let token = caps.get(1)?;
        let amount = parse_amount_token(token.as_str())?;
        Some(ExtractionMatch::new(amount, confidence))
    })
}

/// Parse a numeric token such as `45.67`, `45,67` or `12.`.
///
/// Commas are decimal separators. Tokens with more than one separator, or no
/// digits at all, are rejected.
pub fn parse_amount_token(token: &str) -> Option<Decimal> {
    let normalized = token.replace(',', ".");
    if !normalized.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    if normalized.matches('.').count() > 1 {
        return None;
    }

    let trimmed = normalized.trim_end_matches('.');
    let candidate = if trimmed.starts_with('.') {
        format!("0{}", trimmed)
    } else {
        trimmed.to_string()
    };

    Decimal::from_str(&candidate).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_amount_token() {
        assert_eq!(parse_amount_token("45.67"), Some(dec("45.67")));
        assert_eq!(parse_amount_token("45,67"), Some(dec("45.67")));
        assert_eq!(parse_amount_token("12."), Some(dec("12")));
        assert_eq!(parse_amount_token(".5"), Some(dec("0.5")));
        assert_eq!(parse_amount_token("1,234.56"), None);
        assert_eq!(parse_amount_token(".."), None);
        assert_eq!(parse_amount_token(","), None);
    }

    #[test]
    fn test_labeled_total() {
        let total = extract_total("Coffee 3.00\nTotal: 45.67\nCash 50.00").unwrap();
        assert_eq!(total.value, dec("45.67"));
    }

    #[test]
    fn test_label_is_case_insensitive_and_comma_normalized() {
        assert_eq!(extract_total("TOTAL 19,90").unwrap().value, dec("19.90"));
        assert_eq!(extract_total("Amount: 7,5").unwrap().value, dec("7.5"));
        assert_eq!(extract_total("sum 100").unwrap().value, dec("100"));
    }

    #[test]
    fn test_label_priority() {
        // "total" wins over "amount" even when it appears later
        let text = "Amount: 10.00\nTotal: 12.00";
        assert_eq!(extract_total(text).unwrap().value, dec("12.00"));
    }

    #[test]
    fn test_amount_followed_by_currency() {
        assert_eq!(extract_total("Paid 23.50 EUR").unwrap().value, dec("23.50"));
        assert_eq!(extract_total("Paid 8,20€").unwrap().value, dec("8.20"));
    }

    #[test]
    fn test_max_fallback() {
        let text = "Item 3.00\nItem 45.67\nItem 1.00";
        assert_eq!(extract_total(text).unwrap().value, dec("45.67"));
    }

    #[test]
    fn test_max_fallback_ignores_zero() {
        assert!(extract_total("0.00 0").is_none());
    }

    #[test]
    fn test_unparsable_label_falls_through() {
        let text = "Total: .. \nItem 4.20";
        assert_eq!(extract_total(text).unwrap().value, dec("4.20"));
    }

    #[test]
    fn test_no_numbers() {
        assert!(extract_total("Thank you for shopping").is_none());
    }

    #[test]
    fn test_vat_labels() {
        assert_eq!(extract_vat("VAT: 2.10").unwrap().value, dec("2.10"));
        assert_eq!(extract_vat("Sales tax 0,99").unwrap().value, dec("0.99"));
        assert_eq!(extract_vat("MwSt 1.90").unwrap().value, dec("1.90"));
        assert!(extract_vat("Total: 12.00").is_none());
    }

    #[test]
    fn test_numbers_in_text_order() {
        let extractor = AmountExtractor::new();
        let results = extractor.numbers("3.00 and 45.67 then 1.00");
        let values: Vec<_> = results.iter().map(|m| m.value).collect();
        assert_eq!(values, vec![dec("3.00"), dec("45.67"), dec("1.00")]);

        // a trailing comma makes the token ambiguous
        assert_eq!(extractor.numbers("45.67,").len(), 0);
    }
}
