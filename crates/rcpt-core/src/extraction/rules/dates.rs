//! Transaction date extraction.

use chrono::NaiveDate;
use regex::Regex;

use super::patterns::{DATE_DASH, DATE_DOT, DATE_ISO, DATE_SLASH};
use super::{ExtractionMatch, FieldExtractor};

/// Date field extractor.
///
/// Formats are checked in a fixed priority order; the first format that
/// appears anywhere in the text decides the result.
pub struct DateExtractor {
    formats: Vec<(&'static Regex, &'static str)>,
}

impl DateExtractor {
    pub fn new() -> Self {
        Self {
            formats: vec![
                (&*DATE_ISO, "%Y-%m-%d"),
                (&*DATE_SLASH, "%d/%m/%Y"),
                (&*DATE_DASH, "%d-%m-%Y"),
                (&*DATE_DOT, "%d.%m.%Y"),
            ],
        }
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<NaiveDate>;

    /// Parse the first match of the highest-priority format present.
    ///
    /// An unparsable match (e.g. `31/02/2024`) yields `None` rather than
    /// trying lower-priority formats.
    fn extract(&self, text: &str) -> Option<Self::Output> {
        let (pattern, format, found) = self
            .formats
            .iter()
            .find_map(|(pattern, format)| pattern.find(text).map(|m| (pattern, format, m)))?;

        match NaiveDate::parse_from_str(found.as_str(), format) {
            Ok(date) => Some(ExtractionMatch::new(date, 0.9)),
            Err(e) => {
                tracing::debug!("Date '{}' matched {} but failed to parse: {}", found.as_str(), pattern.as_str(), e);
                None
            }
        }
    }
}

/// Extract the transaction date from receipt text.
pub fn extract_date(text: &str) -> Option<NaiveDate> {
    DateExtractor::new().extract(text).map(|m| m.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_each_format() {
        assert_eq!(extract_date("Date 2024-05-01"), Some(ymd(2024, 5, 1)));
        assert_eq!(extract_date("Date 01/05/2024"), Some(ymd(2024, 5, 1)));
        assert_eq!(extract_date("Date 01-05-2024"), Some(ymd(2024, 5, 1)));
        assert_eq!(extract_date("Date 01.05.2024"), Some(ymd(2024, 5, 1)));
    }

    #[test]
    fn test_priority_beats_position() {
        // the ISO date wins even though the dotted date comes first
        let text = "Printed 02.06.2024\nSold 2024-05-01";
        assert_eq!(extract_date(text), Some(ymd(2024, 5, 1)));
    }

    #[test]
    fn test_invalid_match_is_absent() {
        // the slash format matches first but is not a real date
        assert_eq!(extract_date("31/02/2024 and 01.05.2024"), None);
    }

    #[test]
    fn test_no_date() {
        assert_eq!(extract_date("Shop X\nTotal: 12.34"), None);
    }
}
