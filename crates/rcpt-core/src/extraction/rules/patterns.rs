//! Common regex patterns for receipt extraction.
//!
//! Numeric tokens are deliberately loose (`[0-9.,]+`); the parsers decide
//! whether a token is a usable number.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Dates, in priority order
    pub static ref DATE_ISO: Regex = Regex::new(r"[0-9]{4}-[0-9]{2}-[0-9]{2}").unwrap();
    pub static ref DATE_SLASH: Regex = Regex::new(r"[0-9]{2}/[0-9]{2}/[0-9]{4}").unwrap();
    pub static ref DATE_DASH: Regex = Regex::new(r"[0-9]{2}-[0-9]{2}-[0-9]{4}").unwrap();
    pub static ref DATE_DOT: Regex = Regex::new(r"[0-9]{2}\.[0-9]{2}\.[0-9]{4}").unwrap();

    // Labeled totals, in priority order
    pub static ref TOTAL_LABEL: Regex = Regex::new(r"(?i)total[:\s]*([0-9.,]+)").unwrap();
    pub static ref AMOUNT_LABEL: Regex = Regex::new(r"(?i)amount[:\s]*([0-9.,]+)").unwrap();
    pub static ref SUM_LABEL: Regex = Regex::new(r"(?i)sum[:\s]*([0-9.,]+)").unwrap();
    pub static ref AMOUNT_WITH_CURRENCY: Regex =
        Regex::new(r"([0-9.,]+)\s*(?i:eur|usd|gbp|\$|€|£)").unwrap();

    // Labeled VAT, in priority order
    pub static ref VAT_LABEL: Regex = Regex::new(r"(?i)vat[:\s]*([0-9.,]+)").unwrap();
    pub static ref TAX_LABEL: Regex = Regex::new(r"(?i)tax[:\s]*([0-9.,]+)").unwrap();
    pub static ref MWST_LABEL: Regex = Regex::new(r"(?i)mwst[:\s]*([0-9.,]+)").unwrap();

    // Any numeric token
    pub static ref NUMBER_TOKEN: Regex = Regex::new(r"[0-9.,]+").unwrap();

    // Locale strings such as "de_CH.UTF-8" or "en-GB"
    pub static ref LOCALE_REGION: Regex =
        Regex::new(r"^[A-Za-z]{2,3}[_-]([A-Za-z]{2})(?:[.@].*)?$").unwrap();
}
