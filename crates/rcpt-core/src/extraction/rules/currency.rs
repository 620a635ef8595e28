//! Currency detection and display helpers.

use rust_decimal::{Decimal, RoundingStrategy};

use super::patterns::LOCALE_REGION;
use super::{ExtractionMatch, FieldExtractor};

/// Currency used when neither the text, the configuration nor the locale
/// names one.
pub const FALLBACK_CURRENCY: &str = "USD";

/// Indicators in priority order, with the ISO code each maps to.
const INDICATORS: [(&str, &str); 7] = [
    ("EUR", "EUR"),
    ("USD", "USD"),
    ("GBP", "GBP"),
    ("CHF", "CHF"),
    ("€", "EUR"),
    ("$", "USD"),
    ("£", "GBP"),
];

/// Detects currency codes and symbols in receipt text.
pub struct CurrencyExtractor;

impl CurrencyExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CurrencyExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for CurrencyExtractor {
    type Output = ExtractionMatch<String>;

    /// The first indicator in priority order that occurs anywhere wins.
    fn extract(&self, text: &str) -> Option<Self::Output> {
        let upper = text.to_uppercase();
        INDICATORS
            .iter()
            .find(|(needle, _)| upper.contains(needle))
            .map(|(_, code)| ExtractionMatch::new(code.to_string(), 0.9))
    }
}

/// Detect the currency in `text`, falling back to `default_currency`.
pub fn extract_currency(text: &str, default_currency: &str) -> String {
    CurrencyExtractor::new()
        .extract(text)
        .map(|m| m.value)
        .unwrap_or_else(|| default_currency.to_string())
}

/// Resolve the fallback currency: configured value, then locale, then USD.
pub fn resolve_default_currency(configured: Option<&str>) -> String {
    configured
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .or_else(locale_currency)
        .unwrap_or_else(|| FALLBACK_CURRENCY.to_string())
}

/// Currency of the process locale (`LC_ALL`, `LC_MONETARY`, then `LANG`).
pub fn locale_currency() -> Option<String> {
    ["LC_ALL", "LC_MONETARY", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.is_empty())
        .and_then(|locale| currency_for_locale(&locale))
        .map(str::to_string)
}

/// Map a locale string like `de_CH.UTF-8` to its region's currency.
pub fn currency_for_locale(locale: &str) -> Option<&'static str> {
    let caps = LOCALE_REGION.captures(locale)?;
    currency_for_region(&caps[1].to_uppercase())
}

fn currency_for_region(region: &str) -> Option<&'static str> {
    let code = match region {
        "US" | "EC" | "SV" | "PR" => "USD",
        "GB" => "GBP",
        "CH" | "LI" => "CHF",
        "AT" | "BE" | "CY" | "DE" | "EE" | "ES" | "FI" | "FR" | "GR" | "HR" | "IE" | "IT"
        | "LT" | "LU" | "LV" | "MT" | "NL" | "PT" | "SI" | "SK" => "EUR",
        "PL" => "PLN",
        "CZ" => "CZK",
        "HU" => "HUF",
        "RO" => "RON",
        "SE" => "SEK",
        "NO" => "NOK",
        "DK" => "DKK",
        "CA" => "CAD",
        "AU" => "AUD",
        "NZ" => "NZD",
        "JP" => "JPY",
        "CN" => "CNY",
        "IN" => "INR",
        "BR" => "BRL",
        "MX" => "MXN",
        "TR" => "TRY",
        "ZA" => "ZAR",
        _ => return None,
    };
    Some(code)
}

/// Display symbol for a currency code. Unknown codes are shown as-is.
pub fn currency_symbol(code: &str) -> &str {
    match code {
        "GBP" => "£",
        "USD" => "$",
        "EUR" => "€",
        other => other,
    }
}

/// Format an amount with its currency symbol, e.g. `€12.50`.
pub fn format_currency(amount: Decimal, code: &str) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{}{:.2}", currency_symbol(code), rounded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_symbol_maps_to_code() {
        assert_eq!(extract_currency("Total €12.00", "USD"), "EUR");
        assert_eq!(extract_currency("Total £3.50", "USD"), "GBP");
        assert_eq!(extract_currency("Total $3.50", "EUR"), "USD");
    }

    #[test]
    fn test_codes_are_case_insensitive() {
        assert_eq!(extract_currency("12.00 chf", "USD"), "CHF");
        assert_eq!(extract_currency("paid in eur", "USD"), "EUR");
    }

    #[test]
    fn test_priority_order() {
        // EUR is checked before the dollar sign
        assert_eq!(extract_currency("$ 5.00 / 4.60 EUR", "USD"), "EUR");
    }

    #[test]
    fn test_default_when_absent() {
        assert_eq!(extract_currency("Total 12.00", "CHF"), "CHF");
    }

    #[test]
    fn test_resolve_configured_currency() {
        assert_eq!(resolve_default_currency(Some(" chf ")), "CHF");
    }

    #[test]
    fn test_locale_mapping() {
        assert_eq!(currency_for_locale("de_CH.UTF-8"), Some("CHF"));
        assert_eq!(currency_for_locale("en_GB"), Some("GBP"));
        assert_eq!(currency_for_locale("fr-FR"), Some("EUR"));
        assert_eq!(currency_for_locale("C"), None);
        assert_eq!(currency_for_locale("POSIX"), None);
    }

    #[test]
    fn test_format_currency() {
        let amount = Decimal::from_str("12.5").unwrap();
        assert_eq!(format_currency(amount, "EUR"), "€12.50");
        assert_eq!(format_currency(amount, "CHF"), "CHF12.50");
        assert_eq!(currency_symbol("PLN"), "PLN");
    }
}
