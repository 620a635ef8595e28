//! Deterministic file names for exported receipt images.

use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

/// Label used when neither description nor merchant has usable characters.
const UNKNOWN_LABEL: &str = "Unknown";

/// Extension used when nothing better is known.
const DEFAULT_EXTENSION: &str = "jpg";

/// Build `"<dd.MM.yyyy> - <label> - <amount>.<ext>"`.
///
/// The label is the sanitized description, else the sanitized merchant,
/// else `Unknown`. The amount always has two decimals and a `.` separator.
pub fn generate_file_name(
    date: NaiveDate,
    description: Option<&str>,
    merchant: Option<&str>,
    amount: Decimal,
    extension: &str,
) -> String {
    let label = [description, merchant]
        .into_iter()
        .flatten()
        .map(sanitize_label)
        .find(|l| !l.is_empty())
        .unwrap_or_else(|| UNKNOWN_LABEL.to_string());

    let amount = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    format!(
        "{} - {} - {:.2}.{}",
        date.format("%d.%m.%Y"),
        label,
        amount,
        normalize_extension(extension)
    )
}

/// Keep only `[A-Za-z0-9 ]`, trim, and collapse runs of spaces.
pub fn sanitize_label(label: &str) -> String {
    let kept: String = label
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extension for a declared content type, if it is one we know.
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    match content_type.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "application/pdf" => Some("pdf"),
        _ => None,
    }
}

/// Extension from the content type, else the path suffix, else `jpg`.
pub fn extension_for(content_type: Option<&str>, path: &Path) -> String {
    if let Some(ext) = content_type.and_then(extension_for_content_type) {
        return ext.to_string();
    }

    path.extension()
        .and_then(|e| e.to_str())
        .map(normalize_extension)
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

fn normalize_extension(extension: &str) -> String {
    let cleaned: String = extension
        .trim()
        .trim_start_matches('.')
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();

    if cleaned.is_empty() {
        DEFAULT_EXTENSION.to_string()
    } else {
        cleaned
    }
}
