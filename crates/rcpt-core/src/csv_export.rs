//! CSV report of receipts.

use std::io::Write;
use std::path::Path;

use rust_decimal::Decimal;
use tracing::info;

use crate::error::{RcptError, Result};
use crate::models::Receipt;

/// Column header, always written even for an empty report.
pub const CSV_HEADER: [&str; 9] = [
    "Date",
    "Merchant",
    "Category",
    "Total Amount",
    "VAT Amount",
    "Currency",
    "Notes",
    "Tags",
    "Export Status",
];

/// Write receipts as CSV to any writer.
pub fn write_csv<W: Write>(receipts: &[Receipt], writer: W) -> Result<W> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(CSV_HEADER)?;

    for receipt in receipts {
        let date = receipt.receipt_date.format("%Y-%m-%d").to_string();
        let total = format_amount(receipt.total_amount);
        let vat = format_amount(receipt.vat_amount.unwrap_or(Decimal::ZERO));
        let tags = receipt.tags.join(";");

        wtr.write_record([
            date.as_str(),
            receipt.merchant.as_deref().unwrap_or(""),
            receipt.category.as_str(),
            total.as_str(),
            vat.as_str(),
            receipt.currency.as_str(),
            receipt.notes.as_deref().unwrap_or(""),
            tags.as_str(),
            receipt.export_status.as_str(),
        ])?;
    }

    wtr.flush()?;
    wtr.into_inner().map_err(|e| RcptError::Io(e.into_error()))
}

/// Render receipts as a CSV string.
pub fn to_csv_string(receipts: &[Receipt]) -> Result<String> {
    let data = write_csv(receipts, Vec::new())?;
    String::from_utf8(data)
        .map_err(|e| RcptError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Write receipts to a CSV file, replacing it.
pub fn export_csv_file(receipts: &[Receipt], path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv(receipts, std::io::BufWriter::new(file))?.flush()?;
    info!("Wrote {} receipts to {}", receipts.len(), path.display());
    Ok(())
}

fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExportStatus;
    use chrono::{NaiveDate, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn receipt() -> Receipt {
        let mut receipt = Receipt::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(), "EUR");
        receipt.receipt_date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        receipt.merchant = Some("Shop X".to_string());
        receipt.category = "Fuel".to_string();
        receipt.total_amount = Decimal::from_str("12.3").unwrap();
        receipt
    }

    #[test]
    fn test_header_only_when_empty() {
        let csv = to_csv_string(&[]).unwrap();
        assert_eq!(
            csv,
            "Date,Merchant,Category,Total Amount,VAT Amount,Currency,Notes,Tags,Export Status\n"
        );
    }

    #[test]
    fn test_row_format() {
        let mut receipt = receipt();
        receipt.vat_amount = Some(Decimal::from_str("1.97").unwrap());
        receipt.tags = vec!["trip".to_string(), "client".to_string()];
        receipt.export_status = ExportStatus::Exported;

        let csv = to_csv_string(&[receipt]).unwrap();
        let row = csv.lines().nth(1).unwrap();

        assert_eq!(row, "2024-05-01,Shop X,Fuel,12.30,1.97,EUR,,trip;client,EXPORTED");
    }

    #[test]
    fn test_quotes_and_commas_escaped() {
        let mut receipt = receipt();
        receipt.merchant = Some("Joe's, Inc".to_string());
        receipt.notes = Some("said \"thanks\"".to_string());

        let csv = to_csv_string(&[receipt]).unwrap();
        let row = csv.lines().nth(1).unwrap();

        assert!(row.contains("\"Joe's, Inc\""));
        assert!(row.contains("\"said \"\"thanks\"\"\""));
        assert!(row.contains(",0.00,"));
    }

    #[test]
    fn test_export_csv_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("report.csv");

        export_csv_file(&[receipt(), receipt()], &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);
    }
}
