//! List command - show stored receipts.

use chrono::NaiveDate;
use clap::Args;

use rcpt_core::csv_export::to_csv_string;
use rcpt_core::models::Receipt;
use rcpt_core::store::ReceiptStore;

use super::{receipt_line, AppContext, OutputFormat};

/// Arguments for the list command.
#[derive(Args)]
pub struct ListArgs {
    /// First receipt date to include (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last receipt date to include (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Only receipts in this category
    #[arg(long)]
    category: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

pub async fn run(args: ListArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let ctx = AppContext::open(config_path).await?;
    let receipts = select_receipts(&ctx, args.from, args.to, args.category.as_deref());

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&receipts)?),
        OutputFormat::Csv => print!("{}", to_csv_string(&receipts)?),
        OutputFormat::Text => {
            if receipts.is_empty() {
                println!("No receipts found.");
            }
            for receipt in &receipts {
                println!("{}", receipt_line(receipt));
            }
        }
    }

    Ok(())
}

/// Receipts in an optional date range and category, newest first.
pub fn select_receipts(
    ctx: &AppContext,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    category: Option<&str>,
) -> Vec<Receipt> {
    let feed = match (from, to) {
        (None, None) => ctx.store.query_all(),
        (from, to) => ctx.store.query_by_date_range(
            from.unwrap_or(NaiveDate::MIN),
            to.unwrap_or(NaiveDate::MAX),
        ),
    };

    feed.current()
        .into_iter()
        .filter(|r| category.is_none_or(|c| r.category.eq_ignore_ascii_case(c)))
        .collect()
}
