//! Edit command - change receipt fields and save.
//!
//! Saving copies the image the first time, and again whenever the edit
//! changes its file name or folder.

use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;

use rcpt_core::extraction::rules::parse_amount_token;
use rcpt_core::models::Receipt;
use rcpt_core::store::CategoryStore;

use super::{report_outcome, AppContext};

/// Arguments for the edit command.
#[derive(Args)]
pub struct EditArgs {
    /// Receipt id or unique id prefix
    id: String,

    #[arg(long)]
    merchant: Option<String>,

    /// Receipt date (YYYY-MM-DD)
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Total amount, `.` or `,` as decimal separator
    #[arg(long, value_parser = parse_amount)]
    total: Option<Decimal>,

    /// VAT amount
    #[arg(long, value_parser = parse_amount)]
    vat: Option<Decimal>,

    /// ISO currency code
    #[arg(long)]
    currency: Option<String>,

    #[arg(long)]
    category: Option<String>,

    /// Description used for the exported file name
    #[arg(long)]
    description: Option<String>,

    #[arg(long)]
    notes: Option<String>,

    /// Comma-separated tags, replacing the current ones
    #[arg(long, value_delimiter = ',')]
    tags: Option<Vec<String>>,
}

pub async fn run(args: EditArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let ctx = AppContext::open(config_path).await?;
    let mut receipt = ctx.find_receipt(&args.id).await?;

    if let Some(category) = &args.category {
        if !ctx.store.category_exists(category).await? {
            anyhow::bail!(
                "Unknown category '{}'. Add it with 'rcpt categories add'.",
                category
            );
        }
    }

    apply_edits(&mut receipt, args);

    let outcome = ctx.pipeline().save(receipt, &ctx.config.storage).await?;
    if !report_outcome(&outcome) {
        anyhow::bail!("Receipt saved, but its image could not be exported");
    }

    Ok(())
}

fn apply_edits(receipt: &mut Receipt, args: EditArgs) {
    if let Some(merchant) = args.merchant {
        receipt.merchant = non_empty(merchant);
    }
    if let Some(date) = args.date {
        receipt.receipt_date = date;
    }
    if let Some(total) = args.total {
        receipt.total_amount = total;
    }
    if let Some(vat) = args.vat {
        receipt.vat_amount = Some(vat);
    }
    if let Some(currency) = args.currency {
        receipt.currency = currency.trim().to_uppercase();
    }
    if let Some(category) = args.category {
        receipt.category = category;
    }
    if let Some(description) = args.description {
        receipt.description = non_empty(description);
    }
    if let Some(notes) = args.notes {
        receipt.notes = non_empty(notes);
    }
    if let Some(tags) = args.tags {
        receipt.tags = tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
    }
}

fn non_empty(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_amount(value: &str) -> Result<Decimal, String> {
    parse_amount_token(value.trim()).ok_or_else(|| format!("invalid amount: {}", value))
}
