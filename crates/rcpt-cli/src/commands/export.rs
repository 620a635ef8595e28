//! Export command - copy receipt images to their folders.

use std::collections::HashSet;

use clap::Args;
use console::style;

use rcpt_core::models::{ExportStatus, Receipt};
use rcpt_core::store::ReceiptStore;

use super::{report_outcome, AppContext};

/// Arguments for the export command.
#[derive(Args)]
pub struct ExportArgs {
    /// Receipt ids or unique id prefixes
    #[arg(required_unless_present = "pending")]
    ids: Vec<String>,

    /// Export every receipt that is not exported yet
    #[arg(long)]
    pending: bool,

    /// Rewrite the image even if it is already exported
    #[arg(long)]
    force: bool,
}

pub async fn run(args: ExportArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let ctx = AppContext::open(config_path).await?;

    let mut receipts: Vec<Receipt> = Vec::new();
    for id in &args.ids {
        receipts.push(ctx.find_receipt(id).await?);
    }
    if args.pending {
        receipts.extend(
            ctx.store
                .query_all()
                .current()
                .into_iter()
                .filter(|r| r.export_status != ExportStatus::Exported),
        );
    }
    let receipts = dedup_by_id(receipts);

    if receipts.is_empty() {
        println!("{} Nothing to export.", style("ℹ").blue());
        return Ok(());
    }

    let pipeline = ctx.pipeline();
    let mut failed = 0;

    for receipt in receipts {
        let outcome = pipeline
            .export(receipt, &ctx.config.storage, args.force)
            .await?;
        if !report_outcome(&outcome) {
            failed += 1;
        }
    }

    if failed > 0 {
        anyhow::bail!("{} export(s) failed", failed);
    }

    Ok(())
}

/// Keep the first occurrence of each receipt id.
fn dedup_by_id(receipts: Vec<Receipt>) -> Vec<Receipt> {
    let mut seen = HashSet::new();
    receipts
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let a = Receipt::new(Utc::now(), "EUR");
        let b = Receipt::new(Utc::now(), "EUR");
        let mut stale_a = a.clone();
        stale_a.notes = Some("stale".to_string());

        let unique = dedup_by_id(vec![a.clone(), b.clone(), stale_a, b.clone()]);

        assert_eq!(unique, vec![a, b]);
    }
}
