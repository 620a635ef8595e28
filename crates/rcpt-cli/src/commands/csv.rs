//! CSV command - write a receipt report.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Args;
use console::style;

use rcpt_core::csv_export::{export_csv_file, to_csv_string};

use super::list::select_receipts;
use super::AppContext;

/// Arguments for the csv command.
#[derive(Args)]
pub struct CsvArgs {
    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// First receipt date to include (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last receipt date to include (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Only receipts in this category
    #[arg(long)]
    category: Option<String>,
}

pub async fn run(args: CsvArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let ctx = AppContext::open(config_path).await?;
    let receipts = select_receipts(&ctx, args.from, args.to, args.category.as_deref());

    match &args.output {
        Some(path) => {
            export_csv_file(&receipts, path)?;
            println!(
                "{} Wrote {} receipt(s) to {}",
                style("✓").green(),
                receipts.len(),
                path.display()
            );
        }
        None => print!("{}", to_csv_string(&receipts)?),
    }

    Ok(())
}
