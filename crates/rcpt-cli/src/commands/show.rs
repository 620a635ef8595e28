//! Show command - print a single receipt.

use clap::Args;

use super::{print_receipt, AppContext};

/// Arguments for the show command.
#[derive(Args)]
pub struct ShowArgs {
    /// Receipt id or unique id prefix
    id: String,

    /// Print JSON instead of a summary
    #[arg(long)]
    json: bool,

    /// Include the recognized text
    #[arg(long)]
    raw_text: bool,
}

pub async fn run(args: ShowArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let ctx = AppContext::open(config_path).await?;
    let receipt = ctx.find_receipt(&args.id).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&receipt)?);
        return Ok(());
    }

    print_receipt(&receipt);

    if let Some(confidence) = receipt.ocr_confidence {
        println!("  OCR:       {:.0}% confidence", confidence * 100.0);
    }
    if args.raw_text {
        if let Some(text) = receipt.ocr_raw_text.as_deref().filter(|t| !t.is_empty()) {
            println!();
            println!("{}", text);
        }
    }

    Ok(())
}
