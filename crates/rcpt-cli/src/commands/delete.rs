//! Delete command - remove receipts and their exported images.

use clap::Args;
use console::style;

use super::AppContext;

/// Arguments for the delete command.
#[derive(Args)]
pub struct DeleteArgs {
    /// Receipt ids or unique id prefixes
    #[arg(required = true)]
    ids: Vec<String>,
}

pub async fn run(args: DeleteArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let ctx = AppContext::open(config_path).await?;
    let pipeline = ctx.pipeline();

    for id in &args.ids {
        let receipt = ctx.find_receipt(id).await?;
        pipeline.delete(&receipt).await?;
        println!("{} Deleted receipt {}", style("✓").green(), receipt.id);
    }

    Ok(())
}
