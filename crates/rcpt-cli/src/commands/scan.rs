//! Scan command - capture receipts from image files.

use std::path::PathBuf;

use chrono::Utc;
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use rcpt_core::ocr::{Recognizer, SidecarRecognizer};
use rcpt_core::models::Receipt;
use rcpt_core::storage::SourceImage;
use rcpt_core::store::{CategoryStore, ReceiptStore};

use super::{print_receipt, report_outcome, AppContext};

/// Arguments for the scan command.
#[derive(Args)]
pub struct ScanArgs {
    /// Image files or glob patterns
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Category for the captured receipts
    #[arg(long)]
    category: Option<String>,

    /// Description used for the exported file name
    #[arg(long)]
    description: Option<String>,

    /// Save right away, exporting the image
    #[arg(long)]
    save: bool,

    /// Recognize with the OCR models instead of sidecar transcripts
    #[arg(long)]
    ocr: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: ScanFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ScanFormat {
    /// JSON array of captured receipts
    Json,
    /// Plain text summary
    Text,
}

const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "pdf", "webp", "tiff", "bmp"];

pub async fn run(args: ScanArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let ctx = AppContext::open(config_path).await?;

    if let Some(category) = &args.category {
        if !ctx.store.category_exists(category).await? {
            anyhow::bail!(
                "Unknown category '{}'. Add it with 'rcpt categories add'.",
                category
            );
        }
    }

    let files = expand_inputs(&args.inputs)?;
    if files.is_empty() {
        anyhow::bail!("No matching image files found");
    }

    let recognizer = create_recognizer(&ctx, args.ocr)?;
    let parser = ctx.parser();
    let pipeline = ctx.pipeline();

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} receipts")?
            .progress_chars("=>-"),
    );

    let mut captured: Vec<Receipt> = Vec::with_capacity(files.len());
    let mut failures = 0;

    for path in files {
        let source = SourceImage::new(&path);
        let capture = pipeline
            .capture(&*recognizer, &parser, &source, Utc::now())
            .await?;
        let mut receipt = capture.receipt;

        if capture.draft.raw_text.is_empty() {
            warn!("No text recognized in {}", path.display());
        }

        if let Some(category) = &args.category {
            receipt.category = category.clone();
        }
        if let Some(description) = &args.description {
            receipt.description = Some(description.clone());
        }

        receipt = if args.save {
            let outcome = pipeline.save(receipt, &ctx.config.storage).await?;
            if outcome.is_failure() {
                failures += 1;
            }
            // Keep stdout parseable for JSON output
            if matches!(args.format, ScanFormat::Text) {
                report_outcome(&outcome);
            }
            outcome.into_receipt()
        } else {
            if args.category.is_some() || args.description.is_some() {
                ctx.store.update(&receipt).await?;
            }
            receipt
        };

        info!("Captured {} as {}", path.display(), receipt.id);
        captured.push(receipt);
        pb.inc(1);
    }

    pb.finish_and_clear();

    match args.format {
        ScanFormat::Json => println!("{}", serde_json::to_string_pretty(&captured)?),
        ScanFormat::Text => {
            for receipt in &captured {
                print_receipt(receipt);
            }
            println!(
                "{} Captured {} receipt(s)",
                style("✓").green(),
                captured.len()
            );
        }
    }

    if failures > 0 {
        anyhow::bail!("{} export(s) failed", failures);
    }

    Ok(())
}

fn expand_inputs(inputs: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        let path = PathBuf::from(input);
        if path.is_file() {
            files.push(path);
            continue;
        }

        for entry in glob(input)?.filter_map(|r| r.ok()) {
            let ext = entry
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_lowercase();
            if entry.is_file() && IMAGE_EXTENSIONS.contains(&ext.as_str()) {
                files.push(entry);
            }
        }
    }

    // Receipts keep the source path, so store it absolute
    let mut files: Vec<PathBuf> = files
        .into_iter()
        .map(|p| std::fs::canonicalize(&p).unwrap_or(p))
        .collect();
    files.dedup();
    Ok(files)
}

#[cfg(feature = "native")]
fn create_recognizer(ctx: &AppContext, ocr: bool) -> anyhow::Result<Box<dyn Recognizer>> {
    if ocr {
        let recognizer = rcpt_core::ocr::PureOcrRecognizer::from_config(&ctx.config.models)?;
        return Ok(Box::new(recognizer));
    }
    Ok(Box::new(SidecarRecognizer::new()))
}

#[cfg(not(feature = "native"))]
fn create_recognizer(_ctx: &AppContext, ocr: bool) -> anyhow::Result<Box<dyn Recognizer>> {
    if ocr {
        anyhow::bail!("OCR support is not compiled in. Rebuild with --features native.");
    }
    Ok(Box::new(SidecarRecognizer::new()))
}
