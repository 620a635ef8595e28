//! CLI commands.

pub mod categories;
pub mod config;
pub mod csv;
pub mod delete;
pub mod edit;
pub mod export;
pub mod folders;
pub mod list;
pub mod scan;
pub mod show;

use std::path::{Path, PathBuf};

use console::style;
use tracing::debug;

use rcpt_core::extraction::rules::format_currency;
use rcpt_core::models::{RcptConfig, Receipt};
use rcpt_core::store::{CategoryStore, ReceiptStore, SqliteStore};
use rcpt_core::{ExportOutcome, ExportPipeline, ReceiptParser};

/// Output format for receipt listings.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
    /// CSV output
    Csv,
}

/// Default config file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rcpt")
        .join("config.json")
}

/// The `--config` path if given, else the default location.
pub fn resolve_config_path(config_path: Option<&str>) -> PathBuf {
    config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path)
}

/// Load the config file, falling back to defaults when it does not exist.
pub fn load_config(path: &Path) -> anyhow::Result<RcptConfig> {
    if path.exists() {
        debug!("Loading config from {}", path.display());
        Ok(RcptConfig::from_file(path)?)
    } else {
        debug!("No config at {}, using defaults", path.display());
        Ok(RcptConfig::default())
    }
}

/// Write the config file, creating its directory.
pub fn save_config(config: &RcptConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    config.save(path)?;
    Ok(())
}

/// Loaded configuration plus an open receipt database.
pub struct AppContext {
    pub config: RcptConfig,
    pub store: SqliteStore,
}

impl AppContext {
    /// Load config, open the database and make sure default categories exist.
    pub async fn open(config_path: Option<&str>) -> anyhow::Result<Self> {
        let config = load_config(&resolve_config_path(config_path))?;
        let store = SqliteStore::open(&config.database.path)?;
        store.seed_defaults().await?;

        Ok(Self { config, store })
    }

    pub fn pipeline(&self) -> ExportPipeline<SqliteStore> {
        ExportPipeline::new(self.store.clone())
    }

    pub fn parser(&self) -> ReceiptParser {
        match &self.config.extraction.default_currency {
            Some(currency) => ReceiptParser::new().with_default_currency(currency),
            None => ReceiptParser::new(),
        }
    }

    /// Find a receipt by full id or unique id prefix.
    pub async fn find_receipt(&self, id: &str) -> anyhow::Result<Receipt> {
        if let Some(receipt) = self.store.get_by_id(id).await? {
            return Ok(receipt);
        }

        let mut matches: Vec<Receipt> = self
            .store
            .query_all()
            .current()
            .into_iter()
            .filter(|r| r.id.starts_with(id))
            .collect();

        match matches.len() {
            0 => anyhow::bail!("Receipt not found: {}", id),
            1 => Ok(matches.remove(0)),
            n => anyhow::bail!("Receipt id prefix '{}' is ambiguous ({} matches)", id, n),
        }
    }
}

/// One-line summary of a receipt.
pub fn receipt_line(receipt: &Receipt) -> String {
    format!(
        "{}  {}  {:<24} {:>12}  {:<16} {}",
        &receipt.id[..receipt.id.len().min(8)],
        receipt.receipt_date.format("%Y-%m-%d"),
        receipt.merchant.as_deref().unwrap_or("-"),
        format_currency(receipt.total_amount, &receipt.currency),
        receipt.category,
        receipt.export_status
    )
}

/// Multi-line description of a receipt.
pub fn print_receipt(receipt: &Receipt) {
    println!("{}", style(format!("Receipt {}", receipt.id)).bold());
    println!("  Date:      {}", receipt.receipt_date.format("%d.%m.%Y"));
    println!("  Merchant:  {}", receipt.merchant.as_deref().unwrap_or("-"));
    println!(
        "  Total:     {}",
        format_currency(receipt.total_amount, &receipt.currency)
    );
    if let Some(vat) = receipt.vat_amount {
        println!("  VAT:       {}", format_currency(vat, &receipt.currency));
    }
    println!("  Category:  {}", receipt.category);
    if let Some(description) = &receipt.description {
        println!("  Note:      {}", description);
    }
    if let Some(notes) = &receipt.notes {
        println!("  Notes:     {}", notes);
    }
    if !receipt.tags.is_empty() {
        println!("  Tags:      {}", receipt.tags.join(", "));
    }
    println!("  Status:    {}", receipt.export_status);
    if let Some(stored) = &receipt.stored_uri {
        println!("  Stored at: {}", stored);
    }
}

/// Report a save or export outcome. Returns `false` for failures.
pub fn report_outcome(outcome: &ExportOutcome) -> bool {
    for warning in outcome.warnings() {
        eprintln!("{} {}", style("⚠").yellow(), warning);
    }

    if outcome.is_failure() {
        eprintln!("{} {}", style("✗").red(), outcome.message());
        false
    } else {
        println!("{} {}", style("✓").green(), outcome.message());
        true
    }
}
