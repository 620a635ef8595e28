//! CLI application for receipt capture and expense tracking.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{categories, config, csv, delete, edit, export, folders, list, scan, show};

/// Receipt capture - extract, categorize and file receipt images
#[derive(Parser)]
#[command(name = "rcpt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture receipts from image files
    Scan(scan::ScanArgs),

    /// List stored receipts
    List(list::ListArgs),

    /// Show a single receipt
    Show(show::ShowArgs),

    /// Edit a receipt and save it
    Edit(edit::EditArgs),

    /// Export receipt images to their folders
    Export(export::ExportArgs),

    /// Delete receipts and their exported images
    Delete(delete::DeleteArgs),

    /// Manage expense categories
    Categories(categories::CategoriesArgs),

    /// Manage export folders
    Folders(folders::FoldersArgs),

    /// Write a CSV report
    Csv(csv::CsvArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Scan(args) => scan::run(args, config_path).await,
        Commands::List(args) => list::run(args, config_path).await,
        Commands::Show(args) => show::run(args, config_path).await,
        Commands::Edit(args) => edit::run(args, config_path).await,
        Commands::Export(args) => export::run(args, config_path).await,
        Commands::Delete(args) => delete::run(args, config_path).await,
        Commands::Categories(args) => categories::run(args, config_path).await,
        Commands::Folders(args) => folders::run(args, config_path).await,
        Commands::Csv(args) => csv::run(args, config_path).await,
        Commands::Config(args) => config::run(args, config_path).await,
    }
}
