//! Folders command - export switch and per-bucket folders.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand, ValueEnum};
use console::style;

use rcpt_core::models::RcptConfig;
use rcpt_core::storage::Bucket;

use super::{load_config, resolve_config_path, save_config};

/// Arguments for the folders command.
#[derive(Args)]
pub struct FoldersArgs {
    #[command(subcommand)]
    command: FoldersCommand,
}

#[derive(Subcommand)]
enum FoldersCommand {
    /// Show export settings and the folder used for each bucket
    Show,

    /// Turn image export on
    Enable,

    /// Turn image export off
    Disable,

    /// Use a custom folder for a bucket
    Set {
        #[arg(value_enum)]
        bucket: BucketArg,
        /// Existing, writable folder
        path: PathBuf,
    },

    /// Go back to the default folder for a bucket
    Clear {
        #[arg(value_enum)]
        bucket: BucketArg,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BucketArg {
    Fuel,
    Other,
}

impl From<BucketArg> for Bucket {
    fn from(arg: BucketArg) -> Self {
        match arg {
            BucketArg::Fuel => Bucket::Fuel,
            BucketArg::Other => Bucket::Other,
        }
    }
}

pub async fn run(args: FoldersArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let path = resolve_config_path(config_path);
    let mut config = load_config(&path)?;

    match args.command {
        FoldersCommand::Show => {
            show_folders(&config);
            return Ok(());
        }
        FoldersCommand::Enable => {
            config.storage.enabled = true;
            println!("{} Local storage enabled", style("✓").green());
        }
        FoldersCommand::Disable => {
            config.storage.enabled = false;
            println!("{} Local storage disabled", style("✓").green());
        }
        FoldersCommand::Set { bucket, path: folder } => {
            let folder = check_folder(&folder)?;
            let bucket = Bucket::from(bucket);
            println!(
                "{} {} receipts will be exported to {}",
                style("✓").green(),
                bucket,
                folder.display()
            );
            config.storage.set_custom_folder(bucket, Some(folder));
        }
        FoldersCommand::Clear { bucket } => {
            let bucket = Bucket::from(bucket);
            config.storage.set_custom_folder(bucket, None);
            println!(
                "{} {} receipts will be exported to {}",
                style("✓").green(),
                bucket,
                config.storage.default_folder(bucket).display()
            );
        }
    }

    save_config(&config, &path)
}

fn show_folders(config: &RcptConfig) {
    let storage = &config.storage;
    let status = if storage.enabled {
        style("enabled").green()
    } else {
        style("disabled").yellow()
    };
    println!("Local storage: {}", status);

    for bucket in [Bucket::Fuel, Bucket::Other] {
        match storage.custom_folder(bucket) {
            Some(folder) => println!("{:<6} {} (custom)", bucket.folder_name(), folder.display()),
            None => println!(
                "{:<6} {} (default)",
                bucket.folder_name(),
                storage.default_folder(bucket).display()
            ),
        }
    }
}

fn check_folder(folder: &Path) -> anyhow::Result<PathBuf> {
    let metadata = fs::metadata(folder)
        .map_err(|e| anyhow::anyhow!("Cannot access {}: {}", folder.display(), e))?;
    if !metadata.is_dir() {
        anyhow::bail!("{} is not a directory", folder.display());
    }
    if metadata.permissions().readonly() {
        anyhow::bail!("No write permission for folder {}", folder.display());
    }
    Ok(fs::canonicalize(folder)?)
}
