//! Categories command - manage expense categories.

use clap::{Args, Subcommand};
use console::style;

use rcpt_core::error::StoreError;
use rcpt_core::store::CategoryStore;

use super::AppContext;

/// Arguments for the categories command.
#[derive(Args)]
pub struct CategoriesArgs {
    #[command(subcommand)]
    command: CategoriesCommand,
}

#[derive(Subcommand)]
enum CategoriesCommand {
    /// List categories, defaults first
    List {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a category
    Add {
        /// Category name
        name: String,
    },

    /// Remove a user-added category
    Remove {
        /// Category name
        name: String,
    },
}

pub async fn run(args: CategoriesArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let ctx = AppContext::open(config_path).await?;

    match args.command {
        CategoriesCommand::List { json } => {
            let categories = ctx.store.query_categories().borrow().clone();
            if json {
                println!("{}", serde_json::to_string_pretty(&categories)?);
            } else {
                for category in &categories {
                    if category.is_default {
                        println!("{} {}", category.name, style("(default)").dim());
                    } else {
                        println!("{}", category.name);
                    }
                }
            }
        }
        CategoriesCommand::Add { name } => {
            if ctx.store.add_category(&name).await? {
                println!("{} Added category {}", style("✓").green(), name.trim());
            } else {
                println!("{} Category {} already exists", style("ℹ").blue(), name.trim());
            }
        }
        CategoriesCommand::Remove { name } => {
            if !ctx.store.category_exists(&name).await? {
                anyhow::bail!("Category not found: {}", name);
            }
            match ctx.store.delete_category(&name).await {
                Ok(()) => println!("{} Removed category {}", style("✓").green(), name),
                Err(StoreError::DefaultCategory(_)) => {
                    anyhow::bail!("'{}' is a default category and cannot be removed", name)
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok(())
}
