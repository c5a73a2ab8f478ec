use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::cli::output::get_formatter;
use crate::context::AppContext;
use crate::models::{Config, OutputFormat};
use crate::utils::document_identifier;

#[derive(Debug, Args)]
#[command(group(clap::ArgGroup::new("target").required(true).args(["path", "id"])))]
pub struct DeleteArgs {
    /// Document whose chunks should be removed
    pub path: Option<PathBuf>,

    /// Document identifier to remove, instead of a path
    #[arg(long)]
    pub id: Option<String>,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub force: bool,
}

pub async fn handle_delete(args: DeleteArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let formatter = get_formatter(format);

    let identifier = match (args.id, args.path) {
        (Some(id), _) => id,
        (None, Some(path)) => document_identifier(&path),
        (None, None) => anyhow::bail!("either a path or --id is required"),
    };

    if verbose {
        eprintln!("Deleting indexed chunks for: {}", identifier);
    }

    if !args.force {
        println!(
            "This will delete all indexed chunks of '{}'. Continue? [y/N]",
            identifier
        );
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("{}", formatter.format_message("Cancelled."));
            return Ok(());
        }
    }

    let config = Config::load()?;
    let context = AppContext::initialize(&config)
        .await
        .context("failed to initialize services")?;

    context
        .index
        .delete_document(&identifier)
        .await
        .context("delete failed")?;
    context.shutdown();

    println!(
        "{}",
        formatter.format_message(&format!("Deleted indexed chunks of '{}'", identifier))
    );

    Ok(())
}
