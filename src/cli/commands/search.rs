use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::time::Instant;

use crate::cli::output::get_formatter;
use crate::context::AppContext;
use crate::models::{Config, OutputFormat, SearchResults};
use crate::utils::document_identifier;

const DEFAULT_LIMIT: u64 = 5;

#[derive(Debug, Args)]
#[command(group(clap::ArgGroup::new("scope").required(true).args(["document", "id"])))]
pub struct SearchArgs {
    #[arg(required = true, help = "Search query text")]
    pub query: String,

    #[arg(long, short = 'd', help = "Document to search (path as ingested)")]
    pub document: Option<PathBuf>,

    #[arg(long, help = "Document identifier to search, instead of a path")]
    pub id: Option<String>,

    #[arg(long, short = 'n', help = "Maximum number of results to return")]
    pub limit: Option<u64>,
}

pub async fn handle_search(args: SearchArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let query = args.query.trim();
    if query.is_empty() {
        anyhow::bail!("search query cannot be empty");
    }

    let identifier = match (args.id, args.document) {
        (Some(id), _) => id,
        (None, Some(path)) => document_identifier(&path),
        (None, None) => anyhow::bail!("either --document or --id is required"),
    };

    let limit = args.limit.unwrap_or(DEFAULT_LIMIT);
    if limit == 0 {
        anyhow::bail!("limit must be at least 1");
    }

    let config = Config::load()?;
    let formatter = get_formatter(format);
    let start_time = Instant::now();

    if verbose {
        eprintln!("Query: \"{query}\"");
        eprintln!("  Document: {identifier}");
        eprintln!("  Limit: {limit}");
    }

    let context = AppContext::initialize(&config)
        .await
        .context("failed to initialize services")?;

    let hits = context
        .retriever
        .retrieve(query, &identifier, limit)
        .await
        .context("search failed")?;
    context.shutdown();

    if verbose {
        eprintln!("Timing: {}ms", start_time.elapsed().as_millis());
        eprintln!();
    }

    let duration_ms = start_time.elapsed().as_millis() as u64;
    let results = SearchResults::new(query.to_string(), identifier, hits, duration_ms);
    print!("{}", formatter.format_search_results(&results));

    Ok(())
}
