//! Ingest command implementation.

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::cli::output::{IngestStats, get_formatter};
use crate::context::AppContext;
use crate::extract::extract_blocking;
use crate::models::{Config, IngestReport, OutputFormat};
use crate::utils::{collect_documents, document_identifier, source_name};

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Document or directory of documents to ingest
    #[arg(required = true)]
    pub path: PathBuf,

    /// Identifier to store chunks under (single file only; defaults to the canonical path)
    #[arg(long)]
    pub id: Option<String>,

    /// Delete previously stored chunks of each document first
    #[arg(long)]
    pub replace: bool,

    /// Show what would be ingested without ingesting
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn handle_ingest(args: IngestArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let formatter = get_formatter(format);
    let start_time = Instant::now();

    if !args.path.exists() {
        anyhow::bail!("path does not exist: {}", args.path.display());
    }

    let files = collect_documents(&args.path);
    if files.is_empty() {
        println!("{}", formatter.format_message("No supported documents found."));
        return Ok(());
    }
    if args.id.is_some() && files.len() > 1 {
        anyhow::bail!("--id can only be used when ingesting a single file");
    }

    if verbose {
        eprintln!("Found {} documents to process", files.len());
    }

    if args.dry_run {
        println!(
            "{}",
            formatter.format_message(&format!("Dry run: Would ingest {} files", files.len()))
        );
        for file in &files {
            println!("  {}", file.display());
        }
        return Ok(());
    }

    let config = Config::load()?;
    let context = AppContext::initialize(&config)
        .await
        .context("failed to initialize services")?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut stats = IngestStats {
        files_scanned: files.len() as u64,
        ..Default::default()
    };

    for file in &files {
        pb.inc(1);
        let identifier = args.id.clone().unwrap_or_else(|| document_identifier(file));

        match ingest_file(&context, file, &identifier, args.replace).await {
            Ok(report) => {
                stats.files_ingested += 1;
                stats.chunks_written += report.chunks_written as u64;
                stats.chunks_dropped += report.chunks_dropped() as u64;
                if verbose {
                    pb.println(format!(
                        "{}: {} chunks ({} too short)",
                        identifier,
                        report.chunks_written,
                        report.chunks_dropped()
                    ));
                }
            }
            Err(e) => {
                stats.files_failed += 1;
                pb.println(format!("Skipping {}: {:#}", file.display(), e));
            }
        }
    }

    pb.finish_and_clear();
    context.shutdown();

    stats.duration_ms = start_time.elapsed().as_millis() as u64;
    print!("{}", formatter.format_ingest_stats(&stats));

    Ok(())
}

/// Extract one file and store its chunks under `identifier`.
pub(crate) async fn ingest_file(
    context: &AppContext,
    path: &Path,
    identifier: &str,
    replace: bool,
) -> Result<IngestReport> {
    let text = extract_blocking(Arc::clone(&context.extractor), path.to_path_buf())
        .await
        .with_context(|| format!("failed to extract {}", path.display()))?;
    let source = Some(source_name(path));

    let report = if replace {
        context
            .ingestor
            .replace(identifier, &text, source.as_deref())
            .await?
    } else {
        context
            .ingestor
            .ingest(identifier, &text, source.as_deref())
            .await?
    };
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{MemoryBackend, MetricsStore};
    use crate::test_support::{HashEmbedder, ScriptedGenerator, TEST_DIMENSION};
    use std::sync::Arc;

    fn context() -> AppContext {
        AppContext::from_parts(
            Arc::new(HashEmbedder::new(TEST_DIMENSION)),
            Arc::new(MemoryBackend::new("cli", TEST_DIMENSION as u64)),
            Arc::new(ScriptedGenerator::new(Vec::<String>::new())),
            None::<Arc<MetricsStore>>,
            30,
        )
    }

    #[tokio::test]
    async fn test_ingest_file_append_and_replace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(
            &path,
            "Enzymes lower the activation energy of biochemical reactions.\n\nshort",
        )
        .unwrap();

        let context = context();
        context.index.ensure_ready().await.unwrap();

        let first = ingest_file(&context, &path, "notes", false).await.unwrap();
        assert_eq!(first.chunks_written, 1);
        assert_eq!(first.chunks_dropped(), 1);

        ingest_file(&context, &path, "notes", false).await.unwrap();
        let hits = context.retriever.retrieve("enzymes", "notes", 10).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].metadata["source"], "notes.md");

        let replaced = ingest_file(&context, &path, "notes", true).await.unwrap();
        assert!(replaced.replaced);
        let hits = context.retriever.retrieve("enzymes", "notes", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_ingest_file_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.png");
        std::fs::write(&path, b"not text").unwrap();

        let context = context();
        context.index.ensure_ready().await.unwrap();
        assert!(ingest_file(&context, &path, "img", false).await.is_err());
    }
}
