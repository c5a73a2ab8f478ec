use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use clap::Args;
use std::path::{Path, PathBuf};

use crate::cli::commands::ingest::ingest_file;
use crate::cli::output::get_formatter;
use crate::context::AppContext;
use crate::models::{Config, OutputFormat};
use crate::utils::{document_identifier, sanitize_filename};
use crate::workflows::PlotImage;

#[derive(Debug, Args)]
pub struct ChatArgs {
    /// Document to ask about; ingested on first use
    #[arg(required = true)]
    pub path: PathBuf,

    /// Question to answer
    #[arg(required = true)]
    pub query: String,

    #[arg(long, help = "Identifier the document is stored under")]
    pub id: Option<String>,

    #[arg(long, help = "Directory to write generated plots to as PNG files")]
    pub save_plots: Option<PathBuf>,
}

pub async fn handle_chat(args: ChatArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let query = args.query.trim();
    if query.is_empty() {
        anyhow::bail!("question cannot be empty");
    }

    let identifier = args
        .id
        .clone()
        .unwrap_or_else(|| document_identifier(&args.path));

    let config = Config::load()?;
    let formatter = get_formatter(format);
    let context = AppContext::initialize(&config)
        .await
        .context("failed to initialize services")?;

    let stored = context
        .retriever
        .retrieve(query, &identifier, 1)
        .await
        .context("failed to look up document")?;
    if stored.is_empty() {
        if verbose {
            eprintln!("Ingesting {} as {}", args.path.display(), identifier);
        }
        let report = ingest_file(&context, &args.path, &identifier, false).await?;
        if report.chunks_written == 0 {
            eprintln!("Warning: no usable text found in {}", args.path.display());
        }
    }

    let response = context.chat_workflow().answer(query, &identifier).await;
    context.shutdown();

    if let Some(dir) = args.save_plots.as_deref() {
        for path in save_plots(dir, &response.plots)? {
            eprintln!("Saved plot: {}", path.display());
        }
    }

    print!("{}", formatter.format_chat(&response));
    Ok(())
}

fn save_plots(dir: &Path, plots: &[PlotImage]) -> Result<Vec<PathBuf>> {
    if plots.is_empty() {
        return Ok(Vec::new());
    }
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let mut written = Vec::with_capacity(plots.len());
    for (i, plot) in plots.iter().enumerate() {
        let bytes = STANDARD
            .decode(&plot.image_base64)
            .context("plot image is not valid base64")?;
        let name = sanitize_filename(&plot.function);
        let path = dir.join(format!("plot_{}_{}.png", i + 1, name));
        std::fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_plots_decodes_png() {
        let dir = tempfile::tempdir().unwrap();
        let plots = vec![PlotImage {
            function: "x^2 / 2".to_string(),
            image_base64: STANDARD.encode([0x89, b'P', b'N', b'G']),
        }];

        let written = save_plots(dir.path(), &plots).unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with("plot_1_x^2---2.png"));
        assert_eq!(std::fs::read(&written[0]).unwrap(), vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_save_plots_nothing_to_do() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("plots");
        assert!(save_plots(&target, &[]).unwrap().is_empty());
        assert!(!target.exists());
    }
}
