use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

use crate::cli::output::get_formatter;
use crate::context::AppContext;
use crate::models::{Config, Difficulty, OutputFormat, QuizConfig};
use crate::workflows::QuizRequest;

#[derive(Debug, Args)]
pub struct QuizArgs {
    /// Document to generate questions from (PDF, text or markdown)
    #[arg(required = true)]
    pub path: PathBuf,

    #[arg(long, short = 'n', help = "Number of questions")]
    pub count: Option<u32>,

    #[arg(long, short = 'd', help = "Difficulty: easy, medium or hard")]
    pub difficulty: Option<Difficulty>,

    #[arg(long, help = "Time limit in seconds")]
    pub time_limit: Option<u64>,

    #[arg(long, help = "Mix open-response questions in")]
    pub subjective: bool,

    #[arg(long, help = "Identifier to store the document under")]
    pub id: Option<String>,

    #[arg(long, help = "Drop previously ingested chunks of this document first")]
    pub replace: bool,
}

impl QuizArgs {
    fn to_request(&self, defaults: &QuizConfig, fallback_count: u32) -> Result<QuizRequest> {
        let num_questions = self.count.unwrap_or(fallback_count);
        if num_questions == 0 {
            anyhow::bail!("question count must be at least 1");
        }

        let mut request = QuizRequest::new(&self.path);
        request.document_identifier = self.id.clone();
        request.num_questions = num_questions;
        request.difficulty = self.difficulty.unwrap_or(defaults.default_difficulty);
        request.include_subjective = self.subjective;
        request.time_limit_secs = self.time_limit.unwrap_or(defaults.default_time_limit_secs);
        request.replace = self.replace;
        Ok(request)
    }
}

pub async fn handle_quiz(args: QuizArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    if !args.path.is_file() {
        anyhow::bail!("document not found: {}", args.path.display());
    }

    let config = Config::load()?;
    let formatter = get_formatter(format);
    let request = args.to_request(&config.quiz, config.quiz.default_questions)?;

    if verbose {
        eprintln!(
            "Generating {} {} questions from {}",
            request.num_questions,
            request.difficulty,
            request.document_path.display()
        );
    }

    let context = AppContext::initialize(&config)
        .await
        .context("failed to initialize services")?;
    let state = context.quiz_workflow().run(request).await;
    context.shutdown();

    if state.questions.iter().any(|q| q.is_fallback()) {
        eprintln!("Warning: question generation failed; showing placeholder question.");
    }
    print!("{}", formatter.format_quiz(&state));

    Ok(())
}

#[derive(Debug, Args)]
pub struct WorksheetArgs {
    #[command(flatten)]
    pub quiz: QuizArgs,

    #[arg(long, help = "Worksheet title")]
    pub title: Option<String>,

    #[arg(long, short = 'o', help = "Output file (defaults to generated/worksheet_<timestamp>.md)")]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Leave out the answer key")]
    pub no_answer_key: bool,
}

pub async fn handle_worksheet(args: WorksheetArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    if !args.quiz.path.is_file() {
        anyhow::bail!("document not found: {}", args.quiz.path.display());
    }

    let config = Config::load()?;
    let formatter = get_formatter(format);
    let request = args
        .quiz
        .to_request(&config.quiz, config.quiz.worksheet_questions)?;

    let title = args.title.clone().unwrap_or_else(|| {
        let stem = request
            .document_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Document".to_string());
        format!("Practice Worksheet: {}", stem)
    });

    if verbose {
        eprintln!("Generating {} questions for \"{}\"", request.num_questions, title);
    }

    let context = AppContext::initialize(&config)
        .await
        .context("failed to initialize services")?;
    let (path, count) = write_worksheet(
        context,
        request,
        &title,
        !args.no_answer_key,
        args.output.as_deref(),
    )
    .await?;

    println!(
        "{}",
        formatter.format_message(&format!("Wrote {} questions to {}", count, path.display()))
    );

    Ok(())
}

/// Generate the questions and export them. The context is shut down whether
/// or not the export succeeds.
async fn write_worksheet(
    context: AppContext,
    request: QuizRequest,
    title: &str,
    answer_key: bool,
    output: Option<&Path>,
) -> Result<(PathBuf, usize)> {
    let state = context.quiz_workflow().run(request).await;
    let written = context
        .exporter
        .export(title, &state.questions, answer_key, output)
        .context("failed to write worksheet");
    context.shutdown();
    Ok((written?, state.questions.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{CallKind, MemoryBackend, MetricsStore};
    use crate::test_support::{HashEmbedder, ScriptedGenerator, TEST_DIMENSION};
    use std::sync::Arc;

    fn args() -> QuizArgs {
        QuizArgs {
            path: PathBuf::from("notes.pdf"),
            count: None,
            difficulty: None,
            time_limit: None,
            subjective: false,
            id: None,
            replace: false,
        }
    }

    #[test]
    fn test_request_uses_config_defaults() {
        let defaults = QuizConfig::default();
        let request = args().to_request(&defaults, 7).unwrap();
        assert_eq!(request.num_questions, 7);
        assert_eq!(request.difficulty, defaults.default_difficulty);
        assert_eq!(request.time_limit_secs, defaults.default_time_limit_secs);
        assert!(!request.replace);
    }

    #[test]
    fn test_request_overrides() {
        let mut args = args();
        args.count = Some(3);
        args.difficulty = Some(Difficulty::Hard);
        args.subjective = true;
        args.id = Some("bio".to_string());

        let request = args.to_request(&QuizConfig::default(), 5).unwrap();
        assert_eq!(request.num_questions, 3);
        assert_eq!(request.difficulty, Difficulty::Hard);
        assert!(request.include_subjective);
        assert_eq!(request.document_identifier.as_deref(), Some("bio"));
    }

    #[test]
    fn test_zero_questions_rejected() {
        let mut args = args();
        args.count = Some(0);
        assert!(args.to_request(&QuizConfig::default(), 5).is_err());
    }
    async fn worksheet_context(metrics: Arc<MetricsStore>) -> AppContext {
        let context = AppContext::from_parts(
            Arc::new(HashEmbedder::new(TEST_DIMENSION)),
            Arc::new(MemoryBackend::new("worksheet", TEST_DIMENSION as u64)),
            Arc::new(ScriptedGenerator::new(Vec::<String>::new())),
            Some(metrics),
            30,
        );
        context.index.ensure_ready().await.unwrap();
        context
    }

    #[tokio::test]
    async fn test_write_worksheet() {
        let dir = tempfile::tempdir().unwrap();
        let document = dir.path().join("cells.txt");
        std::fs::write(&document, "The cell membrane controls what enters and leaves the cell.").unwrap();
        let output = dir.path().join("out/worksheet.md");

        let metrics = Arc::new(MetricsStore::open_in_memory().unwrap());
        let context = worksheet_context(metrics).await;
        let (path, count) =
            write_worksheet(context, QuizRequest::new(&document), "Cells", true, Some(&output))
                .await
                .unwrap();

        assert_eq!(path, output);
        assert_eq!(count, 1);
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("# Cells"));
    }

    #[tokio::test]
    async fn test_failed_export_still_prunes_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let document = dir.path().join("cells.txt");
        std::fs::write(&document, "The cell membrane controls what enters and leaves the cell.").unwrap();

        let metrics = Arc::new(MetricsStore::open_in_memory().unwrap());
        metrics.record(CallKind::Text, 10, true);
        metrics.backdate(45);
        let context = worksheet_context(metrics.clone()).await;

        // A directory cannot be written as a file.
        let result =
            write_worksheet(context, QuizRequest::new(&document), "Cells", true, Some(dir.path()))
                .await;

        assert!(result.is_err());
        assert_eq!(metrics.get_summary(365).total_calls, 1);
    }
}
