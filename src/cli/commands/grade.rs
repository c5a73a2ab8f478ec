use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

use crate::cli::output::get_formatter;
use crate::models::{OutputFormat, QuizReport, QuizResult};

#[derive(Debug, Args)]
pub struct GradeArgs {
    /// JSON file holding an array of answered questions
    #[arg(required = true)]
    pub results: PathBuf,
}

pub async fn handle_grade(args: GradeArgs, format: OutputFormat, _verbose: bool) -> Result<()> {
    let formatter = get_formatter(format);
    let results = read_results(&args.results)?;
    let report = QuizReport::from_results(&results);
    print!("{}", formatter.format_report(&report));
    Ok(())
}

fn read_results(path: &Path) -> Result<Vec<QuizResult>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let results = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of quiz results", path.display()))?;
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_results() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        std::fs::write(
            &path,
            r#"[{"question_id": 1, "correct": true, "time_taken": 12},
                {"question_id": 2, "is_correct": false, "topic": "Cells", "time_taken": 30}]"#,
        )
        .unwrap();

        let results = read_results(&path).unwrap();
        let report = QuizReport::from_results(&results);
        assert_eq!(report.correct, 1);
        assert_eq!(report.total, 2);
        assert_eq!(report.time_taken, 42);
        assert_eq!(report.weak_areas[0].topic, "Cells");
    }

    #[test]
    fn test_read_results_rejects_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        std::fs::write(&path, r#"{"correct": true}"#).unwrap();
        assert!(read_results(&path).is_err());
    }
}
