//! Printable worksheet export.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::error::ExportError;
use crate::models::Question;

pub const DEFAULT_OUTPUT_DIR: &str = "generated";
const INSTRUCTIONS: &str = "Instructions: Answer all questions. Show your work for full credit.";

pub trait WorksheetExporter: Send + Sync {
    /// Write the worksheet and return where it was written.
    fn export(
        &self,
        title: &str,
        questions: &[Question],
        answer_key: bool,
        output: Option<&Path>,
    ) -> Result<PathBuf, ExportError>;
}

/// Writes worksheets as markdown, by default to
/// `generated/worksheet_<timestamp>.md`.
#[derive(Debug, Clone)]
pub struct MarkdownExporter {
    output_dir: PathBuf,
}

impl Default for MarkdownExporter {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_DIR)
    }
}

impl MarkdownExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    fn default_path(&self) -> PathBuf {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        self.output_dir.join(format!("worksheet_{}.md", stamp))
    }
}

impl WorksheetExporter for MarkdownExporter {
    fn export(
        &self,
        title: &str,
        questions: &[Question],
        answer_key: bool,
        output: Option<&Path>,
    ) -> Result<PathBuf, ExportError> {
        if questions.is_empty() {
            return Err(ExportError::Empty);
        }

        let path = output.map_or_else(|| self.default_path(), Path::to_path_buf);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, render_worksheet(title, questions, answer_key))?;
        tracing::debug!(path = %path.display(), count = questions.len(), "wrote worksheet");
        Ok(path)
    }
}

pub fn render_worksheet(title: &str, questions: &[Question], answer_key: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", title);
    let _ = writeln!(out, "_{}_\n", INSTRUCTIONS);

    for (i, q) in questions.iter().enumerate() {
        let _ = writeln!(out, "**Question {}** ({})\n", i + 1, q.difficulty);
        let _ = writeln!(out, "{}\n", q.text);
        match q.options.as_deref() {
            Some(options) if !options.is_empty() => {
                for option in options {
                    let _ = writeln!(out, "○ {}  ", option);
                }
                out.push('\n');
            }
            _ => {
                out.push_str("Answer:\n\n\n\n");
            }
        }
    }

    if answer_key {
        out.push_str("---\n\n## Answer Key\n\n");
        for (i, q) in questions.iter().enumerate() {
            let answer = if q.correct_answer.is_empty() {
                "N/A"
            } else {
                q.correct_answer.as_str()
            };
            let _ = writeln!(out, "**{}.** {}\n", i + 1, answer);
            if !q.explanation.is_empty() {
                let _ = writeln!(out, "_Explanation:_ {}\n", q.explanation);
            }
        }
    }

    out
}
