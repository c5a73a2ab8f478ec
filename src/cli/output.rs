use std::fmt::Write as FmtWrite;

use serde::Serialize;

use crate::models::{OutputFormat, QuestionType, QuizReport, SearchResults};
use crate::services::MetricsSummary;
use crate::utils::truncate_chars;
use crate::workflows::{ChatResponse, QuizState};

const PREVIEW_CHARS: usize = 200;

pub trait Formatter {
    fn format_search_results(&self, results: &SearchResults) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_ingest_stats(&self, stats: &IngestStats) -> String;
    fn format_quiz(&self, quiz: &QuizState) -> String;
    fn format_chat(&self, response: &ChatResponse) -> String;
    fn format_report(&self, report: &QuizReport) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub embedding_backend: String,
    pub embedding_model: String,
    pub embedding_dimension: usize,
    pub vector_store_driver: String,
    pub vector_store_url: String,
    pub vector_store_connected: bool,
    pub collection: String,
    pub collection_exists: bool,
    pub document_index: bool,
    pub points: u64,
    pub generation_model: String,
    pub generation_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsSummary>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestStats {
    pub files_scanned: u64,
    pub files_ingested: u64,
    pub files_failed: u64,
    pub chunks_written: u64,
    pub chunks_dropped: u64,
    pub duration_ms: u64,
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> String {
    let result = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    result.unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

fn preview(text: &str) -> String {
    let short = truncate_chars(text, PREVIEW_CHARS);
    if short.len() < text.len() {
        format!("{}...", short)
    } else {
        short.to_string()
    }
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_search_results(&self, results: &SearchResults) -> String {
        if results.is_empty() {
            return format!(
                "No results found for: {} (document: {})\n",
                results.query, results.document_identifier
            );
        }

        let mut output = String::new();
        writeln!(output, "Search results for: \"{}\"", results.query).unwrap();
        writeln!(output, "Document: {}", results.document_identifier).unwrap();
        writeln!(
            output,
            "Found {} results in {}ms\n",
            results.len(),
            results.duration_ms
        )
        .unwrap();

        for (i, hit) in results.hits.iter().enumerate() {
            writeln!(output, "{}. [Score: {:.3}]", i + 1, hit.score).unwrap();
            writeln!(output, "   ---").unwrap();
            for line in preview(&hit.text).lines() {
                writeln!(output, "   {}", line).unwrap();
            }
            writeln!(output).unwrap();
        }

        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Status").unwrap();
        writeln!(output, "------").unwrap();

        writeln!(output, "Embedding:     {}", status.embedding_backend).unwrap();
        writeln!(output, "  Model:       {}", status.embedding_model).unwrap();
        writeln!(output, "  Dimension:   {}", status.embedding_dimension).unwrap();
        writeln!(output).unwrap();

        let vector_status = if status.vector_store_connected {
            "[CONNECTED]"
        } else {
            "[DISCONNECTED]"
        };
        writeln!(
            output,
            "Vector Store:  {} ({})",
            status.vector_store_driver, vector_status
        )
        .unwrap();
        if status.vector_store_connected {
            writeln!(output, "  URL:         {}", status.vector_store_url).unwrap();
            writeln!(output, "  Collection:  {}", status.collection).unwrap();
            if status.collection_exists {
                let index = if status.document_index { "yes" } else { "missing" };
                writeln!(output, "  Doc index:   {}", index).unwrap();
                writeln!(output, "  Points:      {}", status.points).unwrap();
            } else {
                writeln!(output, "  (collection not created yet)").unwrap();
            }
        }
        writeln!(output).unwrap();

        let generation_status = if status.generation_configured {
            "[CONFIGURED]"
        } else {
            "[NO API KEY]"
        };
        writeln!(
            output,
            "Generation:    {} ({})",
            status.generation_model, generation_status
        )
        .unwrap();
        if let Some(ref m) = status.metrics {
            writeln!(output, "  Calls:       {}", m.total_calls).unwrap();
            writeln!(output, "  Structured:  {}", m.structured_calls).unwrap();
            writeln!(output, "  Avg Latency: {}ms", m.avg_latency_ms).unwrap();
            if m.error_rate > 0.0 {
                writeln!(output, "  Error Rate:  {:.1}%", m.error_rate).unwrap();
            }
        }

        output
    }

    fn format_ingest_stats(&self, stats: &IngestStats) -> String {
        let mut output = String::new();
        writeln!(output, "Ingestion Complete").unwrap();
        writeln!(output, "------------------").unwrap();
        writeln!(output, "Files scanned:  {}", stats.files_scanned).unwrap();
        writeln!(output, "Files ingested: {}", stats.files_ingested).unwrap();
        writeln!(output, "Files failed:   {}", stats.files_failed).unwrap();
        writeln!(output, "Chunks written: {}", stats.chunks_written).unwrap();
        writeln!(output, "Chunks dropped: {}", stats.chunks_dropped).unwrap();
        writeln!(output, "Duration: {}ms", stats.duration_ms).unwrap();
        output
    }

    fn format_quiz(&self, quiz: &QuizState) -> String {
        let mut output = String::new();
        writeln!(output, "Quiz: {}", quiz.document_identifier).unwrap();
        writeln!(
            output,
            "Difficulty: {}, time limit: {}s\n",
            quiz.request.difficulty, quiz.request.time_limit_secs
        )
        .unwrap();

        for question in &quiz.questions {
            writeln!(
                output,
                "{}. [{}] {}",
                question.id, question.question_type, question.text
            )
            .unwrap();
            if let Some(ref options) = question.options {
                for (letter, option) in ('A'..='Z').zip(options) {
                    writeln!(output, "   {}) {}", letter, option).unwrap();
                }
            }
            writeln!(output, "   Answer: {}", question.correct_answer).unwrap();
            if !question.explanation.is_empty() {
                writeln!(output, "   Why: {}", question.explanation).unwrap();
            }
            writeln!(output).unwrap();
        }

        output
    }

    fn format_chat(&self, response: &ChatResponse) -> String {
        let mut output = String::new();
        writeln!(output, "{}", response.answer.trim_end()).unwrap();
        if !response.plots.is_empty() {
            writeln!(output).unwrap();
            for plot in &response.plots {
                writeln!(output, "[plot] {}", plot.function).unwrap();
            }
        }
        output
    }

    fn format_report(&self, report: &QuizReport) -> String {
        let mut output = String::new();
        writeln!(output, "Quiz Report").unwrap();
        writeln!(output, "-----------").unwrap();
        writeln!(
            output,
            "Score: {:.1}% ({}/{})",
            report.score, report.correct, report.total
        )
        .unwrap();
        writeln!(output, "Time: {}s", report.time_taken).unwrap();
        if report.weak_areas.is_empty() {
            writeln!(output, "Weak areas: none").unwrap();
        } else {
            writeln!(output, "Weak areas:").unwrap();
            for area in &report.weak_areas {
                writeln!(output, "  {} ({} mistakes)", area.topic, area.mistakes).unwrap();
            }
        }
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}\n", error)
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl Formatter for JsonFormatter {
    fn format_search_results(&self, results: &SearchResults) -> String {
        to_json(results, self.pretty)
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        to_json(status, self.pretty)
    }

    fn format_ingest_stats(&self, stats: &IngestStats) -> String {
        to_json(stats, self.pretty)
    }

    fn format_quiz(&self, quiz: &QuizState) -> String {
        to_json(quiz, self.pretty)
    }

    fn format_chat(&self, response: &ChatResponse) -> String {
        to_json(response, self.pretty)
    }

    fn format_report(&self, report: &QuizReport) -> String {
        to_json(report, self.pretty)
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({"message": message}).to_string()
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({"error": error}).to_string()
    }
}

pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn format_search_results(&self, results: &SearchResults) -> String {
        if results.is_empty() {
            return format!("## No results found\n\nQuery: `{}`\n", results.query);
        }

        let mut output = String::new();
        writeln!(output, "## Search Results\n").unwrap();
        writeln!(output, "**Query:** `{}`\n", results.query).unwrap();
        writeln!(output, "**Document:** `{}`\n", results.document_identifier).unwrap();

        for (i, hit) in results.hits.iter().enumerate() {
            writeln!(output, "### {}. Score: {:.3}\n", i + 1, hit.score).unwrap();
            writeln!(output, "```").unwrap();
            writeln!(output, "{}", hit.text).unwrap();
            writeln!(output, "```\n").unwrap();
        }

        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "## Status\n").unwrap();

        writeln!(output, "### Embedding ({})\n", status.embedding_backend).unwrap();
        writeln!(output, "- **Model:** {}", status.embedding_model).unwrap();
        writeln!(output, "- **Dimension:** {}\n", status.embedding_dimension).unwrap();

        let vector_status = if status.vector_store_connected {
            "✅"
        } else {
            "❌"
        };
        writeln!(
            output,
            "### Vector Store ({}) {}\n",
            status.vector_store_driver, vector_status
        )
        .unwrap();
        writeln!(output, "- **URL:** `{}`", status.vector_store_url).unwrap();
        writeln!(output, "- **Collection:** {}", status.collection).unwrap();
        writeln!(output, "- **Document index:** {}", status.document_index).unwrap();
        writeln!(output, "- **Points:** {}\n", status.points).unwrap();

        let generation_status = if status.generation_configured {
            "✅"
        } else {
            "❌"
        };
        writeln!(output, "### Generation {}\n", generation_status).unwrap();
        writeln!(output, "- **Model:** {}", status.generation_model).unwrap();
        if let Some(ref m) = status.metrics {
            writeln!(output, "- **Calls:** {}", m.total_calls).unwrap();
            writeln!(output, "- **Avg Latency:** {}ms", m.avg_latency_ms).unwrap();
            if m.error_rate > 0.0 {
                writeln!(output, "- **Error Rate:** {:.1}%", m.error_rate).unwrap();
            }
        }

        output
    }

    fn format_ingest_stats(&self, stats: &IngestStats) -> String {
        let mut output = String::new();
        writeln!(output, "## Ingestion Complete\n").unwrap();
        writeln!(output, "| Metric | Value |").unwrap();
        writeln!(output, "|--------|-------|").unwrap();
        writeln!(output, "| Files scanned | {} |", stats.files_scanned).unwrap();
        writeln!(output, "| Files ingested | {} |", stats.files_ingested).unwrap();
        writeln!(output, "| Files failed | {} |", stats.files_failed).unwrap();
        writeln!(output, "| Chunks written | {} |", stats.chunks_written).unwrap();
        writeln!(output, "| Chunks dropped | {} |", stats.chunks_dropped).unwrap();
        writeln!(output, "| Duration | {}ms |", stats.duration_ms).unwrap();
        output
    }

    fn format_quiz(&self, quiz: &QuizState) -> String {
        let mut output = String::new();
        writeln!(output, "## Quiz\n").unwrap();
        writeln!(output, "**Document:** `{}`\n", quiz.document_identifier).unwrap();

        for question in &quiz.questions {
            writeln!(output, "### Question {} ({})\n", question.id, question.difficulty).unwrap();
            writeln!(output, "{}\n", question.text).unwrap();
            if question.question_type == QuestionType::Mcq
                && let Some(ref options) = question.options
            {
                for option in options {
                    writeln!(output, "- {}", option).unwrap();
                }
                writeln!(output).unwrap();
            }
            writeln!(output, "**Answer:** {}\n", question.correct_answer).unwrap();
        }

        output
    }

    fn format_chat(&self, response: &ChatResponse) -> String {
        let mut output = String::new();
        writeln!(output, "{}", response.answer.trim_end()).unwrap();
        for plot in &response.plots {
            writeln!(
                output,
                "\n![{}](data:image/png;base64,{})",
                plot.function, plot.image_base64
            )
            .unwrap();
        }
        output
    }

    fn format_report(&self, report: &QuizReport) -> String {
        let mut output = String::new();
        writeln!(output, "## Quiz Report\n").unwrap();
        writeln!(output, "| Metric | Value |").unwrap();
        writeln!(output, "|--------|-------|").unwrap();
        writeln!(output, "| Score | {:.1}% |", report.score).unwrap();
        writeln!(output, "| Correct | {}/{} |", report.correct, report.total).unwrap();
        writeln!(output, "| Time | {}s |", report.time_taken).unwrap();
        if !report.weak_areas.is_empty() {
            writeln!(output, "\n### Weak Areas\n").unwrap();
            for area in &report.weak_areas {
                writeln!(output, "- **{}**: {} mistakes", area.topic, area.mistakes).unwrap();
            }
        }
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("> {}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("> ⚠️ **Error:** {}\n", error)
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QuizResult, SearchHit};

    fn hit(text: &str) -> SearchHit {
        SearchHit {
            id: "1".to_string(),
            score: 0.91,
            text: text.to_string(),
            document_identifier: "doc".to_string(),
            metadata: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_text_search_preview_truncates() {
        let long = "a".repeat(300);
        let results = SearchResults::new("q".into(), "doc".into(), vec![hit(&long)], 3);
        let output = TextFormatter.format_search_results(&results);
        assert!(output.contains("[Score: 0.910]"));
        assert!(output.contains(&format!("{}...", "a".repeat(200))));
        assert!(!output.contains(&"a".repeat(201)));
    }

    #[test]
    fn test_empty_search_results() {
        let results = SearchResults::new("q".into(), "doc".into(), Vec::new(), 1);
        assert!(TextFormatter.format_search_results(&results).starts_with("No results"));
        assert!(MarkdownFormatter.format_search_results(&results).contains("No results"));
    }

    #[test]
    fn test_report_formats() {
        let report = QuizReport::from_results(&[
            QuizResult {
                is_correct: Some(true),
                ..Default::default()
            },
            QuizResult {
                is_correct: Some(false),
                topic: Some("Cells".to_string()),
                ..Default::default()
            },
        ]);

        let text = TextFormatter.format_report(&report);
        assert!(text.contains("Score: 50.0% (1/2)"));
        assert!(text.contains("Cells (1 mistakes)"));

        let json: serde_json::Value =
            serde_json::from_str(&JsonFormatter::new(false).format_report(&report)).unwrap();
        assert_eq!(json["correct"], 1);
        assert_eq!(json["weak_areas"][0]["topic"], "Cells");
    }

    #[test]
    fn test_json_message_and_error() {
        let formatter = JsonFormatter::new(false);
        assert_eq!(formatter.format_message("ok"), r#"{"message":"ok"}"#);
        assert_eq!(formatter.format_error("bad"), r#"{"error":"bad"}"#);
    }
}
