//! CLI module for edumind.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Study assistant: quizzes, worksheets and document Q&A over your course material.
#[derive(Debug, Parser)]
#[command(name = "edumind")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'f',
        global = true,
        help = "Output format: text, json, or markdown"
    )]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check infrastructure status (embedding model, Qdrant, generation service)
    Status,

    /// Extract, chunk and index documents
    Ingest(commands::IngestArgs),

    /// Remove a document's indexed chunks
    Delete(commands::DeleteArgs),

    /// Search within one ingested document
    Search(commands::SearchArgs),

    /// Generate a quiz from a document
    Quiz(commands::QuizArgs),

    /// Generate a printable worksheet from a document
    Worksheet(commands::WorksheetArgs),

    /// Ask a question about a document
    Chat(commands::ChatArgs),

    /// Score a finished quiz and list weak areas
    Grade(commands::GradeArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}

// FromStr is implemented in models::search

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_quiz_args() {
        let cli = Cli::try_parse_from([
            "edumind", "-f", "json", "quiz", "notes.pdf", "-n", "3", "--difficulty", "hard",
        ])
        .unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Json));
        match cli.command {
            Commands::Quiz(args) => {
                assert_eq!(args.count, Some(3));
                assert_eq!(args.difficulty, Some(crate::models::Difficulty::Hard));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_search_requires_scope() {
        assert!(Cli::try_parse_from(["edumind", "search", "osmosis"]).is_err());
        assert!(Cli::try_parse_from(["edumind", "search", "osmosis", "--id", "bio"]).is_ok());
    }
}
