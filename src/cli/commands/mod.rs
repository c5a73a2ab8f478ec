mod chat;
mod config;
mod delete;
mod grade;
mod ingest;
mod quiz;
mod search;
mod status;

pub use chat::ChatArgs;
pub use config::ConfigCommand;
pub use delete::DeleteArgs;
pub use grade::GradeArgs;
pub use ingest::IngestArgs;
pub use quiz::{QuizArgs, WorksheetArgs};
pub use search::SearchArgs;

pub use chat::handle_chat;
pub use config::handle_config;
pub use delete::handle_delete;
pub use grade::handle_grade;
pub use ingest::handle_ingest;
pub use quiz::{handle_quiz, handle_worksheet};
pub use search::handle_search;
pub use status::handle_status;
