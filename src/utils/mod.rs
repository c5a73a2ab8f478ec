//! Utility modules.

pub mod file;
pub mod text;

pub use file::{DocumentKind, collect_documents, document_identifier, sanitize_filename, source_name};
pub use text::{contains_any, trim_decimal, truncate_chars};
