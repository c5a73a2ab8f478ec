//! File utilities for ingestion.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Document formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Text,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "txt" | "md" | "markdown" | "rst" | "text" => Some(DocumentKind::Text),
            _ => None,
        }
    }
}

/// Identifier under which a document's chunks are stored.
///
/// The canonical path when the file exists, so the same file ingested from
/// different working directories maps to one identifier.
pub fn document_identifier(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .to_string()
}

/// Value stored in the `source` metadata field: the file name, falling back
/// to the full path when there is none.
pub fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// Supported documents under `root` (or `root` itself when it is a file),
/// skipping hidden directories, sorted by path.
pub fn collect_documents(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return if DocumentKind::from_path(root).is_some() {
            vec![root.to_path_buf()]
        } else {
            Vec::new()
        };
    }

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| DocumentKind::from_path(p).is_some())
        .collect();
    files.sort();
    files
}

/// Sanitize a filename by replacing invalid characters.
///
/// Replaces characters that are not allowed in filenames on common operating
/// systems (Windows, macOS, Linux) with hyphens.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | ' ' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect::<String>()
        .trim_matches('-')
        .to_string()
}
