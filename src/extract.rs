//! Text extraction from uploaded documents.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ExtractionError;
use crate::utils::DocumentKind;

pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String, ExtractionError>;
}

/// Run `extractor` on the blocking pool so PDF parsing does not stall the
/// async workers.
pub async fn extract_blocking(
    extractor: Arc<dyn TextExtractor>,
    path: PathBuf,
) -> Result<String, ExtractionError> {
    tokio::task::spawn_blocking(move || extractor.extract(&path))
        .await
        .map_err(|e| ExtractionError::PdfError(e.to_string()))?
}

/// Reads PDFs through `pdf-extract` and plain text or markdown directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileExtractor;

impl FileExtractor {
    /// pdf-extract panics on some malformed files; a bad upload surfaces as an
    /// error instead.
    fn extract_pdf(data: &[u8]) -> Result<String, ExtractionError> {
        match panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(data))) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(ExtractionError::PdfError(e.to_string())),
            Err(_) => Err(ExtractionError::PdfError(
                "PDF parser crashed on this file".to_string(),
            )),
        }
    }
}

impl TextExtractor for FileExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        match DocumentKind::from_path(path) {
            Some(DocumentKind::Pdf) => Self::extract_pdf(&std::fs::read(path)?),
            Some(DocumentKind::Text) => Ok(std::fs::read_to_string(path)?),
            None => Err(ExtractionError::Unsupported(path.display().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "# Cells\n\nThe cell is the unit of life.").unwrap();
        let text = FileExtractor.extract(&path).unwrap();
        assert!(text.contains("unit of life"));
    }

    #[test]
    fn test_unsupported_extension() {
        let result = FileExtractor.extract(Path::new("slides.pptx"));
        assert!(matches!(result, Err(ExtractionError::Unsupported(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = FileExtractor.extract(Path::new("/definitely/missing.txt"));
        assert!(matches!(result, Err(ExtractionError::IoError(_))));
    }

    #[tokio::test]
    async fn test_extract_blocking() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "Osmosis moves water across membranes.").unwrap();

        let extractor: Arc<dyn TextExtractor> = Arc::new(FileExtractor);
        let text = extract_blocking(Arc::clone(&extractor), path).await.unwrap();
        assert!(text.contains("Osmosis"));

        let missing = extract_blocking(extractor, dir.path().join("gone.txt")).await;
        assert!(matches!(missing, Err(ExtractionError::IoError(_))));
    }

    #[test]
    fn test_invalid_pdf_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();
        assert!(FileExtractor.extract(&path).is_err());
    }
}
