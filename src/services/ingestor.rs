//! Document ingestion: raw text to stored chunks.

use crate::error::IndexError;
use crate::models::{Chunk, IngestReport};
use crate::services::chunker::TextChunker;
use crate::services::index::EmbeddingIndex;

/// Metadata key recording where a document's text came from.
pub const SOURCE_FIELD: &str = "source";

#[derive(Clone)]
pub struct DocumentIngestor {
    index: EmbeddingIndex,
    chunker: TextChunker,
}

impl DocumentIngestor {
    pub fn new(index: EmbeddingIndex) -> Self {
        Self {
            index,
            chunker: TextChunker::default(),
        }
    }

    /// Chunk `raw_text` and append the surviving chunks under
    /// `document_identifier`. Earlier entries for the same identifier stay.
    pub async fn ingest(
        &self,
        document_identifier: &str,
        raw_text: &str,
        source: Option<&str>,
    ) -> Result<IngestReport, IndexError> {
        let spans = self.chunker.chunk(raw_text);
        let mut report = IngestReport {
            document_identifier: document_identifier.to_string(),
            candidates: self.chunker.candidates(raw_text),
            ..Default::default()
        };

        if spans.is_empty() {
            tracing::debug!(
                document = document_identifier,
                candidates = report.candidates,
                "no chunks long enough to ingest"
            );
            return Ok(report);
        }

        let chunks: Vec<Chunk> = spans
            .into_iter()
            .map(|span| Chunk::new(document_identifier, span))
            .collect();

        let mut metadata = serde_json::Map::new();
        if let Some(source) = source {
            metadata.insert(SOURCE_FIELD.to_string(), source.into());
        }

        report.chunks_written = self.index.upsert(&chunks, &metadata).await?;
        tracing::debug!(
            document = document_identifier,
            written = report.chunks_written,
            dropped = report.chunks_dropped(),
            "ingested document"
        );
        Ok(report)
    }

    /// Remove every stored chunk of `document_identifier`, then ingest afresh.
    pub async fn replace(
        &self,
        document_identifier: &str,
        raw_text: &str,
        source: Option<&str>,
    ) -> Result<IngestReport, IndexError> {
        self.index.delete_document(document_identifier).await?;
        let mut report = self.ingest(document_identifier, raw_text, source).await?;
        report.replaced = true;
        Ok(report)
    }

    pub fn index(&self) -> &EmbeddingIndex {
        &self.index
    }
}
