//! Document-scoped retrieval.

use crate::error::IndexError;
use crate::models::SearchHit;
use crate::services::index::EmbeddingIndex;

#[derive(Clone)]
pub struct Retriever {
    index: EmbeddingIndex,
}

impl Retriever {
    pub fn new(index: EmbeddingIndex) -> Self {
        Self { index }
    }

    /// Top `limit` chunks of one document. Retrieval is always scoped to a
    /// single identifier.
    pub async fn retrieve(
        &self,
        query: &str,
        document_identifier: &str,
        limit: u64,
    ) -> Result<Vec<SearchHit>, IndexError> {
        self.index
            .search(query, limit, Some(document_identifier))
            .await
    }

    /// Retrieved chunk texts joined by newlines, or `marker` when nothing
    /// matched or the lookup failed.
    pub async fn context(
        &self,
        query: &str,
        document_identifier: &str,
        limit: u64,
        marker: &str,
    ) -> String {
        match self.retrieve(query, document_identifier, limit).await {
            Ok(hits) if !hits.is_empty() => hits
                .iter()
                .map(|h| h.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            Ok(_) => marker.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, document = document_identifier, "retrieval failed");
                marker.to_string()
            }
        }
    }
}
