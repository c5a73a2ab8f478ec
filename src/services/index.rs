//! Embedding index: text in, vectors stored, payloads out.

use std::sync::Arc;

use crate::error::{IndexError, VectorStoreError};
use crate::models::{Chunk, IndexEntry, SearchHit};
use crate::services::embedding::Embedder;
use crate::services::vector_store::{CollectionInfo, VectorStore};

/// Pairs an embedding backend with a vector store.
///
/// The index never deduplicates: every upsert writes fresh entries, and the
/// only way to remove them is [`EmbeddingIndex::delete_document`].
#[derive(Clone)]
pub struct EmbeddingIndex {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl EmbeddingIndex {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    pub async fn ensure_ready(&self) -> Result<(), IndexError> {
        self.store.ensure_ready().await?;
        Ok(())
    }

    /// Embed and store `chunks`. Each stored payload carries the chunk text and
    /// its document identifier on top of `metadata`.
    pub async fn upsert(
        &self,
        chunks: &[Chunk],
        metadata: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<usize, IndexError> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_documents(&texts).await?;

        if vectors.len() != chunks.len() {
            return Err(IndexError::EmbeddingCountMismatch {
                expected: chunks.len(),
                actual: vectors.len(),
            });
        }

        let expected = self.embedder.dimension();
        if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
            return Err(VectorStoreError::DimensionMismatch {
                expected: expected as u64,
                actual: bad.len(),
            }
            .into());
        }

        let ingested_at = chrono::Utc::now().to_rfc3339();
        let entries: Vec<IndexEntry> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry {
                id: chunk.id.clone(),
                vector,
                payload: chunk.payload(metadata, &ingested_at),
            })
            .collect();

        let count = entries.len();
        self.store.upsert(entries).await?;
        tracing::debug!(count, collection = self.store.collection(), "upserted entries");
        Ok(count)
    }

    /// Nearest stored chunks to `query`, best first. An empty collection or a
    /// filter that matches nothing yields an empty list.
    pub async fn search(
        &self,
        query: &str,
        limit: u64,
        document_identifier: Option<&str>,
    ) -> Result<Vec<SearchHit>, IndexError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let vector = self.embedder.embed_query(query).await?;
        Ok(self.store.search(vector, limit, document_identifier).await?)
    }

    pub async fn delete_document(&self, document_identifier: &str) -> Result<(), IndexError> {
        self.store.delete_document(document_identifier).await?;
        tracing::debug!(document = document_identifier, "deleted document entries");
        Ok(())
    }

    pub async fn stats(&self) -> Result<Option<CollectionInfo>, IndexError> {
        Ok(self.store.collection_info().await?)
    }

    pub async fn health_check(&self) -> Result<bool, IndexError> {
        Ok(self.store.health_check().await?)
    }

    pub fn collection(&self) -> &str {
        self.store.collection()
    }

    pub fn embedder_name(&self) -> &str {
        self.embedder.name()
    }

    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DOCUMENT_FIELD;
    use crate::test_support::{FailingEmbedder, HashEmbedder, memory_index};

    fn chunks(doc: &str, texts: &[&str]) -> Vec<Chunk> {
        texts.iter().map(|t| Chunk::new(doc, *t)).collect()
    }

    #[tokio::test]
    async fn test_ensure_ready_is_idempotent() {
        let index = memory_index();
        index.ensure_ready().await.unwrap();
        index.ensure_ready().await.unwrap();
        let stats = index.stats().await.unwrap().unwrap();
        assert_eq!(stats.points_count, 0);
        assert!(stats.has_document_index);
    }

    #[tokio::test]
    async fn test_search_filters_by_document() {
        let index = memory_index();
        index.ensure_ready().await.unwrap();
        let meta = serde_json::Map::new();
        index
            .upsert(&chunks("bio", &["cell membranes regulate transport"]), &meta)
            .await
            .unwrap();
        index
            .upsert(&chunks("chem", &["cell membranes regulate transport"]), &meta)
            .await
            .unwrap();

        let hits = index
            .search("cell membranes", 10, Some("chem"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document_identifier, "chem");

        let all = index.search("cell membranes", 10, None).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_metadata_cannot_override_identifier() {
        let index = memory_index();
        index.ensure_ready().await.unwrap();
        let mut meta = serde_json::Map::new();
        meta.insert(DOCUMENT_FIELD.to_string(), "other".into());
        meta.insert("source".to_string(), "bio.pdf".into());

        index
            .upsert(&chunks("bio", &["osmosis moves water across membranes"]), &meta)
            .await
            .unwrap();
        let hits = index.search("osmosis", 5, Some("bio")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata["source"], "bio.pdf");
    }

    #[tokio::test]
    async fn test_empty_collection_returns_nothing() {
        let index = memory_index();
        index.ensure_ready().await.unwrap();
        assert!(index.search("anything", 5, Some("doc")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_upserts_get_fresh_ids() {
        let index = memory_index();
        index.ensure_ready().await.unwrap();
        let meta = serde_json::Map::new();
        let text = ["the same paragraph ingested twice into the index"];
        index.upsert(&chunks("doc", &text), &meta).await.unwrap();
        index.upsert(&chunks("doc", &text), &meta).await.unwrap();
        assert_eq!(index.stats().await.unwrap().unwrap().points_count, 2);

        index.delete_document("doc").await.unwrap();
        assert_eq!(index.stats().await.unwrap().unwrap().points_count, 0);
    }

    #[tokio::test]
    async fn test_embedding_failure_is_an_error() {
        let index = EmbeddingIndex::new(
            Arc::new(FailingEmbedder),
            Arc::new(crate::services::vector_store::MemoryBackend::new("t", 8)),
        );
        index.ensure_ready().await.unwrap();
        let result = index
            .upsert(&chunks("doc", &["text"]), &serde_json::Map::new())
            .await;
        assert!(matches!(result, Err(IndexError::Embedding(_))));
        assert!(index.search("q", 3, None).await.is_err());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_rejected() {
        let index = EmbeddingIndex::new(
            Arc::new(HashEmbedder::new(4)),
            Arc::new(crate::services::vector_store::MemoryBackend::new("t", 8)),
        );
        index.ensure_ready().await.unwrap();
        let result = index
            .upsert(&chunks("doc", &["text"]), &serde_json::Map::new())
            .await;
        assert!(matches!(
            result,
            Err(IndexError::VectorStore(VectorStoreError::DimensionMismatch { .. }))
        ));
    }
}
