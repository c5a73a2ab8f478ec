//! In-process vector store.
//!
//! Keeps entries in memory behind a lock and answers searches by brute-force
//! cosine similarity. Nothing is persisted.

use async_trait::async_trait;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{CollectionInfo, ReadyStep, VectorStore};
use crate::error::VectorStoreError;
use crate::models::{DOCUMENT_FIELD, IndexEntry, SearchHit};

pub struct MemoryBackend {
    collection: String,
    dimension: u64,
    entries: RwLock<Option<Vec<IndexEntry>>>,
    document_index: AtomicBool,
}

impl MemoryBackend {
    pub fn new(collection: &str, dimension: u64) -> Self {
        Self {
            collection: collection.to_string(),
            dimension,
            entries: RwLock::new(None),
            document_index: AtomicBool::new(false),
        }
    }

    /// An existing, empty collection that has no document identifier index.
    #[cfg(test)]
    pub(crate) fn without_document_index(collection: &str, dimension: u64) -> Self {
        Self {
            entries: RwLock::new(Some(Vec::new())),
            ..Self::new(collection, dimension)
        }
    }

    fn info(&self, entries: &Option<Vec<IndexEntry>>) -> Option<CollectionInfo> {
        entries.as_ref().map(|e| CollectionInfo {
            points_count: e.len() as u64,
            has_document_index: self.document_index.load(Ordering::Acquire),
        })
    }

    fn poisoned(what: &str) -> VectorStoreError {
        VectorStoreError::ConnectionError(format!("{} lock poisoned", what))
    }

    fn missing(&self) -> String {
        format!("collection {} not found", self.collection)
    }
}

#[async_trait]
impl VectorStore for MemoryBackend {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        Ok(true)
    }

    async fn collection_info(&self) -> Result<Option<CollectionInfo>, VectorStoreError> {
        let entries = self.entries.read().map_err(|_| Self::poisoned("read"))?;
        Ok(self.info(&entries))
    }

    async fn ensure_ready(&self) -> Result<(), VectorStoreError> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned("write"))?;
        match ReadyStep::plan(self.info(&entries).as_ref()) {
            ReadyStep::Nothing => {}
            ReadyStep::CreateIndex => self.document_index.store(true, Ordering::Release),
            ReadyStep::CreateCollectionAndIndex => {
                *entries = Some(Vec::new());
                self.document_index.store(true, Ordering::Release);
            }
        }
        Ok(())
    }

    async fn upsert(&self, new_entries: Vec<IndexEntry>) -> Result<(), VectorStoreError> {
        if let Some(bad) = new_entries
            .iter()
            .find(|e| e.vector.len() as u64 != self.dimension)
        {
            return Err(VectorStoreError::DimensionMismatch {
                expected: self.dimension,
                actual: bad.vector.len(),
            });
        }

        let mut guard = self.entries.write().map_err(|_| Self::poisoned("write"))?;
        let entries = guard
            .as_mut()
            .ok_or_else(|| VectorStoreError::UpsertError(self.missing()))?;

        for entry in new_entries {
            match entries.iter_mut().find(|e| e.id == entry.id) {
                Some(existing) => *existing = entry,
                None => entries.push(entry),
            }
        }
        Ok(())
    }

    async fn search(
        &self,
        vector: Vec<f32>,
        limit: u64,
        document_identifier: Option<&str>,
    ) -> Result<Vec<SearchHit>, VectorStoreError> {
        if vector.len() as u64 != self.dimension {
            return Err(VectorStoreError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        let guard = self.entries.read().map_err(|_| Self::poisoned("read"))?;
        let entries = guard
            .as_ref()
            .ok_or_else(|| VectorStoreError::SearchError(self.missing()))?;

        let mut scored: Vec<(f32, &IndexEntry)> = entries
            .iter()
            .filter(|e| match document_identifier {
                Some(id) => e.payload.get(DOCUMENT_FIELD).and_then(|v| v.as_str()) == Some(id),
                None => true,
            })
            .map(|e| (cosine_similarity(&vector, &e.vector), e))
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(limit as usize)
            .map(|(score, e)| SearchHit::from_payload(e.id.clone(), score, e.payload.clone()))
            .collect())
    }

    async fn delete_document(&self, document_identifier: &str) -> Result<(), VectorStoreError> {
        let mut guard = self.entries.write().map_err(|_| Self::poisoned("write"))?;
        if let Some(entries) = guard.as_mut() {
            entries.retain(|e| {
                e.payload.get(DOCUMENT_FIELD).and_then(|v| v.as_str()) != Some(document_identifier)
            });
        }
        Ok(())
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TEXT_FIELD;

    fn entry(id: &str, doc: &str, vector: Vec<f32>) -> IndexEntry {
        let mut payload = serde_json::Map::new();
        payload.insert(TEXT_FIELD.to_string(), format!("text {}", id).into());
        payload.insert(DOCUMENT_FIELD.to_string(), doc.into());
        IndexEntry {
            id: id.to_string(),
            vector,
            payload,
        }
    }

    async fn ready_backend() -> MemoryBackend {
        let backend = MemoryBackend::new("test", 2);
        backend.ensure_ready().await.unwrap();
        backend
    }

    #[tokio::test]
    async fn test_search_orders_by_similarity() {
        let backend = ready_backend().await;
        backend
            .upsert(vec![
                entry("a", "doc", vec![1.0, 0.0]),
                entry("b", "doc", vec![0.0, 1.0]),
                entry("c", "doc", vec![0.7, 0.7]),
            ])
            .await
            .unwrap();

        let hits = backend.search(vec![1.0, 0.1], 2, None).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(hits[0].text, "text a");
    }

    #[tokio::test]
    async fn test_filter_and_delete_by_document() {
        let backend = ready_backend().await;
        backend
            .upsert(vec![
                entry("a", "doc-1", vec![1.0, 0.0]),
                entry("b", "doc-2", vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let hits = backend.search(vec![1.0, 0.0], 10, Some("doc-2")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document_identifier, "doc-2");

        backend.delete_document("doc-2").await.unwrap();
        assert!(backend.search(vec![1.0, 0.0], 10, Some("doc-2")).await.unwrap().is_empty());
        assert_eq!(backend.collection_info().await.unwrap().unwrap().points_count, 1);
    }

    #[tokio::test]
    async fn test_dimension_mismatch() {
        let backend = ready_backend().await;
        let result = backend.upsert(vec![entry("a", "doc", vec![1.0; 3])]).await;
        assert!(matches!(
            result,
            Err(VectorStoreError::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }

    #[tokio::test]
    async fn test_missing_collection_errors() {
        let backend = MemoryBackend::new("test", 2);
        assert!(backend.search(vec![1.0, 0.0], 1, None).await.is_err());
        backend.ensure_ready().await.unwrap();
        backend.ensure_ready().await.unwrap();
        assert!(backend.search(vec![1.0, 0.0], 1, None).await.unwrap().is_empty());
        assert!(backend.collection_info().await.unwrap().unwrap().has_document_index);
    }

    #[tokio::test]
    async fn test_ensure_ready_adds_missing_index_only() {
        let backend = MemoryBackend::without_document_index("test", 2);
        backend.upsert(vec![entry("a", "doc", vec![1.0, 0.0])]).await.unwrap();

        let before = backend.collection_info().await.unwrap().unwrap();
        assert!(!before.has_document_index);

        backend.ensure_ready().await.unwrap();
        let after = backend.collection_info().await.unwrap().unwrap();
        assert!(after.has_document_index);
        assert_eq!(after.points_count, 1);
    }
}
