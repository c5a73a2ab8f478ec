//! Vector store abstraction layer.
//!
//! Backends are selected by [`VectorDriver`]: Qdrant for real deployments and an
//! in-process store for local experiments and tests.

mod memory;
mod qdrant;

pub use memory::MemoryBackend;
pub use qdrant::QdrantBackend;

use async_trait::async_trait;

use crate::error::VectorStoreError;
use crate::models::{IndexEntry, SearchHit, VectorDriver, VectorStoreConfig};

/// Collection information
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionInfo {
    pub points_count: u64,
    /// Whether the keyword index on the document identifier is present.
    pub has_document_index: bool,
}

/// What `ensure_ready` still has to create for a collection in a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyStep {
    Nothing,
    CreateIndex,
    CreateCollectionAndIndex,
}

impl ReadyStep {
    pub fn plan(info: Option<&CollectionInfo>) -> Self {
        match info {
            Some(info) if info.has_document_index => ReadyStep::Nothing,
            Some(_) => ReadyStep::CreateIndex,
            None => ReadyStep::CreateCollectionAndIndex,
        }
    }
}

/// Abstract trait for vector store operations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Check if the vector store is reachable.
    async fn health_check(&self) -> Result<bool, VectorStoreError>;

    /// Returns None if the collection doesn't exist.
    async fn collection_info(&self) -> Result<Option<CollectionInfo>, VectorStoreError>;

    /// Create the collection and the document identifier index if either is
    /// missing. Safe to call repeatedly and from concurrent processes.
    async fn ensure_ready(&self) -> Result<(), VectorStoreError>;

    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<(), VectorStoreError>;

    /// Cosine nearest neighbours, best first, optionally restricted to one
    /// document identifier.
    async fn search(
        &self,
        vector: Vec<f32>,
        limit: u64,
        document_identifier: Option<&str>,
    ) -> Result<Vec<SearchHit>, VectorStoreError>;

    /// Delete every entry belonging to one document identifier.
    async fn delete_document(&self, document_identifier: &str) -> Result<(), VectorStoreError>;

    fn collection(&self) -> &str;
}

/// Create a vector store backend for vectors of the given dimension.
pub fn create_backend(
    config: &VectorStoreConfig,
    dimension: u64,
) -> Result<Box<dyn VectorStore>, VectorStoreError> {
    match config.driver {
        VectorDriver::Qdrant => Ok(Box::new(QdrantBackend::new(config, dimension)?)),
        VectorDriver::Memory => Ok(Box::new(MemoryBackend::new(&config.collection, dimension))),
    }
}
