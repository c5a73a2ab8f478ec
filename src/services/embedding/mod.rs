//! Text embedding backends.
//!
//! The embedding index only sees the [`Embedder`] trait; the concrete backend is
//! picked from configuration by [`create_embedder`].

mod http;
mod onnx;

pub use http::HttpEmbedder;
pub use onnx::OnnxEmbedder;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::EmbeddingError;
use crate::models::{EmbeddingConfig, EmbeddingDriver};

/// Produces fixed-dimension vectors from text.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed document chunks for indexing.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a single search query.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Dimension of the vectors this backend produces.
    fn dimension(&self) -> usize;

    /// Backend name for status output.
    fn name(&self) -> &str;
}

/// Build the configured embedding backend.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    match config.driver {
        EmbeddingDriver::Onnx => {
            let model_dir = config.resolved_model_dir().ok_or_else(|| {
                EmbeddingError::ModelNotFound("could not determine models directory".to_string())
            })?;
            tracing::debug!(model = %config.model_id, dir = %model_dir.display(), "loading ONNX embedder");
            Ok(Arc::new(OnnxEmbedder::load(config, &model_dir)?))
        }
        EmbeddingDriver::Http => Ok(Arc::new(HttpEmbedder::new(config)?)),
    }
}
