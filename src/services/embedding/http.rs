//! Remote embeddings from a text-embeddings server (`POST /embed`).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Embedder;
use crate::error::EmbeddingError;
use crate::models::EmbeddingConfig;

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a [String],
    truncate: bool,
}

#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct EmbedResponse {
    vectors: Vec<Vec<f32>>,
}

/// Sends texts in batches of `embedding.batch_size` and checks that every
/// batch comes back with one vector per input.
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    client: Client,
    endpoint: String,
    batch_size: usize,
    dimension: usize,
}

impl HttpEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/embed", config.url.trim_end_matches('/')),
            batch_size: (config.batch_size as usize).max(1),
            dimension: config.dimension as usize,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&EmbedRequest {
                inputs: texts,
                truncate: true,
            })
            .send()
            .await
            .map_err(|e| match e {
                e if e.is_timeout() => EmbeddingError::Timeout,
                e if e.is_connect() => EmbeddingError::ConnectionError(e.to_string()),
                e => EmbeddingError::RequestError(e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ServerError(format!("status {}: {}", status, body)));
        }

        let EmbedResponse { vectors } = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        if vectors.len() != texts.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} vectors, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for (i, batch) in texts.chunks(self.batch_size).enumerate() {
            tracing::debug!(batch = i, size = batch.len(), "embedding batch");
            vectors.extend(self.embed_batch(batch).await?);
        }
        Ok(vectors)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty embedding response".to_string()))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "http"
    }
}
