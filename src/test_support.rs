//! In-process fakes shared by unit tests.

use std::collections::VecDeque;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{EmbeddingError, ExtractionError, GenerationError, ToolError};
use crate::extract::TextExtractor;
use crate::services::vector_store::MemoryBackend;
use crate::services::{Embedder, EmbeddingIndex, TextGenerator};
use crate::tools::PlotRenderer;

pub const TEST_DIMENSION: usize = 64;

/// Bag-of-words embedder: each lowercase word bumps one hashed bucket.
/// Texts sharing words land close together.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimension];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            vector[(hasher.finish() % self.dimension as u64) as usize] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.embed(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "hash"
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed_documents(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::ConnectionError("embedding service down".to_string()))
    }

    async fn embed_query(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::ConnectionError("embedding service down".to_string()))
    }

    fn dimension(&self) -> usize {
        8
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Index over the hash embedder and an in-memory store. The collection is not
/// created until `ensure_ready` is called.
pub fn memory_index() -> EmbeddingIndex {
    EmbeddingIndex::new(
        Arc::new(HashEmbedder::new(TEST_DIMENSION)),
        Arc::new(MemoryBackend::new("test", TEST_DIMENSION as u64)),
    )
}

/// Replays canned responses in order and records every prompt it receives.
/// Fails once the script is exhausted.
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(GenerationError::EmptyResponse)
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::ServiceError("status 503: unavailable".to_string()))
    }

    fn model(&self) -> &str {
        "failing"
    }
}

/// Returns the same text for every path.
pub struct StaticExtractor {
    text: String,
}

impl StaticExtractor {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl TextExtractor for StaticExtractor {
    fn extract(&self, _path: &Path) -> Result<String, ExtractionError> {
        Ok(self.text.clone())
    }
}

pub struct FailingPlotter;

impl PlotRenderer for FailingPlotter {
    fn render(&self, _function: &str) -> Result<String, ToolError> {
        Err(ToolError::Render("renderer unavailable".to_string()))
    }
}
