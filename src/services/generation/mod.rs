//! Text generation.
//!
//! [`GenerationClient`] is the only entry point the workflows use. It never
//! returns an error: failed free-text calls become a fixed apology and failed
//! structured calls become `None`.

mod gemini;

pub use gemini::GeminiGenerator;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::error::GenerationError;
use crate::services::metrics::{CallKind, MetricsStore};

/// Returned by [`GenerationClient::generate_text`] when the service fails.
pub const APOLOGY: &str = "I'm sorry, I encountered an error generating the response.";

const JSON_INSTRUCTION: &str =
    "Return the result as a valid JSON object. Do not include markdown formatting like ```json.";

/// A hosted language model.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    fn model(&self) -> &str;
}

#[derive(Clone)]
pub struct GenerationClient {
    generator: Arc<dyn TextGenerator>,
    metrics: Option<Arc<MetricsStore>>,
}

impl GenerationClient {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsStore>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn model(&self) -> &str {
        self.generator.model()
    }

    async fn call(&self, kind: CallKind, prompt: &str) -> Result<String, GenerationError> {
        let start = Instant::now();
        let result = self.generator.generate(prompt).await;
        if let Some(metrics) = &self.metrics {
            metrics.record(kind, start.elapsed().as_millis() as u64, result.is_ok());
        }
        result
    }

    pub async fn generate_text(&self, prompt: &str) -> String {
        match self.call(CallKind::Text, prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "text generation failed");
                APOLOGY.to_string()
            }
        }
    }

    /// Ask for bare JSON and parse it. `None` on service failure or when the
    /// response is not valid JSON.
    pub async fn generate_structured(&self, prompt: &str) -> Option<serde_json::Value> {
        let prompt = format!("{}\n\n{}", prompt, JSON_INSTRUCTION);
        let raw = match self.call(CallKind::Structured, &prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "structured generation failed");
                return None;
            }
        };

        match serde_json::from_str(strip_code_fences(&raw)) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(error = %e, "structured response is not valid JSON");
                None
            }
        }
    }
}

/// Remove a leading ```` ``` ````/```` ```json ```` fence and a trailing ```` ``` ````.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = match rest.get(..4) {
            Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
            _ => rest,
        };
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}
