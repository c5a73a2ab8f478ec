//! Gemini `generateContent` client.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::TextGenerator;
use crate::error::GenerationError;
use crate::models::GenerationConfig;

pub struct GeminiGenerator {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_output_tokens: u32,
}

impl GeminiGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(serde::Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: RequestConfig,
}

#[derive(serde::Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(serde::Serialize)]
struct Part {
    text: String,
}

#[derive(serde::Serialize)]
struct RequestConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(serde::Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(serde::Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(serde::Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(serde::Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate.
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        if text.is_empty() { None } else { Some(text) }
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            GenerationError::NotConfigured("GEMINI_API_KEY is not set".to_string())
        })?;

        let request = GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: RequestConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::ServiceError(format!(
                "status {}: {}",
                status, body
            )));
        }

        let body: GenerateResponse = response.json().await?;
        body.into_text().ok_or(GenerationError::EmptyResponse)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let config = GenerationConfig {
            url: "https://example.test/v1beta/".to_string(),
            model: "gemini-test".to_string(),
            ..Default::default()
        };
        let generator = GeminiGenerator::new(&config).unwrap();
        assert_eq!(
            generator.endpoint(),
            "https://example.test/v1beta/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn test_response_text_joins_parts() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"world"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(body.into_text().as_deref(), Some("Hello world"));
    }

    #[test]
    fn test_blocked_response_has_no_text() {
        let body: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert!(body.into_text().is_none());
        let empty: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.into_text().is_none());
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let config = GenerationConfig {
            api_key: Some(String::new()),
            ..Default::default()
        };
        let generator = GeminiGenerator::new(&config).unwrap();
        assert!(!generator.is_configured());
        let result = generator.generate("hi").await;
        assert!(matches!(result, Err(GenerationError::NotConfigured(_))));
    }
}
