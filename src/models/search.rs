//! Search-related models for retrieval queries and hits.

use serde::{Deserialize, Serialize};

use super::chunk::{DOCUMENT_FIELD, TEXT_FIELD};

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// Machine-parseable JSON format
    Json,
    /// Documentation-friendly Markdown format
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// A payload returned from the embedding index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Index entry ID
    pub id: String,

    /// Cosine similarity score
    pub score: f32,

    /// Chunk text
    pub text: String,

    /// Owning document identifier
    pub document_identifier: String,

    /// Remaining payload fields
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl SearchHit {
    /// Split a stored payload into the chunk text, its document identifier and
    /// the remaining caller metadata.
    pub fn from_payload(
        id: String,
        score: f32,
        mut payload: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        let mut take_string = |key: &str| match payload.remove(key) {
            Some(serde_json::Value::String(s)) => s,
            _ => String::new(),
        };
        let text = take_string(TEXT_FIELD);
        let document_identifier = take_string(DOCUMENT_FIELD);

        Self {
            id,
            score,
            text,
            document_identifier,
            metadata: payload,
        }
    }
}

/// Collection of hits for one retrieval query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    pub query: String,
    pub document_identifier: String,
    pub hits: Vec<SearchHit>,
    pub duration_ms: u64,
}

impl SearchResults {
    pub fn new(
        query: String,
        document_identifier: String,
        hits: Vec<SearchHit>,
        duration_ms: u64,
    ) -> Self {
        Self {
            query,
            document_identifier,
            hits,
            duration_ms,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(
            "md".parse::<OutputFormat>().unwrap(),
            OutputFormat::Markdown
        );
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_hit_from_payload() {
        let payload = serde_json::json!({
            "text": "cells divide",
            "document_identifier": "bio",
            "source": "bio.pdf"
        });
        let serde_json::Value::Object(map) = payload else {
            unreachable!()
        };
        let hit = SearchHit::from_payload("id-1".to_string(), 0.9, map);
        assert_eq!(hit.text, "cells divide");
        assert_eq!(hit.document_identifier, "bio");
        assert_eq!(hit.metadata.len(), 1);
        assert_eq!(hit.metadata["source"], "bio.pdf");
    }

    #[test]
    fn test_hit_omits_empty_metadata() {
        let hit = SearchHit {
            id: "1".to_string(),
            score: 0.5,
            text: "text".to_string(),
            document_identifier: "doc".to_string(),
            metadata: serde_json::Map::new(),
        };
        let json = serde_json::to_value(&hit).unwrap();
        assert!(json.get("metadata").is_none());
    }
}
