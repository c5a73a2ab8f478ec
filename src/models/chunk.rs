use serde::{Deserialize, Serialize};

/// Payload key holding the chunk text.
pub const TEXT_FIELD: &str = "text";
/// Payload key holding the owning document identifier; keyword-indexed.
pub const DOCUMENT_FIELD: &str = "document_identifier";
pub const CHECKSUM_FIELD: &str = "checksum";
pub const INGESTED_AT_FIELD: &str = "ingested_at";

/// A contiguous span of extracted text owned by one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub document_identifier: String,
    pub text: String,
    pub checksum: String,
}

impl Chunk {
    pub fn new(document_identifier: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            document_identifier: document_identifier.into(),
            checksum: Self::checksum(&text),
            text,
        }
    }

    pub fn checksum(text: &str) -> String {
        use sha2::{Digest, Sha256};
        let hash = Sha256::digest(text.as_bytes());
        hex::encode(hash)
    }

    /// Build the stored payload: caller metadata first, then the reserved fields.
    pub fn payload(
        &self,
        metadata: &serde_json::Map<String, serde_json::Value>,
        ingested_at: &str,
    ) -> serde_json::Map<String, serde_json::Value> {
        let mut payload = metadata.clone();
        payload.insert(TEXT_FIELD.to_string(), self.text.clone().into());
        payload.insert(
            DOCUMENT_FIELD.to_string(),
            self.document_identifier.clone().into(),
        );
        payload.insert(CHECKSUM_FIELD.to_string(), self.checksum.clone().into());
        payload.insert(INGESTED_AT_FIELD.to_string(), ingested_at.into());
        payload
    }
}

/// A chunk with its embedding, ready for the vector store.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: serde_json::Map<String, serde_json::Value>,
}

/// Outcome of one ingestion call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub document_identifier: String,
    pub candidates: usize,
    pub chunks_written: usize,
    pub replaced: bool,
}

impl IngestReport {
    pub fn chunks_dropped(&self) -> usize {
        self.candidates - self.chunks_written
    }
}
