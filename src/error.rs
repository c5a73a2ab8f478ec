//! Error types for the edumind pipeline.

use thiserror::Error;

/// Errors related to embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding server: {0}")]
    ConnectionError(String),

    #[error("embedding server error: {0}")]
    ServerError(String),

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding timeout")]
    Timeout,

    #[error("embedding model not found: {0}")]
    ModelNotFound(String),

    #[error("failed to load embedding model: {0}")]
    LoadError(String),

    #[error("tokenizer error: {0}")]
    TokenizerError(String),

    #[error("inference error: {0}")]
    InferenceError(String),
}

/// Errors related to vector store operations.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("failed to connect to Qdrant: {0}")]
    ConnectionError(String),

    #[error("collection error: {0}")]
    CollectionError(String),

    #[error("payload index error: {0}")]
    IndexError(String),

    #[error("upsert error: {0}")]
    UpsertError(String),

    #[error("search error: {0}")]
    SearchError(String),

    #[error("delete error: {0}")]
    DeleteError(String),

    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: u64, actual: usize },
}

impl VectorStoreError {
    /// Whether the backend rejected a create call because the target already exists.
    pub fn is_already_exists(&self) -> bool {
        let msg = match self {
            VectorStoreError::CollectionError(msg) | VectorStoreError::IndexError(msg) => msg,
            _ => return false,
        };
        let msg = msg.to_lowercase();
        msg.contains("already exists") || msg.contains("alreadyexists")
    }
}

/// Errors raised by the embedding index (embedder + vector store).
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),

    #[error("embedder returned {actual} vectors for {expected} inputs")]
    EmbeddingCountMismatch { expected: usize, actual: usize },
}

/// Errors related to the generation service.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("generation service error: {0}")]
    ServiceError(String),

    #[error("empty response from generation service")]
    EmptyResponse,

    #[error("generation service not configured: {0}")]
    NotConfigured(String),
}

/// Errors related to document text extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("PDF extraction failed: {0}")]
    PdfError(String),

    #[error("unsupported document type: {0}")]
    Unsupported(String),
}

/// Errors raised by auxiliary tools (solver, plotter).
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("evaluation error: {0}")]
    Evaluation(String),

    #[error("render error: {0}")]
    Render(String),
}

/// Errors related to worksheet export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("nothing to export")]
    Empty,
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Application-level errors that wrap domain errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),

    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("export error: {0}")]
    Export(#[from] ExportError),

    #[error("{0}")]
    Other(String),
}
