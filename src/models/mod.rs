mod chunk;
mod config;
mod question;
mod report;
mod search;

pub use chunk::{
    CHECKSUM_FIELD, Chunk, DOCUMENT_FIELD, INGESTED_AT_FIELD, IndexEntry, IngestReport, TEXT_FIELD,
};
pub use config::{
    Config, DEFAULT_COLLECTION, DEFAULT_EMBEDDING_DIMENSION, DEFAULT_EMBEDDING_MODEL,
    DEFAULT_GENERATION_MODEL, DEFAULT_QDRANT_URL, EmbeddingConfig, EmbeddingDriver,
    GenerationConfig, MetricsConfig, OutputConfig, QuizConfig, VectorDriver, VectorStoreConfig,
};
pub use question::{Difficulty, FALLBACK_TOPIC, Question, QuestionType, normalize_questions};
pub use report::{QuizReport, QuizResult, WeakArea, check_answer};
pub use search::{OutputFormat, SearchHit, SearchResults};
