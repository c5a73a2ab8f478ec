mod chunker;
pub mod embedding;
pub mod generation;
mod index;
mod ingestor;
mod metrics;
mod retriever;
pub mod vector_store;

pub use chunker::{MIN_CHUNK_CHARS, TextChunker};
pub use embedding::{Embedder, HttpEmbedder, OnnxEmbedder, create_embedder};
pub use generation::{APOLOGY, GeminiGenerator, GenerationClient, TextGenerator, strip_code_fences};
pub use index::EmbeddingIndex;
pub use ingestor::{DocumentIngestor, SOURCE_FIELD};
pub use metrics::{CallKind, MetricsStore, MetricsSummary};
pub use retriever::Retriever;
pub use vector_store::{
    CollectionInfo, MemoryBackend, QdrantBackend, ReadyStep, VectorStore, create_backend,
};
