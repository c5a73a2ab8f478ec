//! Service wiring.

use std::sync::Arc;

use crate::error::AppError;
use crate::export::{MarkdownExporter, WorksheetExporter};
use crate::extract::{FileExtractor, TextExtractor};
use crate::models::Config;
use crate::services::{
    DocumentIngestor, Embedder, EmbeddingIndex, GeminiGenerator, GenerationClient, MetricsStore,
    Retriever, TextGenerator, VectorStore, create_backend, create_embedder,
};
use crate::tools::{EquationSolver, ImagePlotter, NumericSolver, PlotRenderer};
use crate::workflows::{ChatWorkflow, QuizWorkflow};

/// Every long-lived service, built once from configuration and passed to the
/// command handlers.
#[derive(Clone)]
pub struct AppContext {
    pub index: EmbeddingIndex,
    pub ingestor: DocumentIngestor,
    pub retriever: Retriever,
    pub generation: GenerationClient,
    pub extractor: Arc<dyn TextExtractor>,
    pub solver: Arc<dyn EquationSolver>,
    pub plotter: Arc<dyn PlotRenderer>,
    pub exporter: Arc<dyn WorksheetExporter>,
    pub metrics: Option<Arc<MetricsStore>>,
    retention_days: u32,
}

impl AppContext {
    /// Build the configured backends and make sure the collection and its
    /// document index exist.
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        let embedder = create_embedder(&config.embedding)?;
        let store: Arc<dyn VectorStore> =
            Arc::from(create_backend(&config.vector_store, embedder.dimension() as u64)?);
        let generator: Arc<dyn TextGenerator> = Arc::new(GeminiGenerator::new(&config.generation)?);

        let metrics = if config.metrics.enabled {
            open_metrics()
        } else {
            None
        };

        let context = Self::from_parts(embedder, store, generator, metrics, config.metrics.retention_days);
        context.index.ensure_ready().await?;
        tracing::debug!(
            collection = context.index.collection(),
            embedder = context.index.embedder_name(),
            "application context ready"
        );
        Ok(context)
    }

    /// Assemble a context from already-built backends.
    pub fn from_parts(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        generator: Arc<dyn TextGenerator>,
        metrics: Option<Arc<MetricsStore>>,
        retention_days: u32,
    ) -> Self {
        let index = EmbeddingIndex::new(embedder, store);
        let mut generation = GenerationClient::new(generator);
        if let Some(metrics) = &metrics {
            generation = generation.with_metrics(Arc::clone(metrics));
        }

        Self {
            ingestor: DocumentIngestor::new(index.clone()),
            retriever: Retriever::new(index.clone()),
            index,
            generation,
            extractor: Arc::new(FileExtractor),
            solver: Arc::new(NumericSolver),
            plotter: Arc::new(ImagePlotter),
            exporter: Arc::new(MarkdownExporter::default()),
            metrics,
            retention_days,
        }
    }

    pub fn quiz_workflow(&self) -> QuizWorkflow {
        QuizWorkflow::new(
            Arc::clone(&self.extractor),
            self.ingestor.clone(),
            self.retriever.clone(),
            self.generation.clone(),
        )
    }

    pub fn chat_workflow(&self) -> ChatWorkflow {
        ChatWorkflow::new(
            self.retriever.clone(),
            self.generation.clone(),
            Arc::clone(&self.solver),
            Arc::clone(&self.plotter),
        )
    }

    /// Explicit teardown: prune old metrics before the process exits.
    pub fn shutdown(self) {
        if let Some(metrics) = &self.metrics {
            metrics.cleanup(self.retention_days);
        }
        tracing::debug!("application context shut down");
    }
}

fn open_metrics() -> Option<Arc<MetricsStore>> {
    let path = Config::metrics_db_path()?;
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::warn!(error = %e, "cannot create metrics directory");
            return None;
        }
    }
    match MetricsStore::open(&path) {
        Ok(store) => Some(Arc::new(store)),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "metrics disabled");
            None
        }
    }
}
