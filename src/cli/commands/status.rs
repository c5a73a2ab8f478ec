use anyhow::Result;

use crate::cli::output::{StatusInfo, get_formatter};
use crate::models::{Config, OutputFormat, VectorDriver};
use crate::services::{CollectionInfo, GeminiGenerator, MetricsStore, create_backend, create_embedder};

pub async fn handle_status(format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    // Status must render even when the model or Qdrant is unavailable.
    let (embedding_backend, embedding_dimension) = match create_embedder(&config.embedding) {
        Ok(embedder) => (embedder.name().to_string(), embedder.dimension()),
        Err(e) => {
            if verbose {
                eprintln!("Embedder unavailable: {e}");
            }
            (
                format!("{} (unavailable)", config.embedding.driver),
                config.embedding.dimension as usize,
            )
        }
    };

    let (vector_store_connected, info) =
        match create_backend(&config.vector_store, embedding_dimension as u64) {
            Ok(store) => {
                let connected = store.health_check().await.unwrap_or(false);
                let info = if connected {
                    store.collection_info().await.ok().flatten()
                } else {
                    None
                };
                (connected, info)
            }
            Err(e) => {
                if verbose {
                    eprintln!("Vector store unavailable: {e}");
                }
                (false, None)
            }
        };

    let generation_configured = GeminiGenerator::new(&config.generation)
        .map(|g| g.is_configured())
        .unwrap_or(false);

    let metrics = if config.metrics.enabled {
        Config::metrics_db_path()
            .filter(|p| p.exists())
            .and_then(|p| MetricsStore::open(&p).ok())
            .map(|store| store.get_summary(config.metrics.retention_days))
    } else {
        None
    };

    let CollectionInfo {
        points_count,
        has_document_index,
    } = info.clone().unwrap_or_default();

    let status = StatusInfo {
        embedding_backend,
        embedding_model: config.embedding.model_id.clone(),
        embedding_dimension,
        vector_store_driver: config.vector_store.driver.to_string(),
        vector_store_url: config.vector_store.url.clone(),
        vector_store_connected,
        collection: config.vector_store.collection.clone(),
        collection_exists: info.is_some(),
        document_index: has_document_index,
        points: points_count,
        generation_model: config.generation.model.clone(),
        generation_configured,
        metrics,
    };

    print!("{}", formatter.format_status(&status));

    if !vector_store_connected || !generation_configured {
        eprintln!();
        if !vector_store_connected && config.vector_store.driver == VectorDriver::Qdrant {
            eprintln!("Warning: Qdrant not reachable. Start with: docker-compose up -d qdrant");
        }
        if !generation_configured {
            eprintln!("Hint: set GEMINI_API_KEY (or generation.api_key) to enable quiz and chat.");
        }
    }

    Ok(())
}
