use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::question::Difficulty;
use super::search::OutputFormat;

pub const DEFAULT_EMBEDDING_URL: &str = "http://localhost:11411";
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const DEFAULT_EMBEDDING_DIMENSION: u32 = 384;
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";
pub const DEFAULT_COLLECTION: &str = "edumind_docs";
pub const DEFAULT_GENERATION_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GENERATION_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_METRICS_RETENTION_DAYS: u32 = 30;

const APP_DIR: &str = "edumind";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub quiz: QuizConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_DIR).join("config.toml"))
    }

    pub fn data_dir() -> Option<PathBuf> {
        dirs::data_local_dir().map(|p| p.join(APP_DIR))
    }

    pub fn models_dir() -> Option<PathBuf> {
        Self::data_dir().map(|p| p.join("models"))
    }

    pub fn metrics_db_path() -> Option<PathBuf> {
        Self::data_dir().map(|p| p.join("metrics.db"))
    }

    /// Load the config file (if any), then apply `.env` and environment overrides.
    pub fn load() -> Result<Self, crate::error::ConfigError> {
        let _ = dotenvy::dotenv();

        let mut config = match Self::config_path() {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(&path)?;
                toml::from_str(&content)?
            }
            _ => Self::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf, crate::error::ConfigError> {
        let path = Self::config_path().ok_or_else(|| {
            crate::error::ConfigError::PathError("could not determine config directory".to_string())
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(path)
    }

    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("QDRANT_URL") {
            self.vector_store.url = url;
        }
        if let Some(key) = lookup("QDRANT_API_KEY") {
            self.vector_store.api_key = Some(key);
        }
        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.generation.api_key = Some(key);
        }
        if let Some(model) = lookup("GEMINI_MODEL_NAME") {
            self.generation.model = model;
        }
        if let Some(path) = lookup("EDUMIND_EMBEDDING_MODEL_PATH") {
            self.embedding.model_path = Some(PathBuf::from(path));
        }
    }

    pub fn validate(&self) -> Result<(), crate::error::ConfigError> {
        if self.embedding.dimension == 0 {
            return Err(crate::error::ConfigError::ValidationError(
                "embedding.dimension must be positive".to_string(),
            ));
        }
        if self.vector_store.collection.trim().is_empty() {
            return Err(crate::error::ConfigError::ValidationError(
                "vector_store.collection cannot be empty".to_string(),
            ));
        }
        if self.quiz.default_questions == 0 {
            return Err(crate::error::ConfigError::ValidationError(
                "quiz.default_questions must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingDriver {
    /// Local ONNX sentence-transformer
    #[default]
    Onnx,
    /// Remote embedding server exposing `/embed`
    Http,
}

impl std::fmt::Display for EmbeddingDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingDriver::Onnx => write!(f, "onnx"),
            EmbeddingDriver::Http => write!(f, "http"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub driver: EmbeddingDriver,

    #[serde(default = "default_embedding_model")]
    pub model_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_path: Option<PathBuf>,

    #[serde(default = "default_embedding_url")]
    pub url: String,

    #[serde(default = "default_embedding_dimension")]
    pub dimension: u32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
}

impl EmbeddingConfig {
    /// Directory holding `model.onnx` and `tokenizer.json`.
    pub fn resolved_model_dir(&self) -> Option<PathBuf> {
        self.model_path.clone().or_else(|| {
            Config::models_dir().map(|dir| dir.join(self.model_id.replace('/', "--")))
        })
    }
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_embedding_url() -> String {
    DEFAULT_EMBEDDING_URL.to_string()
}

fn default_embedding_dimension() -> u32 {
    DEFAULT_EMBEDDING_DIMENSION
}

fn default_max_tokens() -> u32 {
    256
}

fn default_timeout() -> u64 {
    120
}

fn default_batch_size() -> u32 {
    16
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            driver: EmbeddingDriver::default(),
            model_id: default_embedding_model(),
            model_path: None,
            url: default_embedding_url(),
            dimension: default_embedding_dimension(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout(),
            batch_size: default_batch_size(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorDriver {
    #[default]
    Qdrant,
    /// Process-local store, contents are lost on exit
    Memory,
}

impl std::fmt::Display for VectorDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorDriver::Qdrant => write!(f, "qdrant"),
            VectorDriver::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default)]
    pub driver: VectorDriver,

    #[serde(default = "default_qdrant_url")]
    pub url: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_qdrant_url() -> String {
    DEFAULT_QDRANT_URL.to_string()
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            driver: VectorDriver::default(),
            url: default_qdrant_url(),
            collection: default_collection(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_url")]
    pub url: String,

    #[serde(default = "default_generation_model")]
    pub model: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

fn default_generation_url() -> String {
    DEFAULT_GENERATION_URL.to_string()
}

fn default_generation_model() -> String {
    DEFAULT_GENERATION_MODEL.to_string()
}

fn default_temperature() -> f32 {
    0.4
}

fn default_max_output_tokens() -> u32 {
    4096
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            url: default_generation_url(),
            model: default_generation_model(),
            api_key: None,
            timeout_secs: default_timeout(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizConfig {
    #[serde(default = "default_questions")]
    pub default_questions: u32,

    #[serde(default)]
    pub default_difficulty: Difficulty,

    #[serde(default = "default_time_limit")]
    pub default_time_limit_secs: u64,

    #[serde(default = "default_worksheet_questions")]
    pub worksheet_questions: u32,
}

fn default_questions() -> u32 {
    5
}

fn default_time_limit() -> u64 {
    600
}

fn default_worksheet_questions() -> u32 {
    10
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            default_questions: default_questions(),
            default_difficulty: Difficulty::default(),
            default_time_limit_secs: default_time_limit(),
            worksheet_questions: default_worksheet_questions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_true() -> bool {
    true
}

fn default_retention_days() -> u32 {
    DEFAULT_METRICS_RETENTION_DAYS
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            retention_days: default_retention_days(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub default_format: OutputFormat,
}
