//! Local sentence-transformer embeddings through ONNX Runtime.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tokenizers::{PaddingParams, PaddingStrategy, TruncationParams, TruncationStrategy};

use super::Embedder;
use crate::error::EmbeddingError;
use crate::models::EmbeddingConfig;

struct EmbeddingModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    dimension: usize,
}

/// Mean-pooled, L2-normalised embeddings from a BERT-style ONNX export
/// (`model.onnx` + `tokenizer.json`), e.g. all-MiniLM-L6-v2.
#[derive(Clone)]
pub struct OnnxEmbedder {
    model: Arc<EmbeddingModel>,
}

impl OnnxEmbedder {
    pub fn load(config: &EmbeddingConfig, model_dir: &Path) -> Result<Self, EmbeddingError> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let max_tokens = config.max_tokens as usize;

        if !model_path.exists() {
            return Err(EmbeddingError::ModelNotFound(format!(
                "model not found: {}",
                model_path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e: ort::Error| EmbeddingError::LoadError(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e: ort::Error| EmbeddingError::LoadError(e.to_string()))?
            .with_intra_threads(num_cpus())
            .map_err(|e: ort::Error| EmbeddingError::LoadError(e.to_string()))?
            .commit_from_file(&model_path)
            .map_err(|e: ort::Error| EmbeddingError::LoadError(e.to_string()))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| EmbeddingError::TokenizerError(e.to_string()))?;

        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_tokens,
                strategy: TruncationStrategy::LongestFirst,
                ..Default::default()
            }))
            .map_err(|e| EmbeddingError::TokenizerError(e.to_string()))?;

        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            ..Default::default()
        }));

        Ok(Self {
            model: Arc::new(EmbeddingModel {
                session: Mutex::new(session),
                tokenizer,
                dimension: config.dimension as usize,
            }),
        })
    }

    async fn embed_blocking(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let model = Arc::clone(&self.model);
        tokio::task::spawn_blocking(move || model.embed(&texts))
            .await
            .map_err(|e| EmbeddingError::InferenceError(e.to_string()))?
    }
}

impl EmbeddingModel {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EmbeddingError::TokenizerError(e.to_string()))?;

        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);
        let batch_size = encodings.len();

        let mut input_ids = vec![0i64; batch_size * max_len];
        let mut attention_mask = vec![0i64; batch_size * max_len];
        let mut token_type_ids = vec![0i64; batch_size * max_len];

        for (i, encoding) in encodings.iter().enumerate() {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let types = encoding.get_type_ids();
            for j in 0..ids.len() {
                input_ids[i * max_len + j] = i64::from(ids[j]);
                attention_mask[i * max_len + j] = i64::from(mask[j]);
                token_type_ids[i * max_len + j] = i64::from(types[j]);
            }
        }

        let input_ids_tensor = Tensor::from_array(([batch_size, max_len], input_ids))
            .map_err(|e: ort::Error| EmbeddingError::InferenceError(e.to_string()))?;
        let attention_mask_tensor =
            Tensor::from_array(([batch_size, max_len], attention_mask.clone()))
                .map_err(|e: ort::Error| EmbeddingError::InferenceError(e.to_string()))?;
        let token_type_ids_tensor = Tensor::from_array(([batch_size, max_len], token_type_ids))
            .map_err(|e: ort::Error| EmbeddingError::InferenceError(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| EmbeddingError::InferenceError("session lock poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor,
                "token_type_ids" => token_type_ids_tensor
            ])
            .map_err(|e: ort::Error| EmbeddingError::InferenceError(e.to_string()))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e: ort::Error| EmbeddingError::InferenceError(e.to_string()))?;

        match shape.len() {
            // [batch, seq, hidden]: token embeddings, mean-pool over the mask
            3 => {
                let hidden = shape[2] as usize;
                Ok(mean_pool(data, &attention_mask, batch_size, max_len, hidden)
                    .into_iter()
                    .map(|v| normalize(&v[..self.dimension.min(v.len())]))
                    .collect())
            }
            // [batch, hidden]: already pooled
            2 => {
                let hidden = shape[1] as usize;
                Ok((0..batch_size)
                    .map(|i| {
                        let row = &data[i * hidden..(i + 1) * hidden];
                        normalize(&row[..self.dimension.min(hidden)])
                    })
                    .collect())
            }
            _ => Err(EmbeddingError::InferenceError(format!(
                "unexpected output shape: {:?}",
                &shape[..]
            ))),
        }
    }
}

#[async_trait]
impl Embedder for OnnxEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.embed_blocking(texts.to_vec()).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_blocking(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty embedding output".to_string()))
    }

    fn dimension(&self) -> usize {
        self.model.dimension
    }

    fn name(&self) -> &str {
        "onnx"
    }
}

fn mean_pool(
    data: &[f32],
    mask: &[i64],
    batch_size: usize,
    seq_len: usize,
    hidden: usize,
) -> Vec<Vec<f32>> {
    (0..batch_size)
        .map(|i| {
            let mut sum = vec![0f32; hidden];
            let mut count = 0f32;
            for j in 0..seq_len {
                if mask[i * seq_len + j] == 0 {
                    continue;
                }
                count += 1.0;
                let offset = (i * seq_len + j) * hidden;
                for (d, slot) in sum.iter_mut().enumerate() {
                    *slot += data[offset + d];
                }
            }
            if count > 0.0 {
                sum.iter_mut().for_each(|v| *v /= count);
            }
            sum
        })
        .collect()
}

fn normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
