use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

use candle_core::Device;
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use tokenizers::Tokenizer;

use siftrag_core::traits::Embedder;
use siftrag_core::{Embedding, Error};

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::tokenize_batch;

/// Longest token sequence fed to the model; longer inputs are truncated.
pub const MAX_LEN: usize = 256;

/// BERT sentence-embedding model (all-MiniLM-L6-v2 layout) run with candle.
///
/// The model directory must hold `config.json`, `tokenizer.json` and either
/// `model.safetensors` or `pytorch_model.bin`.
pub struct SentenceEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
}

impl SentenceEmbedder {
    pub fn load(model_dir: &Path) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading sentence embedding model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;

        let config_path = model_dir.join("config.json");
        let raw = std::fs::read_to_string(&config_path).with_context(|| format!("reading {}", config_path.display()))?;
        let config: BertConfig = serde_json::from_str(&raw)?;
        let dim = serde_json::from_str::<serde_json::Value>(&raw)?
            .get("hidden_size")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| anyhow!("config.json has no hidden_size"))? as usize;

        let safetensors = model_dir.join("model.safetensors");
        let vb = if safetensors.exists() {
            // SAFETY: the weights file is not modified while the model is alive.
            unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], DTYPE, &device)? }
        } else {
            VarBuilder::from_pth(model_dir.join("pytorch_model.bin"), DTYPE, &device)?
        };
        let model = BertModel::load(vb, &config)?;
        info!(dim, "sentence embedding model loaded");
        Ok(Self { model, tokenizer, device, dim })
    }

    fn embed_texts(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        if texts.is_empty() { return Ok(vec![]); }
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize_batch(&self.tokenizer, texts, MAX_LEN, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let vectors: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_vec2()?;
        let elapsed = start.elapsed().as_millis();
        if elapsed > 1000 { warn!(batch = texts.len(), elapsed_ms = elapsed as u64, "slow embedding batch"); }
        debug!(batch = texts.len(), elapsed_ms = elapsed as u64, "embedded batch");
        Ok(vectors)
    }
}

impl Embedder for SentenceEmbedder {
    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> siftrag_core::Result<Vec<Embedding>> {
        let vectors = self.embed_texts(texts).map_err(|e| Error::EmbeddingFailure(format!("{e:#}")))?;
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dim) {
            return Err(Error::DimensionMismatch { left: bad.len(), right: self.dim });
        }
        Ok(vectors)
    }
}
