//! siftrag-embed
//!
//! Embedding providers behind the core `Embedder` trait: a candle BERT
//! sentence model, a deterministic hashing embedder for development and
//! tests, and a content-hash cache that can wrap either.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use siftrag_core::traits::Embedder;

pub mod cache;
pub mod device;
pub mod hash;
pub mod pool;
pub mod sentence;
pub mod tokenize;

pub use cache::{CachedEmbedder, DEFAULT_CACHE_CAPACITY};
pub use hash::HashEmbedder;
pub use pool::masked_mean_l2;
pub use sentence::SentenceEmbedder;

/// Output size of all-MiniLM-L6-v2, also used for the hashing embedder.
pub const DEFAULT_DIM: usize = 384;

/// `APP_USE_FAKE_EMBEDDINGS=1` (or `true`) selects [`HashEmbedder`];
/// otherwise the sentence model is loaded from [`resolve_model_dir`].
pub fn get_default_embedder() -> Result<Box<dyn Embedder>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
    if use_fake { info!("using hashing embedder"); return Ok(Box::new(HashEmbedder::new(DEFAULT_DIM))); }
    Ok(Box::new(SentenceEmbedder::load(&resolve_model_dir()?)?))
}

pub fn resolve_model_dir() -> Result<PathBuf> {
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) {
            let p = PathBuf::from(&dir);
            if p.exists() { info!(dir = %p.display(), "model dir from {}", var); return Ok(p); }
        }
    }
    let local = Path::new("models/all-MiniLM-L6-v2");
    if local.exists() { return Ok(local.to_path_buf()); }
    Err(anyhow!("Could not locate the sentence embedding model directory (set APP_MODEL_DIR)"))
}
