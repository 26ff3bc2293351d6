use std::hash::Hasher;
use twox_hash::XxHash64;

use siftrag_core::traits::Embedder;
use siftrag_core::{Embedding, Result};

/// Deterministic hashed bag-of-words embedder.
///
/// Each lowercased token, with surrounding punctuation trimmed, is hashed
/// with xxHash64 into one of `dim` buckets; the bucket counts are
/// L2-normalised. Texts sharing words get positive cosine similarity, texts
/// without any word get the zero vector. No model files needed, so this is
/// what development runs and tests use.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim: dim.max(1) } }

    pub fn embed_text(&self, text: &str) -> Embedding {
        let mut v = vec![0f32; self.dim];
        for token in text.split_whitespace() {
            let token = token.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
            if token.is_empty() { continue; }
            let mut hasher = XxHash64::with_seed(0);
            hasher.write(token.as_bytes());
            let idx = (hasher.finish() % self.dim as u64) as usize;
            v[idx] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 { for x in &mut v { *x /= norm; } }
        v
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}
