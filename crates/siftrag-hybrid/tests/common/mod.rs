#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use siftrag_core::traits::{Embedder, TextIndexer, VectorIndexer};
use siftrag_core::{Chunk, Embedding, Error, Result, ScoredCandidate, SourceKind};

pub const VOCAB: [&str; 5] = ["messi", "goal", "weather", "rain", "tactic"];

/// One axis per keyword: component `i` is 1 when the lowercased text
/// contains `VOCAB[i]`. Counts texts and calls.
#[derive(Default)]
pub struct KeywordEmbedder {
    pub calls: AtomicUsize,
    pub texts: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn vector(text: &str) -> Embedding {
        let lower = text.to_lowercase();
        VOCAB.iter().map(|w| if lower.contains(w) { 1.0 } else { 0.0 }).collect()
    }

    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
    pub fn texts(&self) -> usize { self.texts.load(Ordering::SeqCst) }
}

impl Embedder for KeywordEmbedder {
    fn dim(&self) -> usize { VOCAB.len() }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }
}

pub struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn dim(&self) -> usize { VOCAB.len() }
    fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Embedding>> { Err(Error::EmbeddingFailure("model offline".into())) }
}

pub fn chunk(id: &str, text: &str) -> Chunk { Chunk::new(id, text, format!("{id}.txt"), 0) }

fn candidates(chunks: &[Chunk], source: SourceKind) -> Vec<ScoredCandidate> {
    chunks.iter().enumerate().map(|(i, c)| ScoredCandidate::new(c.clone(), 1.0 / (i as f32 + 1.0), source).unwrap()).collect()
}

/// Sparse index returning a fixed ranked list whatever the query.
pub struct FixedText(pub Vec<Chunk>);

impl TextIndexer for FixedText {
    fn add_chunks(&self, _chunks: &[Chunk]) -> Result<()> { Ok(()) }
    fn search(&self, _query: &str, k: usize) -> Result<Vec<ScoredCandidate>> {
        Ok(candidates(&self.0, SourceKind::Text).into_iter().take(k).collect())
    }
    fn len(&self) -> usize { self.0.len() }
}

/// Dense index returning a fixed ranked list whatever the query vector.
pub struct FixedVector(pub Vec<Chunk>);

impl VectorIndexer for FixedVector {
    fn add_chunks(&self, _chunks: &[Chunk], _embeddings: &[Embedding]) -> Result<()> { Ok(()) }
    fn search_vec(&self, _query_vec: &[f32], k: usize) -> Result<Vec<ScoredCandidate>> {
        Ok(candidates(&self.0, SourceKind::Vector).into_iter().take(k).collect())
    }
    fn len(&self) -> usize { self.0.len() }
}
