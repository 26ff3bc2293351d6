use std::sync::Arc;
use tracing::debug;

use siftrag_core::error::{Error, Result};
use siftrag_core::similarity::similarity;
use siftrag_core::traits::Embedder;
use siftrag_core::types::{Chunk, ScoredCandidate};

/// Boundary used to cut chunk text into sentence-like segments.
///
/// A plain period followed by a space: abbreviations and decimals split too.
pub const SEGMENT_SEPARATOR: &str = ". ";

/// Narrows chunks down to the segments that relate to the query.
///
/// A segment survives when it is at least `min_segment_chars` characters
/// long after trimming and its similarity to the query is strictly greater
/// than the threshold. Survivors are rejoined with `". "` in their original
/// order; a chunk left with no segment is dropped.
#[derive(Clone)]
pub struct ContextualCompressor {
    embedder: Arc<dyn Embedder>,
    min_segment_chars: usize,
}

impl ContextualCompressor {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self { Self { embedder, min_segment_chars: 20 } }

    pub fn with_min_segment_chars(mut self, min_segment_chars: usize) -> Self {
        self.min_segment_chars = min_segment_chars;
        self
    }

    pub fn compress(&self, chunks: &[Chunk], query: &str, threshold: f32) -> Result<Vec<Chunk>> {
        self.compress_with(chunks, query, threshold, |c| c, |c, text| Ok(c.with_text(text)))
    }

    /// Like [`ContextualCompressor::compress`], keeping each candidate's
    /// score and source.
    pub fn compress_candidates(&self, candidates: &[ScoredCandidate], query: &str, threshold: f32) -> Result<Vec<ScoredCandidate>> {
        self.compress_with(candidates, query, threshold, |c| &c.chunk, |c, text| ScoredCandidate::new(c.chunk.with_text(text), c.score(), c.source))
    }

    fn compress_with<T, R, F, B>(&self, items: &[T], query: &str, threshold: f32, chunk_of: F, rebuild: B) -> Result<Vec<R>>
    where
        F: Fn(&T) -> &Chunk,
        B: Fn(&T, String) -> Result<R>,
    {
        if !threshold.is_finite() { return Err(Error::UnsupportedInput(format!("threshold must be finite, got {threshold}"))); }

        // (item index, segment) for every segment long enough to score
        let mut candidates: Vec<(usize, &str)> = Vec::new();
        for (i, item) in items.iter().enumerate() {
            for segment in chunk_of(item).text().split(SEGMENT_SEPARATOR) {
                if segment.trim().chars().count() >= self.min_segment_chars { candidates.push((i, segment)); }
            }
        }
        if candidates.is_empty() {
            debug!(chunks = items.len(), "no segment long enough to score");
            return Ok(vec![]);
        }

        let query_vec = self.embedder.embed(query)?;
        let texts: Vec<String> = candidates.iter().map(|(_, s)| s.to_string()).collect();
        let vectors = self.embedder.embed_batch(&texts)?;
        if vectors.len() != texts.len() {
            return Err(Error::EmbeddingFailure(format!("provider returned {} vectors for {} texts", vectors.len(), texts.len())));
        }

        let mut kept: Vec<Vec<&str>> = vec![Vec::new(); items.len()];
        for ((i, segment), vector) in candidates.into_iter().zip(&vectors) {
            if similarity(&query_vec, vector)? > threshold { kept[i].push(segment); }
        }

        let compressed = items
            .iter()
            .zip(kept)
            .filter(|(_, segments)| !segments.is_empty())
            .map(|(item, segments)| rebuild(item, segments.join(SEGMENT_SEPARATOR)))
            .collect::<Result<Vec<R>>>()?;
        debug!(before = items.len(), after = compressed.len(), "compressed chunks");
        Ok(compressed)
    }
}
