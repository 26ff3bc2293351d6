use std::sync::Arc;
use tracing::debug;

use siftrag_core::error::{Error, Result};
use siftrag_core::similarity::similarity;
use siftrag_core::traits::Embedder;
use siftrag_core::types::{Chunk, ScoredCandidate};

/// Orders candidates by cosine similarity between their text and the query.
///
/// The query is embedded once and all candidate texts in a single batch.
/// Sorting is stable: equal similarities keep the incoming order.
#[derive(Clone)]
pub struct Reranker {
    embedder: Arc<dyn Embedder>,
}

impl Reranker {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self { Self { embedder } }

    pub fn rerank(&self, chunks: Vec<Chunk>, query: &str) -> Result<Vec<Chunk>> {
        Ok(self.rerank_scored(chunks, query)?.into_iter().map(|(c, _)| c).collect())
    }

    /// Like [`Reranker::rerank`], keeping each chunk's similarity.
    pub fn rerank_scored(&self, chunks: Vec<Chunk>, query: &str) -> Result<Vec<(Chunk, f32)>> {
        if chunks.is_empty() { return Ok(vec![]); }
        let query_vec = self.embedder.embed(query)?;
        self.score_and_sort(chunks, &query_vec, |c| c)
    }

    /// Rescores candidates against `query`, keeping each one's source.
    pub fn rerank_candidates_for(&self, candidates: Vec<ScoredCandidate>, query: &str) -> Result<Vec<ScoredCandidate>> {
        if candidates.is_empty() { return Ok(vec![]); }
        let query_vec = self.embedder.embed(query)?;
        self.rerank_candidates(candidates, &query_vec)
    }

    /// Rescores candidates against an already embedded query. Each
    /// candidate's score becomes its similarity; its source is kept.
    pub fn rerank_candidates(&self, candidates: Vec<ScoredCandidate>, query_vec: &[f32]) -> Result<Vec<ScoredCandidate>> {
        if candidates.is_empty() { return Ok(vec![]); }
        let scored = self.score_and_sort(candidates, query_vec, |c| &c.chunk)?;
        scored.into_iter().map(|(c, score)| ScoredCandidate::new(c.chunk, score, c.source)).collect()
    }

    fn score_and_sort<T, F>(&self, items: Vec<T>, query_vec: &[f32], chunk_of: F) -> Result<Vec<(T, f32)>>
    where
        F: Fn(&T) -> &Chunk,
    {
        let texts: Vec<String> = items.iter().map(|i| chunk_of(i).text().to_string()).collect();
        let vectors = self.embedder.embed_batch(&texts)?;
        if vectors.len() != items.len() {
            return Err(Error::EmbeddingFailure(format!("provider returned {} vectors for {} texts", vectors.len(), items.len())));
        }
        let mut scored = Vec::with_capacity(items.len());
        for (item, vector) in items.into_iter().zip(&vectors) {
            let score = similarity(query_vec, vector)?;
            scored.push((item, score));
        }
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        if let Some((_, top)) = scored.first() { debug!(candidates = scored.len(), top_score = *top, "reranked"); }
        Ok(scored)
    }
}
