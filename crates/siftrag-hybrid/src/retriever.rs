use std::sync::Arc;
use tracing::{debug, info};

use siftrag_core::error::{Error, Result};
use siftrag_core::traits::{Embedder, TextIndexer, VectorIndexer};
use siftrag_core::types::{Chunk, ScoredCandidate};
use siftrag_text::Bm25Index;
use siftrag_vector::DenseIndex;

use crate::fusion::fuse;
use crate::rerank::Reranker;

/// Rank constant used when none is configured.
pub const DEFAULT_FUSION_K: usize = 60;

/// Dense + sparse retrieval over a pair of indexes sharing one embedder.
pub struct HybridRetriever<TI, VI>
where
    TI: TextIndexer,
    VI: VectorIndexer,
{
    text: TI,
    vector: VI,
    embedder: Arc<dyn Embedder>,
    reranker: Reranker,
    fusion_k: usize,
}

/// The in-memory BM25 + exact dense index pairing.
pub type LocalRetriever = HybridRetriever<Bm25Index, DenseIndex>;

impl LocalRetriever {
    pub fn in_memory(embedder: Arc<dyn Embedder>) -> Self {
        let dim = embedder.dim();
        Self::new(Bm25Index::new(), DenseIndex::with_dim(dim), embedder)
    }
}

impl<TI, VI> HybridRetriever<TI, VI>
where
    TI: TextIndexer,
    VI: VectorIndexer,
{
    pub fn new(text: TI, vector: VI, embedder: Arc<dyn Embedder>) -> Self {
        let reranker = Reranker::new(Arc::clone(&embedder));
        Self { text, vector, embedder, reranker, fusion_k: DEFAULT_FUSION_K }
    }

    pub fn with_fusion_k(mut self, fusion_k: usize) -> Self {
        self.fusion_k = fusion_k;
        self
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> { &self.embedder }

    pub fn text_index(&self) -> &TI { &self.text }

    pub fn vector_index(&self) -> &VI { &self.vector }

    /// Embeds `chunks` and adds them to both indexes.
    pub fn index(&self, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() { return Ok(()); }
        let texts: Vec<String> = chunks.iter().map(|c| c.text().to_string()).collect();
        let embeddings = self.embedder.embed_batch(&texts)?;
        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.embedder.dim()) {
            return Err(Error::DimensionMismatch { left: bad.len(), right: self.embedder.dim() });
        }
        self.add_embedded(chunks, &embeddings)
    }

    /// Adds chunks whose embeddings were computed elsewhere.
    ///
    /// Both indexes replace an existing id in place, so re-indexing a chunk
    /// keeps them in step. The batch is checked before either index is
    /// written.
    pub fn add_embedded(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()> {
        if chunks.len() != embeddings.len() {
            return Err(Error::UnsupportedInput(format!("{} chunks but {} embeddings", chunks.len(), embeddings.len())));
        }
        if chunks.iter().any(|c| c.id().is_empty()) { return Err(Error::UnsupportedInput("chunk with empty id".to_string())); }
        self.vector.add_chunks(chunks, embeddings)?;
        self.text.add_chunks(chunks)?;
        info!(chunks = chunks.len(), dense = self.vector.len(), sparse = self.text.len(), "indexed chunks");
        Ok(())
    }

    pub fn retrieve(&self, query: &str, k_dense: usize, k_sparse: usize, final_k: usize) -> Result<Vec<Chunk>> {
        Ok(self.retrieve_scored(query, k_dense, k_sparse, final_k)?.into_iter().map(|c| c.chunk).collect())
    }

    /// Fused and reranked candidates; each score is the candidate's cosine
    /// similarity to the query, each source the path(s) that found it.
    pub fn retrieve_scored(&self, query: &str, k_dense: usize, k_sparse: usize, final_k: usize) -> Result<Vec<ScoredCandidate>> {
        let query_vec = self.embedder.embed(query).map_err(|e| match e {
            Error::EmbeddingFailure(_) => e,
            other => Error::EmbeddingFailure(other.to_string()),
        })?;

        let dense = self.vector.search_vec(&query_vec, k_dense)?;
        let sparse = self.text.search(query, k_sparse)?;
        debug!(dense = dense.len(), sparse = sparse.len(), "retrieved candidates");

        let merged = fuse(dense, sparse, self.fusion_k)?;
        let merged_len = merged.len();
        let mut ranked = self.reranker.rerank_candidates(merged, &query_vec)?;
        ranked.truncate(final_k);
        debug!(merged = merged_len, returned = ranked.len(), "hybrid retrieval done");
        Ok(ranked)
    }
}
