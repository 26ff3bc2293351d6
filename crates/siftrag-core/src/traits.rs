use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{Chunk, Embedding, ScoredCandidate};

/// Maps text to fixed-length vectors. Identical text must map to identical vectors.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>>;

    fn embed(&self, text: &str) -> Result<Embedding> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| Error::EmbeddingFailure("provider returned no vector".to_string()))
    }
}

impl<E: Embedder + ?Sized> Embedder for Arc<E> {
    fn dim(&self) -> usize { (**self).dim() }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> { (**self).embed_batch(texts) }
    fn embed(&self, text: &str) -> Result<Embedding> { (**self).embed(text) }
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn dim(&self) -> usize { (**self).dim() }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> { (**self).embed_batch(texts) }
    fn embed(&self, text: &str) -> Result<Embedding> { (**self).embed(text) }
}

/// Opaque language-model capability: prompt in, free text out.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
impl<T: TextCompletion + ?Sized> TextCompletion for Arc<T> {
    async fn complete(&self, prompt: &str) -> Result<String> { (**self).complete(prompt).await }
}

/// Keyword (sparse) index over chunk text.
pub trait TextIndexer: Send + Sync {
    fn add_chunks(&self, chunks: &[Chunk]) -> Result<()>;
    fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredCandidate>>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool { self.len() == 0 }
}

/// Nearest-neighbour (dense) index over chunk embeddings.
pub trait VectorIndexer: Send + Sync {
    fn add_chunks(&self, chunks: &[Chunk], embeddings: &[Embedding]) -> Result<()>;
    fn search_vec(&self, query_vec: &[f32], k: usize) -> Result<Vec<ScoredCandidate>>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool { self.len() == 0 }
}

impl<T: TextIndexer + ?Sized> TextIndexer for Arc<T> {
    fn add_chunks(&self, chunks: &[Chunk]) -> Result<()> { (**self).add_chunks(chunks) }
    fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredCandidate>> { (**self).search(query, k) }
    fn len(&self) -> usize { (**self).len() }
}

impl<V: VectorIndexer + ?Sized> VectorIndexer for Arc<V> {
    fn add_chunks(&self, chunks: &[Chunk], embeddings: &[Embedding]) -> Result<()> { (**self).add_chunks(chunks, embeddings) }
    fn search_vec(&self, query_vec: &[f32], k: usize) -> Result<Vec<ScoredCandidate>> { (**self).search_vec(query_vec, k) }
    fn len(&self) -> usize { (**self).len() }
}
