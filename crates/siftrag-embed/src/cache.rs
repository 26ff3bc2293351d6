//! Bounded in-memory embedding cache keyed by the blake3 hash of the text.
//!
//! Compression and reranking embed the same sentences and chunk texts again
//! for every sub-question; wrapping the provider in [`CachedEmbedder`] makes
//! repeated text free after the first call. Entries are evicted by moka's
//! TinyLFU policy once `max_entries` is reached, and after an hour idle.

use moka::sync::Cache;
use std::time::Duration;
use tracing::debug;

use siftrag_core::traits::Embedder;
use siftrag_core::{Embedding, Error, Result};

/// Entries kept when no capacity is given.
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

pub struct CachedEmbedder<E> {
    inner: E,
    cache: Cache<blake3::Hash, Embedding>,
}

impl<E: Embedder> CachedEmbedder<E> {
    pub fn new(inner: E) -> Self { Self::with_capacity(inner, DEFAULT_CACHE_CAPACITY) }

    pub fn with_capacity(inner: E, max_entries: u64) -> Self {
        let cache = Cache::builder().max_capacity(max_entries).time_to_idle(Duration::from_secs(3600)).build();
        Self { inner, cache }
    }

    pub fn inner(&self) -> &E { &self.inner }

    /// Number of texts cached, after pending evictions are applied.
    pub fn len(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks();
    }
}

impl<E: Embedder> Embedder for CachedEmbedder<E> {
    fn dim(&self) -> usize { self.inner.dim() }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let hashes: Vec<blake3::Hash> = texts.iter().map(|t| blake3::hash(t.as_bytes())).collect();
        let mut out: Vec<Option<Embedding>> = hashes.iter().map(|h| self.cache.get(h)).collect();

        // first position of every distinct missing text
        let mut misses: Vec<usize> = Vec::new();
        for (i, hash) in hashes.iter().enumerate() {
            if out[i].is_none() && !misses.iter().any(|&m| hashes[m] == *hash) { misses.push(i); }
        }

        if !misses.is_empty() {
            let batch: Vec<String> = misses.iter().map(|&i| texts[i].clone()).collect();
            let fresh = self.inner.embed_batch(&batch)?;
            if fresh.len() != batch.len() {
                return Err(Error::EmbeddingFailure(format!("provider returned {} vectors for {} texts", fresh.len(), batch.len())));
            }
            for (&i, vector) in misses.iter().zip(fresh) {
                self.cache.insert(hashes[i], vector.clone());
                for (slot, hash) in out.iter_mut().zip(&hashes) {
                    if slot.is_none() && *hash == hashes[i] { *slot = Some(vector.clone()); }
                }
            }
        }
        debug!(requested = texts.len(), embedded = misses.len(), "embedding cache lookup");

        out.into_iter()
            .map(|v| v.ok_or_else(|| Error::EmbeddingFailure("no vector for text".to_string())))
            .collect()
    }
}
