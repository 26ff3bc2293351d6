use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, warn};

use siftrag_core::error::{Error, Result};
use siftrag_core::similarity::similarity;
use siftrag_core::traits::VectorIndexer;
use siftrag_core::types::{Chunk, ChunkId, Embedding, ScoredCandidate, SourceKind};

struct Entry {
	chunk: Chunk,
	vector: Embedding,
}

#[derive(Default)]
struct Inner {
	entries: Vec<Entry>,
	positions: HashMap<ChunkId, usize>,
	dim: Option<usize>,
}

/// Exact cosine nearest-neighbour index.
///
/// Search is a linear scan over every stored vector, so results are the
/// mathematically exact top-k. Re-adding an id replaces its chunk and vector
/// but keeps its original insertion position, which is what equal scores
/// are ordered by. Writers take the lock exclusively; a search never sees a
/// half-applied batch.
pub struct DenseIndex {
	inner: RwLock<Inner>,
}

impl Default for DenseIndex {
	fn default() -> Self { Self::new() }
}

impl DenseIndex {
	pub fn new() -> Self { Self { inner: RwLock::new(Inner::default()) } }

	/// An index that only accepts vectors of `dim` components.
	pub fn with_dim(dim: usize) -> Self { Self { inner: RwLock::new(Inner { dim: Some(dim), ..Inner::default() }) } }

	pub fn dim(&self) -> Option<usize> { self.inner.read().dim }

	pub fn add_chunks(&self, chunks: &[Chunk], embeddings: &[Embedding]) -> Result<()> {
		if chunks.len() != embeddings.len() {
			return Err(Error::UnsupportedInput(format!("{} chunks but {} embeddings", chunks.len(), embeddings.len())));
		}
		if chunks.is_empty() { return Ok(()); }

		let mut inner = self.inner.write();
		let dim = inner.dim.unwrap_or(embeddings[0].len());
		for (chunk, vector) in chunks.iter().zip(embeddings) {
			if chunk.id().is_empty() { return Err(Error::UnsupportedInput("chunk with empty id".to_string())); }
			if vector.len() != dim { return Err(Error::DimensionMismatch { left: vector.len(), right: dim }); }
			if vector.iter().any(|x| !x.is_finite()) {
				return Err(Error::UnsupportedInput(format!("embedding for '{}' has non-finite values", chunk.id())));
			}
		}

		inner.dim = Some(dim);
		let mut replaced = 0usize;
		for (chunk, vector) in chunks.iter().zip(embeddings) {
			let entry = Entry { chunk: chunk.clone(), vector: vector.clone() };
			match inner.positions.get(chunk.id()).copied() {
				Some(pos) => { inner.entries[pos] = entry; replaced += 1; }
				None => {
					let pos = inner.entries.len();
					inner.entries.push(entry);
					inner.positions.insert(chunk.id().to_string(), pos);
				}
			}
		}
		debug!(added = chunks.len(), replaced, total = inner.entries.len(), "dense index updated");
		Ok(())
	}

	/// The `k` chunks most similar to `query_vec`; equal scores keep insertion order.
	pub fn search_vec(&self, query_vec: &[f32], k: usize) -> Result<Vec<ScoredCandidate>> {
		let inner = self.inner.read();
		if inner.entries.is_empty() {
			warn!("dense index is empty; returning no candidates");
			return Ok(vec![]);
		}
		if let Some(dim) = inner.dim {
			if query_vec.len() != dim { return Err(Error::DimensionMismatch { left: query_vec.len(), right: dim }); }
		}
		if k == 0 { return Ok(vec![]); }

		let mut ranked = Vec::with_capacity(inner.entries.len());
		for (pos, entry) in inner.entries.iter().enumerate() {
			ranked.push((pos, similarity(query_vec, &entry.vector)?));
		}
		ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
		ranked.truncate(k);
		ranked
			.into_iter()
			.map(|(pos, score)| ScoredCandidate::new(inner.entries[pos].chunk.clone(), score, SourceKind::Vector))
			.collect()
	}

	pub fn get(&self, id: &str) -> Option<Chunk> {
		let inner = self.inner.read();
		inner.positions.get(id).map(|&pos| inner.entries[pos].chunk.clone())
	}

	pub fn len(&self) -> usize { self.inner.read().entries.len() }

	pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl VectorIndexer for DenseIndex {
	fn add_chunks(&self, chunks: &[Chunk], embeddings: &[Embedding]) -> Result<()> { DenseIndex::add_chunks(self, chunks, embeddings) }
	fn search_vec(&self, query_vec: &[f32], k: usize) -> Result<Vec<ScoredCandidate>> { DenseIndex::search_vec(self, query_vec, k) }
	fn len(&self) -> usize { DenseIndex::len(self) }
}
