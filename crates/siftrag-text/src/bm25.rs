use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

use siftrag_core::error::{Error, Result};
use siftrag_core::traits::TextIndexer;
use siftrag_core::types::{Chunk, ScoredCandidate, SourceKind};

use crate::tokenize::SparseTokenizer;

/// Okapi BM25 constants.
#[derive(Debug, Clone, Copy)]
pub struct Bm25Params {
	pub k1: f64,
	pub b: f64,
	/// Negative idf values are floored to `epsilon * mean(idf)`.
	pub epsilon: f64,
}

impl Default for Bm25Params {
	fn default() -> Self { Self { k1: 1.5, b: 0.75, epsilon: 0.25 } }
}

/// Immutable statistics over the whole corpus at one point in time.
#[derive(Default)]
struct Snapshot {
	chunks: Vec<Chunk>,
	term_freqs: Vec<HashMap<String, u32>>,
	doc_len: Vec<usize>,
	avgdl: f64,
	idf: HashMap<String, f64>,
}

impl Snapshot {
	fn build(chunks: Vec<Chunk>, tokenizer: &SparseTokenizer, params: &Bm25Params) -> Self {
		let mut term_freqs = Vec::with_capacity(chunks.len());
		let mut doc_len = Vec::with_capacity(chunks.len());
		let mut doc_count: BTreeMap<String, u32> = BTreeMap::new();
		for chunk in &chunks {
			let tokens = tokenizer.tokenize(chunk.text());
			doc_len.push(tokens.len());
			let mut freqs: HashMap<String, u32> = HashMap::new();
			for t in tokens { *freqs.entry(t).or_default() += 1; }
			for term in freqs.keys() { *doc_count.entry(term.clone()).or_default() += 1; }
			term_freqs.push(freqs);
		}
		let n = chunks.len() as f64;
		let total_tokens: usize = doc_len.iter().sum();
		let avgdl = if chunks.is_empty() { 0.0 } else { total_tokens as f64 / n };

		let mut idf: HashMap<String, f64> = HashMap::with_capacity(doc_count.len());
		let mut idf_sum = 0.0;
		let mut negative = Vec::new();
		for (term, df) in doc_count {
			let df = f64::from(df);
			let value = (n - df + 0.5).ln() - (df + 0.5).ln();
			idf_sum += value;
			if value < 0.0 { negative.push(term.clone()); }
			idf.insert(term, value);
		}
		if !idf.is_empty() {
			let floor = params.epsilon * (idf_sum / idf.len() as f64);
			for term in negative { idf.insert(term, floor); }
		}
		Self { chunks, term_freqs, doc_len, avgdl, idf }
	}

	fn scores(&self, query_terms: &[String], params: &Bm25Params) -> Vec<f64> {
		let mut scores = vec![0.0; self.chunks.len()];
		for term in query_terms {
			let Some(&idf) = self.idf.get(term) else { continue };
			for (i, freqs) in self.term_freqs.iter().enumerate() {
				let tf = f64::from(freqs.get(term).copied().unwrap_or(0));
				if tf == 0.0 { continue; }
				let len_norm = if self.avgdl > 0.0 { self.doc_len[i] as f64 / self.avgdl } else { 1.0 };
				scores[i] += idf * (tf * (params.k1 + 1.0)) / (tf + params.k1 * (1.0 - params.b + params.b * len_norm));
			}
		}
		scores
	}
}

/// In-memory BM25 keyword index.
///
/// Every [`Bm25Index::add_chunks`] re-tokenizes and rebuilds statistics over
/// the entire accumulated corpus, so insertion costs O(corpus). The rebuilt
/// snapshot is swapped in atomically; searches running during a rebuild keep
/// reading the previous snapshot.
pub struct Bm25Index {
	tokenizer: SparseTokenizer,
	params: Bm25Params,
	snapshot: RwLock<Arc<Snapshot>>,
	writer: Mutex<()>,
}

impl Default for Bm25Index {
	fn default() -> Self { Self::new() }
}

impl Bm25Index {
	pub fn new() -> Self { Self::with_params(Bm25Params::default()) }

	pub fn with_params(params: Bm25Params) -> Self {
		Self { tokenizer: SparseTokenizer::default(), params, snapshot: RwLock::new(Arc::new(Snapshot::default())), writer: Mutex::new(()) }
	}

	/// Appends `chunks` and rebuilds. Re-adding an existing id replaces that
	/// chunk in place, keeping its insertion position for tie order.
	pub fn add_chunks(&self, chunks: &[Chunk]) -> Result<()> {
		if chunks.is_empty() { return Ok(()); }
		if chunks.iter().any(|c| c.id().is_empty()) { return Err(Error::UnsupportedInput("chunk with empty id".to_string())); }
		let _write = self.writer.lock();
		let current = self.snapshot.read().clone();

		let mut corpus = current.chunks.clone();
		let mut positions: HashMap<&str, usize> = current.chunks.iter().enumerate().map(|(i, c)| (c.id(), i)).collect();
		let mut replaced = 0usize;
		for c in chunks {
			match positions.get(c.id()).copied() {
				Some(pos) => { corpus[pos] = c.clone(); replaced += 1; }
				None => { positions.insert(c.id(), corpus.len()); corpus.push(c.clone()); }
			}
		}
		let rebuilt = Snapshot::build(corpus, &self.tokenizer, &self.params);
		debug!(added = chunks.len(), replaced, corpus = rebuilt.chunks.len(), terms = rebuilt.idf.len(), "rebuilt bm25 index");
		*self.snapshot.write() = Arc::new(rebuilt);
		Ok(())
	}

	/// The `k` best chunks for `query`; equal scores keep corpus insertion order.
	pub fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredCandidate>> {
		let snapshot = self.snapshot.read().clone();
		if snapshot.chunks.is_empty() {
			warn!("sparse index is empty; returning no candidates");
			return Ok(vec![]);
		}
		if k == 0 { return Ok(vec![]); }
		let terms = self.tokenizer.tokenize(query);
		let scores = snapshot.scores(&terms, &self.params);
		let mut ranked: Vec<(usize, f64)> = scores.into_iter().enumerate().collect();
		ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
		ranked.truncate(k);
		ranked
			.into_iter()
			.map(|(i, score)| ScoredCandidate::new(snapshot.chunks[i].clone(), score as f32, SourceKind::Text))
			.collect()
	}

	pub fn len(&self) -> usize { self.snapshot.read().chunks.len() }

	pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl TextIndexer for Bm25Index {
	fn add_chunks(&self, chunks: &[Chunk]) -> Result<()> { Bm25Index::add_chunks(self, chunks) }
	fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredCandidate>> { Bm25Index::search(self, query, k) }
	fn len(&self) -> usize { Bm25Index::len(self) }
}
