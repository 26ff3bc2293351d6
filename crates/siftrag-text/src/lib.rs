//! siftrag-text
//!
//! Keyword (sparse) retrieval: an in-memory Okapi BM25 index over chunk text,
//! tokenized with a tantivy lowercase/whitespace analyzer.

pub mod bm25;
pub mod tokenize;

pub use bm25::{Bm25Index, Bm25Params};
pub use tokenize::SparseTokenizer;
