//! siftrag-hybrid
//!
//! Combines dense and sparse retrieval into one ranked candidate list and
//! refines it: reciprocal rank fusion with text deduplication, sentence-level
//! contextual compression, and similarity reranking.

pub mod compress;
pub mod fusion;
pub mod rerank;
pub mod retriever;

pub use compress::ContextualCompressor;
pub use fusion::fuse;
pub use rerank::Reranker;
pub use retriever::{HybridRetriever, LocalRetriever};
