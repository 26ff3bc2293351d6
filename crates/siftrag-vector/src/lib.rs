//! siftrag-vector
//!
//! Dense retrieval: an in-memory exact nearest-neighbour index over chunk
//! embeddings, plus a batched writer that embeds a corpus into it.

pub mod index;
pub mod writer;

pub use index::DenseIndex;
pub use writer::{embed_and_index, IndexWriteOptions};
