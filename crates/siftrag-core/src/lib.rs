//! siftrag-core
//!
//! Shared data model, error taxonomy and collaborator traits for the hybrid
//! retrieval engine, plus the cosine similarity scorer, layered configuration
//! and directory ingestion.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod config;
pub mod data_processor;
pub mod error;
pub mod similarity;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use similarity::similarity;
pub use types::{Chunk, ChunkId, Embedding, RetrievalResult, ScoredCandidate, SourceKind, Stage, SubQuery};
