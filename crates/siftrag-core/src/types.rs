//! Domain types shared by the sparse, dense and hybrid engines.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

pub type ChunkId = String;
pub type Embedding = Vec<f32>;

/// Marker used when a chunk arrives without provenance.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// A unit of retrievable text.
///
/// - `id`: identifier assigned at ingestion, unique within one index
/// - `text`: the text payload; never edited in place
/// - `source_ref`: originating document (file name or document id)
/// - `sequence_index`: position within the originating document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    id: ChunkId,
    text: String,
    source_ref: String,
    sequence_index: usize,
}

impl Chunk {
    pub fn new(id: impl Into<ChunkId>, text: impl Into<String>, source_ref: impl Into<String>, sequence_index: usize) -> Self {
        let source_ref = source_ref.into();
        let source_ref = if source_ref.trim().is_empty() { UNKNOWN_SOURCE.to_string() } else { source_ref };
        Self { id: id.into(), text: text.into(), source_ref, sequence_index }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn text(&self) -> &str { &self.text }
    pub fn source_ref(&self) -> &str { &self.source_ref }
    pub fn sequence_index(&self) -> usize { self.sequence_index }

    /// Same chunk identity and provenance carrying different text.
    /// Used by compression, which narrows a chunk down to its relevant sentences.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self { id: self.id.clone(), text: text.into(), source_ref: self.source_ref.clone(), sequence_index: self.sequence_index }
    }
}

/// Indicates which engine produced a candidate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Vector,
    Text,
    Both,
}

/// A chunk paired with a relevance score for one query.
///
/// `score` is engine-specific but higher is always better. It is always
/// finite: construction rejects NaN and infinities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub chunk: Chunk,
    score: f32,
    pub source: SourceKind,
}

impl ScoredCandidate {
    pub fn new(chunk: Chunk, score: f32, source: SourceKind) -> Result<Self> {
        if !score.is_finite() { return Err(Error::NonFiniteScore); }
        Ok(Self { chunk, score, source })
    }

    pub fn score(&self) -> f32 { self.score }
}

/// Ordered, scored chunks produced by one query execution.
pub type RetrievalResult = Vec<ScoredCandidate>;

/// An atomic question derived from a larger one. Order is generation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubQuery(String);

impl SubQuery {
    pub fn new(text: impl Into<String>) -> Self { Self(text.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for SubQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Per-sub-question pipeline states, in transition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Retrieving,
    Compressing,
    Reranking,
    AwaitingAnswer,
    Done,
}

impl Stage {
    pub fn next(self) -> Self {
        match self {
            Stage::Retrieving => Stage::Compressing,
            Stage::Compressing => Stage::Reranking,
            Stage::Reranking => Stage::AwaitingAnswer,
            Stage::AwaitingAnswer | Stage::Done => Stage::Done,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Retrieving => "retrieving",
            Stage::Compressing => "compressing",
            Stage::Reranking => "reranking",
            Stage::AwaitingAnswer => "awaiting_answer",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}
