use thiserror::Error;

use crate::types::Stage;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Vector dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("Embedding provider failed: {0}")]
    EmbeddingFailure(String),

    #[error("Text completion failed: {0}")]
    CompletionFailure(String),

    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    #[error("Score is not a finite number")]
    NonFiniteScore,

    #[error("Timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Stage {stage} failed: {source}")]
    StageFailure {
        stage: Stage,
        #[source]
        source: Box<Error>,
    },

    #[error("Background task failed: {0}")]
    TaskFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Tag a failure with the pipeline stage it happened in.
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            already @ Error::StageFailure { .. } => already,
            other => Error::StageFailure { stage, source: Box::new(other) },
        }
    }

    /// The stage a failure was tagged with, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::StageFailure { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
