use serde::Serialize;

use siftrag_core::types::{ScoredCandidate, Stage, SubQuery};

use crate::answer::Answer;

/// Chunks left after each evidence stage of one sub-question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageCounts {
    pub retrieved: usize,
    pub compressed: usize,
    pub selected: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubAnswer {
    pub sub_question: SubQuery,
    pub answer: Answer,
    /// The top-k chunks the answer was generated from, best first.
    pub evidence: Vec<ScoredCandidate>,
    pub counts: StageCounts,
}

/// What became of one sub-question. A failure carries the stage it
/// happened in and never an answer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubQuestionOutcome {
    Answered(SubAnswer),
    Failed { sub_question: SubQuery, stage: Option<Stage>, message: String },
}

impl SubQuestionOutcome {
    pub fn sub_question(&self) -> &SubQuery {
        match self {
            SubQuestionOutcome::Answered(a) => &a.sub_question,
            SubQuestionOutcome::Failed { sub_question, .. } => sub_question,
        }
    }

    pub fn answer(&self) -> Option<&SubAnswer> {
        match self {
            SubQuestionOutcome::Answered(a) => Some(a),
            SubQuestionOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool { matches!(self, SubQuestionOutcome::Failed { .. }) }
}

/// Result of one end-to-end question.
#[derive(Debug, Clone, Serialize)]
pub struct QueryReport {
    pub original_query: String,
    /// One entry per sub-question, in decomposition order.
    pub outcomes: Vec<SubQuestionOutcome>,
    /// Absent when no sub-question was answered or synthesis failed.
    pub final_answer: Option<Answer>,
    pub synthesis_error: Option<String>,
}
