use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

use siftrag_core::error::{Error, Result};
use siftrag_core::traits::{TextCompletion, TextIndexer, VectorIndexer};
use siftrag_core::types::{Chunk, Stage, SubQuery};

use crate::answer::{combine_answers, generate_answer};
use crate::decompose::decompose;
use crate::evidence::{with_timeout, EvidencePipeline};
use crate::quiz::{generate_quiz, Quiz, QuizRequest};
use crate::report::{QueryReport, SubAnswer, SubQuestionOutcome};

/// Answers complex questions: decompose, run every sub-question through the
/// evidence pipeline and answer it, then synthesise.
///
/// Sub-question pipelines share nothing mutable beyond the read-only
/// indexes. At most `concurrency` of them run at once and their outcomes
/// come back in decomposition order, whatever order they finish in.
pub struct Orchestrator<TI, VI>
where
    TI: TextIndexer + 'static,
    VI: VectorIndexer + 'static,
{
    evidence: EvidencePipeline<TI, VI>,
    completion: Arc<dyn TextCompletion>,
}

impl<TI, VI> Orchestrator<TI, VI>
where
    TI: TextIndexer + 'static,
    VI: VectorIndexer + 'static,
{
    pub fn new(evidence: EvidencePipeline<TI, VI>, completion: Arc<dyn TextCompletion>) -> Self { Self { evidence, completion } }

    pub fn evidence(&self) -> &EvidencePipeline<TI, VI> { &self.evidence }

    pub async fn decompose(&self, query: &str) -> Result<Vec<SubQuery>> {
        self.timed(decompose(query, self.completion.as_ref())).await
    }

    /// One sub-question from retrieval to answer. Failures come back as
    /// `StageFailure` tagged with the stage that failed.
    pub async fn run_sub_question(&self, sub_question: &SubQuery) -> Result<SubAnswer> {
        let evidence = self.evidence.gather(sub_question.as_str()).await?;

        let stage = Stage::AwaitingAnswer;
        info!(sub_question = %sub_question, %stage, selected = evidence.counts.selected, "stage started");
        let chunks: Vec<Chunk> = evidence.chunks.iter().map(|c| c.chunk.clone()).collect();
        let limit = self.evidence.options().stage_timeout;
        let answer = with_timeout(limit, stage, generate_answer(sub_question.as_str(), &chunks, self.completion.as_ref()))
            .await?
            .map_err(|e| e.in_stage(stage))?;

        info!(sub_question = %sub_question, stage = %stage.next(), "sub-question answered");
        Ok(SubAnswer { sub_question: sub_question.clone(), answer, evidence: evidence.chunks, counts: evidence.counts })
    }

    /// Every sub-question, bounded by the configured concurrency; the
    /// result has one outcome per input, in input order.
    pub async fn run_sub_questions(&self, sub_questions: &[SubQuery]) -> Vec<SubQuestionOutcome> {
        let concurrency = self.evidence.options().concurrency.max(1);
        stream::iter(sub_questions.iter().cloned())
            .map(|sub_question| async move {
                match self.run_sub_question(&sub_question).await {
                    Ok(answer) => SubQuestionOutcome::Answered(answer),
                    Err(e) => {
                        warn!(sub_question = %sub_question, error = %e, "sub-question failed");
                        SubQuestionOutcome::Failed { stage: e.stage(), message: e.to_string(), sub_question }
                    }
                }
            })
            .buffered(concurrency)
            .collect()
            .await
    }

    /// Decompose, answer every sub-question, then combine the answers.
    ///
    /// Only a decomposition failure fails the whole call; failed
    /// sub-questions are reported in place and a failed synthesis leaves
    /// `final_answer` empty with the reason in `synthesis_error`.
    pub async fn answer_query(&self, query: &str) -> Result<QueryReport> {
        let sub_questions = self.decompose(query).await?;
        let outcomes = self.run_sub_questions(&sub_questions).await;
        let failed = outcomes.iter().filter(|o| o.is_failed()).count();
        info!(sub_questions = outcomes.len(), failed, "sub-questions finished");

        let (final_answer, synthesis_error) = match self.timed(combine_answers(query, &outcomes, self.completion.as_ref())).await {
            Ok(answer) => (answer, None),
            Err(e) => {
                warn!(error = %e, "answer synthesis failed");
                (None, Some(e.to_string()))
            }
        };
        Ok(QueryReport { original_query: query.to_string(), outcomes, final_answer, synthesis_error })
    }

    /// Questions about `request.topic` from its top-k hybrid matches,
    /// uncompressed. No matches fails with `UnsupportedInput`.
    pub async fn generate_quiz(&self, request: &QuizRequest) -> Result<Quiz> {
        let candidates = self.evidence.retrieve(&request.topic, self.evidence.options().top_k).await?;
        info!(topic = %request.topic, retrieved = candidates.len(), "quiz context retrieved");
        let chunks: Vec<Chunk> = candidates.into_iter().map(|c| c.chunk).collect();
        self.timed(generate_quiz(&chunks, request, self.completion.as_ref())).await
    }

    /// Completion calls outside any sub-question pipeline, under the stage timeout.
    async fn timed<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let limit = self.evidence.options().stage_timeout;
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout { seconds: limit.as_secs() }),
        }
    }
}
