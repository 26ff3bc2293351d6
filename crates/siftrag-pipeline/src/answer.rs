use serde::Serialize;
use tracing::{debug, info};

use siftrag_core::error::Result;
use siftrag_core::traits::TextCompletion;
use siftrag_core::types::Chunk;

use crate::report::SubQuestionOutcome;

/// Returned, without asking the model, when there is no evidence at all.
pub const NO_INFORMATION_ANSWER: &str = "I couldn't find relevant information to answer your question.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub text: String,
    /// `"[i] <source_ref>"`, numbered like the context the model saw.
    pub citations: Vec<String>,
}

/// Numbered context block and matching citation list for `chunks`.
pub fn numbered_context(chunks: &[Chunk]) -> (String, Vec<String>) {
    let mut parts = Vec::with_capacity(chunks.len());
    let mut citations = Vec::with_capacity(chunks.len());
    for (i, chunk) in chunks.iter().enumerate() {
        parts.push(format!("[{}] {}", i + 1, chunk.text()));
        citations.push(format!("[{}] {}", i + 1, chunk.source_ref()));
    }
    (parts.join("\n\n"), citations)
}

pub fn answer_prompt(question: &str, context: &str) -> String {
    format!(
        "Answer the question using the provided context.\n\n\
         IMPORTANT:\n\
         - Cite your sources using the [number] format from the context\n\
         - Be specific with statistics and comparisons\n\
         - If information is insufficient, say so\n\
         - Keep response focused and analytical\n\n\
         Question: {question}\n\n\
         Context:\n{context}\n\n\
         Answer with citations:\n"
    )
}

pub async fn generate_answer<C>(question: &str, chunks: &[Chunk], completion: &C) -> Result<Answer>
where
    C: TextCompletion + ?Sized,
{
    if chunks.is_empty() {
        debug!(question, "no evidence; skipping completion");
        return Ok(Answer { text: NO_INFORMATION_ANSWER.to_string(), citations: vec![] });
    }
    let (context, citations) = numbered_context(chunks);
    let text = completion.complete(&answer_prompt(question, &context)).await?;
    info!(citations = citations.len(), "answer generated");
    Ok(Answer { text, citations })
}

pub fn synthesis_prompt(original_query: &str, context: &str) -> String {
    format!(
        "Provide a comprehensive answer to the original query by synthesizing the sub-question answers below.\n\n\
         Original Query: {original_query}\n\n\
         Sub-question Results:\n{context}\n\n\
         Provide a comprehensive, well-structured answer that addresses all aspects of the original query:\n"
    )
}

/// One answer for the whole query from the answered sub-questions.
///
/// Failed sub-questions are left out of the synthesis context. Citations
/// are merged without duplicates, first occurrence first. Returns `None`
/// without calling the model when nothing was answered.
pub async fn combine_answers<C>(original_query: &str, outcomes: &[SubQuestionOutcome], completion: &C) -> Result<Option<Answer>>
where
    C: TextCompletion + ?Sized,
{
    let answered: Vec<_> = outcomes.iter().filter_map(SubQuestionOutcome::answer).collect();
    if answered.is_empty() { return Ok(None); }

    let mut context = Vec::with_capacity(answered.len() * 2);
    let mut citations: Vec<String> = Vec::new();
    for (i, sub) in answered.iter().enumerate() {
        context.push(format!("Sub-question {}: {}", i + 1, sub.sub_question));
        context.push(format!("Answer: {}", sub.answer.text));
        for c in &sub.answer.citations {
            if !citations.contains(c) { citations.push(c.clone()); }
        }
    }
    let text = completion.complete(&synthesis_prompt(original_query, &context.join("\n\n"))).await?;
    info!(sub_answers = answered.len(), citations = citations.len(), "combined answers");
    Ok(Some(Answer { text, citations }))
}
