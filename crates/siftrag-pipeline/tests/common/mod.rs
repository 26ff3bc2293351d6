#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use siftrag_core::traits::{Embedder, TextCompletion};
use siftrag_core::{Chunk, Embedding, Error, Result};
use siftrag_hybrid::LocalRetriever;
use siftrag_pipeline::{EvidencePipeline, Orchestrator, PipelineOptions};
use siftrag_text::Bm25Index;
use siftrag_vector::DenseIndex;

pub const VOCAB: [&str; 6] = ["messi", "goal", "weather", "rain", "tactic", "keeper"];

/// One axis per keyword. Any text containing "boom" makes the call fail.
pub struct KeywordEmbedder;

impl Embedder for KeywordEmbedder {
    fn dim(&self) -> usize { VOCAB.len() }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        texts
            .iter()
            .map(|t| {
                let lower = t.to_lowercase();
                if lower.contains("boom") { return Err(Error::EmbeddingFailure("provider crashed".into())); }
                Ok(VOCAB.iter().map(|w| if lower.contains(w) { 1.0 } else { 0.0 }).collect())
            })
            .collect()
    }
}

pub fn corpus() -> Vec<Chunk> {
    vec![
        Chunk::new("match:0", "Messi scored a late goal in the derby. The crowd stayed loud all night long", "match.txt", 0),
        Chunk::new("weather:0", "Heavy rain soaked the pitch before kickoff. The weather forecast had warned everyone", "weather.txt", 0),
        Chunk::new("tactics:0", "The coach switched tactics at half time. A back three replaced the usual back four", "tactics.txt", 0),
        Chunk::new("keeper:0", "The keeper made nine saves in the final. His keeper gloves were signed afterwards", "keeper.txt", 0),
    ]
}

pub const QUIZ_OUTPUT: &str = "1. Who scored late in the derby?\nAnswer: Messi\nExplanation: The match report says so.";

/// Completion stub: returns `decomposition` for decomposition prompts,
/// "final answer" for synthesis prompts, `QUIZ_OUTPUT` for quiz prompts and
/// "answer to <question>" for answer prompts, after the delay of the first matching `delays` key.
#[derive(Default)]
pub struct ScriptedCompletion {
    pub decomposition: String,
    pub delays: Vec<(&'static str, u64)>,
    pub fail_on: Option<&'static str>,
    pub calls: AtomicUsize,
    pub finished: Mutex<Vec<String>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
    pub fn finished(&self) -> Vec<String> { self.finished.lock().unwrap().clone() }
    pub fn prompts(&self) -> Vec<String> { self.prompts.lock().unwrap().clone() }
}

#[async_trait]
impl TextCompletion for ScriptedCompletion {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        if prompt.contains("Sub-questions (one per line, numbered)") { return Ok(self.decomposition.clone()); }
        if prompt.contains("Sub-question Results:") { return Ok("final answer".to_string()); }
        if prompt.contains("educational content generator") { return Ok(QUIZ_OUTPUT.to_string()); }

        let question = prompt.lines().find_map(|l| l.strip_prefix("Question: ")).unwrap_or_default().to_string();
        if let Some(trigger) = self.fail_on {
            if question.contains(trigger) { return Err(Error::CompletionFailure("model refused".into())); }
        }
        if let Some((_, ms)) = self.delays.iter().find(|(key, _)| question.contains(key)) {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
        }
        self.finished.lock().unwrap().push(question.clone());
        Ok(format!("answer to {question}"))
    }
}

pub fn options() -> PipelineOptions {
    PipelineOptions { stage_timeout: Duration::from_secs(2), concurrency: 4, ..PipelineOptions::default() }
}

pub fn evidence_pipeline(options: PipelineOptions) -> EvidencePipeline<Bm25Index, DenseIndex> {
    let retriever = LocalRetriever::in_memory(Arc::new(KeywordEmbedder));
    retriever.index(&corpus()).unwrap();
    EvidencePipeline::new(Arc::new(retriever), options)
}

pub fn orchestrator(completion: Arc<ScriptedCompletion>, options: PipelineOptions) -> Orchestrator<Bm25Index, DenseIndex> {
    Orchestrator::new(evidence_pipeline(options), completion)
}
