use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use siftrag_core::config::Settings;
use siftrag_core::error::{Error, Result};
use siftrag_core::traits::{TextIndexer, VectorIndexer};
use siftrag_core::types::{ScoredCandidate, Stage};
use siftrag_hybrid::{ContextualCompressor, HybridRetriever, Reranker};

use crate::report::StageCounts;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub k_dense: usize,
    pub k_sparse: usize,
    /// Candidates kept after hybrid retrieval.
    pub final_k: usize,
    pub fusion_k: usize,
    pub threshold: f32,
    pub min_segment_chars: usize,
    /// Chunks handed to answer generation.
    pub top_k: usize,
    pub concurrency: usize,
    pub stage_timeout: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self { Self::from_settings(&Settings::default()) }
}

impl PipelineOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            k_dense: settings.retrieval.k_dense,
            k_sparse: settings.retrieval.k_sparse,
            final_k: settings.retrieval.final_k,
            fusion_k: settings.retrieval.fusion_k,
            threshold: settings.compression.threshold,
            min_segment_chars: settings.compression.min_segment_chars,
            top_k: settings.pipeline.top_k,
            concurrency: settings.pipeline.concurrency,
            stage_timeout: Duration::from_secs(settings.pipeline.stage_timeout_secs),
        }
    }
}

/// Top-ranked chunks for one question and how many survived each stage.
#[derive(Debug, Clone)]
pub struct Evidence {
    pub chunks: Vec<ScoredCandidate>,
    pub counts: StageCounts,
}

/// Retrieve, compress and rerank for one question.
///
/// Stages run on the blocking pool, each under the stage timeout. A failure
/// is returned as `StageFailure` tagged with the stage it happened in.
pub struct EvidencePipeline<TI, VI>
where
    TI: TextIndexer + 'static,
    VI: VectorIndexer + 'static,
{
    retriever: Arc<HybridRetriever<TI, VI>>,
    compressor: ContextualCompressor,
    reranker: Reranker,
    options: PipelineOptions,
}

impl<TI, VI> EvidencePipeline<TI, VI>
where
    TI: TextIndexer + 'static,
    VI: VectorIndexer + 'static,
{
    pub fn new(retriever: Arc<HybridRetriever<TI, VI>>, options: PipelineOptions) -> Self {
        let embedder = Arc::clone(retriever.embedder());
        let compressor = ContextualCompressor::new(Arc::clone(&embedder)).with_min_segment_chars(options.min_segment_chars);
        let reranker = Reranker::new(embedder);
        Self { retriever, compressor, reranker, options }
    }

    pub fn options(&self) -> &PipelineOptions { &self.options }

    pub fn retriever(&self) -> &Arc<HybridRetriever<TI, VI>> { &self.retriever }

    pub async fn gather(&self, question: &str) -> Result<Evidence> {
        let opts = &self.options;

        let mut stage = Stage::Retrieving;
        debug!(question, %stage, "stage started");
        let retrieved = self.retrieve(question, opts.final_k).await?;
        let mut counts = StageCounts { retrieved: retrieved.len(), ..StageCounts::default() };

        stage = stage.next();
        debug!(question, %stage, retrieved = counts.retrieved, "stage started");
        let compressor = self.compressor.clone();
        let q = question.to_string();
        let threshold = opts.threshold;
        let compressed = self.blocking_stage(stage, move || compressor.compress_candidates(&retrieved, &q, threshold)).await?;
        counts.compressed = compressed.len();

        stage = stage.next();
        debug!(question, %stage, compressed = counts.compressed, "stage started");
        let reranker = self.reranker.clone();
        let q = question.to_string();
        let mut chunks = self.blocking_stage(stage, move || reranker.rerank_candidates_for(compressed, &q)).await?;
        chunks.truncate(opts.top_k);
        counts.selected = chunks.len();
        Ok(Evidence { chunks, counts })
    }

    /// Hybrid retrieval alone, as the `retrieving` stage: the `final_k`
    /// fused candidates with their similarity and source.
    pub async fn retrieve(&self, question: &str, final_k: usize) -> Result<Vec<ScoredCandidate>> {
        let retriever = Arc::clone(&self.retriever);
        let q = question.to_string();
        let (k_dense, k_sparse) = (self.options.k_dense, self.options.k_sparse);
        self.blocking_stage(Stage::Retrieving, move || retriever.retrieve_scored(&q, k_dense, k_sparse, final_k)).await
    }

    async fn blocking_stage<T, F>(&self, stage: Stage, work: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let handle = tokio::task::spawn_blocking(work);
        match with_timeout(self.options.stage_timeout, stage, handle).await? {
            Ok(result) => result.map_err(|e| e.in_stage(stage)),
            Err(join) => Err(Error::TaskFailed(join.to_string()).in_stage(stage)),
        }
    }
}

/// Awaits `fut` for at most `limit`; a timeout becomes a failure of `stage`.
pub(crate) async fn with_timeout<F: Future>(limit: Duration, stage: Stage, fut: F) -> Result<F::Output> {
    match tokio::time::timeout(limit, fut).await {
        Ok(out) => Ok(out),
        Err(_) => {
            warn!(%stage, timeout_secs = limit.as_secs(), "stage timed out");
            Err(Error::Timeout { seconds: limit.as_secs() }.in_stage(stage))
        }
    }
}
