//! `siftrag`: ingest a folder of text documents into the in-memory hybrid
//! index and either print the refined evidence for a query or answer it
//! end to end through an OpenAI-compatible completion endpoint.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use siftrag_core::config::{Config, Settings};
use siftrag_core::data_processor::{DataProcessor, TextChunker};
use siftrag_core::traits::{Embedder, TextCompletion};
use siftrag_embed::{get_default_embedder, CachedEmbedder};
use siftrag_hybrid::LocalRetriever;
use siftrag_pipeline::{EvidencePipeline, OpenAiCompatible, Orchestrator, PipelineOptions, QueryReport, Quiz, QuizRequest, SubQuestionOutcome};
use siftrag_vector::{embed_and_index, IndexWriteOptions};

mod commands;
mod logging;

use commands::{Cli, Commands, Tuning};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose)?;

    let config = match &cli.config {
        Some(path) => Config::load_with_file(path)?,
        None => Config::load()?,
    };
    let base = config.settings()?;

    match cli.command {
        Commands::Search { query, docs_dir, tuning } => {
            let settings = tuned(&base, &tuning)?;
            let docs_dir = resolve_docs_dir(docs_dir, &settings)?;
            let pipeline = build_pipeline(&docs_dir, &settings, &tuning)?;
            let evidence = pipeline.gather(&query).await?;
            println!("Query: {query}");
            println!(
                "retrieved {} -> compressed {} -> selected {}\n",
                evidence.counts.retrieved, evidence.counts.compressed, evidence.counts.selected
            );
            if evidence.chunks.is_empty() { println!("No relevant passages found."); }
            for (rank, candidate) in evidence.chunks.iter().enumerate() {
                let chunk = &candidate.chunk;
                println!("{}. [{:.4}] {} ({}, {:?})", rank + 1, candidate.score(), chunk.source_ref(), chunk.id(), candidate.source);
                println!("   {}\n", chunk.text());
            }
        }
        Commands::Ask { query, docs_dir, tuning, json } => {
            let settings = tuned(&base, &tuning)?;
            let docs_dir = resolve_docs_dir(docs_dir, &settings)?;
            let pipeline = build_pipeline(&docs_dir, &settings, &tuning)?;
            let completion: Arc<dyn TextCompletion> = Arc::new(OpenAiCompatible::from_settings(&settings.llm)?);
            let orchestrator = Orchestrator::new(pipeline, completion);
            let report = orchestrator.answer_query(&query).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Commands::Quiz { topic, docs_dir, kind, difficulty, count, tuning, json } => {
            let settings = tuned(&base, &tuning)?;
            let docs_dir = resolve_docs_dir(docs_dir, &settings)?;
            let pipeline = build_pipeline(&docs_dir, &settings, &tuning)?;
            let completion: Arc<dyn TextCompletion> = Arc::new(OpenAiCompatible::from_settings(&settings.llm)?);
            let orchestrator = Orchestrator::new(pipeline, completion);
            let quiz = orchestrator.generate_quiz(&QuizRequest { topic, kind, difficulty, count }).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&quiz)?);
            } else {
                print_quiz(&quiz);
            }
        }
    }
    Ok(())
}

fn tuned(base: &Settings, tuning: &Tuning) -> Result<Settings> {
    let mut settings = base.clone();
    tuning.apply(&mut settings);
    settings.validate().context("invalid command line override")?;
    Ok(settings)
}

/// The directory given on the command line, else `data.docs_dir` relative
/// to the working directory.
fn resolve_docs_dir(arg: Option<PathBuf>, settings: &Settings) -> Result<PathBuf> {
    match arg {
        Some(dir) => Ok(dir),
        None => {
            let cwd = std::env::current_dir().context("cannot read the working directory")?;
            Ok(settings.docs_dir(&cwd))
        }
    }
}

/// Chunks every `.txt` under `docs_dir`, embeds the chunks once and fills
/// both indexes.
fn build_pipeline(docs_dir: &Path, settings: &Settings, tuning: &Tuning) -> Result<EvidencePipeline<siftrag_text::Bm25Index, siftrag_vector::DenseIndex>> {
    let processor = DataProcessor::with_chunker(TextChunker::from_settings(&settings.chunking)?);
    let chunks = match tuning.limit {
        Some(limit) => processor.process_directory_limited(docs_dir, limit)?,
        None => processor.process_directory(docs_dir)?,
    };
    if chunks.is_empty() { anyhow::bail!("no .txt documents with content under {}", docs_dir.display()); }

    let embedder: Arc<dyn Embedder> = Arc::new(CachedEmbedder::with_capacity(get_default_embedder()?, settings.embedding.cache_capacity));
    let options = PipelineOptions::from_settings(settings);
    let retriever = LocalRetriever::in_memory(Arc::clone(&embedder)).with_fusion_k(options.fusion_k);

    let write = IndexWriteOptions { show_progress: !tuning.no_progress, ..IndexWriteOptions::default() };
    embed_and_index(embedder.as_ref(), retriever.vector_index(), &chunks, &write)?;
    retriever.text_index().add_chunks(&chunks)?;
    info!(chunks = chunks.len(), dir = %docs_dir.display(), "corpus indexed");

    Ok(EvidencePipeline::new(Arc::new(retriever), options))
}

fn print_report(report: &QueryReport) {
    println!("Question: {}\n", report.original_query);
    for (i, outcome) in report.outcomes.iter().enumerate() {
        println!("Sub-question {}: {}", i + 1, outcome.sub_question());
        match outcome {
            SubQuestionOutcome::Answered(sub) => {
                println!(
                    "  chunks: retrieved {} / compressed {} / selected {}",
                    sub.counts.retrieved, sub.counts.compressed, sub.counts.selected
                );
                println!("  {}", sub.answer.text.trim());
                for citation in &sub.answer.citations { println!("    {citation}"); }
            }
            SubQuestionOutcome::Failed { stage, message, .. } => match stage {
                Some(stage) => println!("  failed while {stage}: {message}"),
                None => println!("  failed: {message}"),
            },
        }
        println!();
    }
    match (&report.final_answer, &report.synthesis_error) {
        (Some(answer), _) => {
            println!("Final answer:\n{}", answer.text.trim());
            if !answer.citations.is_empty() {
                println!("\nSources:");
                for citation in &answer.citations { println!("  {citation}"); }
            }
        }
        (None, Some(error)) => println!("Final answer unavailable: {error}"),
        (None, None) => println!("No sub-question could be answered."),
    }
}

fn print_quiz(quiz: &Quiz) {
    println!("Topic: {} ({} questions, {}, {})\n", quiz.topic, quiz.count, quiz.kind, quiz.difficulty);
    println!("{}", quiz.content.trim());
    if !quiz.sources.is_empty() {
        println!("\nSources:");
        for source in &quiz.sources { println!("  {source}"); }
    }
}
