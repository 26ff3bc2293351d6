//! Command line definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use siftrag_core::config::Settings;
use siftrag_pipeline::{Difficulty, QuizKind};

#[derive(Parser, Debug)]
#[command(name = "siftrag")]
#[command(about = "Hybrid dense + keyword retrieval with cited answers over a folder of .txt documents")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: info level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Extra TOML file merged over config.toml and config.<env>.toml
    #[arg(short, long, global = true, env = "SIFTRAG_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Retrieve, compress and rerank evidence for a query; no language model needed
    Search {
        query: String,
        /// Directory scanned recursively for .txt files [default: data.docs_dir]
        docs_dir: Option<PathBuf>,
        #[command(flatten)]
        tuning: Tuning,
    },
    /// Decompose a question, answer each part from the documents and combine the answers
    Ask {
        query: String,
        docs_dir: Option<PathBuf>,
        #[command(flatten)]
        tuning: Tuning,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write questions with answers about a topic from its best-matching passages
    Quiz {
        topic: String,
        docs_dir: Option<PathBuf>,
        /// quiz, assignment or test
        #[arg(long = "type", default_value = "quiz")]
        kind: QuizKind,
        /// easy, medium or hard
        #[arg(long, default_value = "medium")]
        difficulty: Difficulty,
        /// Number of questions
        #[arg(long, default_value_t = 5)]
        count: usize,
        #[command(flatten)]
        tuning: Tuning,
        /// Print the quiz as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Per-command overrides of the configured settings.
#[derive(Args, Debug, Clone, Default)]
pub struct Tuning {
    /// Chunks kept after reranking
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,
    /// Minimum similarity for a sentence to survive compression
    #[arg(short, long)]
    pub threshold: Option<f32>,
    /// Sub-questions processed at once
    #[arg(long)]
    pub concurrency: Option<usize>,
    /// Only ingest the first N files (sorted by path)
    #[arg(long)]
    pub limit: Option<usize>,
    /// Hide the embedding progress bar
    #[arg(long)]
    pub no_progress: bool,
}

impl Tuning {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(top_k) = self.top_k { settings.pipeline.top_k = top_k; }
        if let Some(threshold) = self.threshold { settings.compression.threshold = threshold; }
        if let Some(concurrency) = self.concurrency { settings.pipeline.concurrency = concurrency; }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_search_with_overrides() {
        let cli = Cli::parse_from(["siftrag", "search", "who scored", "docs", "-k", "3", "--threshold", "0.5", "-v"]);
        assert!(cli.verbose);
        let Commands::Search { docs_dir, query, tuning } = cli.command else { panic!("expected search") };
        assert_eq!(docs_dir, Some(PathBuf::from("docs")));
        assert_eq!(query, "who scored");
        assert_eq!(tuning.top_k, Some(3));
        assert_eq!(tuning.threshold, Some(0.5));
        assert_eq!(tuning.concurrency, None);
    }

    #[test]
    fn parses_ask_with_json_and_config() {
        let cli = Cli::parse_from(["siftrag", "--config", "local.toml", "ask", "q", "--json", "--concurrency", "2"]);
        assert_eq!(cli.config, Some(PathBuf::from("local.toml")));
        let Commands::Ask { docs_dir, json, tuning, .. } = cli.command else { panic!("expected ask") };
        assert_eq!(docs_dir, None);
        assert!(json);
        assert_eq!(tuning.concurrency, Some(2));
    }

    #[test]
    fn parses_quiz_with_defaults() {
        let cli = Cli::parse_from(["siftrag", "quiz", "photosynthesis", "notes"]);
        let Commands::Quiz { topic, docs_dir, kind, difficulty, count, json, .. } = cli.command else { panic!("expected quiz") };
        assert_eq!(topic, "photosynthesis");
        assert_eq!(docs_dir, Some(PathBuf::from("notes")));
        assert_eq!((kind, difficulty, count, json), (QuizKind::Quiz, Difficulty::Medium, 5, false));
    }

    #[test]
    fn parses_quiz_type_difficulty_and_count() {
        let cli = Cli::parse_from(["siftrag", "quiz", "cells", "--type", "assignment", "--difficulty", "hard", "--count", "3"]);
        let Commands::Quiz { kind, difficulty, count, .. } = cli.command else { panic!("expected quiz") };
        assert_eq!((kind, difficulty, count), (QuizKind::Assignment, Difficulty::Hard, 3));
        assert!(Cli::try_parse_from(["siftrag", "quiz", "cells", "--type", "essay"]).is_err());
    }

    #[test]
    fn overrides_only_touch_given_values() {
        let mut settings = Settings::default();
        let tuning = Tuning { top_k: Some(2), threshold: None, concurrency: Some(1), ..Tuning::default() };
        tuning.apply(&mut settings);
        assert_eq!(settings.pipeline.top_k, 2);
        assert_eq!(settings.pipeline.concurrency, 1);
        assert_eq!(settings.compression.threshold, Settings::default().compression.threshold);
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
