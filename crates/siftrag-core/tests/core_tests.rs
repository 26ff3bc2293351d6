use std::fs;
use std::io::Write;
use tempfile::TempDir;

use siftrag_core::config::{expand_path, resolve_with_base, Config};
use siftrag_core::data_processor::{DataProcessor, TextChunker};
use siftrag_core::types::UNKNOWN_SOURCE;
use siftrag_core::{similarity, Chunk, Error, ScoredCandidate, SourceKind, Stage};

#[test]
fn similarity_of_vector_with_itself_is_one() {
    let vectors: [&[f32]; 4] = [&[1.0, 2.0, 3.0], &[-0.5, 0.25, 8.0, 1e-3], &[1e6, -1e6], &[0.1; 384]];
    for v in vectors {
        let s = similarity(v, v).expect("same dims");
        assert!((s - 1.0).abs() <= 1e-6, "self similarity was {s}");
    }
}

#[test]
fn similarity_rejects_dimension_mismatch() {
    let err = similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { left: 2, right: 3 }));
}

#[test]
fn similarity_of_zero_vector_is_zero() {
    assert_eq!(similarity(&[0.0, 0.0], &[1.0, 1.0]).unwrap(), 0.0);
    assert_eq!(similarity(&[0.0, 0.0], &[0.0, 0.0]).unwrap(), 0.0);
}

#[test]
fn similarity_of_opposite_vectors_is_minus_one() {
    let s = similarity(&[1.0, -2.0], &[-2.0, 4.0]).unwrap();
    assert!((s + 1.0).abs() <= 1e-6);
}

#[test]
fn chunk_without_source_falls_back_to_unknown() {
    let chunk = Chunk::new("doc:0", "text", "  ", 0);
    assert_eq!(chunk.source_ref(), UNKNOWN_SOURCE);
    let chunk = Chunk::new("doc:1", "text", "stats.txt", 1);
    assert_eq!(chunk.source_ref(), "stats.txt");
}

#[test]
fn with_text_keeps_identity() {
    let chunk = Chunk::new("doc:3", "long text. more text", "a.txt", 3);
    let narrowed = chunk.with_text("long text");
    assert_eq!(narrowed.id(), "doc:3");
    assert_eq!(narrowed.source_ref(), "a.txt");
    assert_eq!(narrowed.sequence_index(), 3);
    assert_eq!(narrowed.text(), "long text");
    assert_eq!(chunk.text(), "long text. more text");
}

#[test]
fn scored_candidate_rejects_non_finite_scores() {
    let chunk = Chunk::new("a", "b", "c", 0);
    assert!(matches!(ScoredCandidate::new(chunk.clone(), f32::NAN, SourceKind::Text), Err(Error::NonFiniteScore)));
    assert!(matches!(ScoredCandidate::new(chunk.clone(), f32::INFINITY, SourceKind::Vector), Err(Error::NonFiniteScore)));
    assert_eq!(ScoredCandidate::new(chunk, 0.5, SourceKind::Both).unwrap().score(), 0.5);
}

#[test]
fn stages_advance_in_order() {
    let mut stage = Stage::Retrieving;
    let mut seen = vec![stage];
    while stage != Stage::Done { stage = stage.next(); seen.push(stage); }
    assert_eq!(seen, vec![Stage::Retrieving, Stage::Compressing, Stage::Reranking, Stage::AwaitingAnswer, Stage::Done]);
    assert_eq!(Stage::AwaitingAnswer.to_string(), "awaiting_answer");
}

#[test]
fn stage_tag_is_not_rewrapped() {
    let err = Error::EmbeddingFailure("down".into()).in_stage(Stage::Compressing);
    assert_eq!(err.stage(), Some(Stage::Compressing));
    let err = err.in_stage(Stage::Reranking);
    assert_eq!(err.stage(), Some(Stage::Compressing));
}

#[test]
fn process_directory_single_small_file() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    let file_path = dir.join("a.txt");
    let mut f = fs::File::create(&file_path).unwrap();
    writeln!(f, "Short text").unwrap();

    let processor = DataProcessor::new();
    let chunks = processor.process_directory(dir).expect("process");

    assert_eq!(chunks.len(), 1, "one small paragraph becomes one chunk");
    assert_eq!(chunks[0].text(), "Short text");
    assert_eq!(chunks[0].id(), "a.txt:0");
    assert_eq!(chunks[0].source_ref(), "a.txt");
    assert_eq!(chunks[0].sequence_index(), 0);
}

#[test]
fn process_directory_limited_two_files_limit_one() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("a.txt"), "alpha bravo").unwrap();
    fs::write(dir.join("b.txt"), "charlie delta").unwrap();
    fs::write(dir.join("notes.md"), "ignored").unwrap();

    let processor = DataProcessor::new();
    let chunks = processor.process_directory_limited(dir, 1).expect("process limited");

    let sources: std::collections::HashSet<_> = chunks.iter().map(|c| c.source_ref().to_string()).collect();
    assert_eq!(sources.len(), 1, "limited to one source document");
    assert!(sources.contains("a.txt"));
}

#[test]
fn chunk_ids_are_unique_across_nested_directories() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::create_dir_all(dir.join("x")).unwrap();
    fs::create_dir_all(dir.join("y")).unwrap();
    fs::write(dir.join("x/team.txt"), "first team").unwrap();
    fs::write(dir.join("y/team.txt"), "second team").unwrap();

    let chunks = DataProcessor::new().process_directory(dir).unwrap();
    assert_eq!(chunks.len(), 2);
    assert_ne!(chunks[0].id(), chunks[1].id());
    assert!(chunks.iter().all(|c| c.source_ref() == "team.txt"));
}

#[test]
fn missing_directory_is_unsupported_input() {
    let err = DataProcessor::new().process_directory(std::path::Path::new("/definitely/not/here")).unwrap_err();
    assert!(matches!(err, Error::UnsupportedInput(_)));
}

#[test]
fn chunker_respects_size_and_overlap() {
    let chunker = TextChunker::new(40, 10).unwrap();
    let text = (0..60).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
    let chunks = chunker.split(&text);
    assert!(chunks.len() > 1);
    for c in &chunks { assert!(c.chars().count() <= 40, "chunk too long: {c:?}"); }
    for pair in chunks.windows(2) {
        let last_word = pair[0].split(' ').last().unwrap();
        assert!(pair[1].starts_with(last_word) || pair[1].split(' ').any(|w| w == last_word), "no overlap between {:?} and {:?}", pair[0], pair[1]);
    }
}

#[test]
fn chunker_prefers_paragraph_boundaries() {
    let chunker = TextChunker::new(30, 0).unwrap();
    let chunks = chunker.split("First paragraph here.\n\nSecond paragraph here.");
    assert_eq!(chunks, vec!["First paragraph here.", "Second paragraph here."]);
}

#[test]
fn chunker_rejects_overlap_not_smaller_than_size() {
    assert!(matches!(TextChunker::new(10, 10), Err(Error::InvalidConfig(_))));
    assert!(matches!(TextChunker::new(0, 0), Err(Error::InvalidConfig(_))));
}

#[test]
fn config_defaults_without_files() {
    figment::Jail::expect_with(|_jail| {
        let settings = Config::load_for_env("dev", None).map_err(|e| e.to_string())?.settings().map_err(|e| e.to_string())?;
        assert_eq!(settings.retrieval.k_dense, 10);
        assert_eq!(settings.pipeline.top_k, 5);
        assert!((settings.compression.threshold - 0.3).abs() < 1e-6);
        assert_eq!(settings.embedding.cache_capacity, 10_000);
        Ok(())
    });
}

#[test]
fn config_layers_files_and_env() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[retrieval]\nk_dense = 7\nk_sparse = 4\n[pipeline]\ntop_k = 2\n")?;
        jail.create_file("config.prod.toml", "[retrieval]\nk_sparse = 9\n")?;
        jail.set_env("APP_PIPELINE__CONCURRENCY", "8");
        let config = Config::load_for_env("prod", None).map_err(|e| e.to_string())?;
        let settings = config.settings().map_err(|e| e.to_string())?;
        assert_eq!(settings.retrieval.k_dense, 7);
        assert_eq!(settings.retrieval.k_sparse, 9);
        assert_eq!(settings.pipeline.top_k, 2);
        assert_eq!(settings.pipeline.concurrency, 8);
        let top_k: usize = config.get("pipeline.top_k").map_err(|e| e.to_string())?;
        assert_eq!(top_k, 2);
        Ok(())
    });
}

#[test]
fn config_rejects_invalid_values() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("APP_CHUNKING__CHUNK_OVERLAP", "600");
        assert!(matches!(Config::load_for_env("dev", None), Err(Error::InvalidConfig(_))));
        Ok(())
    });
}

#[test]
fn paths_expand_and_resolve() {
    std::env::set_var("SIFTRAG_TEST_DOCS", "/srv/docs");
    assert_eq!(expand_path("${SIFTRAG_TEST_DOCS}/a"), std::path::PathBuf::from("/srv/docs/a"));
    let base = std::path::Path::new("/base");
    assert_eq!(resolve_with_base(base, "rel/dir"), std::path::PathBuf::from("/base/rel/dir"));
    assert_eq!(resolve_with_base(base, "/abs"), std::path::PathBuf::from("/abs"));
}
