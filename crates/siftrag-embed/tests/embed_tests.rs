use std::sync::atomic::{AtomicUsize, Ordering};

use siftrag_core::traits::Embedder;
use siftrag_core::{similarity, Embedding, Error, Result};
use siftrag_embed::{get_default_embedder, CachedEmbedder, HashEmbedder, DEFAULT_DIM};

#[test]
fn fake_embedder_shapes_and_determinism() {
    // Force the hashing embedder to avoid loading the model
    std::env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");

    let embedder = get_default_embedder().expect("embedder");
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), DEFAULT_DIM);
    assert_eq!(embedder.dim(), DEFAULT_DIM);

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    assert_eq!(v1, v2);
}

#[test]
fn hash_embedder_ignores_case_and_punctuation() {
    let e = HashEmbedder::new(64);
    assert_eq!(e.embed_text("Messi scored, GOALS!"), e.embed_text("messi scored goals"));
}

#[test]
fn hash_embedder_relates_texts_sharing_words() {
    let e = HashEmbedder::new(DEFAULT_DIM);
    let q = e.embed_text("goals scored by messi");
    let related = e.embed_text("messi scored twice");
    assert!(similarity(&q, &related).unwrap() > 0.3);
    assert!((similarity(&q, &q).unwrap() - 1.0).abs() < 1e-6);
}

#[test]
fn hash_embedder_maps_wordless_text_to_zero_vector() {
    let e = HashEmbedder::new(8);
    assert!(e.embed_text("  ... ").iter().all(|x| *x == 0.0));
    assert_eq!(similarity(&e.embed_text(""), &e.embed_text("words")).unwrap(), 0.0);
}

struct Counting {
    inner: HashEmbedder,
    texts_seen: AtomicUsize,
    calls: AtomicUsize,
}

impl Embedder for Counting {
    fn dim(&self) -> usize { self.inner.dim() }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts_seen.fetch_add(texts.len(), Ordering::SeqCst);
        self.inner.embed_batch(texts)
    }
}

fn counting() -> Counting { Counting { inner: HashEmbedder::new(32), texts_seen: AtomicUsize::new(0), calls: AtomicUsize::new(0) } }

#[test]
fn cache_embeds_each_distinct_text_once() {
    let cached = CachedEmbedder::new(counting());
    let batch: Vec<String> = ["a b", "c d", "a b"].iter().map(|s| s.to_string()).collect();
    let first = cached.embed_batch(&batch).unwrap();
    assert_eq!(first.len(), 3);
    assert_eq!(first[0], first[2]);
    assert_eq!(cached.inner().texts_seen.load(Ordering::SeqCst), 2);

    let again = cached.embed_batch(&["c d".to_string(), "a b".to_string()]).unwrap();
    assert_eq!(again, vec![first[1].clone(), first[0].clone()]);
    assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 1, "hits never reach the provider");
    assert_eq!(cached.len(), 2);
}

#[test]
fn cache_matches_inner_embedder() {
    let cached = CachedEmbedder::new(HashEmbedder::new(16));
    let direct = HashEmbedder::new(16);
    assert_eq!(cached.embed("tactics and formation").unwrap(), direct.embed_text("tactics and formation"));
}

#[test]
fn cleared_text_is_embedded_again() {
    let cached = CachedEmbedder::new(counting());
    cached.embed("pressing game").unwrap();
    cached.clear();
    cached.embed("pressing game").unwrap();
    assert_eq!(cached.inner().texts_seen.load(Ordering::SeqCst), 2);
}

#[test]
fn capacity_bounds_the_cache_and_evicted_text_is_embedded_again() {
    let cached = CachedEmbedder::with_capacity(counting(), 1);
    let alpha = cached.embed("alpha striker").unwrap();
    cached.embed("bravo keeper").unwrap();
    assert!(cached.len() <= 1, "cache holds {} entries", cached.len());

    let again = cached.embed_batch(&["alpha striker".to_string(), "bravo keeper".to_string()]).unwrap();
    assert_eq!(again[0], alpha);
    assert!(cached.inner().texts_seen.load(Ordering::SeqCst) >= 3, "an evicted text reaches the provider again");
}

struct Failing;

impl Embedder for Failing {
    fn dim(&self) -> usize { 4 }
    fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Embedding>> { Err(Error::EmbeddingFailure("offline".into())) }
}

#[test]
fn cache_passes_provider_errors_through_and_caches_nothing() {
    let cached = CachedEmbedder::new(Failing);
    assert!(matches!(cached.embed("x"), Err(Error::EmbeddingFailure(_))));
    assert!(cached.is_empty());
}
