//! Reciprocal rank fusion of the dense and sparse candidate lists.
//!
//! Dense similarities and BM25 scores live on unrelated scales, so neither is
//! kept. Each list contributes `1 / (fusion_k + rank + 1)` (rank from 0) for
//! every candidate it holds; a text found by both paths gets the sum of its
//! two contributions. Candidates are deduplicated by exact text. The first
//! occurrence (dense before sparse, then by rank) is kept as the
//! representative chunk and its source becomes `Both` when the other path
//! also found it.

use std::collections::HashMap;

use siftrag_core::error::Result;
use siftrag_core::types::{ScoredCandidate, SourceKind};

pub fn fuse(dense: Vec<ScoredCandidate>, sparse: Vec<ScoredCandidate>, fusion_k: usize) -> Result<Vec<ScoredCandidate>> {
    let mut merged: Vec<(ScoredCandidate, f64)> = Vec::with_capacity(dense.len() + sparse.len());
    let mut by_text: HashMap<String, usize> = HashMap::new();

    for list in [dense, sparse] {
        for (rank, candidate) in list.into_iter().enumerate() {
            let contribution = 1.0 / (fusion_k as f64 + rank as f64 + 1.0);
            match by_text.get(candidate.chunk.text()).copied() {
                Some(pos) => {
                    let (kept, score) = &mut merged[pos];
                    *score += contribution;
                    if kept.source != candidate.source { kept.source = SourceKind::Both; }
                }
                None => {
                    by_text.insert(candidate.chunk.text().to_string(), merged.len());
                    merged.push((candidate, contribution));
                }
            }
        }
    }

    // stable: equal fused scores keep first-occurrence order
    merged.sort_by(|a, b| b.1.total_cmp(&a.1));
    merged
        .into_iter()
        .map(|(c, score)| ScoredCandidate::new(c.chunk, score as f32, c.source))
        .collect()
}
