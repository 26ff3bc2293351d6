//! Cosine similarity between embedding vectors.
//!
//! `similarity(a, b) = dot(a, b) / (|a| * |b|)`, accumulated in f64 and
//! clamped to `[-1, 1]`. A zero-magnitude operand has no direction, so the
//! similarity is defined as `0.0` in that case: it ranks below any positive
//! match and never produces NaN.

use crate::error::{Error, Result};

pub fn similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch { left: a.len(), right: b.len() });
    }
    let (mut dot, mut norm_a, mut norm_b) = (0f64, 0f64, 0f64);
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 { return Ok(0.0); }
    let cos = dot / (norm_a.sqrt() * norm_b.sqrt());
    if !cos.is_finite() { return Err(Error::NonFiniteScore); }
    Ok(cos.clamp(-1.0, 1.0) as f32)
}

/// Similarity of `query` against each candidate, in candidate order.
pub fn similarities<'a, I>(query: &[f32], candidates: I) -> Result<Vec<f32>>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    candidates.into_iter().map(|c| similarity(query, c)).collect()
}
