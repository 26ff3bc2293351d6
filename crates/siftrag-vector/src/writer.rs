use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use siftrag_core::error::{Error, Result};
use siftrag_core::traits::{Embedder, VectorIndexer};
use siftrag_core::types::Chunk;

#[derive(Debug, Clone)]
pub struct IndexWriteOptions {
	/// Chunks embedded per provider call.
	pub batch_size: usize,
	pub show_progress: bool,
}

impl Default for IndexWriteOptions {
	fn default() -> Self { Self { batch_size: 64, show_progress: true } }
}

/// Embeds `chunks` batch by batch and adds them to `index`.
///
/// Each batch is added as soon as it is embedded; a provider failure leaves
/// the earlier batches indexed and returns the error.
pub fn embed_and_index<E, V>(embedder: &E, index: &V, chunks: &[Chunk], options: &IndexWriteOptions) -> Result<usize>
where
	E: Embedder + ?Sized,
	V: VectorIndexer + ?Sized,
{
	if chunks.is_empty() { info!("no chunks to embed"); return Ok(0); }
	let batch_size = options.batch_size.max(1);
	let pb = if options.show_progress { ProgressBar::new(chunks.len() as u64) } else { ProgressBar::hidden() };
	if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}") {
		pb.set_style(style.progress_chars("#>-"));
	}

	let mut processed = 0usize;
	for batch in chunks.chunks(batch_size) {
		let texts: Vec<String> = batch.iter().map(|c| c.text().to_string()).collect();
		let vectors = embedder.embed_batch(&texts)?;
		if vectors.len() != batch.len() {
			return Err(Error::EmbeddingFailure(format!("provider returned {} vectors for {} texts", vectors.len(), batch.len())));
		}
		index.add_chunks(batch, &vectors)?;
		processed += batch.len();
		pb.set_position(processed as u64);
	}
	pb.finish_with_message("embedded");
	info!(chunks = processed, "dense index built");
	Ok(processed)
}
