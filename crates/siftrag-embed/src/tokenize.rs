use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// Token id used to pad rows up to the longest sequence in the batch.
pub const PAD_ID: u32 = 0;

/// Encodes `texts` into `[B, T]` id and attention-mask tensors.
///
/// Rows are truncated to `max_len` tokens and padded to the longest row of
/// the batch, so short batches stay short.
pub fn tokenize_batch(tokenizer: &Tokenizer, texts: &[String], max_len: usize, device: &Device) -> Result<(Tensor, Tensor)> {
    let encodings = tokenizer.encode_batch(texts.to_vec(), true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    let seq_len = encodings.iter().map(|e| e.get_ids().len().min(max_len)).max().unwrap_or(0).max(1);

    let mut ids = Vec::with_capacity(encodings.len() * seq_len);
    let mut mask = Vec::with_capacity(encodings.len() * seq_len);
    for enc in &encodings {
        let take = enc.get_ids().len().min(max_len);
        ids.extend_from_slice(&enc.get_ids()[..take]);
        mask.extend_from_slice(&enc.get_attention_mask()[..take]);
        let pad = seq_len - take;
        ids.extend(std::iter::repeat(PAD_ID).take(pad));
        mask.extend(std::iter::repeat(0u32).take(pad));
    }
    let input_ids = Tensor::from_vec(ids, (encodings.len(), seq_len), device)?;
    let attention_mask = Tensor::from_vec(mask, (encodings.len(), seq_len), device)?;
    Ok((input_ids, attention_mask))
}
