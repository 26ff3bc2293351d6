use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::ChunkingSettings;
use crate::error::{Error, Result};
use crate::types::Chunk;

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Recursive character splitter.
///
/// Tries the coarsest separator first and only falls back to finer ones for
/// pieces that are still longer than `chunk_size`. Adjacent pieces are merged
/// back up to `chunk_size` characters, carrying up to `chunk_overlap`
/// characters of the previous chunk into the next one.
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for TextChunker {
    fn default() -> Self { Self { chunk_size: 500, chunk_overlap: 50 } }
}

impl TextChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 || chunk_overlap >= chunk_size {
            return Err(Error::InvalidConfig(format!("invalid chunking: size={chunk_size} overlap={chunk_overlap}")));
        }
        Ok(Self { chunk_size, chunk_overlap })
    }

    pub fn from_settings(settings: &ChunkingSettings) -> Result<Self> { Self::new(settings.chunk_size, settings.chunk_overlap) }

    pub fn split(&self, text: &str) -> Vec<String> { self.split_with(text, &SEPARATORS) }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let idx = separators.iter().position(|s| s.is_empty() || text.contains(s)).unwrap_or(separators.len() - 1);
        let separator = separators[idx];
        let finer = &separators[idx + 1..];

        let pieces: Vec<&str> = if separator.is_empty() {
            text.char_indices().map(|(i, c)| &text[i..i + c.len_utf8()]).collect()
        } else {
            text.split(separator).filter(|p| !p.is_empty()).collect()
        };

        let mut out = Vec::new();
        let mut pending: Vec<&str> = Vec::new();
        for piece in pieces {
            if char_len(piece) < self.chunk_size {
                pending.push(piece);
                continue;
            }
            if !pending.is_empty() { out.extend(self.merge(&pending, separator)); pending.clear(); }
            if finer.is_empty() { out.push(piece.to_string()); } else { out.extend(self.split_with(piece, finer)); }
        }
        if !pending.is_empty() { out.extend(self.merge(&pending, separator)); }
        out
    }

    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;
        for &piece in pieces {
            let len = char_len(piece);
            let joined_len = if window.is_empty() { 0 } else { sep_len };
            if total + len + joined_len > self.chunk_size && !window.is_empty() {
                push_joined(&mut chunks, &window, separator);
                while total > self.chunk_overlap || (total > 0 && total + len + if window.is_empty() { 0 } else { sep_len } > self.chunk_size) {
                    let Some(first) = window.pop_front() else { break };
                    total -= char_len(first) + if window.is_empty() { 0 } else { sep_len };
                }
            }
            total += len + if window.is_empty() { 0 } else { sep_len };
            window.push_back(piece);
        }
        push_joined(&mut chunks, &window, separator);
        chunks
    }
}

fn push_joined(out: &mut Vec<String>, window: &VecDeque<&str>, separator: &str) {
    let joined = window.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() { out.push(trimmed.to_string()); }
}

fn char_len(s: &str) -> usize { s.chars().count() }

/// Turns a directory of `.txt` documents into chunks ready for both indexes.
#[derive(Default)]
pub struct DataProcessor {
    chunker: TextChunker,
}

impl DataProcessor {
    pub fn new() -> Self { Self::default() }

    pub fn with_chunker(chunker: TextChunker) -> Self { Self { chunker } }

    pub fn process_directory(&self, data_dir: &Path) -> Result<Vec<Chunk>> {
        self.process_files(data_dir, self.list_txt_files(data_dir)?)
    }

    pub fn process_directory_limited(&self, data_dir: &Path, limit: usize) -> Result<Vec<Chunk>> {
        let mut files = self.list_txt_files(data_dir)?;
        if files.len() > limit { files.truncate(limit); info!(limit, "limited ingestion to first files"); }
        self.process_files(data_dir, files)
    }

    /// Chunks of one in-memory document, identified by `doc_id`.
    pub fn chunk_document(&self, doc_id: &str, source_ref: &str, content: &str) -> Vec<Chunk> {
        self.chunker
            .split(content)
            .into_iter()
            .enumerate()
            .map(|(seq, text)| Chunk::new(format!("{}:{}", doc_id, seq), text, source_ref, seq))
            .collect()
    }

    fn process_files(&self, data_dir: &Path, files: Vec<PathBuf>) -> Result<Vec<Chunk>> {
        if files.is_empty() {
            warn!(dir = %data_dir.display(), "no .txt files found");
            return Ok(vec![]);
        }
        let mut all_chunks = Vec::new();
        for (file_index, file_path) in files.iter().enumerate() {
            debug!(file = %file_path.display(), "processing file {}/{}", file_index + 1, files.len());
            let content = self.read_file_content(file_path)?;
            let doc_id = file_path.strip_prefix(data_dir).unwrap_or(file_path).to_string_lossy().to_string();
            let source_ref = file_path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
            all_chunks.extend(self.chunk_document(&doc_id, &source_ref, &content));
        }
        info!(files = files.len(), chunks = all_chunks.len(), "processed documents into chunks");
        Ok(all_chunks)
    }

    fn read_file_content(&self, file_path: &Path) -> Result<String> {
        match fs::read_to_string(file_path) {
            Ok(content) => Ok(content),
            Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
        }
    }

    fn list_txt_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !root.is_dir() {
            return Err(Error::UnsupportedInput(format!("not a directory: {}", root.display())));
        }
        let mut txt_files: Vec<PathBuf> = walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("txt"))
            .collect();
        txt_files.sort();
        Ok(txt_files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_carries_overlap() {
        let chunker = TextChunker::new(11, 5).unwrap();
        let chunks = chunker.split("aaa bbb ccc ddd");
        assert_eq!(chunks, vec!["aaa bbb ccc", "ccc ddd"]);
    }
}
