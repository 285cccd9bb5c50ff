//! Sentence- and window-based text chunking.
//!
//! The sentence strategy splits on `". "`, keeps the period with its sentence
//! and packs whole sentences into chunks of at most `max_words` words. A
//! sentence that alone exceeds the limit becomes its own chunk. The window
//! strategy cuts fixed character windows with overlap.

use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{Document, DocumentChunk};

pub const SENTENCE_TERMINATOR: &str = ". ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStrategy {
    Sentences { max_words: usize },
    Window { size: usize, overlap: usize },
}

impl Default for ChunkStrategy {
    fn default() -> Self {
        ChunkStrategy::Sentences { max_words: 100 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Chunker {
    strategy: ChunkStrategy,
}

impl Chunker {
    pub fn new(strategy: ChunkStrategy) -> Result<Self> {
        match strategy {
            ChunkStrategy::Sentences { max_words: 0 } => {
                return Err(Error::InvalidConfig("chunking.max_words must be > 0".into()))
            }
            ChunkStrategy::Window { size, overlap } if size == 0 || overlap >= size => {
                return Err(Error::InvalidConfig(format!(
                    "chunking window needs size > overlap (size={size}, overlap={overlap})"
                )))
            }
            _ => {}
        }
        Ok(Self { strategy })
    }

    pub fn strategy(&self) -> ChunkStrategy {
        self.strategy
    }

    /// Split raw text into trimmed, non-empty segments.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return vec![];
        }
        match self.strategy {
            ChunkStrategy::Sentences { max_words } => pack_sentences(&split_sentences(text), max_words),
            ChunkStrategy::Window { size, overlap } => split_windows(text, size, overlap),
        }
    }

    pub fn chunk_document(&self, doc: &Document) -> Vec<DocumentChunk> {
        let doc_id = doc.doc_id();
        let pieces = self.split(&doc.content);
        let total_chunks = pieces.len();
        debug!(doc_id = %doc_id, total_chunks, "chunked document");
        pieces
            .into_iter()
            .enumerate()
            .map(|(chunk_index, content)| DocumentChunk {
                id: format!("{doc_id}:{chunk_index}"),
                doc_id: doc_id.clone(),
                doc_path: doc.source.clone(),
                content,
                chunk_index,
                total_chunks,
            })
            .collect()
    }

    pub fn chunk_documents(&self, docs: &[Document]) -> Vec<DocumentChunk> {
        docs.iter().flat_map(|d| self.chunk_document(d)).collect()
    }
}

/// Split on the sentence terminator. Every sentence but the last gets its
/// period back; empty pieces are dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    let pieces: Vec<&str> = text.split(SENTENCE_TERMINATOR).collect();
    let last = pieces.len().saturating_sub(1);
    pieces
        .iter()
        .enumerate()
        .filter_map(|(i, piece)| {
            let s = piece.trim();
            if s.is_empty() {
                None
            } else if i < last {
                Some(format!("{s}."))
            } else {
                Some(s.to_string())
            }
        })
        .collect()
}

fn pack_sentences(sentences: &[String], max_words: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut words = 0usize;
    for sentence in sentences {
        let n = sentence.split_whitespace().count();
        if !current.is_empty() && words + n > max_words {
            chunks.push(current.join(" "));
            current.clear();
            words = 0;
        }
        current.push(sentence);
        words += n;
    }
    if !current.is_empty() {
        chunks.push(current.join(" "));
    }
    chunks
}

fn split_windows(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let step = size - overlap;
    let mut out = Vec::new();
    let mut start = 0usize;
    while start < chars.len() {
        let end = (start + size).min(chars.len());
        let window: String = chars[start..end].iter().collect();
        let window = window.trim();
        if !window.is_empty() {
            out.push(window.to_string());
        }
        if end >= chars.len() {
            break;
        }
        start += step;
    }
    out
}
