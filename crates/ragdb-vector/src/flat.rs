//! Exact in-process nearest-neighbour index.

use ragdb_core::types::{Distance, DocumentChunk, ScoredChunk};
use ragdb_core::{Error, Result};

/// Brute-force index over `(chunk, vector)` pairs.
///
/// Built once from parallel sequences and read-only afterwards, so it can be
/// shared between threads without locking. Rebuilding means constructing a
/// new value.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dim: usize,
    distance: Distance,
    chunks: Vec<DocumentChunk>,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    pub fn build(chunks: Vec<DocumentChunk>, vectors: Vec<Vec<f32>>, distance: Distance) -> Result<Self> {
        if chunks.len() != vectors.len() {
            return Err(Error::LengthMismatch { chunks: chunks.len(), vectors: vectors.len() });
        }
        let dim = vectors.first().map_or(0, Vec::len);
        if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
            return Err(Error::DimensionMismatch { expected: dim, actual: bad.len() });
        }
        tracing::debug!(entries = chunks.len(), dim, %distance, "built flat index");
        Ok(Self { dim, distance, chunks, vectors })
    }

    pub fn empty(distance: Distance) -> Self {
        Self { dim: 0, distance, chunks: vec![], vectors: vec![] }
    }

    pub fn len(&self) -> usize { self.chunks.len() }
    pub fn is_empty(&self) -> bool { self.chunks.is_empty() }
    /// Zero for an empty index.
    pub fn dim(&self) -> usize { self.dim }
    pub fn distance(&self) -> Distance { self.distance }
    pub fn chunks(&self) -> &[DocumentChunk] { &self.chunks }

    /// Up to `k` entries ordered by ascending distance; ties keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if self.is_empty() || k == 0 {
            return Ok(vec![]);
        }
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: query.len() });
        }
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, self.distance.compute(query, v)))
            .collect();
        // sort_by is stable, so equal distances stay in insertion order
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        Ok(scored
            .into_iter()
            .take(k)
            .map(|(i, distance)| ScoredChunk { chunk: self.chunks[i].clone(), distance })
            .collect())
    }
}
