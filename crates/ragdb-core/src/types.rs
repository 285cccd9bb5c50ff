//! Domain types shared by the loader, chunker, indexes and synthesizer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type ChunkId = String;

/// Raw text loaded from one source (file path or external key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub source: String,
    pub content: String,
}

impl Document {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self { source: source.into(), content: content.into() }
    }

    /// Stable document identity: the file stem of `source`, or `source` itself
    /// when it has no path shape.
    pub fn doc_id(&self) -> String {
        std::path::Path::new(&self.source)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.source.clone())
    }
}

/// A chunk of a source document that is independently embedded and indexed.
///
/// - `id`: `"{doc_id}:{chunk_index}"`, unique within one document set
/// - `doc_id`: stable document identity (file stem or external id)
/// - `doc_path`: original path or key of the source
/// - `content`: the trimmed text payload
/// - `chunk_index`/`total_chunks`: position within the parent document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: ChunkId,
    pub doc_id: String,
    pub doc_path: String,
    pub content: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

impl DocumentChunk {
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

/// Vector distance used by an index. Fixed when the index is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distance {
    /// Squared Euclidean distance.
    #[default]
    L2,
    /// `1 - cosine_similarity`.
    Cosine,
}

impl Distance {
    /// Distance between two vectors of equal length. Lower is closer.
    pub fn compute(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Distance::L2 => a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum(),
            Distance::Cosine => {
                let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
                let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
                let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
                if na == 0.0 || nb == 0.0 {
                    return 1.0;
                }
                1.0 - dot / (na * nb)
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Distance::L2 => "l2",
            Distance::Cosine => "cosine",
        }
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Distance {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "l2" | "euclid" | "euclidean" => Ok(Distance::L2),
            "cosine" => Ok(Distance::Cosine),
            other => Err(crate::Error::InvalidConfig(format!("unknown distance '{other}'"))),
        }
    }
}

/// One retrieval result. Lower `distance` is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: DocumentChunk,
    pub distance: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_id_uses_file_stem() {
        assert_eq!(Document::new("data/notes/a.txt", "x").doc_id(), "a");
        assert_eq!(Document::new("inline", "x").doc_id(), "inline");
    }

    #[test]
    fn squared_l2_and_cosine() {
        let a = [1.0f32, 0.0];
        let b = [0.0f32, 2.0];
        assert!((Distance::L2.compute(&a, &b) - 5.0).abs() < 1e-6);
        assert!((Distance::Cosine.compute(&a, &b) - 1.0).abs() < 1e-6);
        assert!(Distance::Cosine.compute(&a, &a).abs() < 1e-6);
    }

    #[test]
    fn distance_parses_aliases() {
        assert_eq!("Euclid".parse::<Distance>().ok(), Some(Distance::L2));
        assert!("dot".parse::<Distance>().is_err());
    }
}
