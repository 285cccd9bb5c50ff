//! Vector indexes for chunk retrieval.
//!
//! [`FlatIndex`] is an exact in-memory scan; [`LanceCollection`] persists chunks
//! in LanceDB. [`VectorIndex`] lets callers search either one the same way.

pub mod collection;
pub mod flat;
pub mod schema;
pub mod table;

use anyhow::Result;
use ragdb_core::types::{Distance, ScoredChunk};

pub use collection::LanceCollection;
pub use flat::FlatIndex;
pub use table::open_db;

pub enum VectorIndex {
    Flat(FlatIndex),
    Lance(LanceCollection),
}

impl VectorIndex {
    pub async fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        match self {
            VectorIndex::Flat(index) => Ok(index.search(query, k)?),
            VectorIndex::Lance(collection) => collection.search(query, k).await,
        }
    }

    pub async fn len(&self) -> Result<usize> {
        match self {
            VectorIndex::Flat(index) => Ok(index.len()),
            VectorIndex::Lance(collection) => collection.len().await,
        }
    }

    pub fn distance(&self) -> Distance {
        match self {
            VectorIndex::Flat(index) => index.distance(),
            VectorIndex::Lance(collection) => collection.distance(),
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            VectorIndex::Flat(_) => "memory",
            VectorIndex::Lance(_) => "lancedb",
        }
    }
}

impl From<FlatIndex> for VectorIndex {
    fn from(index: FlatIndex) -> Self { VectorIndex::Flat(index) }
}

impl From<LanceCollection> for VectorIndex {
    fn from(collection: LanceCollection) -> Self { VectorIndex::Lance(collection) }
}
