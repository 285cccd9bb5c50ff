//! The pipeline context: built once at startup, read-only afterwards.
//!
//! Build time runs Chunker → Embedder → Index; query time runs
//! Embedder → Retriever → Synthesizer. Front doors share one context
//! through an `Arc` and never mutate it.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use ragdb_core::chunker::Chunker;
use ragdb_core::traits::Embedder;
use ragdb_core::types::{Distance, Document, DocumentChunk, ScoredChunk};
use ragdb_llm::{ChatModel, Synthesizer};
use ragdb_vector::{FlatIndex, LanceCollection, VectorIndex};

const EMBED_BATCH: usize = 256;

/// Where an answer's context came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub chunk_id: String,
    pub doc_path: String,
    pub distance: f32,
}

impl From<&ScoredChunk> for Source {
    fn from(hit: &ScoredChunk) -> Self {
        Self { chunk_id: hit.chunk.id.clone(), doc_path: hit.chunk.doc_path.clone(), distance: hit.distance }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<Source>,
}

/// Question answering as seen by the console, the HTTP API and the research worker.
pub trait Answerer: Send + Sync {
    fn ask<'a>(&'a self, question: &'a str) -> BoxFuture<'a, Result<Answer>>;

    /// Top chunks for `question` without calling the model.
    fn retrieve<'a>(&'a self, question: &'a str) -> BoxFuture<'a, Result<Vec<ScoredChunk>>>;
}

pub struct RagContext<M> {
    embedder: Arc<dyn Embedder>,
    index: VectorIndex,
    synthesizer: Synthesizer<M>,
    top_k: usize,
}

impl<M: ChatModel> RagContext<M> {
    /// Chunk and embed `docs` in one batch and keep them in an exact in-memory index.
    pub fn build_in_memory(
        docs: &[Document],
        chunker: &Chunker,
        embedder: Arc<dyn Embedder>,
        synthesizer: Synthesizer<M>,
        distance: Distance,
        top_k: usize,
    ) -> Result<Self> {
        let start = Instant::now();
        let chunks = chunker.chunk_documents(docs);
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = embedder.embed_batch(&texts).context("embedding chunks")?;
        let index = FlatIndex::build(chunks, vectors, distance)?;
        info!(
            documents = docs.len(),
            chunks = index.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "built in-memory index"
        );
        Self::new(embedder, VectorIndex::Flat(index), synthesizer, top_k)
    }

    /// Serve from an already populated LanceDB collection.
    pub fn from_collection(
        collection: LanceCollection,
        embedder: Arc<dyn Embedder>,
        synthesizer: Synthesizer<M>,
        top_k: usize,
    ) -> Result<Self> {
        if collection.dim() != embedder.dim() {
            return Err(ragdb_core::Error::DimensionMismatch { expected: collection.dim(), actual: embedder.dim() })
                .with_context(|| format!("collection '{}' was built with another embedder", collection.name()));
        }
        Self::new(embedder, VectorIndex::Lance(collection), synthesizer, top_k)
    }

    fn new(embedder: Arc<dyn Embedder>, index: VectorIndex, synthesizer: Synthesizer<M>, top_k: usize) -> Result<Self> {
        if top_k == 0 {
            return Err(ragdb_core::Error::InvalidConfig("top_k must be > 0".into()).into());
        }
        Ok(Self { embedder, index, synthesizer, top_k })
    }

    pub fn index(&self) -> &VectorIndex { &self.index }
    pub fn top_k(&self) -> usize { self.top_k }

    pub async fn retrieve(&self, question: &str) -> Result<Vec<ScoredChunk>> {
        let embedder = Arc::clone(&self.embedder);
        let owned = question.to_owned();
        let query = tokio::task::spawn_blocking(move || embedder.embed_query(&owned))
            .await
            .context("embedding task failed")?
            .context("embedding question")?;
        let hits = self.index.search(&query, self.top_k).await?;
        debug!(backend = self.index.backend(), hits = hits.len(), "retrieved context");
        Ok(hits)
    }

    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let hits = self.retrieve(question).await?;
        let text = self.synthesizer.answer(question, &hits).await?;
        Ok(Answer { text, sources: hits.iter().map(Source::from).collect() })
    }
}

impl<M: ChatModel> Answerer for RagContext<M> {
    fn ask<'a>(&'a self, question: &'a str) -> BoxFuture<'a, Result<Answer>> {
        Box::pin(RagContext::ask(self, question))
    }

    fn retrieve<'a>(&'a self, question: &'a str) -> BoxFuture<'a, Result<Vec<ScoredChunk>>> {
        Box::pin(RagContext::retrieve(self, question))
    }
}

/// Chunk, embed and upsert `docs` into `collection`. Returns the number of chunks written.
pub async fn index_documents_into(
    collection: &LanceCollection,
    docs: &[Document],
    chunker: &Chunker,
    embedder: &dyn Embedder,
) -> Result<usize> {
    let chunks: Vec<DocumentChunk> = chunker.chunk_documents(docs);
    if chunks.is_empty() {
        info!("no chunks to index");
        return Ok(0);
    }
    let pb = ProgressBar::new(chunks.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} embedded ({percent}%)")?
            .progress_chars("#>-"),
    );
    let mut vectors = Vec::with_capacity(chunks.len());
    for batch in chunks.chunks(EMBED_BATCH) {
        let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
        vectors.extend(embedder.embed_batch(&texts).context("embedding chunks")?);
        pb.inc(batch.len() as u64);
    }
    pb.finish_and_clear();
    let written = collection.upsert(&chunks, &vectors).await?;
    info!(documents = docs.len(), chunks = written, collection = collection.name(), "indexed documents");
    Ok(written)
}
