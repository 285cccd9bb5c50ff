use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use futures::future::BoxFuture;
use tempfile::TempDir;

use ragdb_core::chunker::{ChunkStrategy, Chunker};
use ragdb_core::traits::Embedder;
use ragdb_core::types::{Distance, Document, ScoredChunk};
use ragdb_embed::FakeEmbedder;
use ragdb_llm::mock::MockChatModel;
use ragdb_llm::Synthesizer;
use ragdb_pipeline::{index_documents_into, run_console, Answer, Answerer, RagContext};
use ragdb_vector::{open_db, LanceCollection};

/// Echoes the question back and records what it was asked.
#[derive(Default)]
struct StubAnswerer {
    calls: AtomicUsize,
    questions: Mutex<Vec<String>>,
    fail_on: Option<&'static str>,
}

impl Answerer for StubAnswerer {
    fn ask<'a>(&'a self, question: &'a str) -> BoxFuture<'a, Result<Answer>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.questions.lock().unwrap().push(question.to_string());
            if self.fail_on == Some(question) {
                return Err(anyhow!("backend down"));
            }
            Ok(Answer { text: format!("echo: {question}"), sources: vec![] })
        })
    }

    fn retrieve<'a>(&'a self, _question: &'a str) -> BoxFuture<'a, Result<Vec<ScoredChunk>>> {
        Box::pin(async { Ok(vec![]) })
    }
}

async fn console(input: &str, answerer: &StubAnswerer) -> (usize, String) {
    let mut out = Vec::new();
    let n = run_console(Cursor::new(input.to_string()), &mut out, answerer).await.unwrap();
    (n, String::from_utf8(out).unwrap())
}

#[tokio::test]
async fn quit_first_never_calls_the_pipeline() {
    let stub = StubAnswerer::default();
    let (n, out) = console("quit\nwhat is fire?\n", &stub).await;
    assert_eq!(n, 0);
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    assert!(out.contains("Ask something about the document:"));
}

#[tokio::test]
async fn exit_is_case_insensitive_and_trimmed() {
    let stub = StubAnswerer::default();
    let (n, out) = console("first\n  EXIT \nsecond\n", &stub).await;
    assert_eq!(n, 1);
    assert!(out.contains("💬 Answer:\n echo: first"));
    assert!(!out.contains("second"));
}

#[tokio::test]
async fn end_of_input_stops_and_empty_lines_are_questions() {
    let stub = StubAnswerer::default();
    let (n, _) = console("\nhow much water?", &stub).await;
    assert_eq!(n, 2);
    assert_eq!(*stub.questions.lock().unwrap(), vec!["".to_string(), "how much water?".to_string()]);
}

#[tokio::test]
async fn errors_are_reported_and_the_loop_continues() {
    let stub = StubAnswerer { fail_on: Some("bad"), ..StubAnswerer::default() };
    let (n, out) = console("bad\ngood\nquit\n", &stub).await;
    assert_eq!(n, 1);
    assert!(out.contains("Error: backend down"));
    assert!(out.contains("echo: good"));
}

fn sentence(words: usize, seed: usize) -> String {
    (0..words).map(|i| format!("w{seed}x{i}")).collect::<Vec<_>>().join(" ")
}

/// 25 sentences of 10 words: 250 words that pack into 100/100/50.
fn two_fifty_words() -> Document {
    let text = (0..25).map(|i| sentence(10, i)).collect::<Vec<_>>().join(". ");
    Document::new("notes/long.txt", text)
}

#[tokio::test]
async fn in_memory_round_trip_finds_a_chunk_by_its_own_text() {
    let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder::new(384));
    let chunker = Chunker::new(ChunkStrategy::Sentences { max_words: 100 }).unwrap();
    let mock = MockChatModel::with_responses(["grounded answer"]);
    let ctx = RagContext::build_in_memory(
        &[two_fifty_words()],
        &chunker,
        embedder,
        Synthesizer::new(mock.clone()),
        Distance::L2,
        3,
    )
    .unwrap();
    assert_eq!(ctx.index().len().await.unwrap(), 3);

    let chunks = chunker.chunk_document(&two_fifty_words());
    let counts: Vec<usize> = chunks.iter().map(|c| c.word_count()).collect();
    assert_eq!(counts, vec![100, 100, 50]);

    let hits = ctx.retrieve(&chunks[2].content).await.unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].chunk.chunk_index, 2);
    assert!(hits[0].distance.abs() < 1e-5);

    let answer = ctx.ask(&chunks[2].content).await.unwrap();
    assert_eq!(answer.text, "grounded answer");
    assert_eq!(answer.sources.len(), 3);
    assert_eq!(answer.sources[0].chunk_id, "long:2");

    let calls = mock.calls();
    assert_eq!(calls.len(), 1, "one model call per question");
    assert!(calls[0].0[1].content.contains(&chunks[2].content));
}

#[tokio::test]
async fn empty_corpus_still_answers() {
    let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder::new(16));
    let ctx = RagContext::build_in_memory(
        &[],
        &Chunker::default(),
        embedder,
        Synthesizer::new(MockChatModel::with_responses(["I don't know."])),
        Distance::L2,
        3,
    )
    .unwrap();
    let answer = ctx.ask("anything?").await.unwrap();
    assert!(answer.sources.is_empty());
    assert_eq!(answer.text, "I don't know.");
}

#[tokio::test]
async fn model_failure_surfaces_from_ask() {
    let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder::new(16));
    let ctx = RagContext::build_in_memory(
        &[Document::new("a.txt", "Rain barrels collect roof runoff.")],
        &Chunker::default(),
        embedder,
        Synthesizer::new(MockChatModel::failing()),
        Distance::Cosine,
        3,
    )
    .unwrap();
    assert!(ctx.ask("water?").await.is_err());
}

#[tokio::test]
async fn lancedb_backed_context_answers_from_the_collection() {
    let docs = vec![
        Document::new("fire.txt", "Dry tinder catches a spark. Kindling goes on next."),
        Document::new("water.txt", "Boil water for one minute. Store it in clean containers."),
    ];
    let embedder = Arc::new(FakeEmbedder::new(64));
    let tmp = TempDir::new().unwrap();
    let conn = open_db(&tmp.path().to_string_lossy()).await.unwrap();
    let collection = LanceCollection::create(&conn, "documents", 64, Distance::L2).await.unwrap();
    let written = index_documents_into(&collection, &docs, &Chunker::default(), embedder.as_ref()).await.unwrap();
    assert_eq!(written, 2);

    let opened = LanceCollection::open(&conn, "documents").await.unwrap();
    let ctx = RagContext::from_collection(opened, embedder, Synthesizer::new(MockChatModel::default()), 1).unwrap();
    let answer = ctx.ask("Boil water for one minute. Store it in clean containers.").await.unwrap();
    assert_eq!(answer.text, "mock response");
    assert_eq!(answer.sources.len(), 1);
    assert_eq!(answer.sources[0].chunk_id, "water:0");
}

#[tokio::test]
async fn collection_and_embedder_dims_must_agree() {
    let tmp = TempDir::new().unwrap();
    let conn = open_db(&tmp.path().to_string_lossy()).await.unwrap();
    let collection = LanceCollection::create(&conn, "documents", 8, Distance::L2).await.unwrap();
    let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder::new(16));
    assert!(RagContext::from_collection(collection, embedder, Synthesizer::new(MockChatModel::default()), 3).is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_questions_share_one_context() {
    let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder::new(384));
    let chunker = Chunker::new(ChunkStrategy::Sentences { max_words: 100 }).unwrap();
    let ctx = Arc::new(
        RagContext::build_in_memory(
            &[two_fifty_words()],
            &chunker,
            embedder,
            Synthesizer::new(MockChatModel::with_responses(["a"])),
            Distance::L2,
            3,
        )
        .unwrap(),
    );
    let chunks = chunker.chunk_document(&two_fifty_words());

    let tasks: Vec<_> = chunks
        .iter()
        .map(|c| {
            let ctx = Arc::clone(&ctx);
            let text = c.content.clone();
            tokio::spawn(async move { ctx.retrieve(&text).await })
        })
        .collect();
    for (i, task) in tasks.into_iter().enumerate() {
        let hits = task.await.unwrap().unwrap();
        assert_eq!(hits[0].chunk.chunk_index, i);
    }
}

/// Builds fine, then blows up on every query.
struct PanickingQueryEmbedder;

impl Embedder for PanickingQueryEmbedder {
    fn dim(&self) -> usize { 4 }
    fn max_len(&self) -> usize { 16 }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![0.0; 4]).collect())
    }
    fn embed_query(&self, _text: &str) -> Result<Vec<f32>> {
        panic!("model crashed")
    }
}

#[tokio::test]
async fn embedding_panic_becomes_an_error() {
    let ctx = RagContext::build_in_memory(
        &[],
        &Chunker::default(),
        Arc::new(PanickingQueryEmbedder),
        Synthesizer::new(MockChatModel::with_responses(["unused"])),
        Distance::L2,
        3,
    )
    .unwrap();
    let err = ctx.retrieve("anything").await.unwrap_err();
    assert!(format!("{err:#}").contains("embedding task failed"));
}
