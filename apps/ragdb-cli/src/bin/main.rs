use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ragdb_api::ApiServer;
use ragdb_core::chunker::Chunker;
use ragdb_core::config::{expand_path, resolve_with_base, Config, IndexBackend, Settings};
use ragdb_core::loader::{load_dir_limited, load_path};
use ragdb_core::traits::Embedder;
use ragdb_embed::get_default_embedder;
use ragdb_graph::{ConversationGraph, GraphState};
use ragdb_llm::{AnyChatModel, Synthesizer};
use ragdb_pipeline::{index_documents_into, run_console, Answerer, RagContext};
use ragdb_vector::{open_db, LanceCollection};

#[derive(Parser)]
#[command(name = "ragdb", version, about = "Retrieval-augmented answers over local text files")]
struct Cli {
    /// Directory holding config.toml
    #[arg(long, global = true, default_value = ".")]
    config_dir: PathBuf,

    /// Override index.backend (memory or lancedb)
    #[arg(long, global = true, value_parser = ["memory", "lancedb"])]
    backend: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chunk, embed and store documents in the LanceDB collection (rebuilt from scratch)
    Index {
        /// A .txt file or directory; defaults to data.source
        path: Option<PathBuf>,
        /// Only index the first N files
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Answer one question, or start the console loop when none is given
    Ask { question: Option<String> },
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
    /// Chat with the supervisor/worker agent
    Agent,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::load_from(&cli.config_dir).map_err(|e| {
        eprintln!("Error loading config: {e}");
        e
    })?;
    let mut settings = config.settings()?;
    anchor_paths(&mut settings, &cli.config_dir);
    match cli.backend.as_deref() {
        Some("lancedb") => settings.index.backend = IndexBackend::Lancedb,
        Some(_) => settings.index.backend = IndexBackend::Memory,
        None => {}
    }

    match cli.command {
        Command::Index { path, limit } => index(&settings, path, limit).await,
        Command::Ask { question } => ask(&settings, question).await,
        Command::Serve { bind } => serve(&settings, bind).await,
        Command::Agent => agent(&settings).await,
    }
}

/// Relative data and index paths in config files are relative to the config dir.
fn anchor_paths(settings: &mut Settings, config_dir: &Path) {
    for p in [&mut settings.data.source, &mut settings.index.lancedb_dir] {
        *p = resolve_with_base(config_dir, p.as_str()).to_string_lossy().into_owned();
    }
}

fn source_path(settings: &Settings) -> PathBuf {
    expand_path(&settings.data.source)
}

fn synthesizer(settings: &Settings) -> Result<Synthesizer<AnyChatModel>> {
    let model = AnyChatModel::from_settings(&settings.llm)?;
    Ok(Synthesizer::new(model).with_temperature(settings.llm.temperature))
}

async fn index(settings: &Settings, path: Option<PathBuf>, limit: Option<usize>) -> Result<()> {
    let data = path.unwrap_or_else(|| source_path(settings));
    println!("LanceDB Indexer\n===============");
    println!("Data: {}", data.display());
    let docs = match limit {
        Some(n) => {
            println!("🔢 Limiting indexing to {n} files");
            load_dir_limited(&data, n)?
        }
        None => load_path(&data)?,
    };
    let chunker = Chunker::new(settings.chunking.strategy()?)?;
    let embedder = get_default_embedder(&settings.embed)?;

    let lancedb_path = expand_path(&settings.index.lancedb_dir);
    if lancedb_path.exists() {
        fs::remove_dir_all(&lancedb_path).with_context(|| format!("removing {}", lancedb_path.display()))?;
    }
    fs::create_dir_all(&lancedb_path)?;
    let conn = open_db(&lancedb_path.to_string_lossy()).await?;
    let collection =
        LanceCollection::create(&conn, &settings.index.collection, embedder.dim(), settings.index.distance).await?;
    let written = index_documents_into(&collection, &docs, &chunker, embedder.as_ref()).await?;

    println!("\n✅ Indexing completed successfully!");
    println!("📊 {} documents → {} chunks in '{}'", docs.len(), written, settings.index.collection);
    println!("📁 {}", lancedb_path.display());
    println!("\n💡 Ask questions with: ragdb --backend lancedb ask");
    Ok(())
}

async fn build_context(settings: &Settings) -> Result<RagContext<AnyChatModel>> {
    let embedder: Arc<dyn Embedder> = Arc::from(get_default_embedder(&settings.embed)?);
    let synth = synthesizer(settings)?;
    match settings.index.backend {
        IndexBackend::Memory => {
            let source = source_path(settings);
            let docs = load_path(&source).with_context(|| format!("loading {}", source.display()))?;
            let chunker = Chunker::new(settings.chunking.strategy()?)?;
            RagContext::build_in_memory(&docs, &chunker, embedder, synth, settings.index.distance, settings.retrieval.top_k)
        }
        IndexBackend::Lancedb => {
            let dir = expand_path(&settings.index.lancedb_dir);
            let conn = open_db(&dir.to_string_lossy()).await?;
            let collection = LanceCollection::open(&conn, &settings.index.collection)
                .await
                .with_context(|| format!("opening collection in {} (run `ragdb index` first)", dir.display()))?;
            RagContext::from_collection(collection, embedder, synth, settings.retrieval.top_k)
        }
    }
}

async fn ask(settings: &Settings, question: Option<String>) -> Result<()> {
    let ctx = build_context(settings).await?;
    if let Some(q) = question {
        let answer = ctx.ask(&q).await?;
        println!("\n💬 Answer:\n {}", answer.text);
        for s in &answer.sources {
            println!("   📄 {} ({}, distance {:.4})", s.doc_path, s.chunk_id, s.distance);
        }
        return Ok(());
    }
    let stdin = std::io::stdin();
    let answered = run_console(stdin.lock(), std::io::stdout(), &ctx).await?;
    tracing::info!(answered, "console closed");
    Ok(())
}

async fn serve(settings: &Settings, bind: Option<String>) -> Result<()> {
    let bind = bind.unwrap_or_else(|| settings.api.bind.clone());
    let mut server = ApiServer::new(&bind)?;
    match build_context(settings).await {
        Ok(ctx) => server = server.with_answerer(Arc::new(ctx)),
        Err(e) => tracing::warn!(error = %format!("{e:#}"), "serving without a document index; /ask will return 503"),
    }
    server.serve().await?;
    Ok(())
}

async fn agent(settings: &Settings) -> Result<()> {
    let model = AnyChatModel::from_settings(&settings.llm)?;
    let mut graph = ConversationGraph::new(model).with_temperature(settings.llm.temperature);
    match build_context(settings).await {
        Ok(ctx) => graph = graph.with_retriever(Arc::new(ctx) as Arc<dyn Answerer>),
        Err(e) => tracing::warn!(error = %format!("{e:#}"), "research worker runs without documents"),
    }

    println!("🤖 Agent ready. Type 'exit' or 'quit' to leave.");
    let mut state = GraphState::default();
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\nYou: ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next().transpose()? else { break };
        let input = line.trim();
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            break;
        }
        match graph.respond(&mut state, input).await {
            Ok(reply) => println!("\n🤖 {reply}"),
            Err(e) => println!("\n⚠️  Error: {e}"),
        }
    }
    Ok(())
}
