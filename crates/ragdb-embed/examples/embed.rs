use ragdb_core::config::EmbedSettings;
use ragdb_core::traits::Embedder;
use ragdb_embed::BertEmbedder;

fn main() -> anyhow::Result<()> {
    let embedder = BertEmbedder::new(&EmbedSettings::default())?;
    let texts = vec!["hello world".to_string(), "rust embeddings".to_string()];
    let embs = embedder.embed_batch(&texts)?;
    println!("B={} dim={}", embs.len(), embedder.dim());
    Ok(())
}
