use ragdb_core::config::EmbedSettings;
use ragdb_core::traits::Embedder;
use ragdb_embed::{get_default_embedder, FakeEmbedder};

#[test]
fn fake_embedder_shapes_and_determinism() {
    // Force fake embedder to avoid loading the model
    std::env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");

    let embedder = get_default_embedder(&EmbedSettings::default()).expect("embedder");
    let texts = vec!["hello world".to_string(), "hello world".to_string(), "rust embeddings".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    assert_eq!(embs.len(), texts.len(), "one vector per input");
    assert!(embs.iter().all(|v| v.len() == 384), "embedding dim is 384");

    let norm: f32 = embs[0].iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in embs[0].iter().zip(embs[1].iter()) { assert!((a - b).abs() <= 1e-6); }
    assert_ne!(embs[0], embs[2]);
}

#[test]
fn query_and_batch_agree() {
    let embedder = FakeEmbedder::new(64);
    let batch = embedder.embed_batch(&["fire starting".to_string()]).unwrap();
    let query = embedder.embed_query("fire starting").unwrap();
    assert_eq!(batch[0], query);
    assert_eq!(query.len(), embedder.dim());
}

#[test]
fn empty_batch_is_empty() {
    let embedder = FakeEmbedder::new(16);
    assert!(embedder.embed_batch(&[]).unwrap().is_empty());
}

#[test]
fn zero_fake_dim_is_rejected() {
    let settings = EmbedSettings { use_fake: true, fake_dim: 0, ..EmbedSettings::default() };
    let err = get_default_embedder(&settings).err().expect("zero dim must fail");
    assert!(matches!(err.downcast_ref::<ragdb_core::Error>(), Some(ragdb_core::Error::InvalidConfig(_))));
}
