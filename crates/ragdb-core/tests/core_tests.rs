use std::fs;
use std::io::Write;
use tempfile::TempDir;

use ragdb_core::chunker::{ChunkStrategy, Chunker};
use ragdb_core::config::{resolve_with_base, ChunkMode, Config, IndexBackend, Settings};
use std::path::Path;
use ragdb_core::loader::{load_dir, load_dir_limited, load_file, load_path};
use ragdb_core::types::Distance;
use ragdb_core::Error;

#[test]
fn load_dir_single_small_file() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    let file_path = dir.join("a.txt");
    let mut f = fs::File::create(&file_path).unwrap();
    writeln!(f, "Short text").unwrap();

    let docs = load_dir(dir).expect("load");
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].doc_id(), "a");

    let chunks = Chunker::default().chunk_documents(&docs);
    assert_eq!(chunks.len(), 1, "one short sentence becomes one chunk");
    assert_eq!(chunks[0].content, "Short text");
}

#[test]
fn load_dir_skips_non_txt_and_sorts() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::create_dir_all(dir.join("nested")).unwrap();
    fs::write(dir.join("b.txt"), "bravo").unwrap();
    fs::write(dir.join("nested/a.txt"), "alpha").unwrap();
    fs::write(dir.join("c.md"), "ignored").unwrap();

    let docs = load_dir(dir).expect("load");
    let contents: Vec<&str> = docs.iter().map(|d| d.content.as_str()).collect();
    assert_eq!(contents, vec!["bravo", "alpha"], "sorted by full path, .md skipped");
}

#[test]
fn load_dir_limited_two_files_limit_one() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("a.txt"), "alpha bravo").unwrap();
    fs::write(dir.join("b.txt"), "charlie delta").unwrap();

    let docs = load_dir_limited(dir, 1).expect("load limited");
    assert_eq!(docs.len(), 1, "limited to one source document");
}

#[test]
fn load_file_decodes_invalid_utf8_lossily() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("latin.txt");
    fs::write(&path, [b'c', b'a', b'f', 0xE9]).unwrap();
    let doc = load_file(&path).expect("lossy load");
    assert!(doc.content.starts_with("caf"));
}

#[test]
fn missing_path_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let err = load_path(&tmp.path().join("nope")).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn empty_dir_loads_nothing() {
    let tmp = TempDir::new().unwrap();
    assert!(load_dir(tmp.path()).expect("load").is_empty());
}

#[test]
fn config_defaults_without_files() {
    let tmp = TempDir::new().unwrap();
    let settings = Config::load_from(tmp.path()).expect("config").settings().expect("settings");
    assert_eq!(settings.chunking.max_words, 100);
    assert_eq!(settings.retrieval.top_k, 3);
    assert_eq!(settings.index.backend, IndexBackend::Memory);
    assert!((settings.llm.temperature - 0.2).abs() < f32::EPSILON);
}

#[test]
fn config_reads_toml_sections() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        r#"
[chunking]
mode = "window"
window_size = 200
window_overlap = 20

[index]
backend = "lancedb"
distance = "cosine"
collection = "notes"
"#,
    )
    .unwrap();
    let config = Config::load_from(tmp.path()).expect("config");
    let settings = config.settings().expect("settings");
    assert_eq!(settings.chunking.mode, ChunkMode::Window);
    assert_eq!(settings.chunking.strategy().unwrap(), ChunkStrategy::Window { size: 200, overlap: 20 });
    assert_eq!(settings.index.distance, Distance::Cosine);
    let collection: String = config.get("index.collection").unwrap();
    assert_eq!(collection, "notes");
}

#[test]
fn config_rejects_bad_window() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[chunking]\nmode = \"window\"\nwindow_size = 10\nwindow_overlap = 10\n").unwrap();
    assert!(Config::load_from(tmp.path()).is_err());
}

#[test]
fn settings_validate_limits() {
    let mut s = Settings::default();
    assert!(s.validate().is_ok());
    s.retrieval.top_k = 0;
    assert!(matches!(s.validate(), Err(Error::InvalidConfig(_))));
    s.retrieval.top_k = 3;
    s.llm.temperature = 3.5;
    assert!(s.validate().is_err());
}

#[test]
fn settings_validate_rejects_zero_embed_sizes() {
    let mut s = Settings::default();
    s.embed.fake_dim = 0;
    assert!(matches!(s.validate(), Err(Error::InvalidConfig(m)) if m.contains("fake_dim")));
    s.embed.fake_dim = 8;
    s.embed.max_len = 0;
    assert!(matches!(s.validate(), Err(Error::InvalidConfig(m)) if m.contains("max_len")));
}

#[test]
fn config_rejects_zero_fake_dim_from_file() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[embed]\nuse_fake = true\nfake_dim = 0\n").unwrap();
    assert!(Config::load_from(tmp.path()).is_err());
}

#[test]
fn relative_paths_resolve_against_base() {
    let base = Path::new("/srv/ragdb");
    assert_eq!(resolve_with_base(base, "data/txt"), base.join("data/txt"));
    assert_eq!(resolve_with_base(base, "/var/lib/docs"), Path::new("/var/lib/docs"));
}
