use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::Document;

/// Read one text file. Invalid UTF-8 is decoded lossily rather than rejected.
pub fn load_file(path: &Path) -> Result<Document> {
    if !path.exists() {
        return Err(Error::NotFound(path.display().to_string()));
    }
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => {
            let bytes = fs::read(path).map_err(|source| Error::Io { path: path.display().to_string(), source })?;
            String::from_utf8_lossy(&bytes).to_string()
        }
    };
    debug!(path = %path.display(), bytes = content.len(), "loaded document");
    Ok(Document::new(path.to_string_lossy(), content))
}

/// Load every `.txt` file under `root`, sorted by path.
pub fn load_dir(root: &Path) -> Result<Vec<Document>> {
    load_files(root, None)
}

/// Like [`load_dir`] but keeps only the first `limit` files.
pub fn load_dir_limited(root: &Path, limit: usize) -> Result<Vec<Document>> {
    load_files(root, Some(limit))
}

/// A single file loads as one document; a directory loads all of its `.txt` files.
pub fn load_path(path: &Path) -> Result<Vec<Document>> {
    if path.is_file() { Ok(vec![load_file(path)?]) } else { load_dir(path) }
}

fn load_files(root: &Path, limit: Option<usize>) -> Result<Vec<Document>> {
    if !root.exists() {
        return Err(Error::NotFound(root.display().to_string()));
    }
    let mut files = list_txt_files(root);
    if files.is_empty() {
        info!(root = %root.display(), "no .txt files found");
        return Ok(vec![]);
    }
    if let Some(limit) = limit {
        if files.len() > limit {
            files.truncate(limit);
            info!(limit, "limited to first files");
        }
    }
    let docs = files.iter().map(|p| load_file(p)).collect::<Result<Vec<_>>>()?;
    info!(count = docs.len(), root = %root.display(), "loaded documents");
    Ok(docs)
}

fn list_txt_files(root: &Path) -> Vec<PathBuf> {
    let mut txt_files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("txt"))
        .map(|e| e.path().to_path_buf())
        .collect();
    txt_files.sort();
    txt_files
}
