//! In-memory vector index with brute-force cosine similarity search.
//!
//! The index is built by `assist ingest`, written to `index.json` under the
//! vector store directory, and loaded once at server startup. Search is
//! O(n), which is fine for a personal document folder.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::VectorError;

/// File name of the persisted index inside the vector store directory.
pub const INDEX_FILE: &str = "index.json";

/// A chunk of a source document with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub id: Uuid,
    pub text: String,
    /// Source path relative to the ingested directory.
    pub source: String,
    pub embedding: Vec<f32>,
}

impl IndexedChunk {
    pub fn new(text: impl Into<String>, source: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            source: source.into(),
            embedding,
        }
    }
}

/// A single hit returned from a vector search.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: Uuid,
    /// Cosine similarity score.
    pub score: f64,
    pub text: String,
    pub source: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    embedding_model: String,
    built_at: DateTime<Utc>,
    chunks: Vec<IndexedChunk>,
}

/// In-memory vector index using brute-force cosine similarity.
///
/// Thread-safe via interior RwLock; request handlers only take the read
/// side.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    entries: Arc<RwLock<HashMap<Uuid, IndexedChunk>>>,
    embedding_model: String,
}

impl VectorIndex {
    pub fn new(embedding_model: impl Into<String>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            embedding_model: embedding_model.into(),
        }
    }

    /// Path of the index file for a vector store directory.
    pub fn file_path(store_dir: &Path) -> PathBuf {
        store_dir.join(INDEX_FILE)
    }

    /// Insert a chunk. Overwrites any existing entry with the same ID.
    pub fn insert(&self, chunk: IndexedChunk) -> Result<(), VectorError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| VectorError::Index(format!("Lock poisoned: {}", e)))?;
        entries.insert(chunk.id, chunk);
        Ok(())
    }

    /// Search for the k nearest chunks to the query vector by cosine similarity.
    ///
    /// Returns results sorted by descending similarity score.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, VectorError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| VectorError::Index(format!("Lock poisoned: {}", e)))?;

        let mut scored: Vec<SearchHit> = entries
            .values()
            .map(|chunk| SearchHit {
                id: chunk.id,
                score: cosine_similarity(query, &chunk.embedding),
                text: chunk.text.clone(),
                source: chunk.source.clone(),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored)
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Write the index to `store_dir/index.json`, creating the directory.
    pub fn save(&self, store_dir: &Path) -> Result<PathBuf, VectorError> {
        let chunks: Vec<IndexedChunk> = {
            let entries = self
                .entries
                .read()
                .map_err(|e| VectorError::Index(format!("Lock poisoned: {}", e)))?;
            entries.values().cloned().collect()
        };

        std::fs::create_dir_all(store_dir)?;
        let path = Self::file_path(store_dir);
        let file = IndexFile {
            embedding_model: self.embedding_model.clone(),
            built_at: Utc::now(),
            chunks,
        };
        std::fs::write(&path, serde_json::to_vec(&file)?)?;
        info!(path = %path.display(), chunks = file.chunks.len(), "Vector index saved");
        Ok(path)
    }

    /// Load `store_dir/index.json`.
    ///
    /// Fails with [`VectorError::IndexMissing`] when the file does not exist.
    pub fn load(store_dir: &Path) -> Result<Self, VectorError> {
        let path = Self::file_path(store_dir);
        if !path.exists() {
            return Err(VectorError::IndexMissing(path));
        }

        let content = std::fs::read(&path)?;
        let file: IndexFile = serde_json::from_slice(&content)?;
        let entries: HashMap<Uuid, IndexedChunk> =
            file.chunks.into_iter().map(|c| (c.id, c)).collect();

        info!(
            path = %path.display(),
            chunks = entries.len(),
            model = %file.embedding_model,
            built_at = %file.built_at,
            "Vector index loaded"
        );
        Ok(Self {
            entries: Arc::new(RwLock::new(entries)),
            embedding_model: file.embedding_model,
        })
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude or the lengths differ.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();

    let mag_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}
