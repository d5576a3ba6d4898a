use std::path::PathBuf;

use assist_core::error::AssistError;

/// Errors from embedding, indexing and retrieval.
#[derive(Debug, thiserror::Error)]
pub enum VectorError {
    /// The index file has not been built yet.
    #[error("vector index not found at {0}; run `assist ingest` first")]
    IndexMissing(PathBuf),
    #[error("embedding error: {0}")]
    Embedding(String),
    #[error("index error: {0}")]
    Index(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for VectorError {
    fn from(err: serde_json::Error) -> Self {
        VectorError::Serialization(err.to_string())
    }
}

impl From<VectorError> for AssistError {
    fn from(err: VectorError) -> Self {
        AssistError::Retrieval(err.to_string())
    }
}
