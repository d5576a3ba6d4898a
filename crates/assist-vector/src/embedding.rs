//! Embedding service trait and implementations.
//!
//! - `GeminiEmbedding` calls the Gemini `embedContent` endpoint. This is the
//!   production embedding backend for both ingestion and queries.
//! - `MockEmbedding` provides deterministic hash-based vectors for testing.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use assist_core::config::LlmConfig;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::VectorError;

/// Service for generating text embeddings.
///
/// Implementations convert text into fixed-dimensional vectors. The same
/// service must be used for ingestion and for queries.
pub trait EmbeddingService: Send + Sync {
    /// Generate an embedding vector for the given text.
    fn embed(
        &self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<Vec<f32>, VectorError>> + Send;

    /// Name of the embedding model, recorded in the index file.
    fn model_name(&self) -> &str;
}

/// Object-safe version of [`EmbeddingService`] for dynamic dispatch.
///
/// `EmbeddingService::embed` returns `impl Future` and so is not
/// object-safe; this trait boxes the future instead. Every
/// `EmbeddingService` implements it through the blanket impl below.
pub trait DynEmbeddingService: Send + Sync {
    fn embed_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<f32>, VectorError>> + Send + 'a>>;

    fn model_name(&self) -> &str;
}

impl<T: EmbeddingService> DynEmbeddingService for T {
    fn embed_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<f32>, VectorError>> + Send + 'a>> {
        Box::pin(self.embed(text))
    }

    fn model_name(&self) -> &str {
        EmbeddingService::model_name(self)
    }
}

// ---------------------------------------------------------------------------
// GeminiEmbedding - hosted embedding model
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

/// Gemini `embedContent` client.
pub struct GeminiEmbedding {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl std::fmt::Debug for GeminiEmbedding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiEmbedding")
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiEmbedding {
    pub fn new(config: &LlmConfig) -> Result<Self, VectorError> {
        if config.api_key.trim().is_empty() {
            return Err(VectorError::Embedding("API key is not configured".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| VectorError::Embedding(e.to_string()))?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.embedding_model.clone(),
        })
    }
}

impl EmbeddingService for GeminiEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, VectorError> {
        if text.trim().is_empty() {
            return Err(VectorError::Embedding("Cannot embed empty text".into()));
        }

        let url = format!("{}/models/{}:embedContent", self.api_base, self.model);
        let body = json!({
            "model": format!("models/{}", self.model),
            "content": {"parts": [{"text": text}]},
        });

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| VectorError::Embedding(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(VectorError::Embedding(format!("{}: {}", status, detail)));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| VectorError::Embedding(e.to_string()))?;
        debug!(dims = parsed.embedding.values.len(), "Embedded text");
        Ok(parsed.embedding.values)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ---------------------------------------------------------------------------
// MockEmbedding - deterministic hash-based vectors for testing
// ---------------------------------------------------------------------------

/// Mock embedding service that returns deterministic 384-dimensional vectors.
///
/// The output is derived from a hash of the input text, so identical inputs
/// always produce identical outputs.
#[derive(Debug, Clone, Default)]
pub struct MockEmbedding;

impl MockEmbedding {
    pub fn new() -> Self {
        Self
    }

    fn hash_to_vector(text: &str) -> Vec<f32> {
        let mut result = Vec::with_capacity(384);
        for i in 0..384 {
            let mut hasher = DefaultHasher::new();
            text.hash(&mut hasher);
            i.hash(&mut hasher);
            let h = hasher.finish();
            let val = ((h as f64) / (u64::MAX as f64)) * 2.0 - 1.0;
            result.push(val as f32);
        }

        let norm: f32 = result.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in &mut result {
                *val /= norm;
            }
        }

        result
    }
}

impl EmbeddingService for MockEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, VectorError> {
        if text.is_empty() {
            return Err(VectorError::Embedding("Cannot embed empty text".into()));
        }
        Ok(Self::hash_to_vector(text))
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
