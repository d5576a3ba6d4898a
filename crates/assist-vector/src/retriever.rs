//! Retrieval of relevant passages for a question.

use std::sync::Arc;

use assist_core::types::Passage;
use async_trait::async_trait;
use tracing::debug;

use crate::embedding::{DynEmbeddingService, EmbeddingService};
use crate::error::VectorError;
use crate::index::VectorIndex;

/// Finds passages relevant to a query.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn find_relevant(&self, query: &str) -> Result<Vec<Passage>, VectorError>;
}

/// Top-k cosine retrieval over a loaded [`VectorIndex`].
///
/// Uses dynamic dispatch for the embedder so production code can supply
/// `GeminiEmbedding` while tests use `MockEmbedding`.
pub struct IndexRetriever {
    index: Arc<VectorIndex>,
    embedder: Box<dyn DynEmbeddingService>,
    top_k: usize,
}

impl IndexRetriever {
    pub fn new(index: Arc<VectorIndex>, embedder: impl EmbeddingService + 'static, top_k: usize) -> Self {
        Self {
            index,
            embedder: Box::new(embedder),
            top_k,
        }
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }
}

#[async_trait]
impl Retriever for IndexRetriever {
    async fn find_relevant(&self, query: &str) -> Result<Vec<Passage>, VectorError> {
        if self.index.is_empty() {
            return Ok(Vec::new());
        }
        let query_vec = self.embedder.embed_boxed(query).await?;
        let hits = self.index.search(&query_vec, self.top_k)?;
        debug!(hits = hits.len(), top_k = self.top_k, "Retrieved passages");

        Ok(hits
            .into_iter()
            .map(|hit| Passage {
                text: hit.text,
                source: hit.source,
                score: hit.score,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbedding;
    use crate::index::IndexedChunk;

    async fn retriever_with(texts: &[&str], top_k: usize) -> IndexRetriever {
        let embedder = MockEmbedding::new();
        let index = VectorIndex::new("mock");
        for text in texts {
            let embedding = embedder.embed(text).await.unwrap();
            index
                .insert(IndexedChunk::new(*text, "report.txt", embedding))
                .unwrap();
        }
        IndexRetriever::new(Arc::new(index), embedder, top_k)
    }

    #[tokio::test]
    async fn test_exact_text_ranks_first() {
        let retriever = retriever_with(&["매출 보고서", "회의록", "휴가 계획"], 4).await;
        let passages = retriever.find_relevant("회의록").await.unwrap();
        assert_eq!(passages.len(), 3);
        assert_eq!(passages[0].text, "회의록");
        assert_eq!(passages[0].source, "report.txt");
        assert!((passages[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_top_k_limits_results() {
        let retriever = retriever_with(&["a", "b", "c", "d", "e", "f"], 4).await;
        let passages = retriever.find_relevant("a").await.unwrap();
        assert_eq!(passages.len(), 4);
    }

    #[tokio::test]
    async fn test_empty_index_returns_nothing() {
        let retriever = retriever_with(&[], 4).await;
        assert!(retriever.find_relevant("anything").await.unwrap().is_empty());
        assert!(retriever.index().is_empty());
    }
}
