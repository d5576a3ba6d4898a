//! Document index for question answering over local files.
//!
//! Provides the recursive text splitter used at ingestion, an embedding
//! service trait with Gemini and mock implementations, a brute-force cosine
//! index persisted as JSON, the ingestion pipeline, and the retriever the
//! document-QA chain queries.

pub mod chunker;
pub mod embedding;
pub mod error;
pub mod index;
pub mod ingest;
pub mod retriever;

pub use chunker::TextSplitter;
pub use embedding::{DynEmbeddingService, EmbeddingService, GeminiEmbedding, MockEmbedding};
pub use error::VectorError;
pub use index::{IndexedChunk, SearchHit, VectorIndex};
pub use ingest::{IngestReport, Ingestor};
pub use retriever::{IndexRetriever, Retriever};
