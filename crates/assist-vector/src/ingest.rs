//! Document ingestion pipeline.
//!
//! Walks a directory for `*.txt` files, splits each into chunks, embeds
//! every chunk, and collects them into a [`VectorIndex`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::chunker::TextSplitter;
use crate::embedding::EmbeddingService;
use crate::error::VectorError;
use crate::index::{IndexedChunk, VectorIndex};

/// Summary of an ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
    /// Files skipped because they were unreadable or not UTF-8.
    pub skipped: Vec<String>,
}

/// Builds an index from a document folder.
pub struct Ingestor<E: EmbeddingService> {
    embedder: E,
    splitter: TextSplitter,
}

impl<E: EmbeddingService> Ingestor<E> {
    pub fn new(embedder: E, splitter: TextSplitter) -> Self {
        Self { embedder, splitter }
    }

    /// Ingest every `*.txt` file under `source_dir` into a fresh index.
    pub async fn ingest_dir(&self, source_dir: &Path) -> Result<(VectorIndex, IngestReport), VectorError> {
        if !source_dir.is_dir() {
            return Err(VectorError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("document directory {} not found", source_dir.display()),
            )));
        }

        let index = VectorIndex::new(self.embedder.model_name());
        let mut report = IngestReport::default();

        let mut files: Vec<_> = WalkDir::new(source_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(err) => {
                    warn!(error = %err, "Skipping unreadable directory entry");
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "txt"))
            .map(|e| e.into_path())
            .collect();
        files.sort();

        for path in files {
            let source = path
                .strip_prefix(source_dir)
                .unwrap_or(&path)
                .display()
                .to_string();

            let text = match std::fs::read_to_string(&path) {
                Ok(t) => t,
                Err(e) => {
                    warn!(file = %source, error = %e, "Skipping unreadable document");
                    report.skipped.push(source);
                    continue;
                }
            };

            let added = self.ingest_text(&index, &text, &source).await?;
            debug!(file = %source, chunks = added, "Document ingested");
            report.documents += 1;
            report.chunks += added;
        }

        if report.documents == 0 {
            warn!(dir = %source_dir.display(), "No .txt documents found");
        } else {
            info!(
                documents = report.documents,
                chunks = report.chunks,
                "Ingestion complete"
            );
        }
        Ok((index, report))
    }

    /// Split and embed one document into `index`. Returns the number of
    /// chunks added.
    pub async fn ingest_text(
        &self,
        index: &VectorIndex,
        text: &str,
        source: &str,
    ) -> Result<usize, VectorError> {
        let chunks = self.splitter.split(text);
        for chunk in &chunks {
            let embedding = self.embedder.embed(chunk).await?;
            index.insert(IndexedChunk::new(chunk.clone(), source, embedding))?;
        }
        Ok(chunks.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbedding;

    fn ingestor() -> Ingestor<MockEmbedding> {
        Ingestor::new(MockEmbedding::new(), TextSplitter::new(40, 5))
    }

    #[tokio::test]
    async fn test_ingest_dir_reads_nested_txt_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "분기 보고서 요약입니다.").unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("b.txt"), "nested notes").unwrap();
        std::fs::write(dir.path().join("c.md"), "ignored").unwrap();

        let (index, report) = ingestor().ingest_dir(dir.path()).await.unwrap();
        assert_eq!(report.documents, 2);
        assert_eq!(report.chunks, 2);
        assert_eq!(index.len(), 2);
        assert!(report.skipped.is_empty());

        let query = MockEmbedding::new().embed("nested notes").await.unwrap();
        let hits = index.search(&query, 1).unwrap();
        assert_eq!(hits[0].text, "nested notes");
        assert_eq!(hits[0].source, Path::new("sub").join("b.txt").display().to_string());
    }

    #[tokio::test]
    async fn test_long_document_is_chunked() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("long.txt"),
            "word ".repeat(100),
        )
        .unwrap();
        let (index, report) = ingestor().ingest_dir(dir.path()).await.unwrap();
        assert_eq!(report.documents, 1);
        assert!(report.chunks > 1);
        assert_eq!(index.len(), report.chunks);
    }

    #[tokio::test]
    async fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let (index, report) = ingestor().ingest_dir(dir.path()).await.unwrap();
        assert_eq!(report.documents, 0);
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_whitespace_document_adds_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("blank.txt"), "  \n\n ").unwrap();
        let (index, report) = ingestor().ingest_dir(dir.path()).await.unwrap();
        assert_eq!(report.documents, 1);
        assert_eq!(report.chunks, 0);
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_non_utf8_file_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bin.txt"), [0xff, 0xfe, 0x00]).unwrap();
        let (_, report) = ingestor().ingest_dir(dir.path()).await.unwrap();
        assert_eq!(report.skipped, vec!["bin.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let err = ingestor()
            .ingest_dir(Path::new("/nonexistent/documents"))
            .await
            .unwrap_err();
        assert!(matches!(err, VectorError::Io(_)));
    }
}
