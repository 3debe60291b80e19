//! Corpus population from uploaded documents.

use super::{extract_text, DocumentPayload, TextSplitter};
use crate::errors::{AppflowError, DocumentParseError};
use crate::retrieval::{DocType, RetrievalChunk, SearchBackend};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Extensions accepted when ingesting a documentation directory.
const INGESTIBLE_EXTENSIONS: [&str; 3] = ["md", "txt", "pdf"];

/// Splits documents into chunks and stores them in the search backend.
///
/// Ingestion is replace-not-append: each call fully supersedes the prior
/// corpus for the target tag. The system models a current working document
/// set, not a versioned archive.
#[derive(Debug)]
pub struct DocumentIngestor {
    backend: Arc<dyn SearchBackend>,
    splitter: TextSplitter,
}

impl DocumentIngestor {
    /// Creates an ingestor writing to the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn SearchBackend>, splitter: TextSplitter) -> Self {
        Self { backend, splitter }
    }

    /// Ingests one document under a tag, replacing that tag's corpus.
    ///
    /// Returns the number of chunks stored. A document that parses to zero
    /// chunks is an error: there would be nothing to search.
    pub async fn ingest(
        &self,
        payload: &DocumentPayload,
        doc_type: DocType,
    ) -> Result<usize, AppflowError> {
        let content = extract_text(payload)?;
        let chunks = self.chunk(&content, &payload.source, doc_type);

        if chunks.is_empty() {
            return Err(DocumentParseError::new("document produced no chunks")
                .with_source(payload.source.clone())
                .into());
        }

        let count = chunks.len();
        self.backend.replace(doc_type, chunks).await?;
        info!(doc_type = %doc_type, source = %payload.source, chunks = count, "document ingested");
        Ok(count)
    }

    /// Ingests every `.md`/`.txt`/`.pdf` file under a directory as one
    /// combined corpus for the tag.
    ///
    /// Files that fail to parse are logged and skipped; the tag is replaced
    /// once with everything that did parse. Zero usable chunks across the
    /// whole directory is an error.
    pub async fn ingest_directory(
        &self,
        dir: &Path,
        doc_type: DocType,
    ) -> Result<usize, AppflowError> {
        let mut chunks = Vec::new();
        self.collect_dir(dir, dir, doc_type, &mut chunks)?;

        if chunks.is_empty() {
            return Err(DocumentParseError::new("directory produced no chunks")
                .with_source(dir.display().to_string())
                .into());
        }

        let count = chunks.len();
        self.backend.replace(doc_type, chunks).await?;
        info!(doc_type = %doc_type, dir = %dir.display(), chunks = count, "directory ingested");
        Ok(count)
    }

    fn collect_dir(
        &self,
        root: &Path,
        dir: &Path,
        doc_type: DocType,
        chunks: &mut Vec<RetrievalChunk>,
    ) -> Result<(), AppflowError> {
        let entries = std::fs::read_dir(dir).map_err(|e| {
            DocumentParseError::new(format!("cannot read directory: {e}"))
                .with_source(dir.display().to_string())
        })?;

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                self.collect_dir(root, &path, doc_type, chunks)?;
                continue;
            }

            let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            let ext = ext.to_lowercase();
            if !INGESTIBLE_EXTENSIONS.contains(&ext.as_str()) {
                continue;
            }

            let source = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .display()
                .to_string();

            match std::fs::read(&path) {
                Ok(bytes) => {
                    let payload = DocumentPayload::new(bytes, ext, source.clone());
                    match extract_text(&payload) {
                        Ok(content) => {
                            chunks.extend(self.chunk(&content, &source, doc_type));
                        }
                        Err(e) => warn!(source = %source, error = %e, "skipping unparseable file"),
                    }
                }
                Err(e) => warn!(source = %source, error = %e, "skipping unreadable file"),
            }
        }

        Ok(())
    }

    fn chunk(&self, content: &str, source: &str, doc_type: DocType) -> Vec<RetrievalChunk> {
        let chunks: Vec<RetrievalChunk> = self
            .splitter
            .split(content)
            .into_iter()
            .map(|text| RetrievalChunk::new(text, source, doc_type))
            .collect();
        debug!(source = %source, chunks = chunks.len(), "document split");
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::MemoryIndex;
    use pretty_assertions::assert_eq;

    fn ingestor(index: &Arc<MemoryIndex>) -> DocumentIngestor {
        DocumentIngestor::new(index.clone(), TextSplitter::new(40, 10))
    }

    #[tokio::test]
    async fn test_ingest_stores_chunks() {
        let index = Arc::new(MemoryIndex::new());
        let payload = DocumentPayload::text(
            "The app must track quarterly sales figures per region and highlight anomalies.",
            "req.txt",
        );

        let count = ingestor(&index).ingest(&payload, DocType::Requirements).await.unwrap();

        assert!(count > 1);
        assert_eq!(index.chunk_count(DocType::Requirements), count);
    }

    #[tokio::test]
    async fn test_ingest_is_idempotent_replace() {
        let index = Arc::new(MemoryIndex::new());
        let ing = ingestor(&index);
        let payload = DocumentPayload::text(
            "A requirements document that is long enough to split into several chunks of text.",
            "req.txt",
        );

        let first = ing.ingest(&payload, DocType::Requirements).await.unwrap();
        let second = ing.ingest(&payload, DocType::Requirements).await.unwrap();

        assert_eq!(first, second);
        // Replace-not-append: the corpus holds one ingestion's worth.
        assert_eq!(index.chunk_count(DocType::Requirements), first);
    }

    #[tokio::test]
    async fn test_empty_document_is_parse_error() {
        let index = Arc::new(MemoryIndex::new());
        let payload = DocumentPayload::text("", "empty.txt");

        let err = ingestor(&index).ingest(&payload, DocType::Requirements).await.unwrap_err();
        assert!(matches!(err, AppflowError::DocumentParse(_)));
        assert_eq!(index.chunk_count(DocType::Requirements), 0);
    }

    #[tokio::test]
    async fn test_ingest_directory_combines_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), "first doc about charts and tables").unwrap();
        std::fs::write(dir.path().join("b.txt"), "second doc about layout widgets").unwrap();
        std::fs::write(dir.path().join("c.rs"), "ignored source file").unwrap();

        let index = Arc::new(MemoryIndex::new());
        let count = ingestor(&index)
            .ingest_directory(dir.path(), DocType::TechnicalDocs)
            .await
            .unwrap();

        assert!(count >= 2);
        assert_eq!(index.chunk_count(DocType::TechnicalDocs), count);
    }

    #[tokio::test]
    async fn test_ingest_directory_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.txt"), "usable text content here").unwrap();
        std::fs::write(dir.path().join("bad.pdf"), b"not a real pdf").unwrap();

        let index = Arc::new(MemoryIndex::new());
        let count = ingestor(&index)
            .ingest_directory(dir.path(), DocType::ReferenceApps)
            .await
            .unwrap();

        assert!(count >= 1);
    }

    #[tokio::test]
    async fn test_ingest_empty_directory_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let index = Arc::new(MemoryIndex::new());

        let err = ingestor(&index)
            .ingest_directory(dir.path(), DocType::TechnicalDocs)
            .await
            .unwrap_err();
        assert!(matches!(err, AppflowError::DocumentParse(_)));
    }
}
