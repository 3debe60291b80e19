//! In-process search backend with per-tag corpus snapshots.

use super::{DocType, RetrievalChunk, RetrievalQuery, SearchBackend};
use crate::errors::RetrievalError;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Keyword-ranked in-memory search backend.
///
/// Each tag maps to an immutable `Arc` snapshot of its chunks. A search
/// clones the `Arc` under a read lock and ranks against that snapshot, so a
/// concurrent `replace` can never surface a half-swapped corpus.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    corpora: RwLock<HashMap<DocType, Arc<Vec<RetrievalChunk>>>>,
}

impl MemoryIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of chunks stored under a tag.
    #[must_use]
    pub fn chunk_count(&self, doc_type: DocType) -> usize {
        self.corpora
            .read()
            .get(&doc_type)
            .map_or(0, |chunks| chunks.len())
    }

    fn snapshot(&self, doc_type: DocType) -> Option<Arc<Vec<RetrievalChunk>>> {
        self.corpora.read().get(&doc_type).cloned()
    }
}

#[async_trait]
impl SearchBackend for MemoryIndex {
    async fn search(
        &self,
        query: &RetrievalQuery,
        limit: usize,
    ) -> Result<Vec<RetrievalChunk>, RetrievalError> {
        let Some(snapshot) = self.snapshot(query.doc_type) else {
            return Ok(Vec::new());
        };

        let terms = query_terms(&query.text);

        let mut scored: Vec<(usize, f64, &RetrievalChunk)> = snapshot
            .iter()
            .enumerate()
            .filter(|(_, chunk)| match &query.tech_stack {
                Some(tag) => chunk.source.to_lowercase().contains(&tag.to_lowercase()),
                None => true,
            })
            .map(|(idx, chunk)| (idx, score_chunk(&terms, &chunk.text), chunk))
            .collect();

        // Stable sort keeps insertion order for equal scores.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(_, _, chunk)| chunk.clone())
            .collect())
    }

    async fn replace(
        &self,
        doc_type: DocType,
        chunks: Vec<RetrievalChunk>,
    ) -> Result<(), RetrievalError> {
        tracing::debug!(
            doc_type = %doc_type,
            chunks = chunks.len(),
            "replacing corpus"
        );
        self.corpora.write().insert(doc_type, Arc::new(chunks));
        Ok(())
    }
}

fn query_terms(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Counts query term occurrences in the chunk, normalized by chunk length so
/// short chunks are not drowned out by long ones.
fn score_chunk(terms: &[String], text: &str) -> f64 {
    if terms.is_empty() || text.is_empty() {
        return 0.0;
    }
    let haystack = text.to_lowercase();
    let hits: usize = terms.iter().map(|t| haystack.matches(t.as_str()).count()).sum();
    #[allow(clippy::cast_precision_loss)]
    let normalizer = (haystack.len() as f64).max(1.0);
    hits as f64 / normalizer
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chunk(text: &str, source: &str) -> RetrievalChunk {
        RetrievalChunk::new(text, source, DocType::Requirements)
    }

    #[tokio::test]
    async fn test_empty_tag_returns_empty_not_error() {
        let index = MemoryIndex::new();
        let query = RetrievalQuery::new("anything", DocType::TechnicalDocs);

        let results = index.search(&query, 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_ranking_prefers_matching_chunks() {
        let index = MemoryIndex::new();
        index
            .replace(
                DocType::Requirements,
                vec![
                    chunk("the weather is sunny", "doc"),
                    chunk("sales data and revenue trends", "doc"),
                    chunk("sales sales sales", "doc"),
                ],
            )
            .await
            .unwrap();

        let query = RetrievalQuery::new("sales", DocType::Requirements);
        let results = index.search(&query, 2).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].text, "sales sales sales");
        assert_eq!(results[1].text, "sales data and revenue trends");
    }

    #[tokio::test]
    async fn test_ties_broken_by_insertion_order() {
        let index = MemoryIndex::new();
        index
            .replace(
                DocType::Requirements,
                vec![chunk("first", "doc"), chunk("second", "doc")],
            )
            .await
            .unwrap();

        // No term matches anything: all scores equal, order preserved.
        let query = RetrievalQuery::new("zzz", DocType::Requirements);
        let results = index.search(&query, 5).await.unwrap();

        assert_eq!(results[0].text, "first");
        assert_eq!(results[1].text, "second");
    }

    #[tokio::test]
    async fn test_replace_supersedes_prior_corpus() {
        let index = MemoryIndex::new();
        index
            .replace(DocType::Requirements, vec![chunk("old", "v1")])
            .await
            .unwrap();
        index
            .replace(DocType::Requirements, vec![chunk("new", "v2"), chunk("newer", "v2")])
            .await
            .unwrap();

        assert_eq!(index.chunk_count(DocType::Requirements), 2);

        let query = RetrievalQuery::new("old", DocType::Requirements);
        let results = index.search(&query, 5).await.unwrap();
        assert!(results.iter().all(|c| c.source == "v2"));
    }

    #[tokio::test]
    async fn test_tech_stack_filters_by_source() {
        let index = MemoryIndex::new();
        index
            .replace(
                DocType::TechnicalDocs,
                vec![
                    RetrievalChunk::new("chart docs", "plotting/charts.md", DocType::TechnicalDocs),
                    RetrievalChunk::new("chart guide", "frames/tables.md", DocType::TechnicalDocs),
                ],
            )
            .await
            .unwrap();

        let query =
            RetrievalQuery::new("chart", DocType::TechnicalDocs).with_tech_stack("plotting");
        let results = index.search(&query, 5).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "plotting/charts.md");
    }

    #[tokio::test]
    async fn test_tags_are_isolated() {
        let index = MemoryIndex::new();
        index
            .replace(DocType::Requirements, vec![chunk("req text", "doc")])
            .await
            .unwrap();

        let query = RetrievalQuery::new("req", DocType::ReferenceApps);
        assert!(index.search(&query, 5).await.unwrap().is_empty());
    }
}
