//! Retrieval types and the search backend seam.
//!
//! The engine treats search as a black box behind [`SearchBackend`]: any
//! keyword or embedding-based service that can replace a tagged corpus and
//! return ranked chunks is interchangeable. [`MemoryIndex`] is the in-process
//! implementation used by default and in tests.

mod memory;

pub use memory::MemoryIndex;

use crate::errors::RetrievalError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of document corpus tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocType {
    /// Uploaded business requirements documents.
    Requirements,
    /// Framework and library documentation.
    TechnicalDocs,
    /// Reference application sources used as pattern guidance.
    ReferenceApps,
}

impl DocType {
    /// Returns the stable string form of the tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Requirements => "requirements",
            Self::TechnicalDocs => "technical-docs",
            Self::ReferenceApps => "reference-apps",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored chunk of document text. Immutable once ingested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalChunk {
    /// The chunk text.
    pub text: String,
    /// Identifier of the document the chunk came from.
    pub source: String,
    /// The corpus tag the chunk is stored under.
    pub doc_type: DocType,
}

impl RetrievalChunk {
    /// Creates a new chunk.
    #[must_use]
    pub fn new(text: impl Into<String>, source: impl Into<String>, doc_type: DocType) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            doc_type,
        }
    }
}

/// A search request. Constructed per call; does not outlive it.
#[derive(Debug, Clone)]
pub struct RetrievalQuery {
    /// Free-text query.
    pub text: String,
    /// Corpus tag to search.
    pub doc_type: DocType,
    /// Optional technology-stack tag narrowing results by source.
    pub tech_stack: Option<String>,
}

impl RetrievalQuery {
    /// Creates a new query.
    #[must_use]
    pub fn new(text: impl Into<String>, doc_type: DocType) -> Self {
        Self {
            text: text.into(),
            doc_type,
            tech_stack: None,
        }
    }

    /// Narrows the query to sources matching a technology-stack tag.
    #[must_use]
    pub fn with_tech_stack(mut self, tech_stack: impl Into<String>) -> Self {
        self.tech_stack = Some(tech_stack.into());
        self
    }
}

/// The search backend seam.
///
/// Implementations must be safely callable from concurrent stages: `search`
/// is a pure read, and a `replace` must never let a concurrent search observe
/// a mix of old and new chunks for the same tag.
#[async_trait]
pub trait SearchBackend: Send + Sync + fmt::Debug {
    /// Returns the top-`limit` chunks ranked by relevance for the query.
    ///
    /// A tag with no ingested chunks yields an empty vec, never an error.
    /// Ties are broken by insertion order.
    async fn search(
        &self,
        query: &RetrievalQuery,
        limit: usize,
    ) -> Result<Vec<RetrievalChunk>, RetrievalError>;

    /// Replaces the entire corpus stored under a tag.
    ///
    /// Ingestion is not additive: each call fully supersedes the prior corpus
    /// for that tag.
    async fn replace(
        &self,
        doc_type: DocType,
        chunks: Vec<RetrievalChunk>,
    ) -> Result<(), RetrievalError>;
}

/// Formats retrieved chunks into a readable context block for a prompt.
#[must_use]
pub fn format_context(chunks: &[RetrievalChunk]) -> String {
    chunks
        .iter()
        .map(|c| format!("Document ({}): {}", c.source, c.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}
