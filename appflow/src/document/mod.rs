//! Document ingestion: text extraction, chunking, and corpus population.

mod ingestor;
mod splitter;

pub use ingestor::DocumentIngestor;
pub use splitter::TextSplitter;

use crate::errors::DocumentParseError;

/// A raw uploaded document, as handed over by the caller.
#[derive(Debug, Clone)]
pub struct DocumentPayload {
    /// Raw document bytes.
    pub bytes: Vec<u8>,
    /// File extension, lowercase, without the dot (e.g. `pdf`, `txt`).
    pub extension: String,
    /// Source label stored alongside every chunk.
    pub source: String,
}

impl DocumentPayload {
    /// Creates a payload from raw bytes and an extension.
    #[must_use]
    pub fn new(
        bytes: Vec<u8>,
        extension: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            bytes,
            extension: extension.into().to_lowercase(),
            source: source.into(),
        }
    }

    /// Creates a plain-text payload.
    #[must_use]
    pub fn text(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(content.into().into_bytes(), "txt", source)
    }

    /// Creates a PDF payload.
    #[must_use]
    pub fn pdf(bytes: Vec<u8>, source: impl Into<String>) -> Self {
        Self::new(bytes, "pdf", source)
    }
}

/// Extracts plain text from a payload.
///
/// PDF bytes go through the PDF text extractor; anything else is treated as
/// UTF-8 text (lossy). A document that yields no printable text is a parse
/// error.
pub fn extract_text(payload: &DocumentPayload) -> Result<String, DocumentParseError> {
    let content = if payload.extension == "pdf" {
        pdf_extract::extract_text_from_mem(&payload.bytes).map_err(|e| {
            DocumentParseError::new(format!("failed to read PDF: {e}"))
                .with_source(payload.source.clone())
        })?
    } else {
        String::from_utf8_lossy(&payload.bytes).into_owned()
    };

    if content.trim().is_empty() {
        return Err(DocumentParseError::new("document contains no extractable text")
            .with_source(payload.source.clone()));
    }

    Ok(content)
}
