//! Data types for documents, chunks, and search results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Metadata key holding the uploaded file name.
pub const SOURCE_KEY: &str = "source";
/// Metadata key holding the 1-based PDF page number.
pub const PAGE_KEY: &str = "page";
/// Metadata key holding a chunk's position within its document.
pub const CHUNK_INDEX_KEY: &str = "chunk_index";

/// The format an uploaded file was read as.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Text,
    Pdf,
}

/// A source document containing extracted text and metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// The extracted text content of the document.
    pub text: String,
    /// Format of the file the text came from.
    pub format: DocumentFormat,
    /// Key-value metadata associated with the document (`source`, `page`).
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Create a plain-text document attributed to `source`.
    pub fn text(id: impl Into<String>, source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            format: DocumentFormat::Text,
            metadata: HashMap::from([(SOURCE_KEY.to_string(), source.into())]),
        }
    }
}

/// A contiguous segment of a [`Document`] with its vector embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier for the chunk (`{document_id}_{index}`).
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// Offset of the first character of `text` within the parent document,
    /// counted in `char`s.
    pub start: usize,
    /// The vector embedding for this chunk's text. Empty until embedded.
    pub embedding: Vec<f32>,
    /// Metadata inherited from the parent document plus `chunk_index`.
    pub metadata: HashMap<String, String>,
    /// The ID of the parent [`Document`].
    pub document_id: String,
}

impl Chunk {
    /// Number of characters in the chunk text.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// The identifier shown to users when this chunk is cited:
    /// `filename` or `filename:pN` for PDF pages.
    ///
    /// Falls back to the document ID when no `source` metadata is present.
    pub fn source_id(&self) -> String {
        let source = self.metadata.get(SOURCE_KEY).unwrap_or(&self.document_id);
        match self.metadata.get(PAGE_KEY) {
            Some(page) => format!("{source}:p{page}"),
            None => source.clone(),
        }
    }
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The cosine similarity score (higher is more relevant).
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_with(metadata: HashMap<String, String>) -> Chunk {
        Chunk {
            id: "doc_0".into(),
            text: "abc".into(),
            start: 0,
            embedding: Vec::new(),
            metadata,
            document_id: "doc".into(),
        }
    }

    #[test]
    fn source_id_includes_page_when_present() {
        let chunk = chunk_with(HashMap::from([
            (SOURCE_KEY.to_string(), "report.pdf".to_string()),
            (PAGE_KEY.to_string(), "3".to_string()),
        ]));
        assert_eq!(chunk.source_id(), "report.pdf:p3");
    }

    #[test]
    fn source_id_falls_back_to_document_id() {
        assert_eq!(chunk_with(HashMap::new()).source_id(), "doc");
    }
}
