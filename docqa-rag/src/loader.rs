//! Turning uploaded files into [`Document`]s.
//!
//! Text files are decoded as UTF-8 with invalid sequences replaced. PDFs are
//! parsed with `lopdf` and produce one document per page so citations can
//! point at a page; a page whose text cannot be extracted becomes an empty
//! document rather than failing the whole upload.

use std::collections::HashMap;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::document::{Document, DocumentFormat, PAGE_KEY, SOURCE_KEY};
use crate::error::{RagError, Result};

impl DocumentFormat {
    /// Detect the format from a file name's extension.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let extension = filename.rsplit_once('.')?.1.to_ascii_lowercase();
        match extension.as_str() {
            "txt" | "md" | "text" => Some(Self::Text),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

/// Load an uploaded file into one or more documents.
///
/// # Errors
///
/// Returns [`RagError::IngestionError`] if the extension is unsupported or a
/// PDF cannot be parsed.
pub fn load(filename: &str, bytes: &[u8]) -> Result<Vec<Document>> {
    let format = DocumentFormat::from_filename(filename).ok_or_else(|| RagError::IngestionError {
        source_name: filename.to_string(),
        message: "unsupported file type (expected .txt, .md or .pdf)".to_string(),
    })?;

    let documents = match format {
        DocumentFormat::Text => vec![load_text(filename, bytes)],
        DocumentFormat::Pdf => load_pdf(filename, bytes)?,
    };
    debug!(filename, ?format, documents = documents.len(), "loaded upload");
    Ok(documents)
}

fn load_text(filename: &str, bytes: &[u8]) -> Document {
    let text = String::from_utf8_lossy(bytes).into_owned();
    Document {
        id: Uuid::new_v4().to_string(),
        text,
        format: DocumentFormat::Text,
        metadata: HashMap::from([(SOURCE_KEY.to_string(), filename.to_string())]),
    }
}

fn load_pdf(filename: &str, bytes: &[u8]) -> Result<Vec<Document>> {
    let pdf = lopdf::Document::load_mem(bytes).map_err(|e| RagError::IngestionError {
        source_name: filename.to_string(),
        message: format!("unreadable PDF: {e}"),
    })?;

    let upload_id = Uuid::new_v4();
    let documents = pdf
        .get_pages()
        .into_keys()
        .map(|page| {
            let text = pdf.extract_text(&[page]).unwrap_or_else(|e| {
                warn!(filename, page, error = %e, "could not extract page text");
                String::new()
            });
            Document {
                id: format!("{upload_id}-p{page}"),
                text,
                format: DocumentFormat::Pdf,
                metadata: HashMap::from([
                    (SOURCE_KEY.to_string(), filename.to_string()),
                    (PAGE_KEY.to_string(), page.to_string()),
                ]),
            }
        })
        .collect();
    Ok(documents)
}
