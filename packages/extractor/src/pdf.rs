//! Source document loading.
//!
//! PDFs go through `pdf-extract`; plain-text files are accepted as they are,
//! with form feeds marking page breaks.

use std::path::Path;

use lawtext_core::types::RawDocument;
use tracing::{debug, info};

use crate::error::{ExtractorError, Result};

/// Page separator used when pages are joined into one text.
pub const PAGE_BREAK: char = '\x0C';

/// Load a source document from a `.pdf` or text file.
///
/// # Errors
/// Fails when the file cannot be read, the PDF cannot be parsed, or no
/// text could be extracted (for example from a scanned PDF).
pub fn load_document(path: &Path) -> Result<RawDocument> {
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));

    let document = if is_pdf {
        let bytes = std::fs::read(path)?;
        pdf_to_document(&bytes, path)?
    } else {
        text_to_document(std::fs::read_to_string(path)?)
    };

    if document.text.trim().is_empty() {
        return Err(ExtractorError::InvalidInput(format!(
            "no extractable text in {} (scanned PDFs need OCR first)",
            path.display()
        )));
    }

    info!(
        path = %path.display(),
        pages = document.total_pages,
        characters = document.total_characters,
        "loaded document"
    );
    Ok(document)
}

fn pdf_to_document(bytes: &[u8], path: &Path) -> Result<RawDocument> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| {
        ExtractorError::Pdf {
            path: path.display().to_string(),
            message: e.to_string(),
        }
    })?;
    debug!(pages = pages.len(), "extracted PDF pages");

    let total_pages = pages.len();
    let text = pages.join(&PAGE_BREAK.to_string());
    Ok(RawDocument::new(text, total_pages))
}

/// Build a document from plain text, counting form-feed separated pages.
pub fn text_to_document(text: String) -> RawDocument {
    let total_pages = if text.is_empty() {
        0
    } else {
        text.matches(PAGE_BREAK).count() + 1
    };
    RawDocument::new(text, total_pages)
}
