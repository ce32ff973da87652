//! Document text extraction: turns an uploaded resume into plain text.
//!
//! Extraction is CPU-bound and the PDF library may panic on hostile input, so
//! it always runs on the blocking pool.

use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

pub mod pdf;

pub use pdf::PdfExtractor;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("not a readable PDF: {0}")]
    Malformed(String),

    #[error("document has no extractable text layer")]
    NoTextLayer,
}

/// Converts document bytes into text, pages joined in order.
pub trait DocumentExtractor: Send + Sync {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// Extracts resume text off the async runtime. Never returns blank text.
pub async fn extract_resume_text(
    extractor: Arc<dyn DocumentExtractor>,
    bytes: Bytes,
) -> Result<String, ExtractionError> {
    let size = bytes.len();
    let text = tokio::task::spawn_blocking(move || extractor.extract_text(&bytes))
        .await
        .map_err(|e| {
            if e.is_panic() {
                ExtractionError::Malformed("PDF parser aborted on this document".to_string())
            } else {
                ExtractionError::Malformed(format!("extraction task failed: {e}"))
            }
        })??;

    let text = normalize_whitespace(&text);
    if text.is_empty() {
        return Err(ExtractionError::NoTextLayer);
    }

    debug!("Extracted {} chars from {} byte document", text.len(), size);
    Ok(text)
}

/// Trims trailing spaces per line and collapses runs of blank lines.
fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}
