use tracing::{debug, warn};

use super::{DocumentExtractor, ExtractionError};

/// The PDF header must appear within the first 1024 bytes.
const HEADER_WINDOW: usize = 1024;
const PDF_MAGIC: &[u8] = b"%PDF-";
/// Keeps the last word of one page from fusing with the first word of the next.
pub const PAGE_SEPARATOR: &str = "\n";

/// Text-layer extraction backed by `pdf-extract`.
pub struct PdfExtractor;

impl DocumentExtractor for PdfExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        if !has_pdf_header(bytes) {
            return Err(ExtractionError::Malformed(
                "missing %PDF- header".to_string(),
            ));
        }

        let pages = pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| {
            warn!("pdf-extract failed: {e}");
            ExtractionError::Malformed(e.to_string())
        })?;

        debug!("Read {} pages", pages.len());
        Ok(pages.join(PAGE_SEPARATOR))
    }
}

pub fn has_pdf_header(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(HEADER_WINDOW)];
    window.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC)
}
