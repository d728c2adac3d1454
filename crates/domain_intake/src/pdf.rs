//! PDF text extraction

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

/// Content types treated as PDF
const PDF_CONTENT_TYPES: [&str; 1] = ["application/pdf"];

pub fn is_pdf(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    PDF_CONTENT_TYPES.iter().any(|t| t.eq_ignore_ascii_case(essence))
}

/// Extracts the text layer of a PDF
///
/// Never fails: unreadable documents yield an empty string. NUL
/// characters are removed since PostgreSQL text columns reject them.
pub fn extract_pdf_text(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return String::new();
    }

    // pdf-extract panics on some malformed cross-reference tables
    let result = panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes)));
    match result {
        Ok(Ok(text)) => {
            let text = text.replace('\0', "");
            debug!(chars = text.len(), "extracted PDF text");
            text
        }
        Ok(Err(e)) => {
            warn!(error = %e, "failed to extract PDF text");
            String::new()
        }
        Err(_) => {
            warn!("PDF parser panicked, treating document as empty");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_content_types() {
        assert!(is_pdf("application/pdf"));
        assert!(is_pdf("Application/PDF; name=\"policy.pdf\""));
        assert!(!is_pdf("image/jpeg"));
        assert!(!is_pdf(""));
    }

    #[test]
    fn test_garbage_yields_empty_text() {
        assert_eq!(extract_pdf_text(b"this is not a pdf"), "");
        assert_eq!(extract_pdf_text(&[]), "");
    }
}
