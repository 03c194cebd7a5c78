//! Text extraction for submission documents.
//!
//! The document type comes from the `%PDF` signature, then the declared content type, then
//! the file extension. PDFs go through `pdf-extract`; text documents must be valid UTF-8.
//! Anything else is rejected so that binary content never reaches the scorer.

use anyhow::{Result, anyhow, bail};
use mime_guess::Mime;
use std::panic;

const PDF_SIGNATURE: &[u8] = b"%PDF-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Text,
    /// Recognised but not extractable (images, archives, office files...).
    Unsupported(String),
}

fn is_text_mime(mime: &Mime) -> bool {
    mime.type_().as_str() == "text"
        || matches!(mime.essence_str(), "application/json" | "application/xml")
}

fn kind_of(mime: &Mime) -> DocumentKind {
    if mime.essence_str() == "application/pdf" {
        DocumentKind::Pdf
    } else if is_text_mime(mime) {
        DocumentKind::Text
    } else {
        DocumentKind::Unsupported(mime.essence_str().to_string())
    }
}

/// Works out how to read `bytes`.
///
/// `name` is a file name or URL path used for extension lookup; `content_type` is a declared
/// MIME type. Generic types (`application/octet-stream`) are ignored. When nothing is known
/// the content is sniffed: NUL-free UTF-8 counts as text.
pub fn detect(bytes: &[u8], name: Option<&str>, content_type: Option<&str>) -> DocumentKind {
    if bytes.starts_with(PDF_SIGNATURE) {
        return DocumentKind::Pdf;
    }

    let declared = content_type
        .and_then(|ct| ct.parse::<Mime>().ok())
        .filter(|m| m.essence_str() != "application/octet-stream");
    if let Some(mime) = declared {
        return kind_of(&mime);
    }

    if let Some(mime) = name.and_then(|n| mime_guess::from_path(n).first()) {
        return kind_of(&mime);
    }

    if !bytes.contains(&0) && std::str::from_utf8(bytes).is_ok() {
        DocumentKind::Text
    } else {
        DocumentKind::Unsupported("application/octet-stream".to_string())
    }
}

fn pdf_text(bytes: &[u8]) -> Result<String> {
    // pdf-extract panics on some malformed files
    match panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(anyhow!("PDF extraction failed: {e:?}")),
        Err(_) => bail!("PDF extraction panicked"),
    }
}

/// Extracts plain text from a document.
///
/// # Errors
/// Unsupported types, undecodable text and unreadable PDFs.
pub fn extract_document(
    bytes: &[u8],
    name: Option<&str>,
    content_type: Option<&str>,
) -> Result<String> {
    match detect(bytes, name, content_type) {
        DocumentKind::Pdf => pdf_text(bytes),
        DocumentKind::Text => {
            if bytes.contains(&0) {
                bail!("text document contains NUL bytes");
            }
            String::from_utf8(bytes.to_vec()).map_err(|e| anyhow!("text is not valid UTF-8: {e}"))
        }
        DocumentKind::Unsupported(mime) => bail!("unsupported document type {mime}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_signature_wins_over_name_and_header() {
        let bytes = b"%PDF-1.4\n%garbage";
        assert_eq!(detect(bytes, Some("essay.txt"), Some("text/plain")), DocumentKind::Pdf);
        assert_eq!(detect(b"hello", Some("essay.pdf"), None), DocumentKind::Pdf);
        assert_eq!(
            detect(b"hello", None, Some("application/pdf; charset=binary")),
            DocumentKind::Pdf
        );
    }

    #[test]
    fn text_types_are_recognised() {
        assert_eq!(detect(b"x", Some("notes.md"), None), DocumentKind::Text);
        assert_eq!(detect(b"x", Some("notes.txt"), None), DocumentKind::Text);
        assert_eq!(
            detect(b"x", None, Some("text/plain; charset=utf-8")),
            DocumentKind::Text
        );
        assert_eq!(
            detect(b"plain words", Some("download"), Some("application/octet-stream")),
            DocumentKind::Text
        );
    }

    #[test]
    fn binary_types_are_unsupported() {
        assert_eq!(
            detect(b"\x89PNG\r\n", Some("scan.png"), None),
            DocumentKind::Unsupported("image/png".into())
        );
        assert!(matches!(
            detect(b"a\0b", None, None),
            DocumentKind::Unsupported(_)
        ));
        assert!(extract_document(b"PK\x03\x04", Some("essay.zip"), None).is_err());
    }

    #[test]
    fn text_must_decode_cleanly() {
        assert_eq!(
            extract_document("café".as_bytes(), Some("a.txt"), None).unwrap(),
            "café"
        );
        assert!(extract_document(b"caf\xe9", Some("a.txt"), None).is_err());
        assert!(extract_document(b"a\0b", Some("a.txt"), None).is_err());
    }

    #[test]
    fn broken_pdf_yields_no_text() {
        let text = extract_document(b"%PDF-1.4\nobj endobj xref %%EOF", None, None).unwrap_or_default();
        assert!(!text.contains("endobj"));
        assert!(!text.contains("xref"));
    }
}
