//! Text extraction seam for document submissions.
//!
//! PDF/DOCX/Markdown extraction is delegated to external collaborators
//! implementing [`TextExtractor`]; the core ships only the plain-text
//! passthrough. Extraction failures surface synchronously at submission.

use thiserror::Error;

/// Kind of submitted document, as declared by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Markdown,
    Pdf,
    Docx,
}

/// Extraction failure from a collaborator.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ExtractError(pub String);

impl ExtractError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Turns uploaded document bytes into UTF-8 text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8], kind: DocumentKind) -> Result<String, ExtractError>;
}

/// Passthrough extractor for plain text uploads.
///
/// Invalid UTF-8 sequences are replaced rather than rejected, matching
/// lenient text-file handling.
#[derive(Debug, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8], kind: DocumentKind) -> Result<String, ExtractError> {
        match kind {
            DocumentKind::PlainText => Ok(String::from_utf8_lossy(bytes).into_owned()),
            other => Err(ExtractError::new(format!(
                "unsupported document kind {other:?}; configure a dedicated extractor"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_passthrough() {
        let extractor = PlainTextExtractor;
        let text = extractor
            .extract(b"hello world", DocumentKind::PlainText)
            .unwrap();
        assert_eq!(text, "hello world");
    }

    #[test]
    fn test_invalid_utf8_replaced() {
        let extractor = PlainTextExtractor;
        let text = extractor
            .extract(&[b'h', b'i', 0xFF], DocumentKind::PlainText)
            .unwrap();
        assert!(text.starts_with("hi"));
    }

    #[test]
    fn test_other_kinds_rejected() {
        let extractor = PlainTextExtractor;
        assert!(extractor.extract(b"%PDF-1.4", DocumentKind::Pdf).is_err());
    }
}
