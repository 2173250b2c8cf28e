//! The single resume document attached to the whole tracker.
//!
//! Stored as a `data:<mime>;base64,<payload>` string so the slot holds one
//! self-describing value.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::Path;

use crate::error::ResumeError;

pub const PDF_MIME: &str = "application/pdf";
pub const FALLBACK_MIME: &str = "application/octet-stream";

/// Roughly what one browser local-storage origin allows.
pub const MAX_DOCUMENT_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeDocument {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ResumeDocument {
    pub fn from_bytes(mime: impl Into<String>, bytes: Vec<u8>) -> Result<Self, ResumeError> {
        if bytes.is_empty() {
            return Err(ResumeError::Empty);
        }
        let size = bytes.len() as u64;
        if size > MAX_DOCUMENT_BYTES {
            return Err(ResumeError::TooLarge {
                size,
                limit: MAX_DOCUMENT_BYTES,
            });
        }
        Ok(Self {
            mime: mime.into(),
            bytes,
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_pdf(&self) -> bool {
        self.mime == PDF_MIME
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }

    pub fn from_data_url(url: &str) -> Result<Self, ResumeError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or(ResumeError::MalformedDataUrl)?;
        let (header, payload) = rest.split_once(',').ok_or(ResumeError::MalformedDataUrl)?;
        let mut parts = header.split(';');
        let mime = parts.next().filter(|m| !m.is_empty()).unwrap_or(FALLBACK_MIME);
        // data:application/pdf;name=cv.pdf;base64,... is also valid
        if !parts.any(|p| p == "base64") {
            return Err(ResumeError::MalformedDataUrl);
        }
        let bytes = STANDARD.decode(payload.trim())?;
        Self::from_bytes(mime, bytes)
    }
}

pub fn guess_mime(path: &Path, bytes: &[u8]) -> &'static str {
    let pdf_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if bytes.starts_with(b"%PDF") || pdf_extension {
        PDF_MIME
    } else {
        FALLBACK_MIME
    }
}

/// Reads a picked or dropped file into a document.
pub async fn read_document(path: &Path) -> Result<ResumeDocument, ResumeError> {
    let size = tokio::fs::metadata(path).await?.len();
    if size > MAX_DOCUMENT_BYTES {
        return Err(ResumeError::TooLarge {
            size,
            limit: MAX_DOCUMENT_BYTES,
        });
    }
    let bytes = tokio::fs::read(path).await?;
    let mime = guess_mime(path, &bytes);
    log::info!(
        "event=resume_read module=resume status=ok bytes={} mime={}",
        bytes.len(),
        mime
    );
    ResumeDocument::from_bytes(mime, bytes)
}

/// Runs `read_document` to completion on a current-thread runtime.
pub fn read_document_blocking(path: &Path) -> Result<ResumeDocument, ResumeError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(read_document(path))
}

/// Turns a terminal paste into a path. Dropping a file onto most terminals
/// pastes its path, sometimes quoted or as a `file://` URL.
pub fn path_from_drop(pasted: &str) -> Option<&Path> {
    let trimmed = pasted.trim();
    let unquoted = trimmed
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
        .unwrap_or(trimmed);
    let path = unquoted.strip_prefix("file://").unwrap_or(unquoted);
    if path.is_empty() || path.contains('\n') {
        None
    } else {
        Some(Path::new(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_roundtrip() {
        let doc = ResumeDocument::from_bytes(PDF_MIME, b"%PDF-1.7 hello".to_vec()).unwrap();
        let url = doc.to_data_url();
        assert!(url.starts_with("data:application/pdf;base64,"));
        assert_eq!(ResumeDocument::from_data_url(&url).unwrap(), doc);
    }

    #[test]
    fn test_from_data_url_accepts_extra_parameters() {
        let url = format!("data:application/pdf;name=cv.pdf;base64,{}", STANDARD.encode(b"%PDF"));
        let doc = ResumeDocument::from_data_url(&url).unwrap();
        assert!(doc.is_pdf());
        assert_eq!(doc.bytes, b"%PDF");
    }

    #[test]
    fn test_from_data_url_rejects_garbage() {
        assert!(matches!(
            ResumeDocument::from_data_url("not a url"),
            Err(ResumeError::MalformedDataUrl)
        ));
        assert!(matches!(
            ResumeDocument::from_data_url("data:text/plain,hello"),
            Err(ResumeError::MalformedDataUrl)
        ));
        assert!(matches!(
            ResumeDocument::from_data_url("data:application/pdf;base64,@@@"),
            Err(ResumeError::Decode(_))
        ));
        assert!(matches!(
            ResumeDocument::from_data_url("data:application/pdf;base64,"),
            Err(ResumeError::Empty)
        ));
    }

    #[test]
    fn test_too_large_rejected() {
        let bytes = vec![0u8; MAX_DOCUMENT_BYTES as usize + 1];
        assert!(matches!(
            ResumeDocument::from_bytes(PDF_MIME, bytes),
            Err(ResumeError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime(Path::new("cv.PDF"), b"junk"), PDF_MIME);
        assert_eq!(guess_mime(Path::new("cv"), b"%PDF-1.4"), PDF_MIME);
        assert_eq!(guess_mime(Path::new("cv.docx"), b"PK"), FALLBACK_MIME);
    }

    #[test]
    fn test_path_from_drop() {
        assert_eq!(path_from_drop("'/tmp/my cv.pdf'"), Some(Path::new("/tmp/my cv.pdf")));
        assert_eq!(path_from_drop("file:///tmp/cv.pdf\n"), Some(Path::new("/tmp/cv.pdf")));
        assert_eq!(path_from_drop("  "), None);
        assert_eq!(path_from_drop("a\nb"), None);
    }

    #[tokio::test]
    async fn test_read_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.pdf");
        std::fs::write(&path, b"%PDF-1.5 body").unwrap();

        let doc = read_document(&path).await.unwrap();
        assert!(doc.is_pdf());
        assert_eq!(doc.len(), 13);

        let empty = dir.path().join("empty.pdf");
        std::fs::write(&empty, b"").unwrap();
        assert!(matches!(read_document(&empty).await, Err(ResumeError::Empty)));

        let missing = dir.path().join("missing.pdf");
        assert!(matches!(read_document(&missing).await, Err(ResumeError::Io(_))));
    }
}
