//! Uploaded entry-sheet documents.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::error::{EsprobeError, Result};

pub const PDF_MIME: &str = "application/pdf";

const PDF_MAGIC: &[u8] = b"%PDF-";

/// A document payload accepted for generation. Always non-empty and PDF.
#[derive(Debug, Clone)]
pub struct Document {
    file_name: String,
    mime_type: String,
    bytes: Arc<[u8]>,
}

impl Document {
    /// Accept an in-memory upload.
    pub fn from_bytes(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Result<Self> {
        Self::from_upload(file_name, None, bytes)
    }

    /// Accept an upload whose declared content type may identify it as PDF.
    pub fn from_upload(
        file_name: impl Into<String>,
        content_type: Option<&str>,
        bytes: impl Into<Vec<u8>>,
    ) -> Result<Self> {
        let file_name = file_name.into();
        let bytes: Vec<u8> = bytes.into();

        if bytes.is_empty() {
            return Err(EsprobeError::InvalidDocument(format!("{file_name} is empty")));
        }
        if !(declares_pdf(content_type) || is_pdf(&file_name, &bytes)) {
            return Err(EsprobeError::InvalidDocument(format!(
                "{file_name} is not a PDF document"
            )));
        }

        debug!(file = %file_name, size = bytes.len(), "Accepted document");
        Ok(Self {
            file_name,
            mime_type: PDF_MIME.to_string(),
            bytes: bytes.into(),
        })
    }

    /// Read a document from disk.
    pub async fn read(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document.pdf")
            .to_string();
        Self::from_bytes(name, bytes)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn declares_pdf(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case(PDF_MIME))
        .unwrap_or(false)
}

fn is_pdf(file_name: &str, bytes: &[u8]) -> bool {
    let by_extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    by_extension || bytes.starts_with(PDF_MAGIC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_pdf_by_magic_or_extension() {
        let doc = Document::from_bytes("upload", b"%PDF-1.7 body".to_vec()).unwrap();
        assert_eq!(doc.mime_type(), PDF_MIME);
        assert_eq!(doc.len(), 13);

        assert!(Document::from_bytes("es.PDF", b"not really".to_vec()).is_ok());
    }

    #[test]
    fn rejects_empty_and_foreign_payloads() {
        let empty = Document::from_bytes("es.pdf", Vec::new()).unwrap_err();
        assert!(matches!(empty, EsprobeError::InvalidDocument(_)));

        let docx = Document::from_bytes("es.docx", b"PK\x03\x04".to_vec()).unwrap_err();
        assert!(matches!(docx, EsprobeError::InvalidDocument(_)));
    }

    #[test]
    fn declared_pdf_content_type_is_accepted() {
        let doc =
            Document::from_upload("blob", Some("application/pdf; charset=binary"), b"x".to_vec())
                .unwrap();
        assert_eq!(doc.file_name(), "blob");

        assert!(Document::from_upload("blob", Some("text/plain"), b"x".to_vec()).is_err());
        assert!(Document::from_upload("blob.pdf", Some(PDF_MIME), Vec::new()).is_err());
    }

    #[tokio::test]
    async fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entry_sheet.pdf");
        std::fs::write(&path, b"%PDF-1.4\n").unwrap();

        let doc = Document::read(&path).await.unwrap();
        assert_eq!(doc.file_name(), "entry_sheet.pdf");
        assert_eq!(doc.bytes(), b"%PDF-1.4\n");
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let err = Document::read(Path::new("/nonexistent/es.pdf")).await.unwrap_err();
        assert!(matches!(err, EsprobeError::Io(_)));
    }
}
