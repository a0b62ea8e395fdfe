//! Document Extractor: turns an uploaded PDF or DOCX into plain text.
//!
//! `extract` is total: unknown media types and unreadable documents both yield
//! empty text. Use `try_extract` when the underlying cause matters.

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

pub mod docx;
pub mod pdf;

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const GENERIC_MIME: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("PDF could not be read: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("DOCX could not be read: {0}")]
    Docx(#[from] docx_rs::ReaderError),
}

/// Declared media type of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Pdf,
    WordProcessor,
    Unknown,
}

impl MediaType {
    /// Resolves the media type from the declared content type.
    ///
    /// The file extension is only consulted when the content type is missing
    /// or `application/octet-stream`.
    pub fn from_declared(content_type: Option<&str>, file_name: Option<&str>) -> Self {
        let essence = content_type
            .map(|ct| ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
            .filter(|ct| !ct.is_empty());

        match essence.as_deref() {
            Some(PDF_MIME) => MediaType::Pdf,
            Some(DOCX_MIME) => MediaType::WordProcessor,
            None | Some(GENERIC_MIME) => file_name
                .map(Self::from_file_name)
                .unwrap_or(MediaType::Unknown),
            Some(_) => MediaType::Unknown,
        }
    }

    fn from_file_name(name: &str) -> Self {
        let extension = std::path::Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => MediaType::Pdf,
            "docx" => MediaType::WordProcessor,
            _ => MediaType::Unknown,
        }
    }
}

/// Raw uploaded bytes plus the media type they were declared as.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    bytes: Bytes,
    media_type: MediaType,
    file_name: Option<String>,
}

impl SourceDocument {
    pub fn new(bytes: impl Into<Bytes>, media_type: MediaType) -> Self {
        Self {
            bytes: bytes.into(),
            media_type,
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }
}

/// Plain text pulled out of one document. Empty text is a valid result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText(String);

impl ExtractedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for ExtractedText {
    fn from(text: String) -> Self {
        Self(text)
    }
}

/// Extracts text, surfacing decode failures for supported types.
pub fn try_extract(document: &SourceDocument) -> Result<ExtractedText, ExtractError> {
    let text = match document.media_type {
        MediaType::Pdf => pdf::extract_pdf_text(document.bytes())?,
        MediaType::WordProcessor => docx::extract_docx_text(document.bytes())?,
        MediaType::Unknown => {
            debug!(
                file_name = document.file_name().unwrap_or("<unnamed>"),
                "Unsupported document type; treating as empty text"
            );
            String::new()
        }
    };
    Ok(ExtractedText(text))
}

/// Extracts text, falling back to empty text on any failure.
pub fn extract(document: &SourceDocument) -> ExtractedText {
    match try_extract(document) {
        Ok(text) => text,
        Err(e) => {
            warn!(
                file_name = document.file_name().unwrap_or("<unnamed>"),
                "Document extraction failed, continuing with empty text: {e}"
            );
            ExtractedText::default()
        }
    }
}
