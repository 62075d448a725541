// Extraction layer: uploaded bytes -> document text -> resume fields.
// PDF parsing is CPU-bound and must run inside tokio::task::spawn_blocking
// (see intake::process_upload).

pub mod archive;
pub mod document;
pub mod duration;
pub mod fields;
pub mod llm;
pub mod prompts;

use async_trait::async_trait;
use thiserror::Error;

pub use archive::{expand_upload, UploadedDocument};
pub use document::{extract_text, DocumentKind};
pub use fields::{ExtractedFields, RawExperience};

/// Per-document failure. Reported back to the reviewer alongside the
/// records that did extract, never fatal for the whole batch.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("DOCX extraction failed: {0}")]
    Docx(String),

    #[error("Archive could not be read: {0}")]
    Archive(String),

    #[error("No text could be extracted")]
    EmptyText,

    #[error("No mobile number found")]
    MissingMobile,

    #[error("LLM extraction failed: {0}")]
    Llm(String),

    #[error("Extractor crashed: {0}")]
    Panicked(String),
}

impl ExtractError {
    /// Short machine-friendly label shown in the review table.
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractError::UnsupportedFormat(_) => "unsupported_format",
            ExtractError::Pdf(_) => "pdf_error",
            ExtractError::Docx(_) => "docx_error",
            ExtractError::Archive(_) => "archive_error",
            ExtractError::EmptyText => "empty_text",
            ExtractError::MissingMobile => "missing_mobile",
            ExtractError::Llm(_) => "llm_error",
            ExtractError::Panicked(_) => "extractor_panic",
        }
    }
}

/// Turns plain document text into raw resume fields.
///
/// Carried in `AppState` as `Arc<dyn FieldExtractor>`; the backend is picked
/// from `EXTRACTION_MODE` at startup.
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<ExtractedFields, ExtractError>;

    /// Backend label, logged per batch.
    fn name(&self) -> &'static str;
}

/// Regex and layout heuristics. Fast, deterministic, no network.
pub struct HeuristicFieldExtractor;

#[async_trait]
impl FieldExtractor for HeuristicFieldExtractor {
    async fn extract(&self, text: &str) -> Result<ExtractedFields, ExtractError> {
        Ok(fields::extract_fields(text))
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}
