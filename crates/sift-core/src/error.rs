//! Error types for the sift-core library.
//!
//! Only failures that stop a whole document (or a whole run) are errors.
//! Page, strategy and field failures are collected as [`Warning`]s on the
//! result instead.

use serde::Serialize;
use thiserror::Error;

/// Main error type for the sift library.
#[derive(Error, Debug)]
pub enum SiftError {
    /// Document loading or page access error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Table strategy error.
    #[error("table error: {0}")]
    Table(#[from] TableError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Input file of a kind no document loader handles.
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),
}

/// Errors related to document access.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from a page.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to produce a raster image of a page.
    #[error("failed to render page {page}: {reason}")]
    Render { page: usize, reason: String },

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(usize),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Errors raised by a single table strategy.
#[derive(Error, Debug)]
pub enum TableError {
    /// The strategy's backend is not available in this build or environment.
    #[error("strategy {0} is unavailable")]
    Unavailable(&'static str),

    /// Page access failed inside a strategy.
    #[error("page access failed: {0}")]
    Page(#[from] PdfError),

    /// OCR failed inside a strategy.
    #[error("OCR failed: {0}")]
    Ocr(#[from] OcrError),
}

/// Result type for the sift library.
pub type Result<T> = std::result::Result<T, SiftError>;

/// Category of a scoped, non-fatal failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Text extraction failed for one page; the page contributed an empty string.
    Extraction,
    /// OCR failed for one page; an error marker was substituted.
    Ocr,
    /// A table strategy failed or was unavailable and was excluded.
    TableStrategy,
    /// The document yielded no text and no tables.
    DegenerateDocument,
}

/// A non-fatal failure scoped to one page, strategy or document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    /// Page number (1-indexed) when the failure is page-scoped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    pub message: String,
}

impl Warning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            page: None,
            message: message.into(),
        }
    }

    pub fn on_page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.page {
            Some(page) => write!(f, "{:?} (page {}): {}", self.kind, page, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}
