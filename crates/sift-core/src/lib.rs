//! Core library for business correspondence processing.
//!
//! This crate provides:
//! - Page text extraction with OCR fallback for scanned pages
//! - A table extraction ensemble with fingerprint deduplication
//! - Line-level sanitization (disclaimers, signatures, print noise, subjects)
//! - Run-scoped pseudonymization of emails, phone numbers and names
//! - Validation and normalization of externally extracted field values

pub mod artifacts;
pub mod error;
pub mod extract;
pub mod mask;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod sanitize;
pub mod tables;
pub mod validate;

pub use artifacts::ArtifactWriter;
pub use error::{Result, SiftError, Warning, WarningKind};
pub use extract::{ContentExtractionEngine, ExtractedText};
pub use mask::{PiiMasker, PseudonymStore, SharedPseudonymStore, TokenAssigner};
pub use models::{FieldSchema, SiftConfig};
pub use ocr::{OcrResult, TextBox, TextRecognizer};
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
pub use pdf::{Document, MemoryDocument, PdfDocument};
pub use pipeline::{DocumentProcessor, ProcessedDocument, open_document};
pub use sanitize::{ContentSanitizer, SanitizedDocument};
pub use tables::{ExtractedTable, TableExtractionEnsemble};
pub use validate::{FieldValidator, ValidatedRecord, ValidationResult};
