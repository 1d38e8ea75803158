//! Per-document processing: extract, find tables, sanitize, mask.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Result, SiftError, Warning, WarningKind};
use crate::extract::{ContentExtractionEngine, PageReport};
use crate::mask::{PiiMasker, TokenAssigner};
use crate::models::config::SiftConfig;
use crate::ocr::TextRecognizer;
use crate::pdf::{Document, MemoryDocument, PdfDocument};
use crate::sanitize::{ContentSanitizer, SanitizedDocument};
use crate::tables::TableExtractionEnsemble;

/// Result of processing one document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessedDocument {
    pub page_count: usize,
    pub pages: Vec<PageReport>,
    pub used_ocr: bool,
    pub document: SanitizedDocument,
    /// Tables dropped as cross-strategy duplicates.
    pub duplicate_tables: usize,
    pub warnings: Vec<Warning>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

impl ProcessedDocument {
    /// No text and no tables could be extracted.
    pub fn is_degenerate(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| w.kind == WarningKind::DegenerateDocument)
    }
}

/// Runs every stage over a document.
pub struct DocumentProcessor {
    engine: ContentExtractionEngine,
    tables: TableExtractionEnsemble,
    sanitizer: ContentSanitizer,
    masker: Option<PiiMasker>,
}

impl DocumentProcessor {
    /// Build a processor without OCR.
    pub fn new(config: &SiftConfig) -> Result<Self> {
        Self::with_recognizer(config, None)
    }

    pub fn with_recognizer(
        config: &SiftConfig,
        recognizer: Option<Arc<dyn TextRecognizer>>,
    ) -> Result<Self> {
        let mut engine = ContentExtractionEngine::new(config.pdf.clone());
        if let Some(r) = &recognizer {
            engine = engine.with_recognizer(r.clone());
        }
        let tables =
            TableExtractionEnsemble::from_config(&config.tables, config.pdf.render_dpi, recognizer);
        let masker = if config.masking.enabled {
            Some(PiiMasker::new(&config.masking)?)
        } else {
            None
        };

        Ok(Self {
            engine,
            tables,
            sanitizer: ContentSanitizer::new(&config.sanitizer)?,
            masker,
        })
    }

    /// Process one document, assigning pseudonyms from `store`.
    ///
    /// Never fails: page, strategy and empty-document problems are reported
    /// as warnings on the result.
    pub fn process(&self, doc: &dyn Document, store: &mut impl TokenAssigner) -> ProcessedDocument {
        let start = Instant::now();

        let extracted = self.engine.extract(doc);
        let tables = self.tables.extract(doc);
        debug!(
            "Extracted {} chars and {} tables ({} duplicates)",
            extracted.text.len(),
            tables.tables.len(),
            tables.duplicates
        );

        let mut warnings = extracted.warnings.clone();
        warnings.extend(tables.warnings);
        if !extracted.has_content() && tables.tables.is_empty() {
            warn!("Document yielded no text and no tables");
            warnings.push(Warning::new(
                WarningKind::DegenerateDocument,
                "no extractable text or tables",
            ));
        }

        let mut document = self.sanitizer.sanitize(&extracted.text, tables.tables);
        if let Some(masker) = &self.masker {
            masker.mask_document(&mut document, store);
        }

        let elapsed = start.elapsed();
        info!(
            "Processed {} pages in {:?} (ocr: {}, tables: {}, warnings: {})",
            doc.page_count(),
            elapsed,
            extracted.used_ocr,
            document.tables.len(),
            warnings.len()
        );

        ProcessedDocument {
            page_count: doc.page_count(),
            pages: extracted.pages,
            used_ocr: extracted.used_ocr,
            document,
            duplicate_tables: tables.duplicates,
            warnings,
            processing_time_ms: elapsed.as_millis() as u64,
        }
    }
}

/// Open a document by file extension: `.pdf` or plain text.
pub fn open_document(path: &Path) -> Result<Box<dyn Document>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => Ok(Box::new(PdfDocument::open(path)?)),
        "txt" | "text" => Ok(Box::new(MemoryDocument::open(path)?)),
        _ => Err(SiftError::UnsupportedInput(path.display().to_string())),
    }
}

/// Load the OCR backend when enabled and its models are present.
///
/// A missing or broken model directory is not fatal; extraction then runs
/// on the text layer alone.
pub fn load_recognizer(config: &SiftConfig) -> Option<Arc<dyn TextRecognizer>> {
    if !config.pdf.ocr_enabled {
        debug!("OCR disabled by configuration");
        return None;
    }
    load_native_recognizer(config)
}

#[cfg(feature = "native")]
fn load_native_recognizer(config: &SiftConfig) -> Option<Arc<dyn TextRecognizer>> {
    if !config.ocr.models_present() {
        warn!(
            "OCR models not found in {}, OCR fallback disabled",
            config.ocr.model_dir.display()
        );
        return None;
    }
    match crate::ocr::PureOcrEngine::from_config(&config.ocr) {
        Ok(engine) => Some(Arc::new(engine)),
        Err(e) => {
            warn!("Failed to load OCR engine: {}", e);
            None
        }
    }
}

#[cfg(not(feature = "native"))]
fn load_native_recognizer(_config: &SiftConfig) -> Option<Arc<dyn TextRecognizer>> {
    debug!("Built without an OCR backend");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OcrError;
    use crate::mask::{PiiCategory, PseudonymStore};
    use crate::ocr::{OcrResult, TextBox};
    use image::DynamicImage;
    use pretty_assertions::assert_eq;

    struct FixedRecognizer(&'static str);

    impl TextRecognizer for FixedRecognizer {
        fn recognize(&self, _image: &DynamicImage) -> std::result::Result<OcrResult, OcrError> {
            Ok(OcrResult::from_boxes(
                vec![TextBox::from_rect(self.0, 0.0, 0.0, 100.0, 10.0)],
                (100, 10),
            ))
        }
    }

    const MAIL: &str = "6/12/25, 3:41 PM Example.com Mail - Monsoon support\n\
                        From: Ravi Kumar <ravi.k@acme.co.in>\n\
                        Subject: Monsoon support\n\
                        \n\
                        Support of 5% applies to all SKUs for June.\n\
                        Call 9876543210 for the claim file.\n\
                        \n\
                        SKU  |  Support\n\
                        A100 |  5%\n\
                        B200 |  4%\n\
                        \n\
                        Regards,\n\
                        Ravi Kumar";

    #[test]
    fn test_process_text_document() {
        let processor = DocumentProcessor::new(&SiftConfig::default()).unwrap();
        let doc = MemoryDocument::from_pages([MAIL]);
        let mut store = PseudonymStore::new();

        let out = processor.process(&doc, &mut store);

        assert_eq!(out.page_count, 1);
        assert!(!out.used_ocr);
        assert!(!out.is_degenerate());
        assert_eq!(out.document.subject.as_deref(), Some("Monsoon support"));
        assert!(out.document.text.starts_with("--- PAGE 1 ---\n\nSubject: Monsoon support\n"));
        assert!(out.document.text.contains("Call [PHONE_1] for the claim file."));
        assert!(!out.document.text.contains("Regards"));
        assert!(!out.document.text.contains("ravi.k@acme.co.in"));
        assert_eq!(out.document.tables.len(), 1);
        assert_eq!(out.document.tables[0].rows[0], vec!["SKU", "Support"]);
        assert_eq!(store.get(PiiCategory::Phone, "9876543210"), Some("PHONE_1"));
    }

    #[test]
    fn test_subject_pii_is_masked() {
        let processor = DocumentProcessor::new(&SiftConfig::default()).unwrap();
        let doc = MemoryDocument::from_pages([
            "Subject: Claim for Ravi Kumar, call 9876543210 or ravi.k@acme.co.in\n\n\
             The claim covers all June invoices for the monsoon scheme.",
        ]);
        let mut store = PseudonymStore::new();

        let out = processor.process(&doc, &mut store);

        let masked = "Claim for [PERSON_1], call [PHONE_1] or [EMAIL_1]@acme.co.in";
        assert_eq!(out.document.subject.as_deref(), Some(masked));
        assert!(out.document.text.contains(&format!("Subject: {}", masked)));
        assert_eq!(store.len(PiiCategory::Name), 1);
    }

    #[test]
    fn test_empty_document_is_degenerate_not_error() {
        let processor = DocumentProcessor::new(&SiftConfig::default()).unwrap();
        let doc = MemoryDocument::from_pages(["", "  "]);
        let out = processor.process(&doc, &mut PseudonymStore::new());

        assert!(out.is_degenerate());
        assert!(out.document.tables.is_empty());
        assert!(out.document.text.lines().all(|l| l.is_empty() || l.starts_with("--- PAGE")));
    }

    #[test]
    fn test_ocr_replaces_scanned_text() {
        let image = DynamicImage::new_rgb8(100, 10);
        let doc = MemoryDocument::from_pages(["", ""])
            .with_page_image(1, image.clone())
            .with_page_image(2, image);
        let processor = DocumentProcessor::with_recognizer(
            &SiftConfig::default(),
            Some(Arc::new(FixedRecognizer("Scanned claim note for the monsoon scheme"))),
        )
        .unwrap();

        let out = processor.process(&doc, &mut PseudonymStore::new());

        assert!(out.used_ocr);
        assert!(!out.is_degenerate());
        assert!(out.document.text.contains("--- OCR PAGE 2 ---"));
        assert_eq!(
            out.document.text.matches("Scanned claim note for the monsoon scheme").count(),
            2
        );
    }

    #[test]
    fn test_masking_can_be_disabled() {
        let mut config = SiftConfig::default();
        config.masking.enabled = false;
        let processor = DocumentProcessor::new(&config).unwrap();
        let doc = MemoryDocument::from_pages(["Call 9876543210 about the scheme payout."]);
        let mut store = PseudonymStore::new();

        let out = processor.process(&doc, &mut store);

        assert!(out.document.text.contains("9876543210"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_open_document_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("mail.txt");
        std::fs::write(&txt, "page one\u{c}page two").unwrap();
        assert_eq!(open_document(&txt).unwrap().page_count(), 2);

        let other = dir.path().join("sheet.xlsx");
        std::fs::write(&other, "x").unwrap();
        assert!(matches!(
            open_document(&other),
            Err(SiftError::UnsupportedInput(_))
        ));
    }
}
