//! Cascading text extraction: text layer first, OCR when the layer is too sparse.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{ExtractedText, OcrMergeMode, PageClass, PageReport};
use super::{ocr_error_marker, ocr_page_marker, page_marker};
use crate::error::{Warning, WarningKind};
use crate::models::config::PdfConfig;
use crate::ocr::TextRecognizer;
use crate::pdf::{Document, Pages};

/// Extracts document text, falling back to OCR for image-heavy documents.
pub struct ContentExtractionEngine {
    config: PdfConfig,
    recognizer: Option<Arc<dyn TextRecognizer>>,
}

enum OcrPage {
    Text(String),
    Empty,
    Failed,
}

impl ContentExtractionEngine {
    pub fn new(config: PdfConfig) -> Self {
        Self {
            config,
            recognizer: None,
        }
    }

    pub fn with_recognizer(mut self, recognizer: Arc<dyn TextRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// Extract text from every page.
    ///
    /// Never fails: a page whose text cannot be extracted contributes an empty
    /// string, and a page whose OCR fails contributes an error marker.
    pub fn extract(&self, doc: &dyn Document) -> ExtractedText {
        let mut result = ExtractedText::default();
        let mut layer = Vec::new();

        for page in Pages::new(doc) {
            let text = match page.text() {
                Ok(text) => text,
                Err(e) => {
                    warn!("Text extraction failed on page {}: {}", page.number, e);
                    result
                        .warnings
                        .push(Warning::new(WarningKind::Extraction, e.to_string()).on_page(page.number));
                    String::new()
                }
            };
            let chars = text.trim().chars().count();
            let class = if chars < self.config.sparse_page_chars {
                PageClass::NeedsOcr
            } else {
                PageClass::TextLayerOk
            };
            result.pages.push(PageReport {
                number: page.number,
                class,
                chars,
            });
            layer.push(text);
        }

        let total: usize = result.pages.iter().map(|p| p.chars).sum();
        let any_sparse = result.pages.iter().any(|p| p.class == PageClass::NeedsOcr);
        debug!(
            "Text layer: {} pages, {} chars, sparse pages: {}",
            result.pages.len(),
            total,
            any_sparse
        );

        let needs_ocr = !result.pages.is_empty()
            && (total < self.config.min_text_length || any_sparse);

        if needs_ocr && self.config.ocr_enabled {
            match &self.recognizer {
                Some(recognizer) => {
                    if let Some(text) = self.ocr_fallback(doc, recognizer.as_ref(), &layer, &mut result) {
                        result.text = text;
                        result.used_ocr = true;
                        return result;
                    }
                }
                None => {
                    warn!("Document needs OCR but no recognizer is configured");
                    result.warnings.push(Warning::new(
                        WarningKind::Ocr,
                        "no recognizer configured; text layer kept",
                    ));
                }
            }
        }

        result.text = join_sections(
            layer
                .iter()
                .enumerate()
                .map(|(i, text)| (page_marker(i + 1), text.as_str())),
        );
        result
    }

    /// Run OCR and build the replacement text. `None` keeps the text layer.
    fn ocr_fallback(
        &self,
        doc: &dyn Document,
        recognizer: &dyn TextRecognizer,
        layer: &[String],
        result: &mut ExtractedText,
    ) -> Option<String> {
        info!(
            "Running OCR fallback ({:?}) at {} dpi",
            self.config.merge_mode, self.config.render_dpi
        );

        let mut sections: Vec<(String, String)> = Vec::with_capacity(layer.len());
        let mut recognized_any = false;

        let pages = result.pages.clone();
        for (report, text) in pages.iter().zip(layer) {
            let wants_ocr = match self.config.merge_mode {
                OcrMergeMode::ReplaceDocument => true,
                OcrMergeMode::PerPage => report.class == PageClass::NeedsOcr,
            };
            if !wants_ocr {
                sections.push((page_marker(report.number), text.clone()));
                continue;
            }

            match self.ocr_page(doc, recognizer, report.number, result) {
                OcrPage::Text(ocr_text) => {
                    recognized_any = true;
                    sections.push((ocr_page_marker(report.number), ocr_text));
                }
                OcrPage::Empty if self.config.merge_mode == OcrMergeMode::PerPage => {
                    sections.push((page_marker(report.number), text.clone()));
                }
                OcrPage::Empty => {
                    sections.push((ocr_page_marker(report.number), String::new()));
                }
                OcrPage::Failed => {
                    sections.push((ocr_error_marker(report.number), String::new()));
                }
            }
        }

        if !recognized_any {
            warn!("OCR produced no text; keeping text layer");
            return None;
        }

        Some(join_sections(
            sections.iter().map(|(marker, text)| (marker.clone(), text.as_str())),
        ))
    }

    fn ocr_page(
        &self,
        doc: &dyn Document,
        recognizer: &dyn TextRecognizer,
        page: usize,
        result: &mut ExtractedText,
    ) -> OcrPage {
        let recognized = doc
            .render_page(page, self.config.render_dpi)
            .map_err(|e| e.to_string())
            .and_then(|image| recognizer.recognize(&image).map_err(|e| e.to_string()));

        match recognized {
            Ok(ocr) if ocr.text.trim().is_empty() => OcrPage::Empty,
            Ok(ocr) => {
                debug!("OCR page {}: {} boxes", page, ocr.boxes.len());
                OcrPage::Text(ocr.text)
            }
            Err(e) => {
                warn!("OCR failed on page {}: {}", page, e);
                result
                    .warnings
                    .push(Warning::new(WarningKind::Ocr, e).on_page(page));
                OcrPage::Failed
            }
        }
    }
}

fn join_sections<'a>(sections: impl Iterator<Item = (String, &'a str)>) -> String {
    sections
        .map(|(marker, text)| {
            let text = text.trim_end();
            if text.is_empty() {
                marker
            } else {
                format!("{}\n\n{}", marker, text)
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{OcrError, PdfError};
    use crate::ocr::{OcrResult, TextBox};
    use crate::pdf::MemoryDocument;
    use image::DynamicImage;
    use pretty_assertions::assert_eq;

    const LONG: &str = "This page carries a perfectly healthy text layer with enough characters.";

    struct FixedRecognizer(&'static str);

    impl TextRecognizer for FixedRecognizer {
        fn recognize(&self, image: &DynamicImage) -> Result<OcrResult, OcrError> {
            Ok(OcrResult::from_boxes(
                vec![TextBox::from_rect(self.0, 0.0, 0.0, 10.0, 10.0)],
                (image.width(), image.height()),
            ))
        }
    }

    struct FailingPage;

    impl Document for FailingPage {
        fn page_count(&self) -> usize {
            2
        }

        fn page_text(&self, page: usize) -> crate::pdf::Result<String> {
            match page {
                1 => Err(PdfError::TextExtraction("broken content stream".to_string())),
                _ => Ok(LONG.to_string()),
            }
        }

        fn render_page(&self, page: usize, _dpi: u32) -> crate::pdf::Result<DynamicImage> {
            Err(PdfError::Render {
                page,
                reason: "no raster".to_string(),
            })
        }
    }

    fn image() -> DynamicImage {
        DynamicImage::new_rgb8(8, 8)
    }

    #[test]
    fn test_text_layer_kept_when_dense() {
        let doc = MemoryDocument::from_pages([LONG, LONG]);
        let engine = ContentExtractionEngine::new(PdfConfig::default())
            .with_recognizer(Arc::new(FixedRecognizer("ocr text")));
        let result = engine.extract(&doc);

        assert!(!result.used_ocr);
        assert_eq!(
            result.text,
            format!("--- PAGE 1 ---\n\n{}\n\n--- PAGE 2 ---\n\n{}", LONG, LONG)
        );
        assert!(result.pages.iter().all(|p| p.class == PageClass::TextLayerOk));
    }

    #[test]
    fn test_sparse_page_triggers_whole_document_replacement() {
        let doc = MemoryDocument::from_pages([LONG, "tiny"])
            .with_page_image(1, image())
            .with_page_image(2, image());
        let engine = ContentExtractionEngine::new(PdfConfig::default())
            .with_recognizer(Arc::new(FixedRecognizer("scanned words")));
        let result = engine.extract(&doc);

        assert!(result.used_ocr);
        assert_eq!(
            result.text,
            "--- OCR PAGE 1 ---\n\nscanned words\n\n--- OCR PAGE 2 ---\n\nscanned words"
        );
        assert_eq!(result.pages[1].class, PageClass::NeedsOcr);
    }

    #[test]
    fn test_per_page_merge_keeps_dense_pages() {
        let doc = MemoryDocument::from_pages([LONG, "tiny"]).with_page_image(2, image());
        let config = PdfConfig {
            merge_mode: OcrMergeMode::PerPage,
            ..PdfConfig::default()
        };
        let engine =
            ContentExtractionEngine::new(config).with_recognizer(Arc::new(FixedRecognizer("scanned")));
        let result = engine.extract(&doc);

        assert_eq!(
            result.text,
            format!("--- PAGE 1 ---\n\n{}\n\n--- OCR PAGE 2 ---\n\nscanned", LONG)
        );
    }

    #[test]
    fn test_ocr_failure_substitutes_marker() {
        let doc = MemoryDocument::from_pages(["", ""]).with_page_image(1, image());
        let engine = ContentExtractionEngine::new(PdfConfig::default())
            .with_recognizer(Arc::new(FixedRecognizer("recovered")));
        let result = engine.extract(&doc);

        assert!(result.used_ocr);
        assert_eq!(
            result.text,
            "--- OCR PAGE 1 ---\n\nrecovered\n\n--- OCR PAGE 2 ERROR ---"
        );
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].kind, WarningKind::Ocr);
        assert_eq!(result.warnings[0].page, Some(2));
    }

    #[test]
    fn test_extraction_failure_yields_empty_page() {
        let engine = ContentExtractionEngine::new(PdfConfig::default());
        let result = engine.extract(&FailingPage);

        assert_eq!(result.text, format!("--- PAGE 1 ---\n\n--- PAGE 2 ---\n\n{}", LONG));
        let kinds: Vec<_> = result.warnings.iter().map(|w| (w.kind, w.page)).collect();
        assert_eq!(
            kinds,
            vec![(WarningKind::Extraction, Some(1)), (WarningKind::Ocr, None)]
        );
    }

    #[test]
    fn test_failed_ocr_everywhere_keeps_text_layer() {
        let engine = ContentExtractionEngine::new(PdfConfig::default())
            .with_recognizer(Arc::new(FixedRecognizer("unused")));
        let result = engine.extract(&FailingPage);

        assert!(!result.used_ocr);
        assert!(result.text.ends_with(LONG));
        assert_eq!(
            result.warnings.iter().filter(|w| w.kind == WarningKind::Ocr).count(),
            2
        );
    }

    #[test]
    fn test_empty_document_has_no_content() {
        let doc = MemoryDocument::from_pages(["   ", ""]);
        let result = ContentExtractionEngine::new(PdfConfig::default()).extract(&doc);
        assert!(!result.has_content());
    }
}
