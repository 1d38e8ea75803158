//! Page text extraction with OCR fallback.

mod engine;

pub use engine::ContentExtractionEngine;

use serde::{Deserialize, Serialize};

use crate::error::Warning;

/// How a page's text layer was judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageClass {
    TextLayerOk,
    NeedsOcr,
}

/// How OCR output is combined with the text layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrMergeMode {
    /// OCR every page and replace the whole document's text.
    #[default]
    ReplaceDocument,
    /// OCR only the pages flagged as needing it.
    PerPage,
}

/// Per-page extraction outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageReport {
    pub number: usize,
    pub class: PageClass,
    /// Non-whitespace-trimmed character count of the text layer.
    pub chars: usize,
}

/// Result of extracting one document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractedText {
    /// Full text with page separators.
    pub text: String,
    pub pages: Vec<PageReport>,
    pub used_ocr: bool,
    pub warnings: Vec<Warning>,
}

impl ExtractedText {
    /// Whether any page yielded text.
    pub fn has_content(&self) -> bool {
        self.text
            .lines()
            .any(|line| !line.trim().is_empty() && !is_page_marker(line))
    }
}

pub(crate) fn page_marker(page: usize) -> String {
    format!("--- PAGE {} ---", page)
}

pub(crate) fn ocr_page_marker(page: usize) -> String {
    format!("--- OCR PAGE {} ---", page)
}

pub(crate) fn ocr_error_marker(page: usize) -> String {
    format!("--- OCR PAGE {} ERROR ---", page)
}

fn is_page_marker(line: &str) -> bool {
    let line = line.trim();
    line.starts_with("--- ") && line.ends_with(" ---") && line.contains("PAGE ")
}
