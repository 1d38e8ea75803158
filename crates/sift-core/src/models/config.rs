//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::SiftError;
use crate::extract::OcrMergeMode;
use crate::tables::StrategyKind;

/// Main configuration for the sift pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiftConfig {
    /// Text extraction and OCR fallback configuration.
    pub pdf: PdfConfig,

    /// OCR model configuration.
    pub ocr: OcrConfig,

    /// Table ensemble configuration.
    pub tables: TableConfig,

    /// Content sanitizer configuration.
    pub sanitizer: SanitizerConfig,

    /// PII masking configuration.
    pub masking: MaskingConfig,

    /// Field validation configuration.
    pub validation: ValidationConfig,
}

/// Text extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// DPI for rendering pages to images before OCR.
    pub render_dpi: u32,

    /// A page with fewer extracted characters than this needs OCR.
    pub sparse_page_chars: usize,

    /// A document with less aggregate text than this needs OCR.
    pub min_text_length: usize,

    /// Run the OCR fallback at all.
    pub ocr_enabled: bool,

    /// How OCR output is combined with the text layer.
    pub merge_mode: OcrMergeMode,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_dpi: 200,
            sparse_page_chars: 50,
            min_text_length: 50,
            ocr_enabled: true,
            merge_mode: OcrMergeMode::ReplaceDocument,
        }
    }
}

/// OCR model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Keep `[UNK]` tokens in recognized text instead of replacing them with spaces.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            keep_unk: false,
        }
    }
}

impl OcrConfig {
    /// Whether the detection and recognition models are present on disk.
    pub fn models_present(&self) -> bool {
        self.model_dir.join(&self.detection_model).exists()
            && self.model_dir.join(&self.recognition_model).exists()
    }
}

/// Table ensemble configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Strategies to run, in priority order.
    pub strategies: Vec<StrategyKind>,

    /// Minimum rows for a detected table.
    pub min_rows: usize,

    /// Minimum columns for a detected table.
    pub min_cols: usize,

    /// Minimum run of spaces separating columns in aligned text.
    pub min_column_gap: usize,

    /// Vertical tolerance (pixels) when grouping OCR boxes into rows.
    pub ocr_row_tolerance: f32,

    /// Horizontal gap (pixels) that starts a new column among OCR boxes.
    pub ocr_column_gap: f32,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            strategies: StrategyKind::PRIORITY.to_vec(),
            min_rows: 2,
            min_cols: 2,
            min_column_gap: 2,
            ocr_row_tolerance: 12.0,
            ocr_column_gap: 24.0,
        }
    }
}

/// Content sanitizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizerConfig {
    /// Lines inspected after a signature line to decide transition vs. terminal.
    pub signature_lookahead: usize,

    /// Lines longer than this count as substantive content during lookahead.
    pub substantive_min_len: usize,

    /// Drop From/To/Cc/Bcc/Sent/Date header lines.
    pub drop_header_fields: bool,

    /// Drop webmail print artefacts (image placeholders, quoted-text markers, URLs).
    pub drop_print_noise: bool,

    /// Additional signature line patterns (regular expressions, matched case-insensitively).
    pub extra_signature_patterns: Vec<String>,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            signature_lookahead: 10,
            substantive_min_len: 20,
            drop_header_fields: true,
            drop_print_noise: true,
            extra_signature_patterns: Vec::new(),
        }
    }
}

/// PII masking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskingConfig {
    /// Mask PII at all.
    pub enabled: bool,

    /// Curated first names that anchor person-name matches.
    pub names: Vec<String>,

    /// Organization names that must never be masked as a person.
    pub protected_orgs: Vec<String>,

    /// Characters around a name match searched for a protected organization.
    pub org_window: usize,
}

impl Default for MaskingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            names: DEFAULT_NAMES.iter().map(|s| s.to_string()).collect(),
            protected_orgs: Vec::new(),
            org_window: 20,
        }
    }
}

const DEFAULT_NAMES: &[&str] = &[
    "Aditya", "Abhijit", "Amit", "Anil", "Anubhav", "Arjun", "Deepak", "Kavita", "Manish",
    "Neha", "Pooja", "Priya", "Rahul", "Rajesh", "Ravi", "Rohit", "Sanjay", "Siddharth",
    "Sonika", "Sunil", "Vikram", "Andrew", "David", "James", "John", "Laura", "Maria",
    "Michael", "Sarah", "Thomas",
];

/// Field validation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// JSON schema file; the built-in scheme header schema is used when unset.
    pub schema_path: Option<PathBuf>,
}

impl SiftConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, SiftError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| SiftError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), SiftError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
