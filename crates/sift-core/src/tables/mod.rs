//! Table extraction: independent detection strategies pooled and deduplicated.

mod aligned;
mod cleaner;
mod ensemble;
mod ocr;
mod ruled;

pub use aligned::AlignedStrategy;
pub use cleaner::clean_table;
pub use ensemble::{TableExtraction, TableExtractionEnsemble};
pub use ocr::OcrTableStrategy;
pub use ruled::RuledStrategy;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SiftError, TableError};
use crate::pdf::Document;

/// Table detection strategy identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Cells delimited by drawn rules (`|`, box-drawing characters).
    Ruled,
    /// Borderless columns aligned by whitespace.
    Aligned,
    /// Rows and columns rebuilt from OCR text boxes.
    Ocr,
}

impl StrategyKind {
    /// Default priority order used for deduplication.
    pub const PRIORITY: [StrategyKind; 3] = [StrategyKind::Ruled, StrategyKind::Aligned, StrategyKind::Ocr];

    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Ruled => "ruled",
            StrategyKind::Aligned => "aligned",
            StrategyKind::Ocr => "ocr",
        }
    }
}

/// A pluggable table detector.
pub trait TableStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Whether the strategy can run in this build and environment.
    fn is_available(&self) -> bool {
        true
    }

    fn extract(&self, doc: &dyn Document) -> Result<Vec<ExtractedTable>, TableError>;
}

/// Structural summary used to detect the same table found by several strategies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub rows: usize,
    pub cols: usize,
    pub first: String,
    pub last: String,
}

/// A rectangular cell matrix found on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedTable {
    /// Originating page (1-indexed); unknown for some OCR paths.
    pub page: Option<usize>,
    pub strategy: StrategyKind,
    pub rows: Vec<Vec<String>>,
}

impl ExtractedTable {
    /// Build a table, padding short rows with empty cells.
    pub fn new(strategy: StrategyKind, page: Option<usize>, mut rows: Vec<Vec<String>>) -> Self {
        let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(cols, String::new());
        }
        Self { page, strategy, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn non_empty_cells(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|cell| !cell.trim().is_empty())
            .count()
    }

    pub fn fingerprint(&self) -> Fingerprint {
        let first = self
            .rows
            .first()
            .and_then(|row| row.first())
            .cloned()
            .unwrap_or_default();
        let last = self
            .rows
            .last()
            .and_then(|row| row.last())
            .cloned()
            .unwrap_or_default();
        Fingerprint {
            rows: self.row_count(),
            cols: self.col_count(),
            first,
            last,
        }
    }

    /// Apply a transformation to every cell.
    pub fn map_cells(&mut self, mut f: impl FnMut(&str) -> String) {
        for cell in self.rows.iter_mut().flatten() {
            *cell = f(cell);
        }
    }

    /// Serialize rows as CSV.
    pub fn to_csv(&self) -> Result<String, SiftError> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());
        for row in &self.rows {
            writer.write_record(row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| SiftError::Io(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| SiftError::Config(format!("non-UTF-8 CSV output: {}", e)))
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), SiftError> {
        std::fs::write(path, self.to_csv()?)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn table(strategy: StrategyKind, page: usize, rows: &[&[&str]]) -> ExtractedTable {
    ExtractedTable::new(
        strategy,
        Some(page),
        rows.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect(),
    )
}
