//! OCR tables: rows and columns rebuilt from recognized text box geometry.

use std::sync::Arc;

use tracing::{debug, trace};

use super::{ExtractedTable, StrategyKind, TableStrategy};
use crate::error::TableError;
use crate::models::config::TableConfig;
use crate::ocr::{TextBox, TextRecognizer};
use crate::pdf::{Document, Pages};

pub struct OcrTableStrategy {
    recognizer: Option<Arc<dyn TextRecognizer>>,
    dpi: u32,
    min_rows: usize,
    min_cols: usize,
    row_tolerance: f32,
    column_gap: f32,
}

impl OcrTableStrategy {
    pub fn new(config: &TableConfig, dpi: u32, recognizer: Option<Arc<dyn TextRecognizer>>) -> Self {
        Self {
            recognizer,
            dpi,
            min_rows: config.min_rows,
            min_cols: config.min_cols,
            row_tolerance: config.ocr_row_tolerance,
            column_gap: config.ocr_column_gap,
        }
    }

    /// Group boxes into lines by vertical center.
    fn group_rows<'a>(&self, boxes: &'a [TextBox]) -> Vec<Vec<&'a TextBox>> {
        let mut sorted: Vec<&TextBox> = boxes.iter().filter(|b| !b.text.trim().is_empty()).collect();
        sorted.sort_by(|a, b| a.center_y().total_cmp(&b.center_y()));

        let mut rows: Vec<Vec<&TextBox>> = Vec::new();
        let mut current_y: Option<f32> = None;
        for b in sorted {
            match current_y {
                Some(y) if (b.center_y() - y).abs() <= self.row_tolerance => {
                    if let Some(row) = rows.last_mut() {
                        row.push(b);
                    }
                }
                _ => {
                    current_y = Some(b.center_y());
                    rows.push(vec![b]);
                }
            }
        }
        for row in &mut rows {
            row.sort_by(|a, b| a.rect().0.total_cmp(&b.rect().0));
        }
        rows
    }

    /// Merge boxes of one line into cells, starting a new cell at each wide gap.
    fn cells(&self, row: &[&TextBox]) -> Vec<String> {
        let mut cells: Vec<String> = Vec::new();
        let mut last_right: Option<f32> = None;
        for b in row {
            let (left, _, right, _) = b.rect();
            let text = b.text.trim();
            match (last_right, cells.last_mut()) {
                (Some(prev), Some(cell)) if left - prev <= self.column_gap => {
                    cell.push(' ');
                    cell.push_str(text);
                }
                _ => cells.push(text.to_string()),
            }
            last_right = Some(right);
        }
        cells
    }

    fn tables_in(&self, boxes: &[TextBox], page: usize) -> Vec<ExtractedTable> {
        let mut tables = Vec::new();
        let mut run: Vec<Vec<String>> = Vec::new();

        for row in self.group_rows(boxes) {
            let cells = self.cells(&row);
            let continues = cells.len() >= self.min_cols
                && run.first().is_none_or(|first| first.len() == cells.len());
            if !continues {
                self.flush(&mut run, page, &mut tables);
            }
            if cells.len() >= self.min_cols {
                run.push(cells);
            }
        }
        self.flush(&mut run, page, &mut tables);
        tables
    }

    fn flush(&self, run: &mut Vec<Vec<String>>, page: usize, tables: &mut Vec<ExtractedTable>) {
        let rows = std::mem::take(run);
        if rows.len() >= self.min_rows {
            debug!("OCR table on page {}: {} rows", page, rows.len());
            tables.push(ExtractedTable::new(StrategyKind::Ocr, Some(page), rows));
        }
    }
}

impl TableStrategy for OcrTableStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Ocr
    }

    fn is_available(&self) -> bool {
        self.recognizer.is_some()
    }

    fn extract(&self, doc: &dyn Document) -> Result<Vec<ExtractedTable>, TableError> {
        let recognizer = self
            .recognizer
            .as_ref()
            .ok_or(TableError::Unavailable(StrategyKind::Ocr.name()))?;

        let mut tables = Vec::new();
        for page in Pages::new(doc) {
            // Pages without a raster have nothing to recognize.
            let image = match page.render(self.dpi) {
                Ok(image) => image,
                Err(e) => {
                    trace!("Skipping page {} for OCR tables: {}", page.number, e);
                    continue;
                }
            };
            let result = recognizer.recognize(&image)?;
            tables.extend(self.tables_in(&result.boxes, page.number));
        }
        Ok(tables)
    }
}
