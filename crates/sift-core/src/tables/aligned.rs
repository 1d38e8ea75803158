//! Borderless tables: consecutive lines split into the same number of columns
//! by runs of whitespace.

use tracing::{debug, trace};

use super::{ExtractedTable, StrategyKind, TableStrategy};
use crate::error::TableError;
use crate::models::config::TableConfig;
use crate::pdf::{Document, Pages};

pub struct AlignedStrategy {
    min_rows: usize,
    min_cols: usize,
    min_gap: usize,
}

impl AlignedStrategy {
    pub fn new(config: &TableConfig) -> Self {
        Self {
            min_rows: config.min_rows,
            min_cols: config.min_cols,
            min_gap: config.min_column_gap.max(2),
        }
    }

    fn split_row(&self, line: &str) -> Option<Vec<String>> {
        let line = line.trim();
        if line.is_empty() || line.contains(['|', '│']) {
            return None;
        }
        let cells: Vec<String> = split_on_gaps(line, self.min_gap)
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        (cells.len() >= self.min_cols).then_some(cells)
    }

    fn tables_in(&self, text: &str, page: usize) -> Vec<ExtractedTable> {
        let mut tables = Vec::new();
        let mut run: Vec<Vec<String>> = Vec::new();

        for line in text.lines() {
            match self.split_row(line) {
                Some(cells) if run.first().is_none_or(|first| first.len() == cells.len()) => {
                    run.push(cells);
                }
                Some(cells) => {
                    self.flush(&mut run, page, &mut tables);
                    run.push(cells);
                }
                None => self.flush(&mut run, page, &mut tables),
            }
        }
        self.flush(&mut run, page, &mut tables);
        tables
    }

    fn flush(&self, run: &mut Vec<Vec<String>>, page: usize, tables: &mut Vec<ExtractedTable>) {
        let rows = std::mem::take(run);
        if rows.len() < self.min_rows {
            return;
        }
        if is_list_pattern(&rows) {
            trace!("Rejected list-like run of {} rows on page {}", rows.len(), page);
            return;
        }
        debug!("Aligned table on page {}: {}x{}", page, rows.len(), rows[0].len());
        tables.push(ExtractedTable::new(StrategyKind::Aligned, Some(page), rows));
    }
}

/// Split on tabs or on runs of at least `min_gap` spaces.
fn split_on_gaps(line: &str, min_gap: usize) -> Vec<&str> {
    let mut cells = Vec::new();
    let mut start = 0;
    let mut spaces = 0;
    for (i, ch) in line.char_indices() {
        match ch {
            '\t' => {
                cells.push(&line[start..i - spaces]);
                start = i + 1;
                spaces = 0;
            }
            ' ' => spaces += 1,
            _ => {
                if spaces >= min_gap {
                    cells.push(&line[start..i - spaces]);
                    start = i;
                }
                spaces = 0;
            }
        }
    }
    cells.push(&line[start..]);
    cells
}

impl TableStrategy for AlignedStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Aligned
    }

    fn extract(&self, doc: &dyn Document) -> Result<Vec<ExtractedTable>, TableError> {
        let mut tables = Vec::new();
        for page in Pages::new(doc) {
            tables.extend(self.tables_in(&page.text()?, page.number));
        }
        Ok(tables)
    }
}

/// Runs whose first column is mostly list markers are lists, not tables.
fn is_list_pattern(rows: &[Vec<String>]) -> bool {
    let bullets = rows.iter().filter(|r| is_bullet_marker(&r[0])).count();
    let numbers = rows.iter().filter(|r| is_number_marker(&r[0])).count();

    if bullets * 2 >= rows.len() {
        return true;
    }
    // Numbered first columns are common in real tables; only reject two-column runs.
    rows[0].len() == 2 && (bullets + numbers) * 2 >= rows.len()
}

fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "►" | "■" | "●" | "➤"
    )
}

fn is_number_marker(text: &str) -> bool {
    let text = text.trim();
    let digits = text.trim_end_matches(['.', ')']);
    !digits.is_empty()
        && digits.len() + 1 >= text.len()
        && digits.chars().all(|c| c.is_ascii_digit())
}
