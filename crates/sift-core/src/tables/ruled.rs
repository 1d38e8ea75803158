//! Ruled (bordered) tables: rows whose cells are separated by drawn rules.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

use super::{ExtractedTable, StrategyKind, TableStrategy};
use crate::error::TableError;
use crate::models::config::TableConfig;
use crate::pdf::{Document, Pages};

lazy_static! {
    /// Horizontal rule lines: `+---+---+`, `|---|---|`, `├──┼──┤`, `=====`.
    static ref RULE_LINE: Regex =
        Regex::new(r"^[\s+|│┃├┤┼┌┐└┘┬┴╋╠╣╬═─━=:-]*[-─━═=]{3,}[\s+|│┃├┤┼┌┐└┘┬┴╋╠╣╬═─━=:-]*$").unwrap();
}

const DELIMITERS: &[char] = &['|', '│', '┃', '║'];

pub struct RuledStrategy {
    min_rows: usize,
    min_cols: usize,
}

impl RuledStrategy {
    pub fn new(config: &TableConfig) -> Self {
        Self {
            min_rows: config.min_rows,
            min_cols: config.min_cols,
        }
    }

    fn parse_row(&self, line: &str) -> Option<Vec<String>> {
        let line = line.trim();
        if !line.contains(DELIMITERS) {
            return None;
        }
        let inner = line.strip_prefix(DELIMITERS).unwrap_or(line);
        let inner = inner.strip_suffix(DELIMITERS).unwrap_or(inner);
        let cells: Vec<String> = inner.split(DELIMITERS).map(|c| c.trim().to_string()).collect();
        (cells.len() >= self.min_cols).then_some(cells)
    }

    fn tables_in(&self, text: &str, page: usize) -> Vec<ExtractedTable> {
        let mut tables = Vec::new();
        let mut rows: Vec<Vec<String>> = Vec::new();

        for line in text.lines() {
            if RULE_LINE.is_match(line.trim()) {
                continue;
            }
            match self.parse_row(line) {
                Some(cells) => rows.push(cells),
                None => self.flush(&mut rows, page, &mut tables),
            }
        }
        self.flush(&mut rows, page, &mut tables);
        tables
    }

    fn flush(&self, rows: &mut Vec<Vec<String>>, page: usize, tables: &mut Vec<ExtractedTable>) {
        if rows.len() >= self.min_rows {
            trace!("Ruled table on page {}: {} rows", page, rows.len());
            tables.push(ExtractedTable::new(
                StrategyKind::Ruled,
                Some(page),
                std::mem::take(rows),
            ));
        } else {
            rows.clear();
        }
    }
}

impl TableStrategy for RuledStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Ruled
    }

    fn extract(&self, doc: &dyn Document) -> Result<Vec<ExtractedTable>, TableError> {
        let mut tables = Vec::new();
        for page in Pages::new(doc) {
            tables.extend(self.tables_in(&page.text()?, page.number));
        }
        Ok(tables)
    }
}
