//! Cell-level cleanup applied to every table before deduplication.

use super::ExtractedTable;
use crate::sanitize::disclaimer::looks_like_disclaimer;
use crate::sanitize::patterns::is_cell_noise;

/// Clean one table.
///
/// Cells are trimmed and whitespace-collapsed; disclaimer text and mail-print
/// artefacts are blanked; rows and columns left entirely empty are removed.
/// Returns `None` when no non-empty cell survives.
pub fn clean_table(table: ExtractedTable) -> Option<ExtractedTable> {
    let ExtractedTable { page, strategy, rows } = table;

    let rows: Vec<Vec<String>> = rows
        .into_iter()
        .map(|row| row.iter().map(|cell| clean_cell(cell)).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .collect();

    // Rows may be ragged when a strategy builds the table directly.
    let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
    let keep: Vec<usize> = (0..cols)
        .filter(|&c| rows.iter().any(|row| row.get(c).is_some_and(|cell| !cell.is_empty())))
        .collect();

    let rows: Vec<Vec<String>> = rows
        .into_iter()
        .map(|row| {
            keep.iter()
                .map(|&c| row.get(c).cloned().unwrap_or_default())
                .collect()
        })
        .collect();

    let cleaned = ExtractedTable::new(strategy, page, rows);
    (cleaned.non_empty_cells() > 0).then_some(cleaned)
}

fn clean_cell(cell: &str) -> String {
    let cell = cell.split_whitespace().collect::<Vec<_>>().join(" ");
    if cell.is_empty() || is_cell_noise(&cell) || looks_like_disclaimer(&cell) {
        String::new()
    } else {
        cell
    }
}
