//! Strategy registry: runs every available strategy, then pools and
//! deduplicates results in priority order.

use std::collections::HashSet;
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::cleaner::clean_table;
use super::{AlignedStrategy, ExtractedTable, OcrTableStrategy, RuledStrategy, StrategyKind, TableStrategy};
use crate::error::{TableError, Warning, WarningKind};
use crate::models::config::TableConfig;
use crate::ocr::TextRecognizer;
use crate::pdf::Document;

/// Pooled, cleaned and deduplicated tables of one document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TableExtraction {
    pub tables: Vec<ExtractedTable>,
    /// Tables dropped as duplicates of a higher-priority result.
    pub duplicates: usize,
    pub warnings: Vec<Warning>,
}

pub struct TableExtractionEnsemble {
    strategies: Vec<Box<dyn TableStrategy>>,
}

impl TableExtractionEnsemble {
    /// Build an ensemble; the order of `strategies` is the deduplication priority.
    pub fn new(strategies: Vec<Box<dyn TableStrategy>>) -> Self {
        for s in &strategies {
            if s.is_available() {
                info!("Table strategy {} available", s.kind().name());
            } else {
                info!("Table strategy {} unavailable", s.kind().name());
            }
        }
        Self { strategies }
    }

    /// Build the configured strategies in configured order, ignoring repeats.
    pub fn from_config(
        config: &TableConfig,
        render_dpi: u32,
        recognizer: Option<Arc<dyn TextRecognizer>>,
    ) -> Self {
        let mut seen = HashSet::new();
        let strategies = config
            .strategies
            .iter()
            .filter(|kind| seen.insert(**kind))
            .map(|kind| -> Box<dyn TableStrategy> {
                match kind {
                    StrategyKind::Ruled => Box::new(RuledStrategy::new(config)),
                    StrategyKind::Aligned => Box::new(AlignedStrategy::new(config)),
                    StrategyKind::Ocr => {
                        Box::new(OcrTableStrategy::new(config, render_dpi, recognizer.clone()))
                    }
                }
            })
            .collect();
        Self::new(strategies)
    }

    pub fn strategy_kinds(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    /// Run all available strategies concurrently and merge their results.
    ///
    /// A failing strategy is excluded with a warning. The merge walks results
    /// in priority order, so the first strategy to report a fingerprint wins
    /// regardless of which finished first.
    pub fn extract(&self, doc: &dyn Document) -> TableExtraction {
        let outcomes: Vec<(StrategyKind, Option<Result<Vec<ExtractedTable>, TableError>>)> = self
            .strategies
            .par_iter()
            .map(|s| {
                let outcome = s.is_available().then(|| s.extract(doc));
                (s.kind(), outcome)
            })
            .collect();

        let mut merged = TableExtraction::default();
        let mut seen = HashSet::new();

        for (kind, outcome) in outcomes {
            let tables = match outcome {
                None => {
                    debug!("Skipping unavailable strategy {}", kind.name());
                    continue;
                }
                Some(Err(e)) => {
                    warn!("Table strategy {} failed: {}", kind.name(), e);
                    merged.warnings.push(Warning::new(
                        WarningKind::TableStrategy,
                        format!("{}: {}", kind.name(), e),
                    ));
                    continue;
                }
                Some(Ok(tables)) => tables,
            };

            let found = tables.len();
            for table in tables.into_iter().filter_map(clean_table) {
                if seen.insert(table.fingerprint()) {
                    merged.tables.push(table);
                } else {
                    merged.duplicates += 1;
                }
            }
            debug!("Strategy {} found {} tables", kind.name(), found);
        }

        info!(
            "Tables: {} kept, {} duplicates dropped",
            merged.tables.len(),
            merged.duplicates
        );
        merged
    }
}
