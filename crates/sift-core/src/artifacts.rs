//! On-disk layout of run outputs.
//!
//! ```text
//! <out>/<stem>/<stem>_full_text.txt
//! <out>/<stem>/<stem>_page<P>_table_<N>.csv
//! <out>/<stem>/<stem>_summary.json
//! <out>/pii_mapping.json
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Result, Warning};
use crate::extract::PageReport;
use crate::mask::PseudonymStore;
use crate::pipeline::ProcessedDocument;

pub const MAPPING_FILE: &str = "pii_mapping.json";

/// Summary written next to each document's text.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary<'a> {
    pub source: &'a str,
    pub page_count: usize,
    pub table_count: usize,
    pub duplicate_tables: usize,
    pub used_ocr: bool,
    pub subject: Option<&'a str>,
    pub text_length: usize,
    pub pages: &'a [PageReport],
    pub warnings: &'a [Warning],
    pub processing_time_ms: u64,
}

/// Paths written for one document.
#[derive(Debug, Clone, Default)]
pub struct DocumentArtifacts {
    pub dir: PathBuf,
    pub text: PathBuf,
    pub tables: Vec<PathBuf>,
    pub summary: PathBuf,
}

/// Writes per-document artifacts and the run's pseudonym map.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    out_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn mapping_path(&self) -> PathBuf {
        self.out_dir.join(MAPPING_FILE)
    }

    /// Write text, tables and summary for one processed document.
    pub fn write_document(&self, stem: &str, processed: &ProcessedDocument) -> Result<DocumentArtifacts> {
        let dir = self.out_dir.join(stem);
        std::fs::create_dir_all(&dir)?;

        let text = dir.join(format!("{}_full_text.txt", stem));
        std::fs::write(&text, &processed.document.text)?;

        let mut counters: HashMap<Option<usize>, usize> = HashMap::new();
        let mut tables = Vec::with_capacity(processed.document.tables.len());
        for table in &processed.document.tables {
            let n = counters.entry(table.page).or_insert(0);
            *n += 1;
            let name = match table.page {
                Some(page) => format!("{}_page{}_table_{}.csv", stem, page, n),
                None => format!("{}_table_{}.csv", stem, n),
            };
            let path = dir.join(name);
            table.write_csv(&path)?;
            debug!("Wrote {}", path.display());
            tables.push(path);
        }

        let summary = dir.join(format!("{}_summary.json", stem));
        let doc = &processed.document;
        let content = DocumentSummary {
            source: stem,
            page_count: processed.page_count,
            table_count: doc.tables.len(),
            duplicate_tables: processed.duplicate_tables,
            used_ocr: processed.used_ocr,
            subject: doc.subject.as_deref(),
            text_length: doc.text.chars().count(),
            pages: &processed.pages,
            warnings: &processed.warnings,
            processing_time_ms: processed.processing_time_ms,
        };
        std::fs::write(&summary, serde_json::to_string_pretty(&content)?)?;

        info!("Wrote artifacts for {} to {}", stem, dir.display());
        Ok(DocumentArtifacts {
            dir,
            text,
            tables,
            summary,
        })
    }

    /// Persist the pseudonym map. Called once, at the end of a run.
    pub fn write_mapping(&self, store: &PseudonymStore) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.out_dir)?;
        let path = self.mapping_path();
        store.save(&path)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::{PiiCategory, TokenAssigner};
    use crate::sanitize::SanitizedDocument;
    use crate::tables::{ExtractedTable, StrategyKind, table};
    use pretty_assertions::assert_eq;

    fn processed() -> ProcessedDocument {
        ProcessedDocument {
            page_count: 2,
            document: SanitizedDocument {
                text: "Subject: Offer\n\nBody".to_string(),
                subject: Some("Offer".to_string()),
                tables: vec![
                    table(StrategyKind::Ruled, 2, &[&["a", "b"], &["1", "2"]]),
                    table(StrategyKind::Aligned, 2, &[&["c", "d"], &["3", "4"]]),
                    ExtractedTable::new(
                        StrategyKind::Ocr,
                        None,
                        vec![vec!["x".to_string(), "y".to_string()]],
                    ),
                ],
            },
            ..ProcessedDocument::default()
        }
    }

    #[test]
    fn test_document_layout() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path());
        let written = writer.write_document("mail_01", &processed()).unwrap();

        let names: Vec<String> = written
            .tables
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "mail_01_page2_table_1.csv",
                "mail_01_page2_table_2.csv",
                "mail_01_table_1.csv",
            ]
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("mail_01/mail_01_full_text.txt")).unwrap(),
            "Subject: Offer\n\nBody"
        );
        assert_eq!(
            std::fs::read_to_string(&written.tables[0]).unwrap(),
            "a,b\n1,2\n"
        );

        let summary: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&written.summary).unwrap()).unwrap();
        assert_eq!(summary["page_count"], 2);
        assert_eq!(summary["table_count"], 3);
        assert_eq!(summary["subject"], "Offer");
        assert_eq!(summary["text_length"], 20);
    }

    #[test]
    fn test_mapping_written_at_run_root() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path().join("out"));
        let mut store = PseudonymStore::new();
        store.assign(PiiCategory::Email, "a@example.com");

        let path = writer.write_mapping(&store).unwrap();
        assert_eq!(path, dir.path().join("out").join(MAPPING_FILE));
        assert!(std::fs::read_to_string(path).unwrap().contains("EMAIL_1"));
    }
}
