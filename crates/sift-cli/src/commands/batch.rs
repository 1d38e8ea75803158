//! Batch processing command for many documents.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{error, warn};

use sift_core::pipeline::{DocumentProcessor, ProcessedDocument, load_recognizer, open_document};
use sift_core::{ArtifactWriter, SharedPseudonymStore};

use super::{artifact_stem, load_config};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of input files
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Skip OCR and use only the text layer
    #[arg(long)]
    no_ocr: bool,
}

/// Outcome of processing a single file.
struct ProcessResult {
    path: PathBuf,
    processed: Option<ProcessedDocument>,
    error: Option<String>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if args.no_ocr {
        config.pdf.ocr_enabled = false;
    }

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(ext.to_lowercase().as_str(), "pdf" | "txt" | "text")
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    fs::create_dir_all(&args.output_dir)?;

    let processor = Arc::new(DocumentProcessor::with_recognizer(
        &config,
        load_recognizer(&config),
    )?);
    let writer = Arc::new(ArtifactWriter::new(&args.output_dir));
    let store = SharedPseudonymStore::new();
    let permits = Arc::new(Semaphore::new(args.jobs.max(1)));
    // Aborting a handle cannot interrupt blocking work already running.
    let cancelled = Arc::new(AtomicBool::new(false));

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut handles = Vec::with_capacity(files.len());
    for path in files {
        let processor = processor.clone();
        let writer = writer.clone();
        let store = store.clone();
        let permits = permits.clone();
        let cancelled = cancelled.clone();
        let pb = pb.clone();

        handles.push(tokio::spawn(async move {
            let _permit = permits.acquire_owned().await?;
            let result = tokio::task::spawn_blocking(move || {
                let outcome = process_single_file(&path, &processor, &writer, store, &cancelled);
                pb.inc(1);
                match outcome {
                    Ok(processed) => ProcessResult {
                        path,
                        processed: Some(processed),
                        error: None,
                    },
                    Err(e) => ProcessResult {
                        path,
                        processed: None,
                        error: Some(e.to_string()),
                    },
                }
            })
            .await?;
            anyhow::Ok(result)
        }));
    }

    // Joined in input order so the summary is stable.
    let mut results = Vec::with_capacity(handles.len());
    let mut pending = handles.into_iter();
    while let Some(handle) = pending.next() {
        let result = handle.await??;
        if let Some(message) = &result.error {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", result.path.display(), message);
            } else {
                error!("Failed to process {}: {}", result.path.display(), message);
                cancelled.store(true, Ordering::SeqCst);
                pending.by_ref().for_each(|h| h.abort());
                pb.abandon();
                writer.write_mapping(&store.snapshot())?;
                anyhow::bail!("Processing failed for {}: {}", result.path.display(), message);
            }
        }
        results.push(result);
    }

    pb.finish_with_message("Complete");

    let mapping = writer.write_mapping(&store.snapshot())?;
    let summary_path = args.output_dir.join("summary.csv");
    write_summary(&summary_path, &results)?;

    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(results.len() - failed.len()).green(),
        style(failed.len()).red()
    );
    println!("   Summary: {}", summary_path.display());
    println!("   Mapping: {}", mapping.display());

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_single_file(
    path: &Path,
    processor: &DocumentProcessor,
    writer: &ArtifactWriter,
    mut store: SharedPseudonymStore,
    cancelled: &AtomicBool,
) -> anyhow::Result<ProcessedDocument> {
    let doc = open_document(path)?;
    let processed = processor.process(doc.as_ref(), &mut store);
    if cancelled.load(Ordering::SeqCst) {
        anyhow::bail!("batch cancelled before writing {}", path.display());
    }
    writer.write_document(&artifact_stem(path), &processed)?;
    Ok(processed)
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "pages",
        "tables",
        "used_ocr",
        "subject",
        "warnings",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        match &result.processed {
            Some(p) => wtr.write_record([
                filename,
                if p.is_degenerate() { "empty" } else { "success" },
                &p.page_count.to_string(),
                &p.document.tables.len().to_string(),
                &p.used_ocr.to_string(),
                p.document.subject.as_deref().unwrap_or(""),
                &p.warnings.len().to_string(),
                &p.processing_time_ms.to_string(),
                "",
            ])?,
            None => wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                "",
                "",
                result.error.as_deref().unwrap_or(""),
            ])?,
        }
    }

    wtr.flush()?;
    Ok(())
}
