//! Process command - sanitize a single document.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use sift_core::pipeline::{DocumentProcessor, load_recognizer, open_document};
use sift_core::{ArtifactWriter, PseudonymStore};

use super::{artifact_stem, load_config};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or plain text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Skip OCR and use only the text layer
    #[arg(long)]
    no_ocr: bool,

    /// Leave emails, phone numbers and names unmasked
    #[arg(long)]
    no_mask: bool,

    /// Print the processing summary as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if args.no_ocr {
        config.pdf.ocr_enabled = false;
    }
    if args.no_mask {
        config.masking.enabled = false;
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let processor = DocumentProcessor::with_recognizer(&config, load_recognizer(&config))?;
    let doc = open_document(&args.input)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Processing {} pages", doc.page_count()));

    let mut store = PseudonymStore::new();
    let processed = processor.process(doc.as_ref(), &mut store);

    pb.finish_and_clear();

    let writer = ArtifactWriter::new(&args.output_dir);
    let stem = artifact_stem(&args.input);
    let written = writer.write_document(&stem, &processed)?;
    let mapping = writer.write_mapping(&store)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&processed)?);
    } else {
        println!(
            "{} {} pages, {} tables{}",
            style("✓").green(),
            processed.page_count,
            processed.document.tables.len(),
            if processed.used_ocr { " (OCR)" } else { "" }
        );
        if let Some(subject) = &processed.document.subject {
            println!("  Subject: {}", subject);
        }
        println!("  Output:  {}", written.dir.display());
        println!("  Mapping: {}", mapping.display());
    }

    if !processed.warnings.is_empty() {
        eprintln!("{}", style("Warnings:").yellow());
        for warning in &processed.warnings {
            eprintln!("  - {}", warning);
        }
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
