//! Validate command - normalize an extracted field record.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use serde_json::Value;
use tracing::info;

use sift_core::{FieldSchema, FieldValidator, ValidatedRecord};

use super::load_config;

/// Arguments for the validate command.
#[derive(Args)]
pub struct ValidateArgs {
    /// JSON file holding one record, an array of records, or `{"schemes": [...]}`
    #[arg(required = true)]
    input: PathBuf,

    /// Field schema (default: configured schema, else the built-in scheme header)
    #[arg(short, long)]
    schema: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Exit with an error when any field fails validation
    #[arg(long)]
    strict: bool,
}

pub async fn run(args: ValidateArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let schema = match args.schema.as_ref().or(config.validation.schema_path.as_ref()) {
        Some(path) => {
            info!("Using schema {}", path.display());
            FieldSchema::from_file(path)?
        }
        None => FieldSchema::scheme_header(),
    };
    let validator = FieldValidator::new(schema);

    let raw: Value = serde_json::from_str(&fs::read_to_string(&args.input)?)?;
    let records = records_of(&raw)?;

    let validated: Vec<ValidatedRecord> = records
        .iter()
        .map(|record| validator.validate_record(record))
        .collect();

    let output = if validated.len() == 1 && raw.is_object() && raw.get("schemes").is_none() {
        serde_json::to_string_pretty(&validated[0])?
    } else {
        serde_json::to_string_pretty(&validated)?
    };

    if let Some(path) = &args.output {
        fs::write(path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            path.display()
        );
    } else {
        println!("{}", output);
    }

    let errors: Vec<&String> = validated.iter().flat_map(|r| &r.errors).collect();
    if !errors.is_empty() {
        eprintln!("{}", style("Validation issues:").yellow());
        for error in &errors {
            eprintln!("  - {}", error);
        }
        if args.strict {
            anyhow::bail!("{} fields failed validation", errors.len());
        }
    }

    Ok(())
}

/// The records inside an input document.
fn records_of(raw: &Value) -> anyhow::Result<Vec<&serde_json::Map<String, Value>>> {
    let items: Vec<&Value> = match raw {
        Value::Object(obj) => match obj.get("schemes") {
            Some(Value::Array(schemes)) => schemes.iter().collect(),
            _ => vec![raw],
        },
        Value::Array(items) => items.iter().collect(),
        _ => anyhow::bail!("Expected a JSON object or array of objects"),
    };

    items
        .into_iter()
        .map(|item| {
            item.as_object()
                .ok_or_else(|| anyhow::anyhow!("Expected a JSON object, got {}", item))
        })
        .collect()
}
