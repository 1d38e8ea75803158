//! Subcommands.

pub mod batch;
pub mod config;
pub mod process;
pub mod validate;

use std::path::{Path, PathBuf};

use sift_core::SiftConfig;

/// Default location of the user configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sift")
        .join("config.json")
}

/// Load the configuration named by `--config`, else the default file if it
/// exists, else built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<SiftConfig> {
    if let Some(path) = config_path {
        return Ok(SiftConfig::from_file(Path::new(path))?);
    }
    let default = default_config_path();
    if default.exists() {
        Ok(SiftConfig::from_file(&default)?)
    } else {
        Ok(SiftConfig::default())
    }
}

/// File stem used to name a document's artifacts.
pub fn artifact_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string()
}
