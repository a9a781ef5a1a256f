// flowsync/src/utils/verbose_log.rs
use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes a verbose sync log as pretty JSON into `log_dir`.
///
/// The file is named `<sync name>_<timestamp>.json`; the sync name is reduced
/// to filesystem-safe characters.
pub fn write_verbose_log<T: Serialize>(log_dir: &Path, sync_name: &str, logs: &T) -> Result<PathBuf> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let safe_name: String = sync_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let timestamp = Local::now().format("%Y-%m-%d_%H_%M_%S").to_string();
    let path = log_dir.join(format!("{}_{}.json", safe_name, timestamp));

    let body = serde_json::to_string_pretty(logs).context("Failed to serialize verbose logs")?;
    fs::write(&path, body)
        .with_context(|| format!("Failed to write verbose log file: {}", path.display()))?;
    Ok(path)
}
