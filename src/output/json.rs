use crate::report::Report;
use anyhow::{Context, Result};
use std::path::Path;

/// Serialize a report as pretty-printed JSON
pub fn render_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize report to JSON")
}

/// Write report to a JSON file, creating missing parent directories
pub fn write_report(report: &Report, path: &Path) -> Result<()> {
    let json = render_report(report)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    std::fs::write(path, json).with_context(|| format!("Failed to write report to {:?}", path))?;

    Ok(())
}
