//! Append-only agreement history stored as newline-delimited JSON.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::core::errors::{GlossaError, Result};
use crate::evaluation::agreement::AgreementRecord;

/// Append one record as a single JSON line
pub fn append_record(path: &Path, record: &AgreementRecord) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| GlossaError::artifact_write(parent, e))?;
        }
    }

    let line = serde_json::to_string(record)?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| GlossaError::artifact_write(path, e))?;
    writeln!(file, "{line}").map_err(|e| GlossaError::artifact_write(path, e))?;

    tracing::debug!("Appended agreement record for run {} to {}", record.run_id, path.display());
    Ok(())
}

/// Parse history text; blank lines are skipped
pub fn parse_history(content: &str) -> Result<Vec<AgreementRecord>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|e| GlossaError::Serialization {
                message: format!("invalid history record on line {}: {e}", index + 1),
                data_type: Some("AgreementRecord".to_string()),
                source: Some(Box::new(e)),
            })
        })
        .collect()
}

/// Read every record; a missing file is an empty history
pub fn read_history(path: &Path) -> Result<Vec<AgreementRecord>> {
    match fs::read_to_string(path) {
        Ok(content) => parse_history(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(GlossaError::io(
            format!("Failed to read history {}", path.display()),
            e,
        )),
    }
}
