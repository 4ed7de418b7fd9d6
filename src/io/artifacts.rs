//! Artifact sinks: partition tables, JSON summaries, graph exports, run
//! records and publishing.
//!
//! Every write creates missing parent directories; any failure to do so, or to
//! write the file itself, is an [`GlossaError::ArtifactWrite`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::errors::{GlossaError, Result, ResultExt};
use crate::core::partition::Partition;
use crate::core::run_context::RunRecord;

/// Header row of partition tables
pub const PARTITION_HEADER: [&str; 2] = ["term", "cluster"];

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| GlossaError::artifact_write(parent, e))?;
        }
    }
    Ok(())
}

/// Write text, creating parent directories
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, content).map_err(|e| GlossaError::artifact_write(path, e))?;
    tracing::debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

/// Read an artifact a previous stage should have produced
fn read_stage_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            GlossaError::input(format!(
                "Required artifact {} is missing; run the stage that produces it first",
                path.display()
            ))
        } else {
            GlossaError::io(format!("Failed to read {}", path.display()), e)
        }
    })
}

/// Write a value as pretty-printed JSON
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| GlossaError::Serialization {
        message: format!("Failed to serialize {}: {e}", path.display()),
        data_type: Some(std::any::type_name::<T>().to_string()),
        source: Some(Box::new(e)),
    })?;
    write_text(path, &format!("{json}\n"))
}

/// Read a JSON artifact
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = read_stage_input(path)?;
    serde_json::from_str(&content).map_err(Into::into)
}

/// Quote a CSV field when it contains a delimiter, quote or line break
fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render a partition as a `term,cluster` table in partition order
pub fn partition_to_csv(partition: &Partition) -> String {
    let mut out = String::new();
    out.push_str(&PARTITION_HEADER.join(","));
    out.push('\n');
    for (id, label) in partition.iter() {
        out.push_str(&csv_field(id));
        out.push(',');
        out.push_str(&label.to_string());
        out.push('\n');
    }
    out
}

/// Write a partition table
pub fn write_partition_csv(path: &Path, partition: &Partition) -> Result<()> {
    write_text(path, &partition_to_csv(partition))?;
    tracing::info!(
        "Wrote {} assignments in {} clusters to {}",
        partition.len(),
        partition.num_clusters(),
        path.display()
    );
    Ok(())
}

/// Split CSV text into records of fields, each tagged with the line it
/// starts on
fn parse_csv(content: &str) -> Result<Vec<(usize, Vec<String>)>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();
    let mut line = 1;
    let mut record_line = 1;

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push((record_line, std::mem::take(&mut record)));
                line += 1;
                record_line = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(GlossaError::input(format!(
            "unterminated quoted field starting at line {record_line}"
        )));
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push((record_line, record));
    }
    Ok(records)
}

/// Parse a `term,cluster` table
pub fn partition_from_csv(content: &str) -> Result<Partition> {
    let mut rows = parse_csv(content)?.into_iter();

    match rows.next() {
        Some((_, header)) if header == PARTITION_HEADER => {}
        Some((_, header)) => {
            return Err(GlossaError::input(format!(
                "expected header 'term,cluster', found '{}'",
                header.join(",")
            )))
        }
        None => return Err(GlossaError::input("partition table is empty")),
    }

    let mut partition = Partition::new();
    for (line, row) in rows {
        if row.len() == 1 && row[0].is_empty() {
            continue;
        }
        let [id, label] = row.as_slice() else {
            return Err(GlossaError::input(format!(
                "line {line}: expected 2 fields, found {}",
                row.len()
            )));
        };
        let label: usize = label.trim().parse().map_err(|_| {
            GlossaError::input_field(format!("line {line}: invalid cluster label '{label}'"), id, "cluster")
        })?;
        if partition.contains(id) {
            return Err(GlossaError::input_term(
                format!("line {line}: term assigned twice"),
                id,
            ));
        }
        partition.insert(id.clone(), label)?;
    }
    Ok(partition)
}

/// Read a partition table written by a previous stage
pub fn read_partition_csv(path: &Path) -> Result<Partition> {
    let content = read_stage_input(path)?;
    partition_from_csv(&content).map_err(|e| match e {
        GlossaError::Input { message, term_id, field } => GlossaError::Input {
            message: format!("{}: {message}", path.display()),
            term_id,
            field,
        },
        other => other,
    })
}

/// Persist the run record as `<runs_dir>/<run_id>.json`
pub fn write_run_record(runs_dir: &Path, record: &RunRecord) -> Result<PathBuf> {
    let path = runs_dir.join(format!("{}.json", record.run_id));
    write_json(&path, record)?;
    Ok(path)
}

/// Copy every file under `output` into `docs`, keeping relative layout.
///
/// Returns the destination paths in sorted order.
pub fn publish(output: &Path, docs: &Path) -> Result<Vec<PathBuf>> {
    if !output.is_dir() {
        return Err(GlossaError::input(format!(
            "Output directory {} does not exist; nothing to publish",
            output.display()
        )));
    }

    let mut copied = Vec::new();
    copy_tree(output, docs, &mut copied)?;
    copied.sort();

    tracing::info!(
        "Published {} files from {} to {}",
        copied.len(),
        output.display(),
        docs.display()
    );
    Ok(copied)
}

fn copy_tree(from: &Path, to: &Path, copied: &mut Vec<PathBuf>) -> Result<()> {
    fs::create_dir_all(to).map_err(|e| GlossaError::artifact_write(to, e))?;

    let entries = fs::read_dir(from).with_context(|| format!("Failed to list {}", from.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read an entry of {}", from.display()))?;
        let source = entry.path();
        let destination = to.join(entry.file_name());
        let file_type = entry
            .file_type()
            .with_context(|| format!("Failed to inspect {}", source.display()))?;
        if file_type.is_dir() {
            copy_tree(&source, &destination, copied)?;
        } else {
            fs::copy(&source, &destination).map_err(|e| GlossaError::artifact_write(&destination, e))?;
            copied.push(destination);
        }
    }
    Ok(())
}
