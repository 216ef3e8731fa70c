//! Result export to JSON and CSV files.
//!
//! File names carry a local timestamp: `<base>_<YYYYMMDD_HHMMSS>.<ext>`.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde_json::{Map, Value};

use crate::search::Record;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to write export: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize records: {0}")]
    Json(#[from] serde_json::Error),
}

/// Output path for `base` with a timestamp suffix and extension.
pub fn timestamped_path(base: &Path, extension: &str, at: NaiveDateTime) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!("_{}.{}", at.format("%Y%m%d_%H%M%S"), extension));
    PathBuf::from(name)
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(())
}

/// Write `records` as a pretty-printed JSON array.
///
/// Returns the written path, or `None` when there is nothing to write.
pub fn export_json(records: &[Record], base: &Path) -> Result<Option<PathBuf>, ExportError> {
    if records.is_empty() {
        return Ok(None);
    }
    let path = timestamped_path(base, "json", Local::now().naive_local());
    let json = serde_json::to_vec_pretty(records)?;
    write_file(&path, &json)?;
    Ok(Some(path))
}

/// Write `records` as CSV with one column per flattened field.
///
/// Nested objects become dotted column names (`links.pdf.DEU`). Columns
/// appear in the order they are first seen across all records.
pub fn export_csv(records: &[Record], base: &Path) -> Result<Option<PathBuf>, ExportError> {
    if records.is_empty() {
        return Ok(None);
    }
    let path = timestamped_path(base, "csv", Local::now().naive_local());
    write_file(&path, to_csv(records).as_bytes())?;
    Ok(Some(path))
}

/// Render records as CSV text.
pub fn to_csv(records: &[Record]) -> String {
    let rows: Vec<Vec<(String, String)>> = records
        .iter()
        .map(|record| {
            let mut cells = Vec::new();
            flatten("", record.fields(), &mut cells);
            cells
        })
        .collect();

    let mut columns: Vec<&str> = Vec::new();
    for cells in &rows {
        for (column, _) in cells {
            if !columns.contains(&column.as_str()) {
                columns.push(column.as_str());
            }
        }
    }

    let mut output = String::new();
    let header: Vec<String> = columns.iter().map(|c| escape_csv(c)).collect();
    output.push_str(&header.join(","));
    output.push('\n');

    for cells in &rows {
        let line: Vec<String> = columns
            .iter()
            .map(|column| {
                cells
                    .iter()
                    .find(|(name, _)| name.as_str() == *column)
                    .map(|(_, value)| escape_csv(value))
                    .unwrap_or_default()
            })
            .collect();
        output.push_str(&line.join(","));
        output.push('\n');
    }

    output
}

fn flatten(prefix: &str, fields: &Map<String, Value>, out: &mut Vec<(String, String)>) {
    for (key, value) in fields {
        let column = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(nested) => flatten(&column, nested, out),
            Value::Null => out.push((column, String::new())),
            Value::String(s) => out.push((column, s.clone())),
            other => out.push((column, other.to_string())),
        }
    }
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
