//! Raw scheme record reader.
//!
//! Accepts three layouts:
//!
//! | Content | Records |
//! |---------|---------|
//! | JSON array | one per element |
//! | JSON object | exactly one |
//! | JSON Lines | one per non-blank line |
//!
//! The whole file is tried as one JSON document first; only if that fails is
//! it read line by line. Unparseable lines are skipped with a warning.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Default)]
pub struct SourceRecords {
    pub records: Vec<Value>,
    /// JSON Lines entries that failed to parse.
    pub bad_lines: usize,
}

/// Read and parse the raw source at `path`.
///
/// # Errors
///
/// Fails when the file cannot be read, or when it has content but not a
/// single record could be parsed from it.
pub fn read_records(path: &Path) -> Result<SourceRecords> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read source file: {}", path.display()))?;
    parse_records(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn parse_records(content: &str) -> Result<SourceRecords> {
    if content.trim().is_empty() {
        return Ok(SourceRecords::default());
    }

    if let Ok(document) = serde_json::from_str::<Value>(content) {
        let records = match document {
            Value::Array(items) => items,
            other => vec![other],
        };
        return Ok(SourceRecords {
            records,
            bad_lines: 0,
        });
    }

    let mut parsed = SourceRecords::default();
    for (i, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(record) => parsed.records.push(record),
            Err(e) => {
                tracing::warn!(line = i + 1, error = %e, "skipping unparseable line");
                parsed.bad_lines += 1;
            }
        }
    }

    if parsed.records.is_empty() {
        bail!("no JSON records found ({} unparseable lines)", parsed.bad_lines);
    }
    Ok(parsed)
}
