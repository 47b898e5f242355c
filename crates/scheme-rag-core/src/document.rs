//! Document builder: flatten → synthesize → chunk, with stable chunk ids.
//!
//! Records are independent, so [`build_documents`] fans them out across the
//! rayon pool and collects in input order. Chunk indices restart at zero for
//! every record.
//!
//! A record that fails to flatten is reported in [`BuildReport::skipped`] and
//! the rest of the batch proceeds.

use rayon::prelude::*;
use serde_json::Value;

use crate::chunk::{chunk_text, ChunkOptions};
use crate::error::{Error, Result};
use crate::flatten::flatten;
use crate::models::{ChunkMetadata, ChunkRecord, DocumentMetadata};
use crate::synthesize::synthesize;
use crate::tokenizer::TokenCounter;

/// The joined `title-ministry-department` is cut to this many characters
/// before slugging.
pub const BASE_ID_MAX_CHARS: usize = 80;

/// URL-style slug: the input is transliterated to ASCII, then ASCII
/// alphanumerics are kept in lowercase and every other run of characters
/// collapses into one `-`, with no leading or trailing dashes.
///
/// A straight `'` separates words. Quotes produced by transliteration, such
/// as the one `’` becomes, vanish without leaving a separator.
pub fn slugify(input: &str) -> String {
    let ascii = deunicode::deunicode(&input.replace('\'', "-"));
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_dash = false;

    for c in ascii.chars() {
        if c == '\'' {
            continue;
        }
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Stable per-document id prefix, or a random one when nothing sluggable
/// is present.
pub fn base_id(metadata: &DocumentMetadata) -> String {
    let joined = [
        metadata.title.as_str(),
        metadata.ministry.as_str(),
        metadata.department.as_str(),
    ]
    .join("-");
    let truncated: String = joined.chars().take(BASE_ID_MAX_CHARS).collect();

    let slug = slugify(&truncated);
    if slug.is_empty() {
        uuid::Uuid::new_v4().to_string()
    } else {
        slug
    }
}

pub fn chunk_id(base: &str, index: usize) -> String {
    format!("{}--{:04}", base, index)
}

/// Build every chunk for one raw record.
///
/// An empty synthesized document yields an empty vector, not an error.
///
/// # Errors
///
/// [`Error::MalformedInput`] when the record is not a mapping or nests
/// beyond the flattener's depth limit.
pub fn build_document(
    record: &Value,
    options: &ChunkOptions,
    counter: &dyn TokenCounter,
) -> Result<Vec<ChunkRecord>> {
    if !record.is_object() {
        return Err(Error::MalformedInput(format!(
            "expected a JSON object, found {}",
            kind_of(record)
        )));
    }

    let flat = flatten(record)?;
    let doc = synthesize(&flat);
    if doc.text.is_empty() {
        return Ok(Vec::new());
    }

    let source_id = base_id(&doc.metadata);
    let chunks = chunk_text(&doc.text, options, counter)
        .into_iter()
        .enumerate()
        .map(|(index, text)| ChunkRecord {
            id: chunk_id(&source_id, index),
            text,
            metadata: ChunkMetadata {
                document: doc.metadata.clone(),
                chunk_index: index,
                source_id: source_id.clone(),
            },
        })
        .collect();

    Ok(chunks)
}

/// A record left out of the build, by its position in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// All chunks, grouped by record in input order.
    pub chunks: Vec<ChunkRecord>,
    /// Number of records read.
    pub records: usize,
    /// Records that parsed but synthesized to no text.
    pub empty_records: usize,
    pub skipped: Vec<SkippedRecord>,
}

/// Build chunks for a batch of records in parallel.
pub fn build_documents(
    records: &[Value],
    options: &ChunkOptions,
    counter: &dyn TokenCounter,
) -> BuildReport {
    let results: Vec<Result<Vec<ChunkRecord>>> = records
        .par_iter()
        .map(|record| build_document(record, options, counter))
        .collect();

    let mut report = BuildReport {
        records: records.len(),
        ..Default::default()
    };

    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(chunks) if chunks.is_empty() => report.empty_records += 1,
            Ok(chunks) => report.chunks.extend(chunks),
            Err(e) => {
                tracing::warn!(record = index, error = %e, "skipping record");
                report.skipped.push(SkippedRecord {
                    index,
                    reason: e.to_string(),
                });
            }
        }
    }

    report
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
