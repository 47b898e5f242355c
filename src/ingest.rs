//! Ingestion commands.
//!
//! `build`: raw JSON/JSONL → flatten → synthesize → chunk → NDJSON artifact.
//! `upsert`: NDJSON artifact → cleaned index records → batched upsert.
//!
//! A record that cannot be processed is reported and skipped; only an
//! unreadable source fails the build.

use anyhow::{bail, Result};
use std::path::Path;

use scheme_rag_core::document::{build_documents, BuildReport};
use scheme_rag_core::gateway::{upsert_batched, IndexGateway, UpsertReport, MAX_UPSERT_BATCH};
use scheme_rag_core::models::IndexRecord;

use crate::artifact::{read_jsonl, write_jsonl};
use crate::config::Config;
use crate::gateways::create_index;
use crate::source::read_records;

/// Build chunks from `input` and write them to `out`.
pub fn build_artifact(config: &Config, input: &Path, out: &Path) -> Result<BuildReport> {
    let source = read_records(input)?;
    if source.bad_lines > 0 {
        tracing::warn!(bad_lines = source.bad_lines, "some source lines were not valid JSON");
    }

    let counter = config.chunking.token_counter()?;
    let report = build_documents(&source.records, &config.chunking.options(), counter.as_ref());
    write_jsonl(out, &report.chunks)?;

    tracing::info!(
        records = report.records,
        chunks = report.chunks.len(),
        skipped = report.skipped.len(),
        "build complete"
    );
    Ok(report)
}

pub fn run_build(config: &Config, input: &Path, out: &Path) -> Result<()> {
    let report = build_artifact(config, input, out)?;

    println!("Wrote {} chunks to {}", report.chunks.len(), out.display());
    println!("  records: {}", report.records);
    println!("  empty records: {}", report.empty_records);
    println!("  skipped records: {}", report.skipped.len());
    for skipped in &report.skipped {
        println!("    #{}: {}", skipped.index, skipped.reason);
    }
    Ok(())
}

/// Resolve the effective batch size, rejecting anything above the ceiling.
pub fn resolve_batch_size(config: &Config, override_size: Option<usize>) -> Result<usize> {
    let size = override_size.unwrap_or(config.index.batch_size);
    if size == 0 {
        bail!("batch size must be at least 1");
    }
    if size > MAX_UPSERT_BATCH {
        bail!(
            "batch size {} exceeds the upsert limit of {}",
            size,
            MAX_UPSERT_BATCH
        );
    }
    Ok(size)
}

/// Load the artifact at `input` and upsert it into `index`.
pub async fn upsert_artifact(
    index: &dyn IndexGateway,
    namespace: &str,
    input: &Path,
    batch_size: usize,
) -> Result<UpsertReport> {
    let chunks = read_jsonl(input)?;
    let records: Vec<IndexRecord> = chunks.iter().map(IndexRecord::from).collect();
    println!("Loaded {} records from {}", records.len(), input.display());

    let report = upsert_batched(index, namespace, &records, batch_size, |batch, len| {
        println!("  upserted batch {} with {} records", batch, len);
    })
    .await?;
    Ok(report)
}

pub async fn run_upsert(
    config: &Config,
    input: Option<&Path>,
    batch_size: Option<usize>,
) -> Result<()> {
    let batch_size = resolve_batch_size(config, batch_size)?;
    let input = input.unwrap_or(config.index.artifact.as_path());

    let index = create_index(config).await?;
    let report = upsert_artifact(index.as_ref(), &config.index.namespace, input, batch_size).await?;

    println!(
        "Upserted {} records in {} batches to namespace {}",
        report.records, report.batches, config.index.namespace
    );
    println!("ok");
    Ok(())
}
