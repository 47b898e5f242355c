//! Boundaries to the external collaborators.
//!
//! The core never talks to a network itself. Callers construct one gateway
//! object per collaborator and pass it by reference into the functions that
//! need it:
//!
//! | Trait | Collaborator |
//! |-------|--------------|
//! | [`IndexGateway`] | Semantic index: upsert chunk records, search by text |
//! | [`InferenceBackend`] | Text generation: one prompt in, one completion out |
//! | [`ConversationStore`] | Per-session turn history |
//!
//! Implementations must be `Send + Sync` to work with async runtimes.
//! [`memory`] holds in-process versions of the index and the store.

pub mod memory;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{IndexRecord, SearchResponse, Turn};

/// Hard ceiling on records per upsert call.
pub const MAX_UPSERT_BATCH: usize = 96;

/// Reject a batch larger than [`MAX_UPSERT_BATCH`] before it is sent.
pub fn check_batch(size: usize) -> Result<()> {
    if size > MAX_UPSERT_BATCH {
        return Err(Error::BatchLimitExceeded {
            size,
            limit: MAX_UPSERT_BATCH,
        });
    }
    Ok(())
}

#[async_trait]
pub trait IndexGateway: Send + Sync {
    /// Insert or overwrite records by `_id`. At most [`MAX_UPSERT_BATCH`]
    /// records per call.
    async fn upsert(&self, namespace: &str, records: &[IndexRecord]) -> Result<()>;

    /// Return up to `top_k` hits for `query`, best first.
    async fn search(&self, namespace: &str, query: &str, top_k: usize) -> Result<SearchResponse>;
}

#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Session-keyed history. Storage lifetime is the implementation's choice.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Turns in order; an unknown session has none.
    async fn get(&self, session: &str) -> Result<Vec<Turn>>;

    async fn set(&self, session: &str, turns: Vec<Turn>) -> Result<()>;

    async fn clear(&self, session: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertReport {
    pub batches: usize,
    pub records: usize,
}

/// Upsert `records` in sequential batches of `batch_size`.
///
/// `on_batch(batch_number, len)` runs after each batch lands (1-based).
/// The first failing batch aborts the run; earlier batches stay written.
///
/// # Errors
///
/// [`Error::BatchLimitExceeded`] when `batch_size` is above the ceiling,
/// checked before any call. `batch_size == 0` is rejected as malformed.
pub async fn upsert_batched<F>(
    index: &dyn IndexGateway,
    namespace: &str,
    records: &[IndexRecord],
    batch_size: usize,
    mut on_batch: F,
) -> Result<UpsertReport>
where
    F: FnMut(usize, usize) + Send,
{
    check_batch(batch_size)?;
    if batch_size == 0 {
        return Err(Error::MalformedInput("batch size must be at least 1".to_string()));
    }

    let mut report = UpsertReport::default();
    for (i, batch) in records.chunks(batch_size).enumerate() {
        index.upsert(namespace, batch).await?;
        report.batches += 1;
        report.records += batch.len();
        on_batch(i + 1, batch.len());
    }
    Ok(report)
}
