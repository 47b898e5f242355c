//! Retrieval context assembly.
//!
//! Hits pass through two cuts: the gateway's own `search_top_k` limit with a
//! score threshold applied at query time ([`retrieve`]), then a client-side
//! re-validation, normalization and `top_k` cut ([`assemble`]). The second
//! stage never trusts the first; scores are re-checked against the threshold.
//!
//! Rendered context is one line per hit:
//!
//! ```text
//! [pm-kisan--0000] # PM Kisan _Ministry of Agriculture_ ## Level Central
//! [unknown-id] text of a hit that came back without an id
//! ```

use serde_json::Value;
use std::cmp::Ordering;

use crate::error::Result;
use crate::flatten::stringify;
use crate::gateway::IndexGateway;
use crate::markup::strip_tags;
use crate::models::{RawHit, SearchHit, SearchResponse};

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.3;
pub const DEFAULT_SEARCH_TOP_K: usize = 20;

/// Rendered in place of a missing or empty hit id.
pub const UNKNOWN_ID: &str = "unknown-id";

/// Reserved field carrying the chunk body.
const TEXT_FIELD: &str = "chunk_text";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalOptions {
    /// Lines kept in the rendered context.
    pub top_k: usize,
    /// Minimum score, inclusive.
    pub score_threshold: f64,
    /// Limit requested from the index.
    pub search_top_k: usize,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            search_top_k: DEFAULT_SEARCH_TOP_K,
        }
    }
}

/// Coerce a wire score to a usable float.
///
/// Numbers and numeric strings are accepted. Missing, non-numeric, NaN,
/// infinite and negative scores all become `0.0`.
pub fn coerce_score(raw: Option<&Value>) -> f64 {
    let score = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match score {
        Some(s) if s.is_finite() && s >= 0.0 => s,
        _ => 0.0,
    }
}

/// Keep hits whose coerced score reaches `threshold`.
pub fn filter_by_score(hits: Vec<RawHit>, threshold: f64) -> Vec<RawHit> {
    hits.into_iter()
        .filter(|hit| coerce_score(hit.score.as_ref()) >= threshold)
        .collect()
}

/// Convert raw hits into [`SearchHit`]s: tags stripped from the text, score
/// coerced, and every field but `chunk_text` moved into `meta`.
pub fn normalize_hits(hits: Vec<RawHit>) -> Vec<SearchHit> {
    hits.into_iter()
        .map(|hit| {
            let score = coerce_score(hit.score.as_ref());
            let mut meta = hit.fields.unwrap_or_default();
            let text = meta
                .remove(TEXT_FIELD)
                .map(|v| strip_tags(&stringify(&v)))
                .unwrap_or_default();
            SearchHit {
                id: hit.id,
                score,
                text,
                meta,
            }
        })
        .collect()
}

/// Rank hits by score (stable, descending), keep `top_k`, render one line each.
pub fn build_context(mut hits: Vec<SearchHit>, top_k: usize) -> String {
    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    hits.iter()
        .take(top_k)
        .map(|hit| {
            let id = hit
                .id
                .as_deref()
                .filter(|id| !id.is_empty())
                .unwrap_or(UNKNOWN_ID);
            format!("[{}] {}", id, single_line(&hit.text))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full client-side stage: re-filter, normalize, rank, render.
///
/// Returns `""` when nothing survives.
pub fn assemble(response: SearchResponse, options: &RetrievalOptions) -> String {
    let hits = filter_by_score(response.into_hits(), options.score_threshold);
    build_context(normalize_hits(hits), options.top_k)
}

/// Query the index and apply the query-time threshold.
///
/// An empty result is logged and returned as an empty response.
pub async fn retrieve(
    index: &dyn IndexGateway,
    namespace: &str,
    query: &str,
    options: &RetrievalOptions,
) -> Result<SearchResponse> {
    let response = index.search(namespace, query, options.search_top_k).await?;
    let returned = response.hits().len();
    let hits = filter_by_score(response.into_hits(), options.score_threshold);

    if hits.is_empty() {
        tracing::warn!(
            namespace,
            returned,
            threshold = options.score_threshold,
            "no hits above the score threshold"
        );
    } else {
        tracing::debug!(namespace, returned, kept = hits.len(), "retrieved hits");
    }

    Ok(SearchResponse::from_hits(hits))
}

fn single_line(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}
