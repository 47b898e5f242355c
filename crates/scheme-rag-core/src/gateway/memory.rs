//! In-process gateway implementations for offline use and tests.
//!
//! [`InMemoryIndex`] keeps records per namespace behind `std::sync::RwLock`
//! and scores by lexical overlap: the share of distinct query terms that also
//! occur in the chunk text, so scores lie in `[0, 1]`. It enforces the same
//! batch ceiling as a remote index.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

use super::{check_batch, ConversationStore, IndexGateway};
use crate::error::Result;
use crate::models::{IndexRecord, RawHit, SearchResponse, Turn};

#[derive(Default)]
struct Namespace {
    records: Vec<IndexRecord>,
    positions: HashMap<String, usize>,
}

#[derive(Default)]
pub struct InMemoryIndex {
    namespaces: RwLock<HashMap<String, Namespace>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records stored under `namespace`.
    pub fn len(&self, namespace: &str) -> usize {
        let namespaces = self.namespaces.read().unwrap_or_else(PoisonError::into_inner);
        namespaces.get(namespace).map_or(0, |ns| ns.records.len())
    }

    pub fn is_empty(&self, namespace: &str) -> bool {
        self.len(namespace) == 0
    }
}

/// Lowercased alphanumeric terms.
fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn overlap_score(query_terms: &HashSet<String>, text: &str) -> f64 {
    if query_terms.is_empty() {
        return 0.0;
    }
    let text_terms = terms(text);
    let matched = query_terms.iter().filter(|t| text_terms.contains(*t)).count();
    matched as f64 / query_terms.len() as f64
}

fn to_hit(record: &IndexRecord, score: f64) -> RawHit {
    let mut fields = match serde_json::to_value(record) {
        Ok(Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    };
    fields.remove("_id");
    RawHit {
        id: Some(record.id.clone()),
        score: Some(json!(score)),
        fields: Some(fields),
    }
}

#[async_trait]
impl IndexGateway for InMemoryIndex {
    async fn upsert(&self, namespace: &str, records: &[IndexRecord]) -> Result<()> {
        check_batch(records.len())?;
        let mut namespaces = self.namespaces.write().unwrap_or_else(PoisonError::into_inner);
        let ns = namespaces.entry(namespace.to_string()).or_default();
        for record in records {
            match ns.positions.get(&record.id) {
                Some(&pos) => ns.records[pos] = record.clone(),
                None => {
                    ns.positions.insert(record.id.clone(), ns.records.len());
                    ns.records.push(record.clone());
                }
            }
        }
        Ok(())
    }

    async fn search(&self, namespace: &str, query: &str, top_k: usize) -> Result<SearchResponse> {
        let query_terms = terms(query);
        let namespaces = self.namespaces.read().unwrap_or_else(PoisonError::into_inner);
        let Some(ns) = namespaces.get(namespace) else {
            return Ok(SearchResponse::from_hits(Vec::new()));
        };

        let mut scored: Vec<(f64, &IndexRecord)> = ns
            .records
            .iter()
            .map(|r| (overlap_score(&query_terms, &r.chunk_text), r))
            .filter(|(score, _)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        scored.truncate(top_k);

        Ok(SearchResponse::from_hits(
            scored.into_iter().map(|(s, r)| to_hit(r, s)).collect(),
        ))
    }
}

/// Process-lifetime conversation history.
#[derive(Default)]
pub struct InMemoryConversationStore {
    sessions: RwLock<HashMap<String, Vec<Turn>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn get(&self, session: &str) -> Result<Vec<Turn>> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        Ok(sessions.get(session).cloned().unwrap_or_default())
    }

    async fn set(&self, session: &str, turns: Vec<Turn>) -> Result<()> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.insert(session.to_string(), turns);
        Ok(())
    }

    async fn clear(&self, session: &str) -> Result<()> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.remove(session);
        Ok(())
    }
}
