//! Core data models shared by the ingestion and query paths.
//!
//! The serialized shapes here are interchange formats: [`ChunkRecord`] is one
//! line of the NDJSON chunk artifact, [`IndexRecord`] is what the index
//! receives on upsert, and [`SearchResponse`] is what it returns on search.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::markup::clean_chunk_text;

/// Document-level metadata extracted from a scheme record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub ministry: String,
    #[serde(default)]
    pub department: String,
}

/// Metadata carried by every chunk: the document metadata plus its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    #[serde(flatten)]
    pub document: DocumentMetadata,
    pub chunk_index: usize,
    pub source_id: String,
}

/// One token-bounded slice of a synthesized document.
///
/// `id` is `{source_id}--{chunk_index:04}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// A chunk in the shape the index accepts: `{_id, chunk_text, ...metadata}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub chunk_text: String,
    #[serde(flatten)]
    pub metadata: ChunkMetadata,
}

impl From<&ChunkRecord> for IndexRecord {
    fn from(chunk: &ChunkRecord) -> Self {
        Self {
            id: chunk.id.clone(),
            chunk_text: clean_chunk_text(&chunk.text),
            metadata: chunk.metadata.clone(),
        }
    }
}

/// Raw search response as returned by the index.
///
/// Every level is optional on the wire; missing levels read as "no hits".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub result: Option<SearchResult>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub hits: Vec<RawHit>,
}

/// One hit exactly as the index reports it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawHit {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    /// Usually a number, but tolerated as anything and coerced later.
    #[serde(rename = "_score", default)]
    pub score: Option<Value>,
    #[serde(default)]
    pub fields: Option<Map<String, Value>>,
}

impl SearchResponse {
    pub fn from_hits(hits: Vec<RawHit>) -> Self {
        Self {
            result: Some(SearchResult { hits }),
        }
    }

    pub fn hits(&self) -> &[RawHit] {
        self.result.as_ref().map(|r| r.hits.as_slice()).unwrap_or(&[])
    }

    pub fn into_hits(self) -> Vec<RawHit> {
        self.result.map(|r| r.hits).unwrap_or_default()
    }
}

/// A search hit after client-side normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: Option<String>,
    /// Finite and non-negative; anything else was coerced to `0.0`.
    pub score: f64,
    /// Chunk text with markup tags removed.
    pub text: String,
    /// Every field of the hit except `chunk_text`.
    pub meta: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

impl Role {
    /// Label used when rendering history into a prompt.
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Bot => "Bot",
        }
    }
}

/// One message in a session's running history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_chunk() -> ChunkRecord {
        ChunkRecord {
            id: "pm-kisan--0000".to_string(),
            text: "# PM Kisan<br/>Income support.".to_string(),
            metadata: ChunkMetadata {
                document: DocumentMetadata {
                    title: "PM Kisan".to_string(),
                    ministry: "Ministry of Agriculture".to_string(),
                    department: String::new(),
                },
                chunk_index: 0,
                source_id: "pm-kisan".to_string(),
            },
        }
    }

    #[test]
    fn test_chunk_record_wire_shape() {
        let value = serde_json::to_value(sample_chunk()).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "pm-kisan--0000",
                "text": "# PM Kisan<br/>Income support.",
                "metadata": {
                    "title": "PM Kisan",
                    "ministry": "Ministry of Agriculture",
                    "department": "",
                    "chunk_index": 0,
                    "source_id": "pm-kisan"
                }
            })
        );
    }

    #[test]
    fn test_chunk_metadata_key_order() {
        let line = serde_json::to_string(&sample_chunk().metadata).unwrap();
        let title = line.find("\"title\"").unwrap();
        let department = line.find("\"department\"").unwrap();
        let index = line.find("\"chunk_index\"").unwrap();
        let source = line.find("\"source_id\"").unwrap();
        assert!(title < department && department < index && index < source);
    }

    #[test]
    fn test_index_record_is_flat_and_cleaned() {
        let record = IndexRecord::from(&sample_chunk());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["_id"], "pm-kisan--0000");
        assert_eq!(value["chunk_text"], "# PM Kisan\nIncome support.");
        assert_eq!(value["source_id"], "pm-kisan");
        assert_eq!(value["chunk_index"], 0);
        assert!(value.get("metadata").is_none());
    }

    #[test]
    fn test_search_response_tolerates_missing_levels() {
        let empty: SearchResponse = serde_json::from_value(json!({})).unwrap();
        assert!(empty.hits().is_empty());

        let null_result: SearchResponse = serde_json::from_value(json!({"result": null})).unwrap();
        assert!(null_result.hits().is_empty());

        let response: SearchResponse = serde_json::from_value(json!({
            "result": {"hits": [{"_id": "a", "_score": 0.8, "fields": {"chunk_text": "x"}}, {}]}
        }))
        .unwrap();
        assert_eq!(response.hits().len(), 2);
        assert_eq!(response.hits()[0].id.as_deref(), Some("a"));
        assert!(response.hits()[1].fields.is_none());
    }

    #[test]
    fn test_turn_roles_serialize_lowercase() {
        let value = serde_json::to_value(Turn::bot("hello")).unwrap();
        assert_eq!(value, json!({"role": "bot", "text": "hello"}));
        assert_eq!(Role::User.label(), "User");
    }
}
