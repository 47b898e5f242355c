//! Pinecone records API client.
//!
//! Uses the integrated-embedding *records* endpoints, so chunk text is sent
//! as-is and the index embeds it server-side:
//!
//! - `POST {host}/records/namespaces/{namespace}/upsert` (NDJSON body)
//! - `POST {host}/records/namespaces/{namespace}/search`
//!
//! The API key is read from the environment variable named by
//! `index.api_key_env`.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use scheme_rag_core::error::{Error, Result as CoreResult};
use scheme_rag_core::gateway::{check_batch, IndexGateway};
use scheme_rag_core::models::{IndexRecord, SearchResponse};

use crate::config::IndexConfig;
use crate::http::{normalize_base_url, send_with_retry};

const SERVICE: &str = "pinecone";
const API_VERSION: &str = "2025-01";

pub struct PineconeIndex {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    max_retries: u32,
}

impl PineconeIndex {
    /// # Errors
    ///
    /// Fails when `index.host` is unset or the API key variable is missing.
    pub fn new(config: &IndexConfig) -> Result<Self> {
        let host = config
            .host
            .as_deref()
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("index.host required for the pinecone provider"))?;

        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            anyhow::anyhow!("{} environment variable not set", config.api_key_env)
        })?;
        if api_key.trim().is_empty() {
            bail!("{} environment variable is empty", config.api_key_env);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: normalize_base_url(host, "https"),
            api_key,
            max_retries: config.max_retries,
        })
    }

    fn records_url(&self, namespace: &str, operation: &str) -> String {
        records_url(&self.base_url, namespace, operation)
    }
}

fn records_url(base_url: &str, namespace: &str, operation: &str) -> String {
    format!("{}/records/namespaces/{}/{}", base_url, namespace, operation)
}

/// One JSON record per line.
pub fn upsert_body(records: &[IndexRecord]) -> serde_json::Result<String> {
    let mut body = String::new();
    for record in records {
        body.push_str(&serde_json::to_string(record)?);
        body.push('\n');
    }
    Ok(body)
}

pub fn search_body(query: &str, top_k: usize) -> Value {
    json!({
        "query": {
            "inputs": {"text": query},
            "top_k": top_k,
        }
    })
}

#[async_trait]
impl IndexGateway for PineconeIndex {
    async fn upsert(&self, namespace: &str, records: &[IndexRecord]) -> CoreResult<()> {
        check_batch(records.len())?;
        if records.is_empty() {
            return Ok(());
        }
        let body = upsert_body(records).map_err(|e| Error::MalformedInput(e.to_string()))?;
        let url = self.records_url(namespace, "upsert");

        send_with_retry(SERVICE, self.max_retries, || {
            self.client
                .post(&url)
                .header("Api-Key", &self.api_key)
                .header("X-Pinecone-API-Version", API_VERSION)
                .header("Content-Type", "application/x-ndjson")
                .body(body.clone())
        })
        .await?;

        tracing::debug!(namespace, records = records.len(), "upserted batch");
        Ok(())
    }

    async fn search(&self, namespace: &str, query: &str, top_k: usize) -> CoreResult<SearchResponse> {
        let body = search_body(query, top_k);
        let url = self.records_url(namespace, "search");

        let response = send_with_retry(SERVICE, self.max_retries, || {
            self.client
                .post(&url)
                .header("Api-Key", &self.api_key)
                .header("X-Pinecone-API-Version", API_VERSION)
                .json(&body)
        })
        .await?;

        response
            .json::<SearchResponse>()
            .await
            .map_err(|e| Error::UpstreamUnavailable {
                service: SERVICE,
                message: format!("invalid search response: {}", e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scheme_rag_core::models::{ChunkMetadata, DocumentMetadata};

    #[test]
    fn test_records_url() {
        assert_eq!(
            records_url("https://idx.svc.pinecone.io", "schemes-v1", "upsert"),
            "https://idx.svc.pinecone.io/records/namespaces/schemes-v1/upsert"
        );
    }

    #[test]
    fn test_upsert_body_is_ndjson_of_flat_records() {
        let record = IndexRecord {
            id: "pm-kisan--0000".to_string(),
            chunk_text: "Income support".to_string(),
            metadata: ChunkMetadata {
                document: DocumentMetadata {
                    title: "PM Kisan".to_string(),
                    ..Default::default()
                },
                chunk_index: 0,
                source_id: "pm-kisan".to_string(),
            },
        };
        let body = upsert_body(&[record.clone(), record]).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["_id"], "pm-kisan--0000");
        assert_eq!(first["chunk_text"], "Income support");
        assert_eq!(first["title"], "PM Kisan");
        assert_eq!(first["chunk_index"], 0);
    }

    #[test]
    fn test_search_body_shape() {
        assert_eq!(
            search_body("farmer income", 20),
            json!({"query": {"inputs": {"text": "farmer income"}, "top_k": 20}})
        );
    }

    #[test]
    fn test_new_requires_host() {
        let config = IndexConfig::default();
        let err = PineconeIndex::new(&config).err().unwrap();
        assert!(err.to_string().contains("index.host"));
    }

    #[test]
    fn test_new_requires_api_key() {
        let config = IndexConfig {
            host: Some("idx.svc.pinecone.io".to_string()),
            api_key_env: "SRAG_TEST_UNSET_PINECONE_KEY".to_string(),
            ..Default::default()
        };
        let err = PineconeIndex::new(&config).err().unwrap();
        assert!(err.to_string().contains("SRAG_TEST_UNSET_PINECONE_KEY"));
    }
}
