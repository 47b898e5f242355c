//! Ollama inference backend (`POST /api/generate`, non-streaming).

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use scheme_rag_core::error::{Error, Result as CoreResult};
use scheme_rag_core::gateway::InferenceBackend;

use crate::config::InferenceConfig;
use crate::http::{normalize_base_url, send_with_retry};

const SERVICE: &str = "ollama";

pub struct OllamaBackend {
    client: reqwest::Client,
    url: String,
    model: String,
    max_retries: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

impl OllamaBackend {
    pub fn new(config: &InferenceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            url: format!("{}/api/generate", normalize_base_url(&config.url, "http")),
            model: config.model.clone(),
            max_retries: config.max_retries,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

pub fn generate_body(model: &str, prompt: &str) -> Value {
    json!({
        "model": model,
        "prompt": prompt,
        "stream": false,
    })
}

#[async_trait]
impl InferenceBackend for OllamaBackend {
    async fn generate(&self, prompt: &str) -> CoreResult<String> {
        let body = generate_body(&self.model, prompt);
        let response = send_with_retry(SERVICE, self.max_retries, || {
            self.client.post(&self.url).json(&body)
        })
        .await?;

        let parsed: GenerateResponse =
            response
                .json()
                .await
                .map_err(|e| Error::UpstreamUnavailable {
                    service: SERVICE,
                    message: format!("invalid generate response: {}", e),
                })?;
        Ok(parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_body() {
        assert_eq!(
            generate_body("llama3.1:8b", "Hello"),
            json!({"model": "llama3.1:8b", "prompt": "Hello", "stream": false})
        );
    }

    #[test]
    fn test_url_is_normalized() {
        let backend = OllamaBackend::new(&InferenceConfig {
            url: "localhost:11434/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(backend.url, "http://localhost:11434/api/generate");
        assert_eq!(backend.model(), "llama3.1:8b");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        let backend = OllamaBackend::new(&InferenceConfig {
            url: "http://127.0.0.1:1".to_string(),
            max_retries: 0,
            ..Default::default()
        })
        .unwrap();
        let err = backend.generate("hi").await.unwrap_err();
        assert!(matches!(err, Error::UpstreamUnavailable { service: "ollama", .. }));
    }
}
