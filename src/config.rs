//! TOML configuration.
//!
//! Every field has a default, so a missing file is equivalent to an empty
//! one and [`Config::minimal`] is always a valid configuration. Secrets are
//! never read from the file; `index.api_key_env` names the environment
//! variable that holds the index API key.
//!
//! ```toml
//! [chunking]
//! max_tokens = 512
//! overlap_tokens = 40
//! tokenizer = "cl100k_base"
//!
//! [retrieval]
//! top_k = 5
//! score_threshold = 0.3
//! search_top_k = 20
//! history_turns = 5
//!
//! [index]
//! provider = "pinecone"
//! host = "https://my-index.svc.pinecone.io"
//! namespace = "schemes-v1"
//!
//! [inference]
//! provider = "ollama"
//! model = "llama3.1:8b"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use scheme_rag_core::chunk::{ChunkOptions, DEFAULT_MAX_TOKENS, DEFAULT_OVERLAP_TOKENS};
use scheme_rag_core::gateway::MAX_UPSERT_BATCH;
use scheme_rag_core::prompt::HISTORY_WINDOW;
use scheme_rag_core::retrieval::{
    RetrievalOptions, DEFAULT_SCORE_THRESHOLD, DEFAULT_SEARCH_TOP_K, DEFAULT_TOP_K,
};
use scheme_rag_core::tokenizer::{TiktokenCounter, TokenCounter, WhitespaceCounter};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
}

impl Config {
    /// All defaults. Used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_overlap_tokens")]
    pub overlap_tokens: usize,
    /// `cl100k_base` or `whitespace`.
    #[serde(default = "default_tokenizer")]
    pub tokenizer: String,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            overlap_tokens: default_overlap_tokens(),
            tokenizer: default_tokenizer(),
        }
    }
}

impl ChunkingConfig {
    pub fn options(&self) -> ChunkOptions {
        ChunkOptions {
            max_tokens: self.max_tokens,
            overlap_tokens: self.overlap_tokens,
        }
    }

    pub fn token_counter(&self) -> Result<Box<dyn TokenCounter>> {
        match self.tokenizer.as_str() {
            "cl100k_base" => Ok(Box::new(
                TiktokenCounter::cl100k().context("Failed to load cl100k_base tokenizer")?,
            )),
            "whitespace" => Ok(Box::new(WhitespaceCounter)),
            other => bail!("Unknown tokenizer: {}", other),
        }
    }
}

fn default_max_tokens() -> usize {
    DEFAULT_MAX_TOKENS
}
fn default_overlap_tokens() -> usize {
    DEFAULT_OVERLAP_TOKENS
}
fn default_tokenizer() -> String {
    "cl100k_base".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,
    #[serde(default = "default_search_top_k")]
    pub search_top_k: usize,
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            score_threshold: default_score_threshold(),
            search_top_k: default_search_top_k(),
            history_turns: default_history_turns(),
        }
    }
}

impl RetrievalConfig {
    pub fn options(&self) -> RetrievalOptions {
        RetrievalOptions {
            top_k: self.top_k,
            score_threshold: self.score_threshold,
            search_top_k: self.search_top_k,
        }
    }
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}
fn default_score_threshold() -> f64 {
    DEFAULT_SCORE_THRESHOLD
}
fn default_search_top_k() -> usize {
    DEFAULT_SEARCH_TOP_K
}
fn default_history_turns() -> usize {
    HISTORY_WINDOW
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    /// `pinecone` or `memory`.
    #[serde(default = "default_index_provider")]
    pub provider: String,
    /// Index host, e.g. `https://<index>.svc.<region>.pinecone.io`.
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_index_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_index_max_retries")]
    pub max_retries: u32,
    /// NDJSON chunk artifact; written by `build`, read by `upsert` and the
    /// `memory` provider.
    #[serde(default = "default_artifact")]
    pub artifact: PathBuf,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            provider: default_index_provider(),
            host: None,
            namespace: default_namespace(),
            api_key_env: default_api_key_env(),
            batch_size: default_batch_size(),
            timeout_secs: default_index_timeout_secs(),
            max_retries: default_index_max_retries(),
            artifact: default_artifact(),
        }
    }
}

fn default_index_provider() -> String {
    "pinecone".to_string()
}
fn default_namespace() -> String {
    "schemes-v1".to_string()
}
fn default_api_key_env() -> String {
    "PINECONE_API_KEY".to_string()
}
fn default_batch_size() -> usize {
    MAX_UPSERT_BATCH
}
fn default_index_timeout_secs() -> u64 {
    30
}
fn default_index_max_retries() -> u32 {
    3
}
fn default_artifact() -> PathBuf {
    PathBuf::from("rag.jsonl")
}

#[derive(Debug, Deserialize, Clone)]
pub struct InferenceConfig {
    /// `ollama` or `disabled`.
    #[serde(default = "default_inference_provider")]
    pub provider: String,
    #[serde(default = "default_inference_url")]
    pub url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_inference_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_inference_max_retries")]
    pub max_retries: u32,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            provider: default_inference_provider(),
            url: default_inference_url(),
            model: default_model(),
            timeout_secs: default_inference_timeout_secs(),
            max_retries: default_inference_max_retries(),
        }
    }
}

impl InferenceConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_inference_provider() -> String {
    "ollama".to_string()
}
fn default_inference_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_model() -> String {
    "llama3.1:8b".to_string()
}
fn default_inference_timeout_secs() -> u64 {
    120
}
fn default_inference_max_retries() -> u32 {
    2
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to [`Config::minimal`].
///
/// A file that exists but fails to parse or validate is still an error.
pub fn load_or_minimal(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::minimal())
    }
}

pub fn validate(config: &Config) -> Result<()> {
    // Validate chunking
    if config.chunking.max_tokens == 0 {
        bail!("chunking.max_tokens must be > 0");
    }
    match config.chunking.tokenizer.as_str() {
        "cl100k_base" | "whitespace" => {}
        other => bail!(
            "Unknown chunking.tokenizer: '{}'. Must be cl100k_base or whitespace.",
            other
        ),
    }

    // Validate retrieval
    let retrieval = &config.retrieval;
    if !(0.0..=1.0).contains(&retrieval.score_threshold) {
        bail!("retrieval.score_threshold must be in [0.0, 1.0]");
    }
    if retrieval.top_k < 1 {
        bail!("retrieval.top_k must be >= 1");
    }
    if retrieval.search_top_k < retrieval.top_k {
        bail!(
            "retrieval.search_top_k ({}) must be >= retrieval.top_k ({})",
            retrieval.search_top_k,
            retrieval.top_k
        );
    }

    // Validate index
    if !(1..=MAX_UPSERT_BATCH).contains(&config.index.batch_size) {
        bail!("index.batch_size must be between 1 and {}", MAX_UPSERT_BATCH);
    }
    match config.index.provider.as_str() {
        "pinecone" | "memory" => {}
        other => bail!(
            "Unknown index provider: '{}'. Must be pinecone or memory.",
            other
        ),
    }

    // Validate inference
    match config.inference.provider.as_str() {
        "ollama" | "disabled" => {}
        other => bail!(
            "Unknown inference provider: '{}'. Must be ollama or disabled.",
            other
        ),
    }

    Ok(())
}
