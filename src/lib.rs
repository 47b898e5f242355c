//! # Scheme RAG
//!
//! Retrieval-augmented question answering over Indian government scheme
//! records. The pure pipeline lives in [`scheme_rag_core`]; this crate owns
//! configuration, file formats, the HTTP gateways and the `srag` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌───────────┐   ┌──────────────┐
//! │ schemes.json │──▶│ srag build   │──▶│ rag.jsonl │──▶│ srag upsert  │──▶ Pinecone
//! └──────────────┘   └──────────────┘   └───────────┘   └──────────────┘
//!
//! question ──▶ search ──▶ assemble ──▶ compose prompt ──▶ Ollama ──▶ reply
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`source`] | Raw JSON / JSON Lines record reader |
//! | [`artifact`] | NDJSON chunk artifact |
//! | [`ingest`] | `build` and `upsert` commands |
//! | [`search`] | `search` command |
//! | [`chat`] | Conversation orchestrator |
//! | [`pinecone`] | HTTP index gateway |
//! | [`ollama`] | HTTP inference backend |
//! | [`gateways`] | Gateway construction from config |
//! | [`http`] | Retry and backoff for upstream calls |
//! | [`logging`] | Tracing subscriber setup |

pub mod artifact;
pub mod chat;
pub mod config;
pub mod gateways;
pub mod http;
pub mod ingest;
pub mod logging;
pub mod ollama;
pub mod pinecone;
pub mod search;
pub mod source;
