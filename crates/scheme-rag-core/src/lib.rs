//! # Scheme RAG Core
//!
//! Pure transformation logic for Scheme RAG: turning nested government-scheme
//! records into retrieval-ready chunks, and turning search hits plus
//! conversation history into a grounded prompt.
//!
//! This crate performs no filesystem, network, or runtime-specific I/O. The
//! index, inference backend, and conversation store are reached only through
//! the traits in [`gateway`], so the application decides how they are wired.
//!
//! ```text
//! ingestion:  record ─▶ flatten ─▶ synthesize ─▶ chunk ─▶ document ─▶ IndexGateway::upsert
//! query:      IndexGateway::search ─▶ retrieval::assemble ─▶ prompt::compose_prompt ─▶ InferenceBackend
//! ```

pub mod chunk;
pub mod document;
pub mod error;
pub mod flatten;
pub mod gateway;
pub mod markup;
pub mod models;
pub mod prompt;
pub mod retrieval;
pub mod synthesize;
pub mod tokenizer;

pub use error::{Error, Result};
