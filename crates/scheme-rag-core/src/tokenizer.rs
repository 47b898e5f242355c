//! Token counting capability used by the chunker.
//!
//! Only consistency within one run matters to chunking, so the counter is a
//! trait. [`TiktokenCounter`] is the production choice (the `cl100k_base` BPE
//! that the embedding side also budgets against); [`WhitespaceCounter`] is a
//! dependency-free approximation for tests and quick local runs.

use crate::error::{Error, Result};

pub trait TokenCounter: Send + Sync {
    fn count_tokens(&self, text: &str) -> usize;
}

/// BPE token counter backed by `tiktoken-rs`.
pub struct TiktokenCounter {
    bpe: tiktoken_rs::CoreBPE,
}

impl TiktokenCounter {
    /// Counter over the `cl100k_base` encoding. The ranks ship with the
    /// crate, so this never touches the network.
    pub fn cl100k() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| Error::Tokenizer(e.to_string()))?;
        Ok(Self { bpe })
    }
}

impl TokenCounter for TiktokenCounter {
    fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

/// One token per whitespace-separated word.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceCounter;

impl TokenCounter for WhitespaceCounter {
    fn count_tokens(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}
