//! Sentence-boundary chunker with word-based overlap.
//!
//! Splits synthesized text into windows bounded by `max_tokens`, measured with
//! a pluggable [`TokenCounter`].
//!
//! # Algorithm
//!
//! 1. Split on `.`, `!` or `?` followed by whitespace. The punctuation stays
//!    with its sentence and the whitespace is dropped.
//! 2. Accumulate sentences into a window. Before adding one, if the window is
//!    non-empty and `window_tokens + sentence_tokens > max_tokens`, close the
//!    window and emit it.
//! 3. Seed the next window with the trailing `overlap_tokens / 2` *words* of
//!    the closed chunk (whitespace words, not tokens; at least the first word
//!    is always dropped). With `overlap_tokens == 0` the next window starts
//!    empty.
//! 4. Sentences are never split, so a window may exceed `max_tokens` by at
//!    most one oversized sentence.
//! 5. Empty chunks are discarded.
//!
//! The overlap unit mismatch in step 3 is intentional and observable: chunk
//! boundaries must stay identical to previously built artifacts.
//!
//! # Example
//!
//! ```rust
//! use scheme_rag_core::chunk::{chunk_text, ChunkOptions};
//! use scheme_rag_core::tokenizer::WhitespaceCounter;
//!
//! let options = ChunkOptions { max_tokens: 512, overlap_tokens: 40 };
//! let chunks = chunk_text("One sentence. Another one.", &options, &WhitespaceCounter);
//! assert_eq!(chunks, vec!["One sentence. Another one.".to_string()]);
//! ```

use regex::Regex;
use std::sync::LazyLock;

use crate::tokenizer::TokenCounter;

pub const DEFAULT_MAX_TOKENS: usize = 512;
pub const DEFAULT_OVERLAP_TOKENS: usize = 40;

static SENTENCE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkOptions {
    /// Soft per-chunk budget in tokens.
    pub max_tokens: usize,
    /// Overlap budget; halved and applied to words.
    pub overlap_tokens: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            overlap_tokens: DEFAULT_OVERLAP_TOKENS,
        }
    }
}

/// Split trimmed text into sentences, keeping terminal punctuation.
///
/// Always yields at least one element (`""` for blank input).
pub fn split_sentences(text: &str) -> Vec<&str> {
    let text = text.trim();
    let mut sentences = Vec::new();
    let mut start = 0;
    for boundary in SENTENCE_BOUNDARY.find_iter(text) {
        // The punctuation class is ASCII, so it is exactly one byte.
        let end = boundary.start() + 1;
        sentences.push(&text[start..end]);
        start = boundary.end();
    }
    sentences.push(&text[start..]);
    sentences
}

/// Split `text` into overlapping, token-bounded chunks.
pub fn chunk_text(text: &str, options: &ChunkOptions, counter: &dyn TokenCounter) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut window: Vec<String> = Vec::new();
    let mut window_tokens = 0usize;

    for sentence in split_sentences(text) {
        let tokens = counter.count_tokens(sentence);

        if window_tokens + tokens > options.max_tokens && !window.is_empty() {
            let closed = window.join(" ").trim().to_string();
            window.clear();
            window_tokens = 0;

            if options.overlap_tokens > 0 && !closed.is_empty() {
                let seed = overlap_seed(&closed, options.overlap_tokens);
                window_tokens = counter.count_tokens(&seed);
                window.push(seed);
            }
            chunks.push(closed);
        }

        window.push(sentence.to_string());
        window_tokens += tokens;
    }

    if !window.is_empty() {
        chunks.push(window.join(" ").trim().to_string());
    }

    chunks.retain(|chunk| !chunk.is_empty());
    chunks
}

/// Trailing words of a closed chunk carried into the next window.
fn overlap_seed(closed: &str, overlap_tokens: usize) -> String {
    let words: Vec<&str> = closed.split_whitespace().collect();
    let keep_from = words.len().saturating_sub(overlap_tokens / 2).max(1);
    words
        .get(keep_from..)
        .map(|tail| tail.join(" "))
        .unwrap_or_default()
}
