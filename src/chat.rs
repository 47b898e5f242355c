//! Conversation orchestration.
//!
//! One turn: greeting check → retrieve → assemble context → render history →
//! compose prompt → generate → persist. Turns for the same session run one at
//! a time behind a per-session async mutex; different sessions do not block
//! each other.
//!
//! Upstream failures never surface as answer content. The user gets
//! [`TRY_AGAIN`], the cause is logged, and the session history is left as it
//! was so the question can simply be asked again.

use anyhow::{anyhow, bail, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;

use scheme_rag_core::gateway::{ConversationStore, IndexGateway, InferenceBackend};
use scheme_rag_core::models::Turn;
use scheme_rag_core::prompt::{compose_prompt, render_history};
use scheme_rag_core::retrieval::{assemble, retrieve, RetrievalOptions};

use crate::config::Config;

pub const GREETING: &str = "Hello! How can I help you today?";

pub const TRY_AGAIN: &str =
    "Sorry, I couldn't reach the scheme service just now. Please try again in a moment.";

const GREETING_WORDS: &[&str] = &["hi", "hello", "hey", "namaste"];

/// Whether `message` is nothing but a greeting word (case and trailing
/// punctuation ignored).
pub fn is_greeting(message: &str) -> bool {
    let word = message
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .to_lowercase();
    GREETING_WORDS.contains(&word.as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Greeting,
    Answer,
    /// An upstream call failed; nothing was persisted.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub kind: ReplyKind,
}

#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub namespace: String,
    pub retrieval: RetrievalOptions,
    pub history_turns: usize,
}

impl ChatSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            namespace: config.index.namespace.clone(),
            retrieval: config.retrieval.options(),
            history_turns: config.retrieval.history_turns,
        }
    }
}

/// Lazily created async mutex per session id.
///
/// An entry nobody holds or waits on is only referenced by the map, so it is
/// pruned on the next lock call.
#[derive(Default)]
struct SessionLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionLocks {
    async fn lock(&self, session: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(session.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

pub struct Orchestrator<'a> {
    index: &'a dyn IndexGateway,
    store: &'a dyn ConversationStore,
    backend: Option<&'a dyn InferenceBackend>,
    settings: ChatSettings,
    locks: SessionLocks,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        index: &'a dyn IndexGateway,
        store: &'a dyn ConversationStore,
        settings: ChatSettings,
    ) -> Self {
        Self {
            index,
            store,
            backend: None,
            settings,
            locks: SessionLocks::default(),
        }
    }

    pub fn with_backend(mut self, backend: &'a dyn InferenceBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Answer one message in `session`.
    pub async fn reply(&self, session: &str, message: &str) -> Result<Reply> {
        let message = message.trim();
        if message.is_empty() {
            bail!("message is empty");
        }

        let _guard = self.locks.lock(session).await;
        let mut turns = self.store.get(session).await?;
        turns.push(Turn::user(message));

        if is_greeting(message) {
            turns.push(Turn::bot(GREETING));
            self.store.set(session, turns).await?;
            return Ok(Reply {
                text: GREETING.to_string(),
                kind: ReplyKind::Greeting,
            });
        }

        let backend = self
            .backend
            .ok_or_else(|| anyhow!("no inference backend configured"))?;

        let prompt = match self.prompt_for(message, &turns).await {
            Ok(prompt) => prompt,
            Err(e) if e.is_upstream() => {
                tracing::warn!(session, error = %e, "search failed");
                return Ok(unavailable());
            }
            Err(e) => return Err(e.into()),
        };

        let answer = match backend.generate(&prompt).await {
            Ok(answer) => answer,
            Err(e) if e.is_upstream() => {
                tracing::warn!(session, error = %e, "generation failed");
                return Ok(unavailable());
            }
            Err(e) => return Err(e.into()),
        };

        turns.push(Turn::bot(answer.clone()));
        self.store.set(session, turns).await?;
        Ok(Reply {
            text: answer,
            kind: ReplyKind::Answer,
        })
    }

    /// The prompt `reply` would send for `question`, without generating or
    /// persisting anything.
    pub async fn build_prompt(&self, session: &str, question: &str) -> Result<String> {
        let _guard = self.locks.lock(session).await;
        let mut turns = self.store.get(session).await?;
        turns.push(Turn::user(question.trim()));
        Ok(self.prompt_for(question.trim(), &turns).await?)
    }

    pub async fn clear(&self, session: &str) -> Result<()> {
        let _guard = self.locks.lock(session).await;
        self.store.clear(session).await?;
        Ok(())
    }

    pub async fn history(&self, session: &str) -> Result<Vec<Turn>> {
        Ok(self.store.get(session).await?)
    }

    /// `turns` already ends with the current question.
    async fn prompt_for(
        &self,
        question: &str,
        turns: &[Turn],
    ) -> scheme_rag_core::Result<String> {
        let response = retrieve(
            self.index,
            &self.settings.namespace,
            question,
            &self.settings.retrieval,
        )
        .await?;
        let context = assemble(response, &self.settings.retrieval);
        let conversation = render_history(turns, self.settings.history_turns);
        Ok(compose_prompt(&context, question, &conversation))
    }
}

fn unavailable() -> Reply {
    Reply {
        text: TRY_AGAIN.to_string(),
        kind: ReplyKind::Unavailable,
    }
}
