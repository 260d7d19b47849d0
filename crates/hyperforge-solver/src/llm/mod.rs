//! LLM collaborator contract.
//!
//! Selection policies talk to a language model through [`LlmClient`]. The
//! exchange is plain text: a [`SelectionPrompt`] renders the environment, and
//! the model answers with a `***`-delimited block of `key: value` lines that
//! [`parse_block`] reads back.

mod parse;
mod prompt;


use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{LlmError, SelectionParseError};

pub use parse::{parse_block, parse_list, ResponseBlock, STOP_KEYWORD};
pub use prompt::SelectionPrompt;

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A chat completion backend. Calls block until the model answers.
pub trait LlmClient: Send + Sync {
    fn chat(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;
}

impl<F> LlmClient for F
where
    F: Fn(&[ChatMessage]) -> Result<String, LlmError> + Send + Sync,
{
    fn chat(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        self(messages)
    }
}

/// Asks `client` until `parse` accepts a response, at most `max_attempts` times.
///
/// Client errors and rejected responses are logged and retried.
pub fn ask<T, F>(
    client: &dyn LlmClient,
    messages: &[ChatMessage],
    max_attempts: usize,
    mut parse: F,
) -> Result<T, LlmError>
where
    F: FnMut(&str) -> Result<T, SelectionParseError>,
{
    let attempts = max_attempts.max(1);
    for attempt in 1..=attempts {
        match client.chat(messages) {
            Ok(text) => match parse(&text) {
                Ok(value) => return Ok(value),
                Err(e) => warn!(event = "llm_parse_failed", attempt, error = %e),
            },
            Err(e) => warn!(event = "llm_error", attempt, error = %e),
        }
    }
    Err(LlmError::AttemptsExhausted { attempts })
}

/// Client answering from a fixed queue of responses.
///
/// Used for offline replays of recorded sessions. Every request is kept for
/// inspection; an empty queue answers with a request error.
#[derive(Default)]
pub struct ScriptedClient {
    responses: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedClient {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(|r| Ok(r.into())).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queues a response.
    pub fn push(&self, response: impl Into<String>) {
        lock(&self.responses).push_back(Ok(response.into()));
    }

    /// Queues a request failure.
    pub fn push_error(&self, message: impl Into<String>) {
        lock(&self.responses).push_back(Err(message.into()));
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        lock(&self.requests).clone()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    pub fn remaining(&self) -> usize {
        lock(&self.responses).len()
    }
}

impl LlmClient for ScriptedClient {
    fn chat(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        lock(&self.requests).push(messages.to_vec());
        match lock(&self.responses).pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(LlmError::Request(message)),
            None => Err(LlmError::Request("no scripted response left".to_string())),
        }
    }
}

impl fmt::Debug for ScriptedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedClient")
            .field("remaining", &self.remaining())
            .field("requests", &self.request_count())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
