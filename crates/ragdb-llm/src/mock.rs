//! Scripted chat model for tests.

use std::sync::{Arc, Mutex};

use crate::error::{LlmError, Result};
use crate::provider::{ChatModel, Message};

/// Replies from a queue, then falls back to `default_response`.
/// Every call is recorded so tests can inspect the prompts.
#[derive(Debug, Clone)]
pub struct MockChatModel {
    responses: Arc<Mutex<Vec<String>>>,
    calls: Arc<Mutex<Vec<(Vec<Message>, f32)>>>,
    pub default_response: String,
    pub fail_chat: bool,
}

impl Default for MockChatModel {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            default_response: "mock response".into(),
            fail_chat: false,
        }
    }
}

impl MockChatModel {
    #[must_use]
    pub fn with_responses<S: Into<String>>(responses: impl IntoIterator<Item = S>) -> Self {
        Self { responses: Arc::new(Mutex::new(responses.into_iter().map(Into::into).collect())), ..Self::default() }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self { fail_chat: true, ..Self::default() }
    }

    /// Messages and temperature of every call so far, oldest first.
    pub fn calls(&self) -> Vec<(Vec<Message>, f32)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }
}

impl ChatModel for MockChatModel {
    async fn chat(&self, messages: &[Message], temperature: f32) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((messages.to_vec(), temperature));
        }
        if self.fail_chat {
            return Err(LlmError::Other("mock LLM error".into()));
        }
        let mut responses = self.responses.lock().map_err(|_| LlmError::Other("mock poisoned".into()))?;
        if responses.is_empty() {
            Ok(self.default_response.clone())
        } else {
            Ok(responses.remove(0))
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
