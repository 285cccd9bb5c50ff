use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Anything that turns role-tagged messages into generated text.
pub trait ChatModel: Send + Sync {
    /// Send messages at the given sampling temperature and return the reply text.
    ///
    /// # Errors
    ///
    /// Returns the provider failure unchanged; callers decide whether to retry.
    fn chat(&self, messages: &[Message], temperature: f32) -> impl Future<Output = Result<String>> + Send;

    fn name(&self) -> &'static str;
}
