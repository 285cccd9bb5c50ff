//! Local Ollama server through its native `/api/chat` endpoint.

use serde::{Deserialize, Serialize};

use crate::error::{LlmError, Result};
use crate::http::status_error;
use crate::provider::{ChatModel, Message};

#[derive(Debug, Clone)]
pub struct Ollama {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl Ollama {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str, model: impl Into<String>) -> Self {
        Self { client, base_url: base_url.trim_end_matches('/').to_string(), model: model.into() }
    }
}

impl ChatModel for Ollama {
    async fn chat(&self, messages: &[Message], temperature: f32) -> Result<String> {
        let body = OllamaRequest { model: &self.model, messages, stream: false, options: Options { temperature } };
        let response = self.client.post(format!("{}/api/chat", self.base_url)).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(status_error("ollama", status, &text));
        }
        let resp: OllamaResponse = serde_json::from_str(&text)?;
        resp.message
            .map(|m| m.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyResponse { provider: "ollama" })
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    options: Options,
}

#[derive(Serialize)]
struct Options {
    temperature: f32,
}

#[derive(Deserialize)]
struct OllamaResponse {
    message: Option<OllamaMessage>,
}

#[derive(Deserialize)]
struct OllamaMessage {
    content: String,
}
