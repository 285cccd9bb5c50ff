use ragdb_core::config::{LlmProviderKind, LlmSettings};

#[cfg(any(test, feature = "mock"))]
use crate::mock::MockChatModel;
use crate::error::Result;
use crate::http::client_with_timeout;
use crate::ollama::Ollama;
use crate::openai::OpenAiCompatible;
use crate::provider::{ChatModel, Message};

#[derive(Debug, Clone)]
pub enum AnyChatModel {
    OpenAi(OpenAiCompatible),
    Ollama(Ollama),
    #[cfg(any(test, feature = "mock"))]
    Mock(MockChatModel),
}

impl AnyChatModel {
    /// Build the configured provider. The API key comes from the env var named in settings.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        let client = client_with_timeout(settings.timeout_secs)?;
        let model = match settings.provider {
            LlmProviderKind::Openai => {
                let api_key = settings.api_key();
                if api_key.is_none() {
                    tracing::warn!(env = %settings.api_key_env, "no API key set; requests go out unauthenticated");
                }
                Self::OpenAi(OpenAiCompatible::new(client, &settings.base_url, &settings.model, api_key, settings.max_tokens))
            }
            LlmProviderKind::Ollama => Self::Ollama(Ollama::new(client, &settings.base_url, &settings.model)),
        };
        tracing::info!(provider = model.name(), model = %settings.model, base_url = %settings.base_url, "chat model ready");
        Ok(model)
    }
}

impl ChatModel for AnyChatModel {
    async fn chat(&self, messages: &[Message], temperature: f32) -> Result<String> {
        match self {
            Self::OpenAi(p) => p.chat(messages, temperature).await,
            Self::Ollama(p) => p.chat(messages, temperature).await,
            #[cfg(any(test, feature = "mock"))]
            Self::Mock(p) => p.chat(messages, temperature).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::OpenAi(p) => p.name(),
            Self::Ollama(p) => p.name(),
            #[cfg(any(test, feature = "mock"))]
            Self::Mock(p) => p.name(),
        }
    }
}
