//! Chat-model clients and the answer synthesizer.

pub mod any;
pub mod error;
pub mod http;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod provider;
pub mod synthesizer;

pub use any::AnyChatModel;
pub use error::{LlmError, Result};
pub use provider::{ChatModel, Message, Role};
pub use synthesizer::Synthesizer;
