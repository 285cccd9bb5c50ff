//! Turns retrieved chunks plus a question into one model call.

use ragdb_core::types::ScoredChunk;

use crate::error::Result;
use crate::provider::{ChatModel, Message};

pub const DEFAULT_SYSTEM_PROMPT: &str = "Use the given context to answer the question. \
If you don't know the answer, say you don't know. \
Use three sentence maximum and keep the answer concise.";

pub const CONTEXT_SEPARATOR: &str = "\n---\n";

pub const DEFAULT_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Clone)]
pub struct Synthesizer<M> {
    model: M,
    temperature: f32,
    system_prompt: String,
}

impl<M: ChatModel> Synthesizer<M> {
    pub fn new(model: M) -> Self {
        Self { model, temperature: DEFAULT_TEMPERATURE, system_prompt: DEFAULT_SYSTEM_PROMPT.to_string() }
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn model(&self) -> &M { &self.model }
    pub fn temperature(&self) -> f32 { self.temperature }

    /// System instructions followed by a user turn carrying the joined context.
    pub fn build_messages(&self, question: &str, chunks: &[ScoredChunk]) -> Vec<Message> {
        let context = chunks.iter().map(|c| c.chunk.content.as_str()).collect::<Vec<_>>().join(CONTEXT_SEPARATOR);
        vec![
            Message::system(self.system_prompt.clone()),
            Message::user(format!(
                "Answer the question based on the following context. Context: {context} Question: {question} Answer:"
            )),
        ]
    }

    /// Exactly one model call; failures come back unchanged.
    pub async fn answer(&self, question: &str, chunks: &[ScoredChunk]) -> Result<String> {
        let messages = self.build_messages(question, chunks);
        tracing::debug!(model = self.model.name(), context_chunks = chunks.len(), "synthesizing answer");
        self.model.chat(&messages, self.temperature).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockChatModel;
    use crate::provider::Role;
    use ragdb_core::types::DocumentChunk;

    fn scored(content: &str) -> ScoredChunk {
        ScoredChunk {
            chunk: DocumentChunk {
                id: "d:0".into(),
                doc_id: "d".into(),
                doc_path: "d.txt".into(),
                content: content.into(),
                chunk_index: 0,
                total_chunks: 1,
            },
            distance: 0.0,
        }
    }

    #[test]
    fn context_is_joined_with_separator() {
        let synth = Synthesizer::new(MockChatModel::default());
        let msgs = synth.build_messages("why?", &[scored("alpha"), scored("beta")]);
        assert_eq!(msgs[0].role, Role::System);
        assert!(msgs[0].content.contains("say you don't know"));
        assert_eq!(msgs[1].role, Role::User);
        assert!(msgs[1].content.contains("alpha\n---\nbeta"));
        assert!(msgs[1].content.ends_with("Question: why? Answer:"));
    }

    #[tokio::test]
    async fn answer_calls_model_once_with_default_temperature() {
        let mock = MockChatModel::with_responses(["42"]);
        let synth = Synthesizer::new(mock.clone());
        assert_eq!(synth.answer("q", &[scored("ctx")]).await.unwrap(), "42");
        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert!((calls[0].1 - 0.2).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn model_failure_propagates() {
        let synth = Synthesizer::new(MockChatModel::failing()).with_temperature(0.7);
        assert!(synth.answer("q", &[]).await.is_err());
    }
}
