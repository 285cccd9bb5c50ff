use std::sync::Arc;

use tracing::{debug, info};

use ragdb_llm::synthesizer::CONTEXT_SEPARATOR;
use ragdb_llm::{ChatModel, Message, Role};
use ragdb_pipeline::Answerer;

use crate::error::GraphError;
use crate::node::{Node, Worker};
use crate::state::{GraphState, StateUpdate};

/// Histories shorter than this are left alone by the summarizer.
pub const SUMMARY_THRESHOLD: usize = 7;
/// Messages kept verbatim once a summary has been taken.
pub const KEEP_AFTER_SUMMARY: usize = 3;
pub const DEFAULT_MAX_STEPS: usize = 8;

const RESEARCH_PROMPT: &str = "You are a research agent. Use the retrieved context to answer the user's query \
and write the result in this format: small agenda -> quick overview -> resume -> sources you used. \
The user needs to approve your output.";

pub struct ConversationGraph<M> {
    model: M,
    retriever: Option<Arc<dyn Answerer>>,
    temperature: f32,
    max_steps: usize,
}

impl<M: ChatModel> ConversationGraph<M> {
    pub fn new(model: M) -> Self {
        Self { model, retriever: None, temperature: 0.2, max_steps: DEFAULT_MAX_STEPS }
    }

    /// Source of context for the research worker.
    #[must_use]
    pub fn with_retriever(mut self, retriever: Arc<dyn Answerer>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Run one turn from the entry node to the end.
    pub async fn run(&self, mut state: GraphState) -> Result<GraphState, GraphError> {
        let mut node = Some(Node::ENTRY);
        let mut steps = 0usize;
        while let Some(current) = node {
            if steps >= self.max_steps {
                return Err(GraphError::StepLimit(self.max_steps));
            }
            steps += 1;
            debug!(node = current.name(), step = steps, "running node");
            let update = self.step(current, &state).await?;
            state.apply(update);
            node = current.successor(state.next)?;
        }
        info!(steps, messages = state.messages.len(), "graph turn finished");
        Ok(state)
    }

    /// Append `input` as a user message, run a turn and return the reply.
    /// On error `state` is left as it was.
    pub async fn respond(&self, state: &mut GraphState, input: &str) -> Result<String, GraphError> {
        let mut next = state.clone();
        next.messages.push(Message::user(input));
        next.next = None;
        *state = self.run(next).await?;
        Ok(state.last_reply().unwrap_or_default().to_string())
    }

    async fn step(&self, node: Node, state: &GraphState) -> Result<StateUpdate, GraphError> {
        match node {
            Node::Summarizer => self.summarize(state).await,
            Node::Supervisor => self.supervise(state).await,
            Node::Worker(Worker::Chat) => self.chat(state).await,
            Node::Worker(Worker::Research) => self.research(state).await,
        }
    }

    async fn summarize(&self, state: &GraphState) -> Result<StateUpdate, GraphError> {
        if state.messages.len() < SUMMARY_THRESHOLD {
            return Ok(StateUpdate::default());
        }
        let mut transcript = String::new();
        if let Some(earlier) = &state.summary {
            transcript.push_str(&format!("Earlier summary: {earlier}\n"));
        }
        transcript.push_str(
            &state
                .messages
                .iter()
                .map(|m| format!("{}: {}", role_name(m.role), m.content))
                .collect::<Vec<_>>()
                .join("\n"),
        );
        let summary = self
            .model
            .chat(&[Message::user(format!("Summarize this conversation:\n{transcript}"))], self.temperature)
            .await?;
        let keep = state.messages[state.messages.len() - KEEP_AFTER_SUMMARY..].to_vec();
        info!(dropped = state.messages.len() - keep.len(), "summarized conversation");
        Ok(StateUpdate { replace_messages: Some(keep), summary: Some(summary), ..StateUpdate::default() })
    }

    async fn supervise(&self, state: &GraphState) -> Result<StateUpdate, GraphError> {
        let members = Worker::ALL.iter().map(|w| w.as_str()).collect::<Vec<_>>().join(", ");
        let system = format!(
            "You are a supervisor tasked with managing a conversation between the following workers: [{members}]. \
Given the following user request, respond with the worker to act next as JSON {{\"next\": \"<worker>\"}}. \
Each worker will perform a task and then the turn ends."
        );
        let mut messages = vec![Message::system(system)];
        messages.extend(state.messages.iter().cloned());
        let reply = self.model.chat(&messages, 0.0).await?;
        let worker = Worker::parse_route(&reply)?;
        debug!(%worker, "supervisor routed");
        Ok(StateUpdate { next: Some(worker), ..StateUpdate::default() })
    }

    async fn chat(&self, state: &GraphState) -> Result<StateUpdate, GraphError> {
        let mut messages = state.messages.clone();
        if let Some(summary) = &state.summary {
            messages.push(Message::system(format!("Summary of the earlier conversation: {summary}")));
        }
        let reply = self.model.chat(&messages, self.temperature).await?;
        Ok(StateUpdate::reply(reply))
    }

    async fn research(&self, state: &GraphState) -> Result<StateUpdate, GraphError> {
        let query = state.last_user().unwrap_or_default();
        let context = match &self.retriever {
            Some(retriever) => {
                let hits = retriever.retrieve(query).await.map_err(|e| GraphError::Retrieval(format!("{e:#}")))?;
                hits.iter().map(|h| format!("[{}] {}", h.chunk.doc_path, h.chunk.content)).collect::<Vec<_>>()
            }
            None => vec![],
        };
        let mut system = RESEARCH_PROMPT.to_string();
        if context.is_empty() {
            system.push_str("\nNo documents were retrieved; say so in the sources section.");
        } else {
            system.push_str("\nContext:\n");
            system.push_str(&context.join(CONTEXT_SEPARATOR));
        }
        let mut messages = vec![Message::system(system)];
        messages.extend(state.messages.iter().cloned());
        let reply = self.model.chat(&messages, self.temperature).await?;
        Ok(StateUpdate::reply(reply))
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}
