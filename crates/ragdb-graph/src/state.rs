use serde::{Deserialize, Serialize};

use ragdb_llm::{Message, Role};

use crate::node::Worker;

/// Conversation state threaded through the graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphState {
    pub messages: Vec<Message>,
    pub summary: Option<String>,
    pub next: Option<Worker>,
}

impl GraphState {
    pub fn with_user(input: impl Into<String>) -> Self {
        Self { messages: vec![Message::user(input)], ..Self::default() }
    }

    pub fn apply(&mut self, update: StateUpdate) {
        if let Some(messages) = update.replace_messages {
            self.messages = messages;
        }
        self.messages.extend(update.append);
        if update.summary.is_some() {
            self.summary = update.summary;
        }
        if update.next.is_some() {
            self.next = update.next;
        }
    }

    pub fn last_reply(&self) -> Option<&str> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant).map(|m| m.content.as_str())
    }

    pub fn last_user(&self) -> Option<&str> {
        self.messages.iter().rev().find(|m| m.role == Role::User).map(|m| m.content.as_str())
    }
}

/// Partial update returned by a node. Empty fields leave the state alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub replace_messages: Option<Vec<Message>>,
    pub append: Vec<Message>,
    pub summary: Option<String>,
    pub next: Option<Worker>,
}

impl StateUpdate {
    pub fn reply(content: String) -> Self {
        Self { append: vec![Message::assistant(content)], ..Self::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_update_is_a_no_op() {
        let mut state = GraphState::with_user("hi");
        state.summary = Some("earlier".into());
        let before = state.clone();
        state.apply(StateUpdate::default());
        assert_eq!(state, before);
    }

    #[test]
    fn replace_then_append() {
        let mut state = GraphState::with_user("a");
        state.apply(StateUpdate {
            replace_messages: Some(vec![Message::user("b")]),
            append: vec![Message::assistant("c")],
            ..StateUpdate::default()
        });
        let contents: Vec<&str> = state.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["b", "c"]);
        assert_eq!(state.last_reply(), Some("c"));
        assert_eq!(state.last_user(), Some("b"));
    }
}
