use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// Workers the supervisor can hand a turn to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Worker {
    #[serde(rename = "chat_node")]
    Chat,
    #[serde(rename = "research_node")]
    Research,
}

impl Worker {
    pub const ALL: [Worker; 2] = [Worker::Chat, Worker::Research];

    pub fn as_str(self) -> &'static str {
        match self {
            Worker::Chat => "chat_node",
            Worker::Research => "research_node",
        }
    }

    /// Accepts a bare worker name (optionally quoted or fenced) or `{"next": "<name>"}`.
    pub fn parse_route(reply: &str) -> Result<Self, GraphError> {
        let cleaned = reply.trim().trim_matches('`').trim();
        let cleaned = cleaned.strip_prefix("json").unwrap_or(cleaned).trim();
        if let Ok(route) = serde_json::from_str::<Route>(cleaned) {
            return Ok(route.next);
        }
        cleaned
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '.')
            .parse()
            .map_err(|_| GraphError::InvalidRoute(reply.trim().to_string()))
    }
}

impl fmt::Display for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Worker {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chat_node" | "chat" => Ok(Worker::Chat),
            "research_node" | "research" => Ok(Worker::Research),
            _ => Err(GraphError::InvalidRoute(s.to_string())),
        }
    }
}

#[derive(Deserialize)]
struct Route {
    next: Worker,
}

/// Nodes of the conversation graph. The edges are fixed:
/// summarizer → supervisor → the chosen worker → end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Summarizer,
    Supervisor,
    Worker(Worker),
}

impl Node {
    pub const ENTRY: Node = Node::Summarizer;

    pub fn name(self) -> &'static str {
        match self {
            Node::Summarizer => "summarizer_node",
            Node::Supervisor => "supervisor",
            Node::Worker(w) => w.as_str(),
        }
    }

    /// Node to run after this one, or `None` when the turn is finished.
    pub fn successor(self, next: Option<Worker>) -> Result<Option<Node>, GraphError> {
        match self {
            Node::Summarizer => Ok(Some(Node::Supervisor)),
            Node::Supervisor => next
                .map(|w| Some(Node::Worker(w)))
                .ok_or_else(|| GraphError::InvalidRoute("supervisor set no route".into())),
            Node::Worker(_) => Ok(None),
        }
    }
}
