//! Supervisor/worker conversation graph.
//!
//! Each turn enters at the summarizer, which compacts long histories, then the
//! supervisor asks the model which worker answers: plain chat or research over
//! the indexed documents.

pub mod error;
pub mod graph;
pub mod node;
pub mod state;

pub use error::GraphError;
pub use graph::ConversationGraph;
pub use node::{Node, Worker};
pub use state::{GraphState, StateUpdate};
