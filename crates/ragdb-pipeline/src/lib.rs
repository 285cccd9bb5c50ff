//! Retrieval-augmented answering: the explicit pipeline context and the console loop.

pub mod console;
pub mod context;

pub use console::run_console;
pub use context::{index_documents_into, Answer, Answerer, RagContext, Source};
