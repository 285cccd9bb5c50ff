use ragdb_llm::LlmError;

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("model call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("supervisor chose an unknown worker: {0:?}")]
    InvalidRoute(String),

    #[error("retrieval failed: {0}")]
    Retrieval(String),

    #[error("graph did not finish within {0} steps")]
    StepLimit(usize),
}
