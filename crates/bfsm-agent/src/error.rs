use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("unknown agent property {0:?}")]
    UnknownProperty(String),

    #[error("agent count mismatch: store has {store}, rngs have {rngs}")]
    CountMismatch { store: usize, rngs: usize },
}

pub type AgentResult<T> = Result<T, AgentError>;
