use thiserror::Error;

#[derive(Debug, Error)]
pub enum GsdError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("phase not found: {0}")]
    PhaseNotFound(String),

    #[error("invalid phase id: {0}")]
    InvalidPhaseId(String),

    #[error("phase {phase} has {count} executed plan summaries; pass --force to remove anyway")]
    PhaseHasSummaries { phase: String, count: usize },

    #[error("invalid JSON: {0}")]
    Jsonc(String),

    #[error("unknown schema: {0} (expected 'plan' or 'summary')")]
    UnknownSchema(String),

    #[error("unknown workflow: {0}")]
    UnknownWorkflow(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GsdError>;
