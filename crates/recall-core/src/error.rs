use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Cross-tenant access blocked: tenant '{tenant}' touched id '{id}'")]
    CrossTenantViolation { tenant: String, id: String },
}

impl EngineError {
    /// Only backend unavailability is worth retrying; everything else is a
    /// caller bug or a deliberate abort. The engine never retries
    /// internally, backoff policy belongs to the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Unavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
