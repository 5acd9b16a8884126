use thiserror::Error;

pub type AdPulseResult<T> = Result<T, AdPulseError>;

#[derive(Error, Debug)]
pub enum AdPulseError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Referential integrity violation: {0}")]
    ReferentialIntegrity(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AdPulseError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        AdPulseError::NotFound {
            kind,
            id: id.into(),
        }
    }
}
