use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("Validation failed: {0}")]
    ValidationFailure(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
