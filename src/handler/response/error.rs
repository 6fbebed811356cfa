use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("Invalid status code: {0}")]
    InvalidStatusCode(u16),

    #[error("Failed to serialize JSON: {0}")]
    JsonSerializationError(#[from] serde_json::Error),
}
