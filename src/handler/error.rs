use hyper::StatusCode;
use std::error::Error as StdError;
use thiserror::Error;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Error value carried by `next.fail(..)` to the error-aware handlers.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerError {
    status: StatusCode,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl HandlerError {
    /// Builds an error with the given status. Invalid codes fall back to 500.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message: message.into(),
            source: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(500, message)
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for HandlerError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err.to_string()).with_source(err)
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(400, err.to_string()).with_source(err)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::internal(message)
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::internal(message)
    }
}
