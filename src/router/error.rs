use crate::methods::RouteMethod;
use thiserror::Error;

/// Failures raised while registering routes.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("invalid route pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: matchit::InsertError,
    },

    #[error("`{method}` requires at least one handler")]
    MissingHandler { method: RouteMethod },

    #[error("`{method}` requires a path pattern")]
    MissingPath { method: RouteMethod },

    #[error("`{method}` received a path pattern where a handler was expected")]
    UnexpectedPath { method: RouteMethod },
}
