use thiserror::Error;

/// Result type for validation operations.
pub type Result<T> = std::result::Result<T, ValidatorError>;

/// Errors that can occur while validating a route.
///
/// The variant decides how the route validator reacts: transport-level
/// failures are retryable, everything else is terminal. The classification
/// lives here, in `is_retryable`, so it is decided once rather than matched
/// ad hoc at every call site.
#[derive(Debug, Error)]
pub enum ValidatorError {
    /// A coordinate failed the local numeric check before any request was made
    #[error("invalid coordinates - {0}")]
    InvalidCoordinates(String),

    /// HTTP request failed at the transport level (connection, timeout, ...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The routing API answered with a non-success status code
    #[error("HTTP status {0}")]
    Status(u16),

    /// Response body was not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Anything else
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ValidatorError {
    /// Whether this failure is worth retrying.
    ///
    /// Transport failures and error status codes are transient from the
    /// caller's point of view. A body that fails to parse, or an unknown
    /// error, is a property of the response and retrying will not fix it.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ValidatorError::Http(_) | ValidatorError::Status(_))
    }
}
