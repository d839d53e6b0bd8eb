//! Generation client setup errors.

/// Failure to prepare the HTTP client a generation adapter talks through.
///
/// Raised before any request leaves the process, so it never carries a
/// status code and is never retried. Failures of requests that did reach a
/// generation service are [`ServiceError`](crate::ServiceError)s instead.
///
/// # Examples
///
/// ```
/// use fabula_error::{FabulaError, HttpError};
///
/// let err: FabulaError = HttpError::new("Failed to build HTTP client: invalid proxy").into();
/// assert!(err.to_string().contains("HTTP Client Error: Failed to build"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("HTTP Client Error: {} at line {} in {}", message, line, file)]
pub struct HttpError {
    /// What went wrong while preparing the client
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl HttpError {
    /// Record a client setup failure at the caller's location.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
