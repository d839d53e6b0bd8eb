//! Retry classification shared by every error raised at a suspension point.

/// Trait for errors that support retry logic.
///
/// Retry loops consult only this trait: transient failures (rate limits,
/// timeouts, temporarily unavailable backends) return `true`, permanent
/// failures (invalid input, exhausted quota, rejected writes) return `false`
/// and are surfaced on the first attempt.
///
/// # Examples
///
/// ```
/// use fabula_error::{RetryableError, ServiceError, ServiceErrorKind, ServiceKind};
///
/// let err = ServiceError::new(
///     ServiceKind::Speech,
///     ServiceErrorKind::RateLimited("429 Too Many Requests".to_string()),
/// );
/// assert!(err.is_retryable());
///
/// let err = ServiceError::new(
///     ServiceKind::Image,
///     ServiceErrorKind::InvalidInput("prompt rejected".to_string()),
/// );
/// assert!(!err.is_retryable());
/// ```
pub trait RetryableError {
    /// Returns true if this error should trigger a retry.
    fn is_retryable(&self) -> bool;
}
