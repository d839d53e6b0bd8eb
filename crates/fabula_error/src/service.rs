//! Generation service error types.

use crate::RetryableError;

/// The generation service an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ServiceKind {
    /// Narrative (text) generation
    #[display("narrative")]
    Narrative,
    /// Speech synthesis
    #[display("speech")]
    Speech,
    /// Image synthesis
    #[display("image")]
    Image,
}

/// Whether a service failure is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ServiceErrorClass {
    /// Rate limits, timeouts, temporary unavailability
    #[display("transient")]
    Transient,
    /// Invalid input, exhausted quota, rejected credentials
    #[display("permanent")]
    Permanent,
}

/// Specific error conditions reported by a generation service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ServiceErrorKind {
    /// Request was throttled by the service
    #[display("Rate limited: {}", _0)]
    RateLimited(String),
    /// Request did not complete in time
    #[display("Timed out: {}", _0)]
    Timeout(String),
    /// Service is temporarily unavailable (5xx, connection refused)
    #[display("Service unavailable: {}", _0)]
    Unavailable(String),
    /// Service rejected the input
    #[display("Invalid input: {}", _0)]
    InvalidInput(String),
    /// Account quota is exhausted and will not recover by retrying
    #[display("Quota exhausted: {}", _0)]
    QuotaExhausted(String),
    /// Credentials were missing or rejected
    #[display("Unauthorized: {}", _0)]
    Unauthorized(String),
    /// Service answered but the payload could not be interpreted
    #[display("Malformed response: {}", _0)]
    MalformedResponse(String),
}

impl ServiceErrorKind {
    /// Classify this condition as transient or permanent.
    pub fn class(&self) -> ServiceErrorClass {
        match self {
            ServiceErrorKind::RateLimited(_)
            | ServiceErrorKind::Timeout(_)
            | ServiceErrorKind::Unavailable(_) => ServiceErrorClass::Transient,
            ServiceErrorKind::InvalidInput(_)
            | ServiceErrorKind::QuotaExhausted(_)
            | ServiceErrorKind::Unauthorized(_)
            | ServiceErrorKind::MalformedResponse(_) => ServiceErrorClass::Permanent,
        }
    }

    /// Check if this error type should be retried.
    pub fn is_transient(&self) -> bool {
        self.class() == ServiceErrorClass::Transient
    }
}

/// Generation service error with source location tracking.
///
/// # Examples
///
/// ```
/// use fabula_error::{ServiceError, ServiceErrorClass, ServiceErrorKind, ServiceKind};
///
/// let err = ServiceError::new(
///     ServiceKind::Narrative,
///     ServiceErrorKind::Timeout("no response after 60s".to_string()),
/// );
/// assert_eq!(err.kind.class(), ServiceErrorClass::Transient);
/// assert!(format!("{}", err).contains("narrative"));
/// ```
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
#[display("Service Error ({}): {} at line {} in {}", service, kind, line, file)]
pub struct ServiceError {
    /// Which generation service failed
    pub service: ServiceKind,
    /// The kind of error that occurred
    pub kind: ServiceErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ServiceError {
    /// Create a new ServiceError with automatic location tracking.
    #[track_caller]
    pub fn new(service: ServiceKind, kind: ServiceErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            service,
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl RetryableError for ServiceError {
    fn is_retryable(&self) -> bool {
        self.kind.is_transient()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_kinds_are_retryable() {
        for kind in [
            ServiceErrorKind::RateLimited("429".into()),
            ServiceErrorKind::Timeout("slow".into()),
            ServiceErrorKind::Unavailable("503".into()),
        ] {
            assert!(ServiceError::new(ServiceKind::Image, kind).is_retryable());
        }
    }

    #[test]
    fn permanent_kinds_are_not_retryable() {
        for kind in [
            ServiceErrorKind::InvalidInput("bad".into()),
            ServiceErrorKind::QuotaExhausted("insufficient_quota".into()),
            ServiceErrorKind::Unauthorized("401".into()),
            ServiceErrorKind::MalformedResponse("not json".into()),
        ] {
            assert!(!ServiceError::new(ServiceKind::Speech, kind).is_retryable());
        }
    }
}
