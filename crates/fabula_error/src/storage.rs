//! Artifact store error types.

use crate::RetryableError;

/// Kinds of artifact store errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StoreErrorKind {
    /// Failed to create storage directory
    #[display("Failed to create storage directory: {}", _0)]
    DirectoryCreation(String),
    /// Failed to write artifact
    #[display("Failed to write artifact: {}", _0)]
    FileWrite(String),
    /// Artifact not found at the specified location
    #[display("Artifact not found: {}", _0)]
    NotFound(String),
    /// Invalid storage path
    #[display("Invalid storage path: {}", _0)]
    InvalidPath(String),
    /// Storage backend is unavailable
    #[display("Storage unavailable: {}", _0)]
    Unavailable(String),
    /// Write did not complete in time
    #[display("Storage timeout: {}", _0)]
    Timeout(String),
    /// Backend refused the write (size, content type, permissions)
    #[display("Write rejected: {}", _0)]
    Rejected(String),
}

/// Artifact store error with location tracking.
///
/// # Examples
///
/// ```
/// use fabula_error::{StoreError, StoreErrorKind};
///
/// let err = StoreError::new(StoreErrorKind::NotFound("stories/x/audio/scene_0.wav".to_string()));
/// assert!(format!("{}", err).contains("not found"));
/// ```
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
#[display("Store Error: {} at line {} in {}", kind, line, file)]
pub struct StoreError {
    /// The kind of error that occurred
    pub kind: StoreErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StoreError {
    /// Create a new store error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StoreErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl RetryableError for StoreError {
    fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            StoreErrorKind::FileWrite(_)
                | StoreErrorKind::DirectoryCreation(_)
                | StoreErrorKind::Unavailable(_)
                | StoreErrorKind::Timeout(_)
        )
    }
}
