//! Device playback error types.

use crate::RetryableError;

/// Specific error conditions for device-side playback.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum PlaybackErrorKind {
    /// An asset could not be fetched
    #[display("Failed to download {}: {}", url, message)]
    Download {
        /// Asset URL
        url: String,
        /// Failure description
        message: String,
    },
    /// The scheduler was asked to make an illegal state transition
    #[display("Invalid playback transition from {} to {}", from, to)]
    InvalidTransition {
        /// Current state
        from: String,
        /// Requested state
        to: String,
    },
    /// A segment was due but its asset is not cached
    #[display("Asset missing from cache: {}", _0)]
    MissingAsset(String),
    /// The output device refused a segment
    #[display("Dispatch failed: {}", _0)]
    Dispatch(String),
    /// Manifest failed validation on the device
    #[display("Invalid manifest: {}", _0)]
    InvalidManifest(String),
}

/// Playback error with location tracking.
///
/// # Examples
///
/// ```
/// use fabula_error::{PlaybackError, PlaybackErrorKind, RetryableError};
///
/// let err = PlaybackError::new(PlaybackErrorKind::Download {
///     url: "http://cdn/scene_0.wav".to_string(),
///     message: "connection reset".to_string(),
/// });
/// assert!(err.is_retryable());
/// ```
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
#[display("Playback Error: {} at line {} in {}", kind, line, file)]
pub struct PlaybackError {
    /// The specific error condition
    pub kind: PlaybackErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl PlaybackError {
    /// Create a new PlaybackError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PlaybackErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl RetryableError for PlaybackError {
    fn is_retryable(&self) -> bool {
        matches!(self.kind, PlaybackErrorKind::Download { .. })
    }
}
