//! Manifest construction and validation error types.

/// Specific error conditions for manifest operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ManifestErrorKind {
    /// No scenes were supplied
    #[display("Cannot build a manifest from zero scenes")]
    Empty,
    /// Scene indices are not 0..n without gaps
    #[display("Scene indices are not contiguous: expected {}, found {}", expected, found)]
    NonContiguousScenes {
        /// Index the timeline expected next
        expected: usize,
        /// Index actually found
        found: usize,
    },
    /// A scene carries a zero audio duration
    #[display("Scene {} has a zero audio duration", scene_index)]
    InvalidDuration {
        /// Offending scene
        scene_index: usize,
    },
    /// Cumulative start offsets exceeded the representable range
    #[display("Timeline offsets overflowed")]
    TimelineOverflow,
    /// A received manifest breaks the synchronization contract
    #[display("Manifest contract violated: {}", _0)]
    Contract(String),
    /// Manifest could not be (de)serialized
    #[display("Manifest JSON error: {}", _0)]
    Json(String),
}

/// Manifest error with location tracking.
///
/// # Examples
///
/// ```
/// use fabula_error::{ManifestError, ManifestErrorKind};
///
/// let err = ManifestError::new(ManifestErrorKind::Empty);
/// assert!(format!("{}", err).contains("zero scenes"));
/// ```
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
#[display("Manifest Error: {} at line {} in {}", kind, line, file)]
pub struct ManifestError {
    /// The specific error condition
    pub kind: ManifestErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl ManifestError {
    /// Create a new ManifestError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ManifestErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
