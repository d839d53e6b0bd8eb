//! Segmentation error types.

/// Reasons a narrative could not be split into scenes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum SegmentationErrorKind {
    /// Narrative contained no text after trimming
    #[display("Narrative is empty")]
    EmptyNarrative,
    /// Narrative did not contain enough scene boundaries
    #[display("Narrative has {} scene(s); at least 2 are required for a timed manifest", found)]
    InsufficientBoundaries {
        /// Number of scene chunks found
        found: usize,
    },
    /// Requested scene limit cannot produce any scene
    #[display("Scene limit must be at least 1, got {}", _0)]
    InvalidSceneLimit(usize),
}

/// Segmentation error with location tracking.
///
/// # Examples
///
/// ```
/// use fabula_error::{SegmentationError, SegmentationErrorKind};
///
/// let err = SegmentationError::new(SegmentationErrorKind::InsufficientBoundaries { found: 1 });
/// assert!(format!("{}", err).contains("at least 2"));
/// ```
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
#[display("Segmentation Error: {} at line {} in {}", kind, line, file)]
pub struct SegmentationError {
    /// The specific error condition
    pub kind: SegmentationErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl SegmentationError {
    /// Create a new SegmentationError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: SegmentationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
