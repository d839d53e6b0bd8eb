//! Per-scene generation error types.

use crate::{ServiceError, StoreError};

/// Why a single scene could not produce its artifacts.
#[derive(Debug, Clone, PartialEq, derive_more::Display)]
pub enum SceneFailureCause {
    /// Speech synthesis failed after exhausting retries
    #[display("speech synthesis failed: {}", _0)]
    Speech(ServiceError),
    /// Image synthesis failed after exhausting retries
    #[display("image synthesis failed: {}", _0)]
    Image(ServiceError),
    /// Artifact upload failed after exhausting retries
    #[display("artifact upload failed: {}", _0)]
    Upload(StoreError),
    /// Synthesized audio reported a non-positive duration
    #[display("synthesized audio has invalid duration {} ms", _0)]
    InvalidDuration(i64),
    /// The illustration could not be reshaped for the device
    #[display("image processing failed: {}", _0)]
    ImageProcessing(String),
}

/// One scene's sub-generation or upload failed.
///
/// # Examples
///
/// ```
/// use fabula_error::{SceneFailureCause, SceneGenerationError};
///
/// let err = SceneGenerationError::new(2, SceneFailureCause::InvalidDuration(0));
/// assert_eq!(err.scene_index, 2);
/// assert!(format!("{}", err).contains("scene 2"));
/// ```
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
#[display("Scene Generation Error (scene {}): {} at line {} in {}", scene_index, cause, line, file)]
pub struct SceneGenerationError {
    /// Index of the failing scene
    pub scene_index: usize,
    /// What failed
    pub cause: SceneFailureCause,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl SceneGenerationError {
    /// Create a new SceneGenerationError with automatic location tracking.
    #[track_caller]
    pub fn new(scene_index: usize, cause: SceneFailureCause) -> Self {
        let location = std::panic::Location::caller();
        Self {
            scene_index,
            cause,
            line: location.line(),
            file: location.file(),
        }
    }
}
