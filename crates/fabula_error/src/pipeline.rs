//! Story-level pipeline error types.

use crate::{ManifestError, SceneGenerationError, SegmentationError, ServiceError};
use std::fmt;

/// Pipeline stage a story failed in.
///
/// Displays as the wire-level stage name reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum FailureStage {
    /// Generating the narrative text
    #[display("narrating")]
    Narrating,
    /// Splitting the narrative into scenes
    #[display("segmenting")]
    Segmenting,
    /// Producing and uploading per-scene media
    #[display("generating_scenes")]
    GeneratingScenes,
    /// Assembling the playback timeline
    #[display("building_manifest")]
    BuildingManifest,
}

/// Why a story failed.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineErrorKind {
    /// Narrative generation failed
    Narrative(ServiceError),
    /// Narrative could not be segmented
    Segmentation(SegmentationError),
    /// One or more scenes failed under the active scene policy
    Scenes {
        /// Every scene failure observed before the story was failed
        failed: Vec<SceneGenerationError>,
        /// Number of scenes the story attempted
        attempted: usize,
    },
    /// Timeline assembly failed
    Manifest(ManifestError),
    /// Caller cancelled the story
    Cancelled,
    /// The story exceeded its wall-clock ceiling
    TimedOut {
        /// Configured ceiling in milliseconds
        limit_ms: u64,
    },
}

impl fmt::Display for PipelineErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineErrorKind::Narrative(e) => write!(f, "narrative generation failed: {}", e.kind),
            PipelineErrorKind::Segmentation(e) => write!(f, "{}", e.kind),
            PipelineErrorKind::Scenes { failed, attempted } => {
                write!(f, "{} of {} scene(s) failed", failed.len(), attempted)?;
                for failure in failed {
                    write!(f, "; scene {}: {}", failure.scene_index, failure.cause)?;
                }
                Ok(())
            }
            PipelineErrorKind::Manifest(e) => write!(f, "{}", e.kind),
            PipelineErrorKind::Cancelled => write!(f, "story generation was cancelled"),
            PipelineErrorKind::TimedOut { limit_ms } => {
                write!(f, "story generation exceeded {} ms", limit_ms)
            }
        }
    }
}

/// The single structured error surfaced for a failed story.
///
/// Identifies the failing stage and carries a human-readable cause.
///
/// # Examples
///
/// ```
/// use fabula_error::{FailureStage, PipelineError, PipelineErrorKind};
///
/// let err = PipelineError::new("story_1a2b3c4d", FailureStage::GeneratingScenes, PipelineErrorKind::Cancelled);
/// assert_eq!(err.stage.to_string(), "generating_scenes");
/// assert!(err.cause().contains("cancelled"));
/// ```
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
#[display("Pipeline Error: story {} failed while {}: {} at line {} in {}", story_id, stage, kind, line, file)]
pub struct PipelineError {
    /// Story that failed
    pub story_id: String,
    /// Stage the story was in when it failed
    pub stage: FailureStage,
    /// Why it failed
    pub kind: PipelineErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl PipelineError {
    /// Create a new PipelineError with automatic location tracking.
    #[track_caller]
    pub fn new(story_id: impl Into<String>, stage: FailureStage, kind: PipelineErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            story_id: story_id.into(),
            stage,
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Human-readable cause without location details.
    pub fn cause(&self) -> String {
        self.kind.to_string()
    }
}
