//! Top-level error wrapper types.

use crate::{
    ConfigError, HttpError, JsonError, ManifestError, PipelineError, PlaybackError,
    SceneGenerationError, SegmentationError, ServiceError, StoreError,
};

/// Every error the workspace can surface through [`FabulaResult`].
///
/// # Examples
///
/// ```
/// use fabula_error::{FabulaError, FabulaErrorKind, StoreError, StoreErrorKind};
///
/// let err: FabulaError = StoreError::new(StoreErrorKind::Unavailable("disk full".into())).into();
/// assert!(matches!(err.kind(), FabulaErrorKind::Store(_)));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum FabulaErrorKind {
    /// HTTP error
    #[from(HttpError)]
    Http(HttpError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Generation service error
    #[from(ServiceError)]
    Service(ServiceError),
    /// Artifact store error
    #[from(StoreError)]
    Store(StoreError),
    /// Narrative segmentation error
    #[from(SegmentationError)]
    Segmentation(SegmentationError),
    /// Single scene generation error
    #[from(SceneGenerationError)]
    Scene(SceneGenerationError),
    /// Manifest error
    #[from(ManifestError)]
    Manifest(ManifestError),
    /// Story-level pipeline error
    #[from(PipelineError)]
    Pipeline(PipelineError),
    /// Device playback error
    #[from(PlaybackError)]
    Playback(PlaybackError),
}

/// Fabula error with kind discrimination.
///
/// # Examples
///
/// ```
/// use fabula_error::{ConfigError, FabulaResult};
///
/// fn load_tick() -> FabulaResult<u64> {
///     Err(ConfigError::new("Failed to parse configuration: invalid type for `device.tick_ms`"))?
/// }
///
/// assert!(load_tick().unwrap_err().to_string().contains("device.tick_ms"));
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Fabula Error: {}", _0)]
pub struct FabulaError(Box<FabulaErrorKind>);

impl FabulaError {
    /// Create a new error from a kind.
    pub fn new(kind: FabulaErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &FabulaErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to FabulaErrorKind
impl<T> From<T> for FabulaError
where
    T: Into<FabulaErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Fabula operations.
pub type FabulaResult<T> = std::result::Result<T, FabulaError>;
