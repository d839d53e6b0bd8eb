//! Error types for the Fabula library.
//!
//! This crate provides the foundation error types used throughout the Fabula workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! Errors raised at suspension points (generation calls, uploads, downloads)
//! implement [`RetryableError`], which is the only thing retry logic consults.
//!
//! # Examples
//!
//! ```
//! use fabula_error::{FabulaErrorKind, FabulaResult, SegmentationError, SegmentationErrorKind};
//!
//! fn split(narrative: &str) -> FabulaResult<Vec<String>> {
//!     if narrative.trim().is_empty() {
//!         Err(SegmentationError::new(SegmentationErrorKind::EmptyNarrative))?
//!     }
//!     Ok(narrative.split("\n\n").map(str::to_string).collect())
//! }
//!
//! let err = split("   ").unwrap_err();
//! assert!(matches!(err.kind(), FabulaErrorKind::Segmentation(_)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod http;
mod json;
mod manifest;
mod pipeline;
mod playback;
mod retry;
mod scene;
mod segmentation;
mod service;
mod storage;

pub use config::ConfigError;
pub use error::{FabulaError, FabulaErrorKind, FabulaResult};
pub use http::HttpError;
pub use json::JsonError;
pub use manifest::{ManifestError, ManifestErrorKind};
pub use pipeline::{FailureStage, PipelineError, PipelineErrorKind};
pub use playback::{PlaybackError, PlaybackErrorKind};
pub use retry::RetryableError;
pub use scene::{SceneFailureCause, SceneGenerationError};
pub use segmentation::{SegmentationError, SegmentationErrorKind};
pub use service::{ServiceError, ServiceErrorClass, ServiceErrorKind, ServiceKind};
pub use storage::{StoreError, StoreErrorKind};
