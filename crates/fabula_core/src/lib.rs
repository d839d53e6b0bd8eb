//! Core data types for the Fabula story generation pipeline.
//!
//! This crate provides the plain data shared by the server-side pipeline and
//! the playback device: story requests, scenes, synthesized media, the
//! playback manifest and its wire format, story records, and status messages.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod artifact;
mod manifest;
mod media;
mod message;
mod record;
mod scene;
mod state;
mod story;
mod telemetry;

pub use artifact::{ArtifactKey, ArtifactKind};
pub use manifest::{Manifest, ManifestSegment, SegmentKind};
pub use media::{AudioFormat, ImageFormat, SynthesizedAudio, SynthesizedImage};
pub use message::{ClientMessage, PlaybackStatus, ServerMessage};
pub use record::{StoryFailure, StoryRecord, StoryStatus};
pub use scene::{Scene, SceneArtifacts};
pub use state::{PipelineState, ScenePolicy};
pub use story::{StoryId, StoryRequest, StoryRequestBuilder};
pub use telemetry::init_tracing;
#[cfg(feature = "otel")]
pub use telemetry::{init_telemetry, shutdown_telemetry};
