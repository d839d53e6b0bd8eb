//! Story generation pipeline.
//!
//! A story flows through [`PipelineOrchestrator`]:
//!
//! 1. the narrative service writes a story for the prompt;
//! 2. [`SceneSegmenter`] splits it into ordered scenes;
//! 3. [`SceneMediaGenerator`] produces and uploads narration and an
//!    illustration per scene, scenes running concurrently, optionally
//!    reshaping illustrations with a [`DeviceImageProfile`];
//! 4. [`ManifestBuilder`] lays the scenes out on one timeline.
//!
//! Either a complete [`Manifest`](fabula_core::Manifest) is returned or a
//! single [`PipelineError`](fabula_error::PipelineError) naming the failing
//! stage.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod device_image;
mod generator;
mod manifest_builder;
mod orchestrator;
mod prompt;
mod segmenter;

pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use device_image::{DeviceImageProfile, DeviceImageProfileBuilder};
pub use generator::SceneMediaGenerator;
pub use manifest_builder::ManifestBuilder;
pub use orchestrator::{GeneratedStory, PipelineOrchestrator, PipelineServices};
pub use prompt::narrative_prompt;
pub use segmenter::SceneSegmenter;
