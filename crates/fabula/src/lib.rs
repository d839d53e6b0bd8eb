//! Fabula - prompt to synchronized story playback
//!
//! Fabula turns a single story prompt into a multi-scene, narrated and
//! illustrated playback package for a small client device:
//!
//! 1. a narrative service writes the story;
//! 2. the story is split into scenes;
//! 3. every scene gets narration audio and an illustration, generated
//!    concurrently and uploaded to an artifact store;
//! 4. the scenes are laid out on one absolute timeline, the [`Manifest`];
//! 5. a device downloads the manifest's assets and replays it against its
//!    own clock.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use fabula::{
//!     FabulaConfig, FileSystemArtifactStore, JsonRecordStore, OpenAiClient, OpenAiConfig,
//!     PipelineConfig, PipelineOrchestrator, PipelineServices, StoryRequest,
//! };
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = FabulaConfig::load()?;
//!     let client = Arc::new(OpenAiClient::new(OpenAiConfig::from_settings(
//!         &config.models,
//!         std::env::var("OPENAI_API_KEY").ok(),
//!     ))?);
//!     let services = PipelineServices {
//!         narrative: client.clone(),
//!         speech: client.clone(),
//!         image: client,
//!         store: Arc::new(FileSystemArtifactStore::new(&config.storage.root, None)?),
//!         records: Arc::new(JsonRecordStore::new(&config.storage.records_dir)),
//!     };
//!
//!     let pipeline = PipelineOrchestrator::connect(services, PipelineConfig::from_config(&config)).await?;
//!     let story = pipeline
//!         .run(&StoryRequest::new("me", "a rabbit and a spaceship"), CancellationToken::new())
//!         .await?;
//!     println!("{}", story.manifest.to_json()?);
//!     Ok(())
//! }
//! ```
//!
//! # Cargo Features
//!
//! - `otel` - export tracing spans through OpenTelemetry's stdout exporter
//!
//! # Architecture
//!
//! - `fabula_error` - error types
//! - `fabula_core` - story, scene, manifest, record and message types
//! - `fabula_interface` - service and store traits
//! - `fabula_rate_limit` - configuration, retry policy, per-service limits
//! - `fabula_storage` - artifact and story record stores
//! - `fabula_models` - OpenAI-compatible generation adapters
//! - `fabula_pipeline` - segmentation, scene generation, manifest assembly
//! - `fabula_device` - client-side playback scheduler and runtime
//!
//! This crate (`fabula`) re-exports everything for convenience.

pub use fabula_core::*;
pub use fabula_device::*;
pub use fabula_error::*;
pub use fabula_interface::*;
pub use fabula_models::{OpenAiClient, OpenAiConfig, OpenAiConfigBuilder};
pub use fabula_pipeline::*;
pub use fabula_rate_limit::{
    DeviceImageSettings, DeviceSettings, FabulaConfig, ModelSettings, PipelineSettings,
    RetryPolicy, RetryPolicyBuilder, RetrySettings, ServiceLimiter, ServiceLimits,
    ServicesConfig, StorageSettings,
};
pub use fabula_storage::*;
