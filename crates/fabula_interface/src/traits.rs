//! Trait definitions for generation services and stores.

use async_trait::async_trait;
use fabula_core::{StoryRecord, SynthesizedAudio, SynthesizedImage};
use fabula_error::{FabulaResult, ServiceError, StoreError};

/// Text generation service that turns a prompt into a narrative.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    /// Generate narrative text for a story prompt.
    async fn generate_text(&self, prompt: &str) -> Result<String, ServiceError>;

    /// Provider name (e.g., "openai").
    fn provider_name(&self) -> &str;
}

/// Speech synthesis service that narrates scene text.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize narration audio and report its duration.
    async fn synthesize_speech(&self, text: &str) -> Result<SynthesizedAudio, ServiceError>;
}

/// Image synthesis service that illustrates scene text.
#[async_trait]
pub trait ImageSynthesizer: Send + Sync {
    /// Synthesize an illustration for the given text.
    async fn synthesize_image(&self, text: &str) -> Result<SynthesizedImage, ServiceError>;
}

/// Durable store for generated artifacts.
///
/// Paths are relative and `/`-separated; implementations return a locator a
/// device can download from.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Write `bytes` under `path` and return its retrievable locator.
    async fn put(&self, path: &str, bytes: &[u8], content_type: &str)
    -> Result<String, StoreError>;

    /// Verify the store can accept writes.
    ///
    /// Called once when the pipeline is constructed, not per upload.
    async fn check_ready(&self) -> Result<(), StoreError>;
}

/// Non-critical sink for story metadata.
///
/// Failures are logged by callers and never change a story's outcome.
#[async_trait]
pub trait StoryRecordStore: Send + Sync {
    /// Persist the latest snapshot of a story.
    async fn record_story(&self, record: &StoryRecord) -> FabulaResult<()>;
}
