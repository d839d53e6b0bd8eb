//! Per-scene media generation and upload.

use crate::DeviceImageProfile;
use fabula_core::{ArtifactKey, ArtifactKind, Scene, SceneArtifacts, SynthesizedAudio, SynthesizedImage};
use fabula_error::{SceneFailureCause, SceneGenerationError, ServiceKind};
use fabula_interface::{ArtifactStore, ImageSynthesizer, SpeechSynthesizer};
use fabula_rate_limit::{RetryPolicy, ServiceLimiter, ServicesConfig};
use std::sync::Arc;
use tracing::instrument;

/// Produces the narration and illustration of one scene.
///
/// Speech and image synthesis run concurrently, each rate limited and
/// retried on transient failures. A scene yields [`SceneArtifacts`] only
/// when both artifacts were synthesized and uploaded; any sub-failure
/// fails the whole scene. With a [`DeviceImageProfile`], illustrations
/// are reshaped for the device before upload.
#[derive(Clone)]
pub struct SceneMediaGenerator {
    speech: Arc<dyn SpeechSynthesizer>,
    image: Arc<dyn ImageSynthesizer>,
    store: Arc<dyn ArtifactStore>,
    speech_limiter: ServiceLimiter,
    image_limiter: ServiceLimiter,
    retry: RetryPolicy,
    device_image: Option<DeviceImageProfile>,
}

impl std::fmt::Debug for SceneMediaGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneMediaGenerator")
            .field("speech_limiter", &self.speech_limiter)
            .field("image_limiter", &self.image_limiter)
            .field("retry", &self.retry)
            .field("device_image", &self.device_image)
            .finish_non_exhaustive()
    }
}

impl SceneMediaGenerator {
    /// Create a generator over the given services and store.
    pub fn new(
        speech: Arc<dyn SpeechSynthesizer>,
        image: Arc<dyn ImageSynthesizer>,
        store: Arc<dyn ArtifactStore>,
        limits: &ServicesConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            speech,
            image,
            store,
            speech_limiter: ServiceLimiter::new(ServiceKind::Speech, &limits.speech),
            image_limiter: ServiceLimiter::new(ServiceKind::Image, &limits.image),
            retry,
            device_image: None,
        }
    }

    /// Reshape illustrations with `profile` before upload.
    pub fn with_device_image(mut self, profile: Option<DeviceImageProfile>) -> Self {
        self.device_image = profile;
        self
    }

    /// Generate and upload both artifacts of `scene`.
    #[instrument(skip(self, scene), fields(scene = scene.index))]
    pub async fn generate(
        &self,
        story_id: &str,
        scene: &Scene,
    ) -> Result<SceneArtifacts, SceneGenerationError> {
        let fail = |cause| SceneGenerationError::new(scene.index, cause);

        let (audio, image) = tokio::try_join!(
            async {
                self.synthesize_speech(&scene.text)
                    .await
                    .map_err(|e| fail(SceneFailureCause::Speech(e)))
            },
            async {
                self.synthesize_image(&scene.text)
                    .await
                    .map_err(|e| fail(SceneFailureCause::Image(e)))
            },
        )?;

        let audio_duration_ms = u64::try_from(audio.duration_ms)
            .ok()
            .filter(|d| *d > 0)
            .ok_or_else(|| fail(SceneFailureCause::InvalidDuration(audio.duration_ms)))?;

        let image = match self.device_image {
            Some(profile) => prepare_for_device(profile, image)
                .await
                .map_err(|e| fail(SceneFailureCause::ImageProcessing(e)))?,
            None => image,
        };

        let (audio_locator, image_locator) = tokio::try_join!(
            self.upload_audio(story_id, scene.index, &audio),
            self.upload_image(story_id, scene.index, &image),
        )
        .map_err(|e| fail(SceneFailureCause::Upload(e)))?;

        tracing::info!(audio_duration_ms, "Scene artifacts ready");
        Ok(SceneArtifacts {
            scene_index: scene.index,
            audio_locator,
            image_locator,
            audio_duration_ms,
        })
    }

    async fn synthesize_speech(
        &self,
        text: &str,
    ) -> Result<SynthesizedAudio, fabula_error::ServiceError> {
        self.speech_limiter
            .execute(&self.retry, "synthesize_speech", || {
                self.speech.synthesize_speech(text)
            })
            .await
    }

    async fn synthesize_image(
        &self,
        text: &str,
    ) -> Result<SynthesizedImage, fabula_error::ServiceError> {
        self.image_limiter
            .execute(&self.retry, "synthesize_image", || {
                self.image.synthesize_image(text)
            })
            .await
    }

    async fn upload_audio(
        &self,
        story_id: &str,
        scene_index: usize,
        audio: &SynthesizedAudio,
    ) -> Result<String, fabula_error::StoreError> {
        let path = ArtifactKey::new(story_id, scene_index, ArtifactKind::Audio)
            .path(audio.format.extension());
        let content_type = audio.format.content_type();
        self.retry
            .run("upload_audio", || self.store.put(&path, &audio.bytes, content_type))
            .await
    }

    async fn upload_image(
        &self,
        story_id: &str,
        scene_index: usize,
        image: &SynthesizedImage,
    ) -> Result<String, fabula_error::StoreError> {
        let path = ArtifactKey::new(story_id, scene_index, ArtifactKind::Image)
            .path(image.format.extension());
        let content_type = image.format.content_type();
        self.retry
            .run("upload_image", || self.store.put(&path, &image.bytes, content_type))
            .await
    }
}

/// Run the CPU-bound resize off the async workers.
async fn prepare_for_device(
    profile: DeviceImageProfile,
    image: SynthesizedImage,
) -> Result<SynthesizedImage, String> {
    tokio::task::spawn_blocking(move || profile.apply(&image))
        .await
        .map_err(|e| e.to_string())?
        .map_err(|e| e.to_string())
}
