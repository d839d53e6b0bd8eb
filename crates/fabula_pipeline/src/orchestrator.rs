//! Story-level orchestration.

use crate::{ManifestBuilder, PipelineConfig, SceneMediaGenerator, SceneSegmenter, narrative_prompt};
use fabula_core::{
    Manifest, PipelineState, Scene, SceneArtifacts, ScenePolicy, StoryId, StoryRecord, StoryRequest,
};
use fabula_error::{
    FabulaResult, FailureStage, PipelineError, PipelineErrorKind, SegmentationErrorKind,
    ServiceKind,
};
use fabula_interface::{
    ArtifactStore, ImageSynthesizer, NarrativeGenerator, SpeechSynthesizer, StoryRecordStore,
};
use fabula_rate_limit::ServiceLimiter;
use futures::{StreamExt, stream};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Collaborators a pipeline runs against.
#[derive(Clone)]
pub struct PipelineServices {
    /// Writes the narrative
    pub narrative: Arc<dyn NarrativeGenerator>,
    /// Narrates each scene
    pub speech: Arc<dyn SpeechSynthesizer>,
    /// Illustrates each scene
    pub image: Arc<dyn ImageSynthesizer>,
    /// Holds uploaded artifacts
    pub store: Arc<dyn ArtifactStore>,
    /// Receives story record snapshots
    pub records: Arc<dyn StoryRecordStore>,
}

/// Outcome of a successful story.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedStory {
    /// Identifier assigned to the story
    pub story_id: StoryId,
    /// Playback timeline
    pub manifest: Manifest,
    /// Terminal record snapshot
    pub record: StoryRecord,
    /// Original indices of scenes dropped under best-effort policy
    pub dropped_scenes: Vec<usize>,
}

/// Drives one story from prompt to manifest.
///
/// Each run walks `Started → Narrating → Segmenting → GeneratingScenes →
/// BuildingManifest → Completed`. Any failure, cancellation, or timeout
/// ends the run in `Failed` with a single [`PipelineError`] naming the stage
/// that was active. No partial manifest is ever returned.
///
/// One orchestrator may run many stories concurrently; rate limiters are
/// shared across them.
pub struct PipelineOrchestrator {
    narrative: Arc<dyn NarrativeGenerator>,
    narrative_limiter: ServiceLimiter,
    generator: SceneMediaGenerator,
    records: Arc<dyn StoryRecordStore>,
    config: PipelineConfig,
}

impl std::fmt::Debug for PipelineOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineOrchestrator")
            .field("provider", &self.narrative.provider_name())
            .field("generator", &self.generator)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PipelineOrchestrator {
    /// Build an orchestrator after checking the artifact store is writable.
    ///
    /// # Errors
    ///
    /// Returns the store's readiness error; no story is started.
    pub async fn connect(services: PipelineServices, config: PipelineConfig) -> FabulaResult<Self> {
        services.store.check_ready().await?;

        let limits = *config.limits();
        let generator = SceneMediaGenerator::new(
            services.speech,
            services.image,
            services.store,
            &limits,
            config.retry().clone(),
        )
        .with_device_image(*config.device_image());

        info!(
            provider = services.narrative.provider_name(),
            max_scenes = config.max_scenes(),
            policy = %config.scene_policy(),
            "Pipeline ready"
        );

        Ok(Self {
            narrative_limiter: ServiceLimiter::new(ServiceKind::Narrative, &limits.narrative),
            narrative: services.narrative,
            generator,
            records: services.records,
            config,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Generate a story under a fresh identifier.
    pub async fn run(
        &self,
        request: &StoryRequest,
        cancel: CancellationToken,
    ) -> Result<GeneratedStory, PipelineError> {
        self.run_with_id(StoryId::generate(), request, cancel).await
    }

    /// Generate a story under a caller-chosen identifier.
    pub async fn run_with_id(
        &self,
        story_id: StoryId,
        request: &StoryRequest,
        cancel: CancellationToken,
    ) -> Result<GeneratedStory, PipelineError> {
        let (state, _) = watch::channel(PipelineState::Started);
        self.run_observed(story_id, request, cancel, &state).await
    }

    /// Generate a story, publishing every state transition on `state`.
    ///
    /// `state` is reset to `Started` before the run begins.
    #[instrument(skip(self, story_id, request, cancel, state), fields(story_id = %story_id))]
    pub async fn run_observed(
        &self,
        story_id: StoryId,
        request: &StoryRequest,
        cancel: CancellationToken,
        state: &watch::Sender<PipelineState>,
    ) -> Result<GeneratedStory, PipelineError> {
        state.send_replace(PipelineState::Started);
        let tracker = StageTracker { state };

        let record = StoryRecord::processing(
            story_id.as_str(),
            request.user_id(),
            request.prompt(),
            self.config.generation_method(),
        );
        info!(user_id = %request.user_id(), "Story started");

        let timeout = *self.config.timeout();
        let covered = async {
            self.save_record(&record).await;
            self.execute(&story_id, request, &tracker).await
        };
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PipelineErrorKind::Cancelled),
            result = tokio::time::timeout(timeout, covered) => {
                result.unwrap_or_else(|_| {
                    Err(PipelineErrorKind::TimedOut {
                        limit_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    })
                })
            }
        };

        match outcome {
            Ok((manifest, dropped_scenes)) => {
                tracker.advance(PipelineState::Completed);
                let record = record.completed(manifest.scene_count(), manifest.end_ms());
                self.save_record(&record).await;
                info!(
                    scenes = manifest.scene_count(),
                    total_ms = manifest.end_ms(),
                    dropped = dropped_scenes.len(),
                    "Story completed"
                );
                Ok(GeneratedStory {
                    story_id,
                    manifest,
                    record,
                    dropped_scenes,
                })
            }
            Err(kind) => {
                let stage = tracker
                    .current()
                    .failure_stage()
                    .unwrap_or(FailureStage::Narrating);
                let error = PipelineError::new(story_id.as_str(), stage, kind);
                tracker.advance(PipelineState::Failed);
                self.save_record(&record.failed(&error)).await;
                error!(stage = %error.stage, cause = %error.cause(), "Story failed");
                Err(error)
            }
        }
    }

    async fn execute(
        &self,
        story_id: &StoryId,
        request: &StoryRequest,
        tracker: &StageTracker<'_>,
    ) -> Result<(Manifest, Vec<usize>), PipelineErrorKind> {
        tracker.advance(PipelineState::Narrating);
        let prompt = narrative_prompt(request.prompt(), *self.config.max_scenes());
        let narrative = self
            .narrative_limiter
            .execute(self.config.retry(), "generate_text", || {
                self.narrative.generate_text(&prompt)
            })
            .await
            .map_err(PipelineErrorKind::Narrative)?;

        tracker.advance(PipelineState::Segmenting);
        let scenes = self.segment(&narrative)?;
        debug!(scenes = scenes.len(), "Narrative segmented");

        tracker.advance(PipelineState::GeneratingScenes);
        let (artifacts, dropped) = self.generate_scenes(story_id, &scenes).await?;

        tracker.advance(PipelineState::BuildingManifest);
        let manifest = ManifestBuilder::build(story_id.as_str(), &artifacts)
            .map_err(PipelineErrorKind::Manifest)?;

        Ok((manifest, dropped))
    }

    fn segment(&self, narrative: &str) -> Result<Vec<Scene>, PipelineErrorKind> {
        match SceneSegmenter::segment(narrative, *self.config.max_scenes()) {
            Ok(scenes) => Ok(scenes),
            Err(e)
                if *self.config.single_scene_fallback()
                    && matches!(e.kind, SegmentationErrorKind::InsufficientBoundaries { .. }) =>
            {
                warn!(error = %e.kind, "No scene boundaries found, using a single scene");
                Ok(vec![Scene::new(0, narrative.trim())])
            }
            Err(e) => Err(PipelineErrorKind::Segmentation(e)),
        }
    }

    /// Run every scene, at most `scene_concurrency` at a time.
    ///
    /// Returns artifacts ordered by contiguous scene index, plus the
    /// original indices of any dropped scenes.
    async fn generate_scenes(
        &self,
        story_id: &StoryId,
        scenes: &[Scene],
    ) -> Result<(Vec<SceneArtifacts>, Vec<usize>), PipelineErrorKind> {
        let attempted = scenes.len();
        let results = stream::iter(
            scenes
                .iter()
                .map(|scene| self.generator.generate(story_id.as_str(), scene)),
        )
        .buffer_unordered(*self.config.scene_concurrency());
        let mut results = std::pin::pin!(results);

        let mut artifacts = Vec::with_capacity(attempted);
        let mut failed = Vec::new();
        while let Some(result) = results.next().await {
            match (result, self.config.scene_policy()) {
                (Ok(scene), _) => artifacts.push(scene),
                // Returning drops the stream, which cancels sibling scenes.
                (Err(e), ScenePolicy::Strict) => {
                    return Err(PipelineErrorKind::Scenes {
                        failed: vec![e],
                        attempted,
                    });
                }
                (Err(e), ScenePolicy::BestEffort) => {
                    warn!(scene = e.scene_index, cause = %e.cause, "Dropping failed scene");
                    failed.push(e);
                }
            }
        }

        if artifacts.is_empty() {
            failed.sort_by_key(|e| e.scene_index);
            return Err(PipelineErrorKind::Scenes { failed, attempted });
        }

        artifacts.sort_by_key(|a| a.scene_index);
        for (position, scene) in artifacts.iter_mut().enumerate() {
            scene.scene_index = position;
        }

        let mut dropped: Vec<usize> = failed.iter().map(|e| e.scene_index).collect();
        dropped.sort_unstable();
        if !dropped.is_empty() {
            warn!(?dropped, kept = artifacts.len(), "Continuing with surviving scenes");
        }
        Ok((artifacts, dropped))
    }

    /// Write a record snapshot, giving up after `record_timeout`.
    ///
    /// Record failures never change the story's outcome.
    async fn save_record(&self, record: &StoryRecord) {
        let limit = *self.config.record_timeout();
        match tokio::time::timeout(limit, self.records.record_story(record)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(status = %record.status(), error = %e, "Failed to persist story record");
            }
            Err(_) => {
                warn!(
                    status = %record.status(),
                    limit_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                    "Story record write timed out"
                );
            }
        }
    }
}

struct StageTracker<'a> {
    state: &'a watch::Sender<PipelineState>,
}

impl StageTracker<'_> {
    fn current(&self) -> PipelineState {
        *self.state.borrow()
    }

    fn advance(&self, next: PipelineState) {
        let previous = self.state.send_replace(next);
        debug_assert!(
            previous.can_transition_to(next),
            "illegal transition {previous} -> {next}"
        );
        debug!(from = %previous, to = %next, "Pipeline state transition");
    }
}
