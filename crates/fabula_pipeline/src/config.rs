//! Pipeline configuration.

use crate::DeviceImageProfile;
use fabula_core::ScenePolicy;
use fabula_rate_limit::{FabulaConfig, RetryPolicy, ServicesConfig};
use std::time::Duration;

/// Settings for one [`PipelineOrchestrator`](crate::PipelineOrchestrator).
///
/// # Examples
///
/// ```
/// use fabula_core::ScenePolicy;
/// use fabula_pipeline::PipelineConfig;
/// use std::time::Duration;
///
/// let config = PipelineConfig::builder()
///     .scene_policy(ScenePolicy::BestEffort)
///     .timeout(Duration::from_secs(30))
///     .build()
///     .unwrap();
///
/// assert_eq!(*config.max_scenes(), 6);
/// assert_eq!(*config.scene_policy(), ScenePolicy::BestEffort);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, derive_builder::Builder, derive_getters::Getters)]
#[builder(setter(into), default)]
pub struct PipelineConfig {
    /// Upper bound on scenes per story
    max_scenes: usize,
    /// Strict or best-effort scene handling
    scene_policy: ScenePolicy,
    /// Scenes generated concurrently
    scene_concurrency: usize,
    /// Wall-clock ceiling for one story
    timeout: Duration,
    /// Fall back to a single scene when segmentation finds no boundary
    single_scene_fallback: bool,
    /// Label written into story records
    generation_method: String,
    /// Retry policy for generation and upload calls
    retry: RetryPolicy,
    /// Per-service rate and concurrency limits
    limits: ServicesConfig,
    /// Ceiling on one story record write
    record_timeout: Duration,
    /// Reshape illustrations for the device before upload
    device_image: Option<DeviceImageProfile>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_config(&FabulaConfig::default())
    }
}

impl PipelineConfig {
    /// Creates a new config builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Derive pipeline settings from loaded configuration.
    pub fn from_config(config: &FabulaConfig) -> Self {
        let pipeline = &config.pipeline;
        Self {
            max_scenes: pipeline.max_scenes,
            scene_policy: pipeline.scene_policy,
            scene_concurrency: pipeline.scene_concurrency.max(1),
            timeout: Duration::from_secs(pipeline.timeout_secs),
            single_scene_fallback: pipeline.single_scene_fallback,
            generation_method: pipeline.generation_method.clone(),
            retry: RetryPolicy::from(&config.retry),
            limits: config.services,
            record_timeout: Duration::from_millis(pipeline.record_timeout_ms),
            device_image: pipeline
                .device_image
                .enabled
                .then(|| DeviceImageProfile::from(&pipeline.device_image)),
        }
    }
}
