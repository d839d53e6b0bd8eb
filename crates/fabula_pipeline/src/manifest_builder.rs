//! Timeline assembly.

use fabula_core::{Manifest, ManifestSegment, SceneArtifacts, SegmentKind};
use fabula_error::{ManifestError, ManifestErrorKind};

/// Lays fully generated scenes out on a single timeline.
///
/// Scene `i + 1` starts exactly where scene `i`'s narration ends; each
/// scene's image and audio share one start offset.
///
/// # Examples
///
/// ```
/// use fabula_core::SceneArtifacts;
/// use fabula_pipeline::ManifestBuilder;
///
/// let scenes: Vec<_> = [4000, 6000, 5000]
///     .into_iter()
///     .enumerate()
///     .map(|(i, d)| SceneArtifacts {
///         scene_index: i,
///         audio_locator: format!("a{i}.wav"),
///         image_locator: format!("i{i}.png"),
///         audio_duration_ms: d,
///     })
///     .collect();
///
/// let manifest = ManifestBuilder::build("story_1a2b3c4d", &scenes).unwrap();
/// let starts: Vec<u64> = manifest.segments.iter().map(|s| s.start_ms).collect();
/// assert_eq!(starts, vec![0, 0, 4000, 4000, 10000, 10000]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestBuilder;

impl ManifestBuilder {
    /// Build the manifest for `story_id`.
    ///
    /// `scenes` must be indexed `0..n` in order.
    ///
    /// # Errors
    ///
    /// Fails on an empty scene list, non-contiguous indices, a zero audio
    /// duration, or an offset overflow.
    pub fn build(story_id: &str, scenes: &[SceneArtifacts]) -> Result<Manifest, ManifestError> {
        if scenes.is_empty() {
            return Err(ManifestError::new(ManifestErrorKind::Empty));
        }

        let mut segments = Vec::with_capacity(scenes.len() * 2);
        let mut start_ms: u64 = 0;
        for (expected, scene) in scenes.iter().enumerate() {
            if scene.scene_index != expected {
                return Err(ManifestError::new(ManifestErrorKind::NonContiguousScenes {
                    expected,
                    found: scene.scene_index,
                }));
            }
            if scene.audio_duration_ms == 0 {
                return Err(ManifestError::new(ManifestErrorKind::InvalidDuration {
                    scene_index: expected,
                }));
            }

            let duration = scene.audio_duration_ms;
            segments.push(
                ManifestSegment::new(SegmentKind::Image, scene.image_locator.clone(), start_ms)
                    .with_scene(expected)
                    .with_duration(duration),
            );
            segments.push(
                ManifestSegment::new(SegmentKind::Audio, scene.audio_locator.clone(), start_ms)
                    .with_scene(expected)
                    .with_duration(duration),
            );

            start_ms = start_ms
                .checked_add(duration)
                .ok_or_else(|| ManifestError::new(ManifestErrorKind::TimelineOverflow))?;
        }

        tracing::debug!(
            story_id,
            scenes = scenes.len(),
            total_ms = start_ms,
            "Built manifest"
        );
        Ok(Manifest::new(story_id, segments))
    }
}
