//! Scenes and their generated artifacts.

use serde::{Deserialize, Serialize};

/// One ordered narrative unit.
///
/// Scenes of one story are numbered `0..n` without gaps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scene {
    /// Zero-based position in the story
    pub index: usize,
    /// Narration text for this scene
    pub text: String,
}

impl Scene {
    /// Create a scene.
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// Stored audio and image of one fully generated scene.
///
/// Only exists once both artifacts were synthesized and uploaded.
/// `audio_duration_ms` is derived from the synthesized audio.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SceneArtifacts {
    /// Scene this artifact pair belongs to
    pub scene_index: usize,
    /// Retrievable locator of the narration audio
    pub audio_locator: String,
    /// Retrievable locator of the illustration
    pub image_locator: String,
    /// Length of the narration audio
    pub audio_duration_ms: u64,
}
