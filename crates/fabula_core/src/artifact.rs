//! Artifact addressing.

/// Kind of stored scene artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ArtifactKind {
    /// Narration audio
    Audio,
    /// Illustration
    Image,
}

impl ArtifactKind {
    /// Directory name under the story prefix.
    pub fn directory(&self) -> &'static str {
        match self {
            ArtifactKind::Audio => "audio",
            ArtifactKind::Image => "images",
        }
    }
}

/// Storage key of one scene artifact.
///
/// # Examples
///
/// ```
/// use fabula_core::{ArtifactKey, ArtifactKind};
///
/// let key = ArtifactKey::new("story_1a2b3c4d", 2, ArtifactKind::Image);
/// assert_eq!(key.path("png"), "stories/story_1a2b3c4d/images/scene_2.png");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    story_id: String,
    scene_index: usize,
    kind: ArtifactKind,
}

impl ArtifactKey {
    /// Key for one scene's artifact of `kind`.
    pub fn new(story_id: impl Into<String>, scene_index: usize, kind: ArtifactKind) -> Self {
        Self {
            story_id: story_id.into(),
            scene_index,
            kind,
        }
    }

    /// Relative store path with the given file extension.
    pub fn path(&self, extension: &str) -> String {
        format!(
            "stories/{}/{}/scene_{}.{}",
            self.story_id,
            self.kind.directory(),
            self.scene_index,
            extension
        )
    }

    /// Prefix shared by every artifact of the story.
    pub fn story_prefix(story_id: &str) -> String {
        format!("stories/{}/", story_id)
    }
}
