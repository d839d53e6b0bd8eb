//! Story identifiers and requests.

use serde::{Deserialize, Serialize};

/// Identifier of one story generation.
///
/// # Examples
///
/// ```
/// use fabula_core::StoryId;
///
/// let id = StoryId::generate();
/// assert!(id.as_str().starts_with("story_"));
/// assert_eq!(id.as_str().len(), "story_".len() + 8);
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_more::Display,
)]
#[serde(transparent)]
pub struct StoryId(String);

impl StoryId {
    /// Generate a fresh `story_xxxxxxxx` identifier.
    pub fn generate() -> Self {
        let hex = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("story_{}", &hex[..8]))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for StoryId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for StoryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for StoryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Immutable input of one generation call.
///
/// # Examples
///
/// ```
/// use fabula_core::StoryRequest;
///
/// let request = StoryRequest::builder()
///     .user_id("user-42")
///     .prompt("a rabbit and a spaceship")
///     .build()
///     .unwrap();
///
/// assert_eq!(request.prompt(), "a rabbit and a spaceship");
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct StoryRequest {
    /// Requesting user
    user_id: String,
    /// Natural-language story prompt
    prompt: String,
}

impl StoryRequest {
    /// Create a request directly.
    pub fn new(user_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            prompt: prompt.into(),
        }
    }

    /// Creates a new request builder.
    pub fn builder() -> StoryRequestBuilder {
        StoryRequestBuilder::default()
    }
}
