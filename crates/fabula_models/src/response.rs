//! Response bodies.
//!
//! Fields the adapters do not read are optional so that compatible servers
//! with sparser responses still parse.

use serde::{Deserialize, Serialize};

/// OpenAI-compatible chat completion response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionResponse {
    /// Unique identifier for the completion
    #[serde(default)]
    pub id: Option<String>,
    /// Model used for completion
    #[serde(default)]
    pub model: Option<String>,
    /// Generated completions
    pub choices: Vec<Choice>,
}

impl ChatCompletionResponse {
    /// Content of the first choice, if non-empty.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// A completion choice
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Choice {
    /// Index of this choice
    #[serde(default)]
    pub index: u32,
    /// The generated message
    pub message: ChoiceMessage,
    /// Reason why generation finished
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Message in a choice
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ChoiceMessage {
    /// Role of the message (typically "assistant")
    #[serde(default)]
    pub role: Option<String>,
    /// Generated content
    #[serde(default)]
    pub content: Option<String>,
}

/// Image generation response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ImageResponse {
    /// Generated images
    pub data: Vec<ImageData>,
}

/// One generated image
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ImageData {
    /// Base64-encoded image bytes
    #[serde(default)]
    pub b64_json: Option<String>,
    /// Prompt after server-side rewriting
    #[serde(default)]
    pub revised_prompt: Option<String>,
}

/// Error envelope returned with non-2xx statuses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiErrorBody {
    /// Error details
    pub error: ApiErrorDetail,
}

/// Error details
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiErrorDetail {
    /// Human-readable message
    #[serde(default)]
    pub message: String,
    /// Error category such as `insufficient_quota`
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Machine-readable code, a string or number depending on the server
    #[serde(default)]
    pub code: Option<serde_json::Value>,
}
