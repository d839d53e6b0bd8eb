//! Adapter configuration.

use fabula_core::{AudioFormat, ImageFormat};
use fabula_rate_limit::ModelSettings;

/// Connection and model settings for [`OpenAiClient`](crate::OpenAiClient).
///
/// # Examples
///
/// ```
/// use fabula_models::OpenAiConfig;
///
/// let config = OpenAiConfig::builder()
///     .base_url("http://localhost:8080")
///     .text_model("llama3")
///     .build()
///     .unwrap();
///
/// assert_eq!(config.base_url(), "http://localhost:8080");
/// assert!(config.api_key().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, derive_builder::Builder, derive_getters::Getters)]
#[builder(setter(into), default)]
pub struct OpenAiConfig {
    /// API root without `/v1`
    base_url: String,
    /// Bearer token
    #[builder(setter(strip_option))]
    api_key: Option<String>,
    /// Chat model for narratives
    text_model: String,
    /// Speech model
    speech_model: String,
    /// Narration voice
    voice: String,
    /// Requested speech encoding
    audio_format: AudioFormat,
    /// Image model
    image_model: String,
    /// Requested image size
    image_size: String,
    /// Encoding of returned images
    image_format: ImageFormat,
    /// Style prefix for image prompts
    image_style: String,
    /// System prompt for narratives
    system_prompt: String,
    /// Sampling temperature
    temperature: f32,
    /// Completion token limit
    max_tokens: u32,
    /// Per-request timeout in seconds
    timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self::from_settings(&ModelSettings::default(), None)
    }
}

impl OpenAiConfig {
    /// Creates a new config builder.
    pub fn builder() -> OpenAiConfigBuilder {
        OpenAiConfigBuilder::default()
    }

    /// Build from loaded model settings and an optional API key.
    pub fn from_settings(settings: &ModelSettings, api_key: Option<String>) -> Self {
        Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key,
            text_model: settings.text_model.clone(),
            speech_model: settings.speech_model.clone(),
            voice: settings.voice.clone(),
            audio_format: settings.audio_format,
            image_model: settings.image_model.clone(),
            image_size: settings.image_size.clone(),
            image_format: settings.image_format,
            image_style: settings.image_style.clone(),
            system_prompt: settings.system_prompt.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            timeout_secs: settings.timeout_secs,
        }
    }

    /// Full URL of an API path such as `/v1/audio/speech`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
