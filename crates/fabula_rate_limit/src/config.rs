//! Layered TOML configuration.
//!
//! Sources, later overriding earlier:
//! - bundled defaults (`include_str!` of `fabula.toml`)
//! - `~/.config/fabula/fabula.toml`
//! - `./fabula.toml`
//! - `FABULA__SECTION__KEY` environment variables

use fabula_core::{AudioFormat, ImageFormat, ScenePolicy};
use fabula_error::{ConfigError, FabulaError, FabulaResult};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, instrument};

/// Story pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Upper bound on scenes per story
    pub max_scenes: usize,
    /// How individual scene failures are treated
    pub scene_policy: ScenePolicy,
    /// Scenes generated concurrently
    pub scene_concurrency: usize,
    /// Wall-clock ceiling for one story
    pub timeout_secs: u64,
    /// Retry as one scene when the narrative cannot be segmented
    pub single_scene_fallback: bool,
    /// Label written into story records
    pub generation_method: String,
    /// Ceiling on a single story record write
    pub record_timeout_ms: u64,
    /// Illustration processing for the playback device
    pub device_image: DeviceImageSettings,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_scenes: 6,
            scene_policy: ScenePolicy::Strict,
            scene_concurrency: 3,
            timeout_secs: 180,
            single_scene_fallback: false,
            generation_method: "openai".to_string(),
            record_timeout_ms: 2000,
            device_image: DeviceImageSettings::default(),
        }
    }
}

/// How illustrations are reshaped for the playback device's display.
///
/// Disabled unless configured; the bundled `fabula.toml` enables it.
///
/// ```toml
/// [pipeline.device_image]
/// enabled = true
/// width = 2600
/// height = 1200
/// grayscale = true
/// jpeg_quality = 85
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DeviceImageSettings {
    /// Process illustrations before upload
    pub enabled: bool,
    /// Target width in pixels
    pub width: u32,
    /// Target height in pixels
    pub height: u32,
    /// Convert to grayscale
    pub grayscale: bool,
    /// JPEG quality, 1 to 100
    pub jpeg_quality: u8,
}

impl Default for DeviceImageSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            width: 2600,
            height: 1200,
            grayscale: true,
            jpeg_quality: 85,
        }
    }
}

/// Retry settings for generation and upload calls.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Retries after the first attempt
    pub max_retries: usize,
    /// Delay before the first retry
    pub initial_backoff_ms: u64,
    /// Backoff multiplier per retry
    pub factor: u64,
    /// Upper bound on a single delay
    pub max_delay_ms: u64,
    /// Randomize delays
    pub jitter: bool,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 500,
            factor: 2,
            max_delay_ms: 8000,
            jitter: true,
        }
    }
}

/// Request limits for one generation service.
///
/// `None` means unlimited.
///
/// ```toml
/// [services.image]
/// rpm = 5
/// max_concurrent = 2
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct ServiceLimits {
    /// Requests per minute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpm: Option<u32>,
    /// Concurrent in-flight requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent: Option<u32>,
}

/// Limits for each generation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Narrative text generation
    pub narrative: ServiceLimits,
    /// Speech synthesis
    pub speech: ServiceLimits,
    /// Image synthesis
    pub image: ServiceLimits,
}

/// Artifact and record storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory artifacts are written under
    pub root: PathBuf,
    /// Base URL artifacts are served from, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,
    /// Directory story records are written to
    pub records_dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./fabula-data"),
            public_base_url: None,
            records_dir: PathBuf::from("./fabula-data/records"),
        }
    }
}

/// Generation model settings for the OpenAI-compatible adapters.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelSettings {
    /// API root, without the `/v1` suffix
    pub base_url: String,
    /// Chat model used for narratives
    pub text_model: String,
    /// Speech model
    pub speech_model: String,
    /// Narration voice
    pub voice: String,
    /// Requested speech encoding
    pub audio_format: AudioFormat,
    /// Image model
    pub image_model: String,
    /// Requested image dimensions
    pub image_size: String,
    /// Encoding the image service returns
    pub image_format: ImageFormat,
    /// Style prefix prepended to image prompts
    pub image_style: String,
    /// System prompt for narrative generation
    pub system_prompt: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion token limit
    pub max_tokens: u32,
    /// Per-request HTTP timeout
    pub timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            text_model: "gpt-4o-mini".to_string(),
            speech_model: "tts-1".to_string(),
            voice: "nova".to_string(),
            audio_format: AudioFormat::Wav,
            image_model: "dall-e-3".to_string(),
            image_size: "1024x1024".to_string(),
            image_format: ImageFormat::Png,
            image_style: "Children's book illustration style, colorful and friendly".to_string(),
            system_prompt: "You are a creative children's storyteller.".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            timeout_secs: 60,
        }
    }
}

/// Playback device settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DeviceSettings {
    /// Dispatch loop period
    pub tick_ms: u64,
    /// Retries per asset download
    pub download_retries: usize,
    /// Delay before the first download retry
    pub download_backoff_ms: u64,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            tick_ms: 50,
            download_retries: 3,
            download_backoff_ms: 250,
        }
    }
}

/// Top-level Fabula configuration.
///
/// # Example
///
/// ```no_run
/// use fabula_rate_limit::FabulaConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = FabulaConfig::load()?;
/// println!("max scenes: {}", config.pipeline.max_scenes);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FabulaConfig {
    /// Pipeline settings
    pub pipeline: PipelineSettings,
    /// Retry settings
    pub retry: RetrySettings,
    /// Per-service limits
    pub services: ServicesConfig,
    /// Storage settings
    pub storage: StorageSettings,
    /// Model settings
    pub models: ModelSettings,
    /// Device settings
    pub device: DeviceSettings,
}

impl FabulaConfig {
    /// Load configuration from a specific file path.
    ///
    /// Keys missing from the file take their built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> FabulaResult<Self> {
        debug!("Loading configuration from file");

        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                FabulaError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                FabulaError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Load configuration with precedence: env > current dir > home dir > bundled.
    ///
    /// User config files are optional and silently skipped if not found.
    #[instrument]
    pub fn load() -> FabulaResult<Self> {
        debug!("Loading configuration with precedence: env > current dir > home dir > bundled defaults");

        const DEFAULT_CONFIG: &str = include_str!("../../../fabula.toml");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/fabula/fabula.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("fabula").required(false))
            .add_source(
                Environment::with_prefix("FABULA")
                    .separator("__")
                    .try_parsing(true),
            );

        builder
            .build()
            .map_err(|e| {
                FabulaError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                FabulaError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }
}
