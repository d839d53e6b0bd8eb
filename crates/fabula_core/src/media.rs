//! Synthesized media payloads and their formats.

use serde::{Deserialize, Serialize};

/// Encoding of synthesized narration audio.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AudioFormat {
    /// RIFF/WAVE PCM
    #[default]
    Wav,
    /// MPEG-1 Layer III
    Mp3,
}

impl AudioFormat {
    /// MIME type used when uploading the artifact.
    pub fn content_type(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Mp3 => "audio/mpeg",
        }
    }

    /// File extension used in artifact paths.
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
        }
    }
}

/// Encoding of a synthesized illustration.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ImageFormat {
    /// Portable Network Graphics
    #[default]
    Png,
    /// JPEG
    Jpeg,
    /// WebP
    Webp,
}

impl ImageFormat {
    /// MIME type used when uploading the artifact.
    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Webp => "image/webp",
        }
    }

    /// File extension used in artifact paths.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
        }
    }
}

/// Narration audio returned by a speech service.
///
/// `duration_ms` is reported by the service and is not trusted blindly;
/// scene generation rejects non-positive values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    /// Encoded audio bytes
    pub bytes: Vec<u8>,
    /// Playback length reported by the service
    pub duration_ms: i64,
    /// Encoding of `bytes`
    pub format: AudioFormat,
}

/// Illustration returned by an image service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedImage {
    /// Encoded image bytes
    pub bytes: Vec<u8>,
    /// Encoding of `bytes`
    pub format: ImageFormat,
}
