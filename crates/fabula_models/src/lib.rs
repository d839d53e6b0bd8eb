//! OpenAI-compatible generation service adapters.
//!
//! [`OpenAiClient`] implements the narrative, speech and image traits of
//! `fabula_interface` against the `/v1/chat/completions`,
//! `/v1/audio/speech` and `/v1/images/generations` endpoints. HTTP failures
//! are classified into transient and permanent [`ServiceErrorKind`]s so the
//! pipeline can decide what to retry.
//!
//! [`ServiceErrorKind`]: fabula_error::ServiceErrorKind

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod audio;
mod classify;
mod client;
mod config;
mod image;
mod narrative;
mod request;
mod response;
mod speech;

pub use audio::{mp3_duration_ms, wav_duration_ms};
pub use classify::{classify_status, classify_transport};
pub use client::OpenAiClient;
pub use config::{OpenAiConfig, OpenAiConfigBuilder};
pub use request::{ChatCompletionRequest, ImageRequest, Message, SpeechRequest};
pub use response::{ApiErrorBody, ChatCompletionResponse, ImageData, ImageResponse};
