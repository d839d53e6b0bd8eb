//! Session channel messages exchanged with playback devices.

use crate::Manifest;
use serde::{Deserialize, Serialize};

/// Playback status a device reports for a story.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlaybackStatus {
    /// Playback began
    Playing,
    /// Last segment finished
    Done,
    /// Download or playback failed
    Error,
}

/// Message sent from a device to the server.
///
/// # Examples
///
/// ```
/// use fabula_core::{ClientMessage, PlaybackStatus};
///
/// let msg: ClientMessage = serde_json::from_str(
///     r#"{"type":"story_status","story_id":"story_1a2b3c4d","status":"done"}"#,
/// ).unwrap();
///
/// assert_eq!(msg, ClientMessage::StoryStatus {
///     story_id: "story_1a2b3c4d".into(),
///     status: PlaybackStatus::Done,
///     detail: None,
/// });
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Playback progress for one story
    StoryStatus {
        /// Story being played
        story_id: String,
        /// Reported status
        status: PlaybackStatus,
        /// Optional failure description
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
}

impl ClientMessage {
    /// Status report without detail.
    pub fn status(story_id: impl Into<String>, status: PlaybackStatus) -> Self {
        ClientMessage::StoryStatus {
            story_id: story_id.into(),
            status,
            detail: None,
        }
    }

    /// Error report carrying a failure description.
    pub fn error(story_id: impl Into<String>, detail: impl Into<String>) -> Self {
        ClientMessage::StoryStatus {
            story_id: story_id.into(),
            status: PlaybackStatus::Error,
            detail: Some(detail.into()),
        }
    }
}

/// Message sent from the server to a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Acknowledges a status report
    StatusReceived {
        /// Story the report was about
        story_id: String,
        /// Status that was received
        status: PlaybackStatus,
    },
    /// Delivers a playback manifest
    StoryManifest {
        /// The timeline to replay
        manifest: Manifest,
    },
}

impl ServerMessage {
    /// Acknowledgement for a client status report.
    ///
    /// Returns `None` for messages that need no acknowledgement.
    pub fn acknowledge(message: &ClientMessage) -> Option<Self> {
        match message {
            ClientMessage::StoryStatus {
                story_id, status, ..
            } => Some(ServerMessage::StatusReceived {
                story_id: story_id.clone(),
                status: *status,
            }),
        }
    }
}
