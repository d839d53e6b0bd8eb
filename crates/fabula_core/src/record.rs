//! Persisted story records.

use chrono::{DateTime, Utc};
use fabula_error::PipelineError;
use serde::{Deserialize, Serialize};

/// Coarse status stored in a story record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StoryStatus {
    /// Generation in flight
    Processing,
    /// Manifest produced
    Completed,
    /// Generation failed
    Failed,
}

/// Failing stage and cause of a failed story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryFailure {
    /// Wire-level stage name
    pub stage: String,
    /// Human-readable cause
    pub cause: String,
}

/// Snapshot of one story generation.
///
/// Created as `processing` when the pipeline starts and replaced once by a
/// terminal `completed` or `failed` snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct StoryRecord {
    story_id: String,
    user_id: String,
    prompt: String,
    status: StoryStatus,
    scene_count: usize,
    total_duration_ms: u64,
    generation_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    failure: Option<StoryFailure>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StoryRecord {
    /// Record for a story that has just started.
    pub fn processing(
        story_id: impl Into<String>,
        user_id: impl Into<String>,
        prompt: impl Into<String>,
        generation_method: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            story_id: story_id.into(),
            user_id: user_id.into(),
            prompt: prompt.into(),
            status: StoryStatus::Processing,
            scene_count: 0,
            total_duration_ms: 0,
            generation_method: generation_method.into(),
            failure: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Terminal snapshot of a completed story.
    pub fn completed(&self, scene_count: usize, total_duration_ms: u64) -> Self {
        Self {
            status: StoryStatus::Completed,
            scene_count,
            total_duration_ms,
            failure: None,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    /// Terminal snapshot of a failed story.
    pub fn failed(&self, error: &PipelineError) -> Self {
        Self {
            status: StoryStatus::Failed,
            failure: Some(StoryFailure {
                stage: error.stage.to_string(),
                cause: error.cause(),
            }),
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    /// Whether the record is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status != StoryStatus::Processing
    }
}
