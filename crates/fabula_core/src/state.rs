//! Per-story pipeline state machine.

use fabula_error::FailureStage;
use serde::{Deserialize, Serialize};

/// Lifecycle of one story generation.
///
/// `Started → Narrating → Segmenting → GeneratingScenes → BuildingManifest →
/// Completed`, with `Failed` reachable from every non-terminal state.
///
/// # Examples
///
/// ```
/// use fabula_core::PipelineState;
///
/// assert!(PipelineState::Started.can_transition_to(PipelineState::Narrating));
/// assert!(PipelineState::Segmenting.can_transition_to(PipelineState::Failed));
/// assert!(!PipelineState::Completed.can_transition_to(PipelineState::Failed));
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    /// Request accepted
    Started,
    /// Generating narrative text
    Narrating,
    /// Splitting narrative into scenes
    Segmenting,
    /// Producing per-scene media
    GeneratingScenes,
    /// Assembling the timeline
    BuildingManifest,
    /// Manifest returned
    Completed,
    /// Story failed
    Failed,
}

impl PipelineState {
    /// Whether no further transitions are allowed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Completed | PipelineState::Failed)
    }

    /// Whether `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;
        match (self, next) {
            (Completed | Failed, _) => false,
            (_, Failed) => true,
            (Started, Narrating)
            | (Narrating, Segmenting)
            | (Segmenting, GeneratingScenes)
            | (GeneratingScenes, BuildingManifest)
            | (BuildingManifest, Completed) => true,
            _ => false,
        }
    }

    /// Stage reported when a story fails while in this state.
    ///
    /// `Started` maps to `Narrating`, the first stage with external work.
    pub fn failure_stage(&self) -> Option<FailureStage> {
        match self {
            PipelineState::Started | PipelineState::Narrating => Some(FailureStage::Narrating),
            PipelineState::Segmenting => Some(FailureStage::Segmenting),
            PipelineState::GeneratingScenes => Some(FailureStage::GeneratingScenes),
            PipelineState::BuildingManifest => Some(FailureStage::BuildingManifest),
            PipelineState::Completed | PipelineState::Failed => None,
        }
    }
}

/// How the orchestrator treats individual scene failures.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScenePolicy {
    /// Any scene failure fails the story
    #[default]
    Strict,
    /// Failed scenes are dropped and the rest renumbered
    BestEffort,
}
