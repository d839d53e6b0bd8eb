//! The playback manifest and its wire format.
//!
//! A manifest is a flat list of image and audio segments, each carrying an
//! absolute start offset. Order is encoded purely by `start`; consumers sort
//! before dispatching.

use fabula_error::{ManifestError, ManifestErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Kind of a playable segment.
///
/// Images order before audio at equal offsets so the illustration is on
/// screen when narration starts.
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
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SegmentKind {
    /// Illustration shown for the scene
    Image,
    /// Narration audio for the scene
    Audio,
}

/// One playable unit with an absolute start offset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManifestSegment {
    /// Image or audio
    #[serde(rename = "type")]
    pub kind: SegmentKind,
    /// Locator the device downloads the asset from
    pub url: String,
    /// Offset from story start in milliseconds
    #[serde(rename = "start")]
    pub start_ms: u64,
    /// Scene the segment belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<usize>,
    /// Expected playback length in milliseconds
    #[serde(default, rename = "duration", skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl ManifestSegment {
    /// Create a segment without the optional scene metadata.
    pub fn new(kind: SegmentKind, url: impl Into<String>, start_ms: u64) -> Self {
        Self {
            kind,
            url: url.into(),
            start_ms,
            scene: None,
            duration_ms: None,
        }
    }

    /// Attach the owning scene index.
    pub fn with_scene(mut self, scene: usize) -> Self {
        self.scene = Some(scene);
        self
    }

    /// Attach the expected playback length.
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

/// Flat, time-ordered description of everything a device replays.
///
/// # Examples
///
/// ```
/// use fabula_core::{Manifest, ManifestSegment, SegmentKind};
///
/// let manifest = Manifest::new(
///     "story_1a2b3c4d",
///     vec![
///         ManifestSegment::new(SegmentKind::Audio, "a0.wav", 0),
///         ManifestSegment::new(SegmentKind::Image, "i0.png", 0),
///     ],
/// );
///
/// let json = manifest.to_json().unwrap();
/// assert!(json.contains(r#""type":"audio""#));
/// assert_eq!(Manifest::from_json(&json).unwrap(), manifest);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Manifest {
    /// Story this timeline belongs to
    pub story_id: String,
    /// Segments, ascending by start when produced by the builder
    pub segments: Vec<ManifestSegment>,
}

impl Manifest {
    /// Create a manifest.
    pub fn new(story_id: impl Into<String>, segments: Vec<ManifestSegment>) -> Self {
        Self {
            story_id: story_id.into(),
            segments,
        }
    }

    /// Segments sorted by start offset, images before audio on ties.
    ///
    /// The sort is stable, so segments that compare equal keep their
    /// original relative order.
    pub fn sorted_segments(&self) -> Vec<ManifestSegment> {
        let mut segments = self.segments.clone();
        segments.sort_by_key(|s| (s.start_ms, s.kind));
        segments
    }

    /// Distinct asset locators in first-appearance order.
    pub fn urls(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.segments
            .iter()
            .filter(|s| seen.insert(s.url.as_str()))
            .map(|s| s.url.as_str())
            .collect()
    }

    /// Number of scenes, counted as distinct start offsets.
    pub fn scene_count(&self) -> usize {
        self.segments
            .iter()
            .map(|s| s.start_ms)
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Offset at which playback is complete.
    ///
    /// Uses the furthest `start + duration` when durations are present,
    /// otherwise the last start offset.
    pub fn end_ms(&self) -> u64 {
        let last_start = self.segments.iter().map(|s| s.start_ms).max().unwrap_or(0);
        self.segments
            .iter()
            .filter_map(|s| s.duration_ms.map(|d| s.start_ms.saturating_add(d)))
            .max()
            .map_or(last_start, |end| end.max(last_start))
    }

    /// Check the synchronization contract.
    ///
    /// Every start offset must carry exactly one image and one audio segment,
    /// the first scene starts at zero, scene indices (when present) are
    /// `0..n` in start order, and when audio durations are present each
    /// scene starts exactly where the previous narration ends.
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.segments.is_empty() {
            return Err(ManifestError::new(ManifestErrorKind::Empty));
        }

        let mut groups: BTreeMap<u64, Vec<&ManifestSegment>> = BTreeMap::new();
        for segment in &self.segments {
            groups.entry(segment.start_ms).or_default().push(segment);
        }

        let contract = |msg: String| ManifestError::new(ManifestErrorKind::Contract(msg));

        if let Some(first) = groups.keys().next()
            && *first != 0
        {
            return Err(contract(format!("first scene starts at {} ms, not 0", first)));
        }

        let mut expected_start: Option<u64> = None;
        for (position, (start, group)) in groups.iter().enumerate() {
            let images = group.iter().filter(|s| s.kind == SegmentKind::Image).count();
            let audios = group.iter().filter(|s| s.kind == SegmentKind::Audio).count();
            if images != 1 || audios != 1 {
                return Err(contract(format!(
                    "offset {} ms has {} image and {} audio segment(s)",
                    start, images, audios
                )));
            }

            for segment in group {
                if let Some(scene) = segment.scene
                    && scene != position
                {
                    return Err(ManifestError::new(ManifestErrorKind::NonContiguousScenes {
                        expected: position,
                        found: scene,
                    }));
                }
            }

            if let Some(expected) = expected_start
                && expected != *start
            {
                return Err(contract(format!(
                    "scene {} starts at {} ms but previous narration ends at {} ms",
                    position, start, expected
                )));
            }

            let audio_duration = group
                .iter()
                .find(|s| s.kind == SegmentKind::Audio)
                .and_then(|s| s.duration_ms);
            expected_start = match audio_duration {
                Some(0) => {
                    return Err(ManifestError::new(ManifestErrorKind::InvalidDuration {
                        scene_index: position,
                    }));
                }
                Some(duration) => Some(start.checked_add(duration).ok_or_else(|| {
                    ManifestError::new(ManifestErrorKind::TimelineOverflow)
                })?),
                None => None,
            };
        }

        Ok(())
    }

    /// Serialize to compact wire JSON.
    pub fn to_json(&self) -> Result<String, ManifestError> {
        serde_json::to_string(self)
            .map_err(|e| ManifestError::new(ManifestErrorKind::Json(e.to_string())))
    }

    /// Parse wire JSON.
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        serde_json::from_str(json)
            .map_err(|e| ManifestError::new(ManifestErrorKind::Json(e.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(index: usize, start: u64, duration: u64) -> Vec<ManifestSegment> {
        vec![
            ManifestSegment::new(SegmentKind::Image, format!("i{index}.png"), start)
                .with_scene(index)
                .with_duration(duration),
            ManifestSegment::new(SegmentKind::Audio, format!("a{index}.wav"), start)
                .with_scene(index)
                .with_duration(duration),
        ]
    }

    #[test]
    fn wire_format_uses_type_and_start_keys() {
        let manifest = Manifest::new(
            "story_x",
            vec![ManifestSegment::new(SegmentKind::Image, "u", 4000)],
        );
        let json = manifest.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"story_id":"story_x","segments":[{"type":"image","url":"u","start":4000}]}"#
        );
    }

    #[test]
    fn parses_minimal_wire_format() {
        let json = r#"{"story_id":"s","segments":[
            {"type":"audio","url":"a","start":0},
            {"type":"image","url":"i","start":0}
        ]}"#;
        let manifest = Manifest::from_json(json).unwrap();
        assert_eq!(manifest.segments.len(), 2);
        assert_eq!(manifest.segments[0].scene, None);
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn sorted_segments_orders_defensively() {
        let mut segments = scene(1, 4000, 6000);
        segments.extend(scene(0, 0, 4000));
        let manifest = Manifest::new("s", segments);
        let starts: Vec<_> = manifest
            .sorted_segments()
            .iter()
            .map(|s| (s.start_ms, s.kind))
            .collect();
        assert_eq!(
            starts,
            vec![
                (0, SegmentKind::Image),
                (0, SegmentKind::Audio),
                (4000, SegmentKind::Image),
                (4000, SegmentKind::Audio),
            ]
        );
        assert_eq!(manifest.end_ms(), 10000);
        assert_eq!(manifest.scene_count(), 2);
    }

    #[test]
    fn validate_rejects_gap_between_scenes() {
        let mut segments = scene(0, 0, 4000);
        segments.extend(scene(1, 4500, 1000));
        let err = Manifest::new("s", segments).validate().unwrap_err();
        assert!(matches!(err.kind, ManifestErrorKind::Contract(_)));
    }

    #[test]
    fn validate_rejects_lonely_image() {
        let mut segments = scene(0, 0, 4000);
        segments.push(ManifestSegment::new(SegmentKind::Image, "x", 4000));
        assert!(Manifest::new("s", segments).validate().is_err());
    }

    #[test]
    fn validate_rejects_empty() {
        let err = Manifest::new("s", vec![]).validate().unwrap_err();
        assert_eq!(err.kind, ManifestErrorKind::Empty);
    }
}
