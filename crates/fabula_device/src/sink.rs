//! Output devices that receive dispatched segments.

use fabula_core::{ManifestSegment, SegmentKind};
use fabula_error::PlaybackError;
use std::sync::{Mutex, PoisonError};

/// Presents a segment: shows an image or starts an audio clip.
///
/// Dispatch must return immediately; the dispatch loop never waits for a
/// segment to finish.
pub trait SegmentSink: Send + Sync {
    /// Present `segment` using its cached bytes.
    fn dispatch(&self, segment: &ManifestSegment, asset: &[u8]) -> Result<(), PlaybackError>;
}

/// Logs each dispatch.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSink;

impl SegmentSink for LoggingSink {
    fn dispatch(&self, segment: &ManifestSegment, asset: &[u8]) -> Result<(), PlaybackError> {
        let action = match segment.kind {
            SegmentKind::Image => "Showing image",
            SegmentKind::Audio => "Starting audio",
        };
        tracing::info!(
            start_ms = segment.start_ms,
            scene = segment.scene,
            url = %segment.url,
            size = asset.len(),
            "{}",
            action
        );
        Ok(())
    }
}

/// Remembers every dispatched segment in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    dispatched: Mutex<Vec<ManifestSegment>>,
}

impl RecordingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Segments dispatched so far.
    pub fn dispatched(&self) -> Vec<ManifestSegment> {
        self.dispatched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SegmentSink for RecordingSink {
    fn dispatch(&self, segment: &ManifestSegment, _asset: &[u8]) -> Result<(), PlaybackError> {
        self.dispatched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(segment.clone());
        Ok(())
    }
}
