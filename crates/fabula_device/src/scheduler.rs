//! Device playback finite-state machine.

use crate::AssetCache;
use fabula_core::{ClientMessage, Manifest, ManifestSegment, PlaybackStatus};
use fabula_error::{PlaybackError, PlaybackErrorKind};
use tracing::{debug, error, info, warn};

/// Playback lifecycle of a device.
///
/// `Init → Downloading → Ready → Playing → Done → Init`, with `Error`
/// reachable from `Downloading` and `Playing`. `Error` recovers either by
/// downloading a fresh manifest or by falling back to the last manifest
/// that downloaded completely.
///
/// # Examples
///
/// ```
/// use fabula_device::DeviceState;
///
/// assert!(DeviceState::Init.can_transition_to(DeviceState::Downloading));
/// assert!(DeviceState::Error.can_transition_to(DeviceState::Ready));
/// assert!(!DeviceState::Ready.can_transition_to(DeviceState::Error));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceState {
    /// Waiting for a manifest
    Init,
    /// Fetching the manifest's assets
    Downloading,
    /// Every asset is cached; playback may start
    Ready,
    /// Dispatching segments against the clock
    Playing,
    /// Last segment finished
    Done,
    /// Download or playback failed
    Error,
}

impl DeviceState {
    /// Whether `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: DeviceState) -> bool {
        use DeviceState::*;
        matches!(
            (self, next),
            (Init, Downloading)
                | (Downloading, Ready)
                | (Downloading, Error)
                | (Ready, Playing)
                | (Playing, Done)
                | (Playing, Error)
                | (Done, Init)
                | (Error, Downloading)
                | (Error, Ready)
        )
    }
}

/// Side effect requested by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// Present this segment now
    Dispatch(ManifestSegment),
    /// Send this status upstream
    Report(ClientMessage),
}

#[derive(Debug, Clone)]
struct LoadedManifest {
    manifest: Manifest,
    segments: Vec<ManifestSegment>,
    next: usize,
    started_at_ms: Option<u64>,
    end_ms: u64,
}

impl LoadedManifest {
    fn new(manifest: Manifest) -> Self {
        Self {
            segments: manifest.sorted_segments(),
            end_ms: manifest.end_ms(),
            manifest,
            next: 0,
            started_at_ms: None,
        }
    }
}

/// Time-driven replay of one manifest at a time.
///
/// The scheduler performs no I/O. Callers feed it manifests, download
/// outcomes, and clock readings; it answers with [`PlaybackEvent`]s to
/// execute. Each segment is dispatched exactly once, in ascending start
/// order, as soon as elapsed playback time reaches its start.
///
/// # Examples
///
/// ```
/// use fabula_core::{Manifest, ManifestSegment, SegmentKind};
/// use fabula_device::{AssetCache, DevicePlaybackScheduler, DeviceState, PlaybackEvent};
/// use std::sync::Arc;
///
/// let manifest = Manifest::new("story_1a2b3c4d", vec![
///     ManifestSegment::new(SegmentKind::Image, "i0.png", 0),
///     ManifestSegment::new(SegmentKind::Audio, "a0.wav", 0),
/// ]);
/// let cache = AssetCache::new();
/// cache.insert_all(manifest.urls().into_iter().map(|u| (u.to_string(), Arc::from(&b"x"[..]))));
///
/// let mut scheduler = DevicePlaybackScheduler::new();
/// scheduler.begin_download(manifest).unwrap();
/// scheduler.download_succeeded(&cache).unwrap();
/// let events = scheduler.start(0);
///
/// let dispatched = events.iter().filter(|e| matches!(e, PlaybackEvent::Dispatch(_))).count();
/// assert_eq!(dispatched, 2);
/// ```
#[derive(Debug, Clone)]
pub struct DevicePlaybackScheduler {
    state: DeviceState,
    loaded: Option<LoadedManifest>,
    last_good: Option<Manifest>,
}

impl Default for DevicePlaybackScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl DevicePlaybackScheduler {
    /// Scheduler waiting for its first manifest.
    pub fn new() -> Self {
        Self {
            state: DeviceState::Init,
            loaded: None,
            last_good: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> DeviceState {
        self.state
    }

    /// Story of the manifest being downloaded or played.
    pub fn story_id(&self) -> Option<&str> {
        self.loaded.as_ref().map(|l| l.manifest.story_id.as_str())
    }

    /// Manifest being downloaded or played.
    pub fn manifest(&self) -> Option<&Manifest> {
        self.loaded.as_ref().map(|l| &l.manifest)
    }

    /// Most recent manifest whose assets were fully downloaded.
    pub fn last_good(&self) -> Option<&Manifest> {
        self.last_good.as_ref()
    }

    /// Whether a new manifest can be accepted right now.
    pub fn is_idle(&self) -> bool {
        matches!(self.state, DeviceState::Init | DeviceState::Error)
    }

    /// Accept a manifest and start downloading it.
    ///
    /// # Errors
    ///
    /// Rejects manifests that break the synchronization contract and calls
    /// made outside `Init` or `Error`.
    pub fn begin_download(&mut self, manifest: Manifest) -> Result<(), PlaybackError> {
        self.check(DeviceState::Downloading)?;
        manifest
            .validate()
            .map_err(|e| PlaybackError::new(PlaybackErrorKind::InvalidManifest(e.kind.to_string())))?;
        self.loaded = Some(LoadedManifest::new(manifest));
        self.enter(DeviceState::Downloading);
        Ok(())
    }

    /// Mark the download complete once every asset is cached.
    ///
    /// # Errors
    ///
    /// Fails with `MissingAsset` if any locator is absent from `cache`; the
    /// state stays `Downloading`.
    pub fn download_succeeded(&mut self, cache: &AssetCache) -> Result<(), PlaybackError> {
        self.check(DeviceState::Ready)?;
        let Some(loaded) = &self.loaded else {
            return Err(self.invalid(DeviceState::Ready));
        };
        if let Some(missing) = loaded
            .manifest
            .urls()
            .into_iter()
            .find(|url| !cache.contains(url))
        {
            return Err(PlaybackError::new(PlaybackErrorKind::MissingAsset(
                missing.to_string(),
            )));
        }
        self.last_good = Some(loaded.manifest.clone());
        self.enter(DeviceState::Ready);
        Ok(())
    }

    /// Record a failed download.
    ///
    /// Reports the failure upstream, then falls back to the last good
    /// manifest when there is one; otherwise the device halts in `Error`.
    pub fn download_failed(&mut self, failure: &PlaybackError) -> Vec<PlaybackEvent> {
        if self.state != DeviceState::Downloading {
            warn!(state = %self.state, "Ignoring download failure outside Downloading");
            return Vec::new();
        }
        let story_id = self.story_id().unwrap_or_default().to_string();
        error!(story_id = %story_id, error = %failure.kind, "Manifest download failed");
        self.enter(DeviceState::Error);
        let events = vec![PlaybackEvent::Report(ClientMessage::error(
            story_id,
            failure.kind.to_string(),
        ))];

        match self.last_good.clone() {
            Some(previous) => {
                info!(story_id = %previous.story_id, "Replaying last good manifest");
                self.loaded = Some(LoadedManifest::new(previous));
                self.enter(DeviceState::Ready);
            }
            None => self.loaded = None,
        }
        events
    }

    /// Start playback at `now_ms` and dispatch everything due at t=0.
    pub fn start(&mut self, now_ms: u64) -> Vec<PlaybackEvent> {
        if self.state != DeviceState::Ready {
            return Vec::new();
        }
        let Some(loaded) = self.loaded.as_mut() else {
            return Vec::new();
        };
        loaded.started_at_ms = Some(now_ms);
        let story_id = loaded.manifest.story_id.clone();
        self.enter(DeviceState::Playing);

        let mut events = vec![PlaybackEvent::Report(ClientMessage::status(
            story_id,
            PlaybackStatus::Playing,
        ))];
        events.extend(self.tick(now_ms));
        events
    }

    /// Advance playback to `now_ms`.
    ///
    /// Dispatches every segment whose start has been reached and not yet
    /// dispatched. Once all segments are out and the last one's duration
    /// has elapsed, reports `done` and returns to `Init`.
    pub fn tick(&mut self, now_ms: u64) -> Vec<PlaybackEvent> {
        if self.state != DeviceState::Playing {
            return Vec::new();
        }
        let Some(loaded) = self.loaded.as_mut() else {
            return Vec::new();
        };
        let elapsed = now_ms.saturating_sub(loaded.started_at_ms.unwrap_or(now_ms));

        let mut events = Vec::new();
        while let Some(segment) = loaded.segments.get(loaded.next)
            && segment.start_ms <= elapsed
        {
            debug!(kind = %segment.kind, start_ms = segment.start_ms, elapsed, "Dispatching segment");
            events.push(PlaybackEvent::Dispatch(segment.clone()));
            loaded.next += 1;
        }

        if loaded.next == loaded.segments.len() && elapsed >= loaded.end_ms {
            let story_id = loaded.manifest.story_id.clone();
            self.enter(DeviceState::Done);
            events.push(PlaybackEvent::Report(ClientMessage::status(
                story_id,
                PlaybackStatus::Done,
            )));
            self.loaded = None;
            self.enter(DeviceState::Init);
        }
        events
    }

    /// Record a failure while presenting a segment.
    ///
    /// Playback halts in `Error` until a fresh manifest arrives.
    pub fn playback_failed(&mut self, failure: &PlaybackError) -> Vec<PlaybackEvent> {
        if self.state != DeviceState::Playing {
            return Vec::new();
        }
        let story_id = self.story_id().unwrap_or_default().to_string();
        error!(story_id = %story_id, error = %failure.kind, "Playback failed");
        self.loaded = None;
        self.enter(DeviceState::Error);
        vec![PlaybackEvent::Report(ClientMessage::error(
            story_id,
            failure.kind.to_string(),
        ))]
    }

    fn check(&self, next: DeviceState) -> Result<(), PlaybackError> {
        if self.state.can_transition_to(next) {
            Ok(())
        } else {
            Err(self.invalid(next))
        }
    }

    fn invalid(&self, next: DeviceState) -> PlaybackError {
        PlaybackError::new(PlaybackErrorKind::InvalidTransition {
            from: self.state.to_string(),
            to: next.to_string(),
        })
    }

    fn enter(&mut self, next: DeviceState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal device transition {} -> {}",
            self.state,
            next
        );
        info!(from = %self.state, to = %next, "Device state transition");
        self.state = next;
    }
}
