//! Tick-driven device loop.

use crate::{
    AssetCache, Clock, DeviceConfig, DevicePlaybackScheduler, DeviceState, ManifestDownloader,
    PlaybackEvent, SegmentSink,
};
use fabula_core::{ClientMessage, Manifest};
use fabula_error::{PlaybackError, PlaybackErrorKind};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

type DownloadOutcome = (Manifest, Result<(), PlaybackError>);

/// Runs a [`DevicePlaybackScheduler`] against real channels and a clock.
///
/// - Manifests arrive on an mpsc receiver.
/// - At most one manifest downloads at a time; the newest manifest received
///   meanwhile waits as pending, replacing any older pending one.
/// - A manifest that finishes downloading during playback is staged and
///   starts when the current story is done.
/// - Status reports leave on an mpsc sender.
///
/// The loop ends on cancellation, or once the manifest channel is closed
/// and nothing is left to download or play.
pub struct DeviceRuntime {
    scheduler: DevicePlaybackScheduler,
    downloader: ManifestDownloader,
    sink: Arc<dyn SegmentSink>,
    clock: Arc<dyn Clock>,
    config: DeviceConfig,
    status: mpsc::Sender<ClientMessage>,
    downloads: JoinSet<DownloadOutcome>,
    pending: Option<Manifest>,
    staged: Option<Manifest>,
}

impl std::fmt::Debug for DeviceRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceRuntime")
            .field("state", &self.scheduler.state())
            .field("downloader", &self.downloader)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DeviceRuntime {
    /// Create a runtime reporting status on `status`.
    pub fn new(
        downloader: ManifestDownloader,
        sink: Arc<dyn SegmentSink>,
        clock: Arc<dyn Clock>,
        config: DeviceConfig,
        status: mpsc::Sender<ClientMessage>,
    ) -> Self {
        Self {
            scheduler: DevicePlaybackScheduler::new(),
            downloader,
            sink,
            clock,
            config,
            status,
            downloads: JoinSet::new(),
            pending: None,
            staged: None,
        }
    }

    /// Current scheduler state.
    pub fn state(&self) -> DeviceState {
        self.scheduler.state()
    }

    /// Cache assets are played from.
    pub fn cache(&self) -> &AssetCache {
        self.downloader.cache()
    }

    /// Run until cancelled or until the manifest channel drains.
    ///
    /// Returns the scheduler so callers can inspect the final state.
    pub async fn run(
        mut self,
        mut manifests: mpsc::Receiver<Manifest>,
        cancel: CancellationToken,
    ) -> DevicePlaybackScheduler {
        let mut ticker = tokio::time::interval(*self.config.tick());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut inbox_open = true;

        info!(tick_ms = self.config.tick().as_millis() as u64, "Device runtime started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Device runtime shutting down");
                    break;
                }
                received = manifests.recv(), if inbox_open => match received {
                    Some(manifest) => self.receive(manifest).await,
                    None => {
                        debug!("Manifest channel closed");
                        inbox_open = false;
                    }
                },
                Some(joined) = self.downloads.join_next(), if !self.downloads.is_empty() => {
                    match joined {
                        Ok((manifest, outcome)) => self.finish_download(manifest, outcome).await,
                        Err(e) => error!(error = %e, "Download task panicked"),
                    }
                    self.start_pending().await;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                    if !inbox_open && self.is_drained() {
                        info!("No more manifests, device runtime stopping");
                        break;
                    }
                }
            }
        }

        self.downloads.abort_all();
        self.scheduler
    }

    fn is_drained(&self) -> bool {
        self.scheduler.is_idle()
            && self.downloads.is_empty()
            && self.pending.is_none()
            && self.staged.is_none()
    }

    async fn receive(&mut self, manifest: Manifest) {
        if let Err(e) = manifest.validate() {
            warn!(story_id = %manifest.story_id, error = %e.kind, "Rejecting invalid manifest");
            let message = ClientMessage::error(manifest.story_id, e.kind.to_string());
            report(&self.status, message).await;
            return;
        }

        if !self.downloads.is_empty() {
            if let Some(replaced) = self.pending.replace(manifest) {
                debug!(story_id = %replaced.story_id, "Pending manifest superseded");
            }
            return;
        }
        self.start_download(manifest).await;
    }

    async fn start_download(&mut self, manifest: Manifest) {
        if self.scheduler.is_idle()
            && let Err(e) = self.scheduler.begin_download(manifest.clone())
        {
            warn!(story_id = %manifest.story_id, error = %e.kind, "Manifest refused");
            let message = ClientMessage::error(manifest.story_id, e.kind.to_string());
            report(&self.status, message).await;
            return;
        }

        info!(
            story_id = %manifest.story_id,
            assets = manifest.urls().len(),
            "Downloading manifest"
        );
        let downloader = self.downloader.clone();
        self.downloads.spawn(async move {
            let outcome = downloader.download(&manifest).await;
            (manifest, outcome)
        });
    }

    async fn start_pending(&mut self) {
        if self.downloads.is_empty()
            && let Some(next) = self.pending.take()
        {
            self.start_download(next).await;
        }
    }

    async fn finish_download(&mut self, manifest: Manifest, outcome: Result<(), PlaybackError>) {
        let owns_scheduler = self.scheduler.state() == DeviceState::Downloading
            && self.scheduler.story_id() == Some(manifest.story_id.as_str());

        if owns_scheduler {
            let outcome =
                outcome.and_then(|()| self.scheduler.download_succeeded(self.downloader.cache()));
            if let Err(e) = outcome {
                let events = self.scheduler.download_failed(&e);
                self.execute(events).await;
            }
            return;
        }

        // Downloaded while another story was playing.
        match outcome {
            Ok(()) => {
                debug!(story_id = %manifest.story_id, "Manifest staged behind current playback");
                self.staged = Some(manifest);
            }
            Err(e) => {
                error!(story_id = %manifest.story_id, error = %e.kind, "Background download failed");
                let message = ClientMessage::error(manifest.story_id, e.kind.to_string());
                report(&self.status, message).await;
            }
        }
    }

    async fn tick(&mut self) {
        let now = self.clock.now_ms();
        let events = match self.scheduler.state() {
            DeviceState::Ready => self.scheduler.start(now),
            DeviceState::Playing => self.scheduler.tick(now),
            _ => Vec::new(),
        };
        self.execute(events).await;

        if self.scheduler.is_idle()
            && let Some(staged) = self.staged.take()
        {
            self.load_staged(staged).await;
        }
        if self.scheduler.state() == DeviceState::Init && self.downloads.is_empty() {
            self.evict();
        }
    }

    async fn load_staged(&mut self, manifest: Manifest) {
        let story_id = manifest.story_id.clone();
        let loaded = self
            .scheduler
            .begin_download(manifest)
            .and_then(|()| self.scheduler.download_succeeded(self.downloader.cache()));
        if let Err(e) = loaded {
            let events = self.scheduler.download_failed(&e);
            warn!(story_id = %story_id, error = %e.kind, "Staged manifest could not be loaded");
            self.execute(events).await;
        }
    }

    /// Keep only assets still reachable from a manifest the device may play.
    fn evict(&self) {
        let keep: HashSet<&str> = [
            self.scheduler.last_good(),
            self.pending.as_ref(),
            self.staged.as_ref(),
        ]
        .into_iter()
        .flatten()
        .flat_map(|m| m.urls())
        .collect();
        let evicted = self.downloader.cache().retain(&keep);
        if evicted > 0 {
            debug!(evicted, "Evicted unreferenced assets");
        }
    }

    async fn execute(&mut self, events: Vec<PlaybackEvent>) {
        let mut queue = VecDeque::from(events);
        while let Some(event) = queue.pop_front() {
            match event {
                PlaybackEvent::Report(message) => report(&self.status, message).await,
                PlaybackEvent::Dispatch(segment) => {
                    let dispatched = match self.downloader.cache().get(&segment.url) {
                        Some(asset) => self.sink.dispatch(&segment, &asset),
                        None => Err(PlaybackError::new(PlaybackErrorKind::MissingAsset(
                            segment.url.clone(),
                        ))),
                    };
                    if let Err(e) = dispatched {
                        // Remaining dispatches of the failed story are dropped.
                        queue.retain(|queued| matches!(queued, PlaybackEvent::Report(_)));
                        queue.extend(self.scheduler.playback_failed(&e));
                    }
                }
            }
        }
    }
}

async fn report(status: &mpsc::Sender<ClientMessage>, message: ClientMessage) {
    if status.send(message).await.is_err() {
        warn!("Status channel closed, dropping report");
    }
}
