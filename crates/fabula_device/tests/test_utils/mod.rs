//! Fixtures for device runtime tests.

#![allow(dead_code)]

use fabula_core::{ClientMessage, Manifest, ManifestSegment, PlaybackStatus, SegmentKind};
use fabula_device::{
    AssetCache, DeviceConfig, DevicePlaybackScheduler, DeviceRuntime, ManifestDownloader,
    MemoryFetcher, MonotonicClock, RecordingSink,
};
use fabula_rate_limit::RetryPolicy;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Two scenes at 0 and 8000 ms, 5000 ms of narration in the second.
pub fn two_scene_manifest(story_id: &str) -> Manifest {
    let url = |name: &str| format!("memory://{story_id}/{name}");
    Manifest::new(
        story_id,
        vec![
            ManifestSegment::new(SegmentKind::Image, url("i0"), 0)
                .with_scene(0)
                .with_duration(8000),
            ManifestSegment::new(SegmentKind::Audio, url("a0"), 0)
                .with_scene(0)
                .with_duration(8000),
            ManifestSegment::new(SegmentKind::Image, url("i1"), 8000)
                .with_scene(1)
                .with_duration(5000),
            ManifestSegment::new(SegmentKind::Audio, url("a1"), 8000)
                .with_scene(1)
                .with_duration(5000),
        ],
    )
}

pub fn serve(fetcher: &MemoryFetcher, manifest: &Manifest) {
    for url in manifest.urls() {
        fetcher.insert(url, url.as_bytes().to_vec());
    }
}

pub fn fast_config() -> DeviceConfig {
    DeviceConfig::builder()
        .tick(Duration::from_millis(50))
        .download_retry(
            RetryPolicy::builder()
                .max_retries(3usize)
                .initial_backoff_ms(1u64)
                .max_delay_ms(2u64)
                .jitter(false)
                .build()
                .expect("valid retry policy"),
        )
        .download_concurrency(2usize)
        .build()
        .expect("valid device config")
}

pub struct Device {
    pub manifests: mpsc::Sender<Manifest>,
    pub status: mpsc::Receiver<ClientMessage>,
    pub cancel: CancellationToken,
    pub cache: AssetCache,
    pub handle: JoinHandle<DevicePlaybackScheduler>,
}

/// Spawn a runtime fed by `fetcher`, dispatching into `sink`.
pub fn spawn_device(fetcher: Arc<MemoryFetcher>, sink: Arc<RecordingSink>) -> Device {
    let config = fast_config();
    let cache = AssetCache::new();
    let downloader = ManifestDownloader::new(
        fetcher,
        cache.clone(),
        config.download_retry().clone(),
        *config.download_concurrency(),
    );
    let (status_tx, status_rx) = mpsc::channel(32);
    let (manifest_tx, manifest_rx) = mpsc::channel(4);
    let cancel = CancellationToken::new();

    let runtime = DeviceRuntime::new(
        downloader,
        sink,
        Arc::new(MonotonicClock::new()),
        config,
        status_tx,
    );
    let handle = tokio::spawn(runtime.run(manifest_rx, cancel.clone()));

    Device {
        manifests: manifest_tx,
        status: status_rx,
        cancel,
        cache,
        handle,
    }
}

/// Next status report as `(story_id, status)`.
pub async fn next_status(status: &mut mpsc::Receiver<ClientMessage>) -> (String, PlaybackStatus) {
    match status.recv().await.expect("status report") {
        ClientMessage::StoryStatus {
            story_id, status, ..
        } => (story_id, status),
    }
}
