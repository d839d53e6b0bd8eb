//! Local manifest replay.

use super::inspect::read_text;
use super::load_config;
use fabula_core::{ClientMessage, Manifest};
use fabula_device::{
    AssetCache, DeviceConfig, DeviceRuntime, LocatorFetcher, LoggingSink, ManifestDownloader,
    MonotonicClock,
};
use fabula_error::FabulaResult;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Replay a manifest through the device runtime, logging every dispatch.
pub async fn play_manifest(path: &Path, config_path: Option<&Path>) -> FabulaResult<()> {
    let config = load_config(config_path)?;
    let manifest = Manifest::from_json(&read_text(path)?)?;
    manifest.validate()?;

    let device = DeviceConfig::from_settings(&config.device);
    let fetcher = LocatorFetcher::new(Duration::from_secs(config.models.timeout_secs))?;
    let downloader = ManifestDownloader::new(
        Arc::new(fetcher),
        AssetCache::new(),
        device.download_retry().clone(),
        *device.download_concurrency(),
    );

    let (status_tx, mut status_rx) = mpsc::channel::<ClientMessage>(16);
    let (manifest_tx, manifest_rx) = mpsc::channel(1);
    let cancel = CancellationToken::new();

    let runtime = DeviceRuntime::new(
        downloader,
        Arc::new(LoggingSink),
        Arc::new(MonotonicClock::new()),
        device,
        status_tx,
    );
    let handle = tokio::spawn(runtime.run(manifest_rx, cancel.clone()));

    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    if manifest_tx.send(manifest).await.is_err() {
        tracing::error!("Device runtime stopped before receiving the manifest");
    }
    drop(manifest_tx);

    while let Some(message) = status_rx.recv().await {
        if let Ok(json) = serde_json::to_string(&message) {
            println!("{}", json);
        }
    }

    match handle.await {
        Ok(scheduler) => tracing::info!(state = %scheduler.state(), "Playback finished"),
        Err(e) => tracing::error!(error = %e, "Device runtime task failed"),
    }
    Ok(())
}
