//! Client-side playback for story manifests.
//!
//! A device receives a [`Manifest`](fabula_core::Manifest), downloads every
//! asset it references, and replays the segments against its own monotonic
//! clock. All timing is precomputed server-side; the device only compares
//! elapsed time with each segment's start offset.
//!
//! - [`DevicePlaybackScheduler`] is the pure finite-state machine.
//! - [`ManifestDownloader`] fills the [`AssetCache`] through an [`AssetFetcher`].
//! - [`DeviceRuntime`] ties them to a tick loop, a manifest channel, and a
//!   status channel.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod clock;
mod config;
mod downloader;
mod fetcher;
mod runtime;
mod scheduler;
mod sink;

pub use cache::AssetCache;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{DeviceConfig, DeviceConfigBuilder};
pub use downloader::ManifestDownloader;
pub use fetcher::{AssetFetcher, FileFetcher, HttpFetcher, LocatorFetcher, MemoryFetcher};
pub use runtime::DeviceRuntime;
pub use scheduler::{DevicePlaybackScheduler, DeviceState, PlaybackEvent};
pub use sink::{LoggingSink, RecordingSink, SegmentSink};
