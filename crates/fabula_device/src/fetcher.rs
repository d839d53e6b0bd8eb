//! Asset fetchers by locator scheme.

use async_trait::async_trait;
use fabula_error::{PlaybackError, PlaybackErrorKind};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::instrument;

fn download_error(url: &str, message: impl Into<String>) -> PlaybackError {
    PlaybackError::new(PlaybackErrorKind::Download {
        url: url.to_string(),
        message: message.into(),
    })
}

/// Retrieves the bytes behind an asset locator.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Fetch the asset at `url`.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, PlaybackError>;
}

/// Reads `file://` locators from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

#[async_trait]
impl AssetFetcher for FileFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, PlaybackError> {
        let path = url
            .strip_prefix("file://")
            .ok_or_else(|| download_error(url, "not a file:// locator"))?;
        tokio::fs::read(path)
            .await
            .map_err(|e| download_error(url, e.to_string()))
    }
}

/// Downloads `http://` and `https://` locators.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with a per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self, PlaybackError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| download_error("", format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, PlaybackError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| download_error(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(download_error(url, format!("HTTP {}", status.as_u16())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| download_error(url, e.to_string()))?;
        tracing::debug!(size = bytes.len(), "Downloaded asset");
        Ok(bytes.to_vec())
    }
}

/// Dispatches to the file or HTTP fetcher by locator scheme.
#[derive(Debug, Clone)]
pub struct LocatorFetcher {
    file: FileFetcher,
    http: HttpFetcher,
}

impl LocatorFetcher {
    /// Create a fetcher for `file://` and HTTP(S) locators.
    pub fn new(http_timeout: Duration) -> Result<Self, PlaybackError> {
        Ok(Self {
            file: FileFetcher,
            http: HttpFetcher::new(http_timeout)?,
        })
    }
}

#[async_trait]
impl AssetFetcher for LocatorFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, PlaybackError> {
        if url.starts_with("file://") {
            self.file.fetch(url).await
        } else if url.starts_with("http://") || url.starts_with("https://") {
            self.http.fetch(url).await
        } else {
            Err(download_error(url, "unsupported locator scheme"))
        }
    }
}

/// Serves assets from memory, optionally failing some locators first.
///
/// # Examples
///
/// ```
/// use fabula_device::{AssetFetcher, MemoryFetcher};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let fetcher = MemoryFetcher::new();
/// fetcher.insert("memory://a.wav", b"RIFF".to_vec());
/// fetcher.fail_times("memory://a.wav", 1);
///
/// assert!(fetcher.fetch("memory://a.wav").await.is_err());
/// assert_eq!(fetcher.fetch("memory://a.wav").await.unwrap(), b"RIFF");
/// assert_eq!(fetcher.calls(), 2);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    assets: Mutex<HashMap<String, Vec<u8>>>,
    failures: Mutex<HashMap<String, usize>>,
    calls: AtomicUsize,
}

impl MemoryFetcher {
    /// Create a fetcher with no assets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `bytes` for `url`.
    pub fn insert(&self, url: impl Into<String>, bytes: Vec<u8>) {
        self.assets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.into(), bytes);
    }

    /// Fail the next `times` fetches of `url`.
    pub fn fail_times(&self, url: impl Into<String>, times: usize) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.into(), times);
    }

    /// Total fetches attempted.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetFetcher for MemoryFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, PlaybackError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        {
            let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(remaining) = failures.get_mut(url)
                && *remaining > 0
            {
                *remaining -= 1;
                return Err(download_error(url, "injected failure"));
            }
        }
        self.assets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
            .ok_or_else(|| download_error(url, "not found"))
    }
}
