//! Whole-manifest asset download.

use crate::{AssetCache, AssetFetcher};
use fabula_core::Manifest;
use fabula_error::PlaybackError;
use fabula_rate_limit::RetryPolicy;
use futures::{StreamExt, TryStreamExt, stream};
use std::sync::Arc;
use tracing::instrument;

/// Downloads every asset of a manifest into the cache.
///
/// Assets are committed to the cache only once all of them arrived, so a
/// failed download never leaves a partially playable manifest behind.
#[derive(Clone)]
pub struct ManifestDownloader {
    fetcher: Arc<dyn AssetFetcher>,
    cache: AssetCache,
    retry: RetryPolicy,
    concurrency: usize,
}

impl std::fmt::Debug for ManifestDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManifestDownloader")
            .field("cached", &self.cache.len())
            .field("retry", &self.retry)
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}

impl ManifestDownloader {
    /// Create a downloader filling `cache`.
    pub fn new(
        fetcher: Arc<dyn AssetFetcher>,
        cache: AssetCache,
        retry: RetryPolicy,
        concurrency: usize,
    ) -> Self {
        Self {
            fetcher,
            cache,
            retry,
            concurrency: concurrency.max(1),
        }
    }

    /// Cache the downloader writes into.
    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }

    /// Fetch every asset of `manifest` not already cached.
    ///
    /// Each asset gets its own retry budget.
    ///
    /// # Errors
    ///
    /// Returns the first asset failure that exhausted its retries.
    #[instrument(skip(self, manifest), fields(story_id = %manifest.story_id))]
    pub async fn download(&self, manifest: &Manifest) -> Result<(), PlaybackError> {
        let missing: Vec<&str> = manifest
            .urls()
            .into_iter()
            .filter(|url| !self.cache.contains(url))
            .collect();
        tracing::debug!(assets = missing.len(), "Downloading manifest assets");

        let fetched: Vec<(String, Arc<[u8]>)> = stream::iter(missing.into_iter().map(str::to_owned))
            .map(|url: String| async move {
                let bytes = self
                    .retry
                    .run("download_asset", || self.fetcher.fetch(&url))
                    .await?;
                Ok::<_, PlaybackError>((url, Arc::from(bytes)))
            })
            .buffer_unordered(self.concurrency)
            .try_collect()
            .await?;

        let count = fetched.len();
        self.cache.insert_all(fetched);
        tracing::info!(assets = count, "Manifest assets cached");
        Ok(())
    }
}
