//! Local asset cache keyed by locator.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

/// Downloaded asset bytes, shared between the downloader and the runtime.
///
/// Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct AssetCache {
    assets: Arc<RwLock<HashMap<String, Arc<[u8]>>>>,
}

impl AssetCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached bytes for `url`.
    pub fn get(&self, url: &str) -> Option<Arc<[u8]>> {
        self.assets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
    }

    /// Whether `url` is cached.
    pub fn contains(&self, url: &str) -> bool {
        self.assets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(url)
    }

    /// Insert a batch of assets at once.
    pub fn insert_all(&self, batch: impl IntoIterator<Item = (String, Arc<[u8]>)>) {
        let mut assets = self.assets.write().unwrap_or_else(PoisonError::into_inner);
        assets.extend(batch);
    }

    /// Drop every asset whose locator is not in `keep`.
    ///
    /// Returns the number of evicted assets.
    pub fn retain(&self, keep: &HashSet<&str>) -> usize {
        let mut assets = self.assets.write().unwrap_or_else(PoisonError::into_inner);
        let before = assets.len();
        assets.retain(|url, _| keep.contains(url.as_str()));
        before - assets.len()
    }

    /// Number of cached assets.
    pub fn len(&self) -> usize {
        self.assets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
