//! In-memory artifact store.

use async_trait::async_trait;
use fabula_error::{StoreError, StoreErrorKind};
use fabula_interface::ArtifactStore;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// A stored artifact and its declared content type.
type Object = (Vec<u8>, String);

/// Artifact store backed by a map, returning `memory://` locators.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    objects: RwLock<BTreeMap<String, Object>>,
}

impl MemoryArtifactStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes and content type stored under `path`.
    pub fn get(&self, path: &str) -> Option<(Vec<u8>, String)> {
        self.objects.read().ok()?.get(path).cloned()
    }

    /// Stored paths in lexical order.
    pub fn paths(&self) -> Vec<String> {
        self.objects
            .read()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of stored artifacts.
    pub fn len(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or(0)
    }

    /// Whether nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Locator returned for `path`.
    pub fn locator(path: &str) -> String {
        format!("memory://{}", path)
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn put(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, StoreError> {
        if path.is_empty() || path.starts_with('/') || path.split('/').any(|p| p == "..") {
            return Err(StoreError::new(StoreErrorKind::InvalidPath(path.to_string())));
        }
        let mut objects = self
            .objects
            .write()
            .map_err(|e| StoreError::new(StoreErrorKind::Unavailable(e.to_string())))?;
        objects.insert(path.to_string(), (bytes.to_vec(), content_type.to_string()));
        tracing::debug!(path, size = bytes.len(), "Stored artifact in memory");
        Ok(Self::locator(path))
    }

    async fn check_ready(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
