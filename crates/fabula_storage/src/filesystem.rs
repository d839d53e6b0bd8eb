//! Filesystem artifact store.
//!
//! Artifacts are written to `{root}/{path}` through a temp file and rename,
//! so a reader never observes a partially written artifact.

use async_trait::async_trait;
use fabula_error::{FabulaResult, StoreError, StoreErrorKind};
use fabula_interface::ArtifactStore;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

const READY_MARKER: &str = ".fabula-ready";

/// Filesystem storage backend.
///
/// Locators are `{public_base_url}/{path}` when a base URL is configured,
/// otherwise `file://` URLs of the written files.
#[derive(Debug, Clone)]
pub struct FileSystemArtifactStore {
    root: PathBuf,
    public_base_url: Option<String>,
}

impl FileSystemArtifactStore {
    /// Create a store rooted at `root`.
    ///
    /// Creates the root directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created or resolved.
    #[tracing::instrument(skip(root, public_base_url))]
    pub fn new(
        root: impl Into<PathBuf>,
        public_base_url: Option<String>,
    ) -> FabulaResult<Self> {
        let root = root.into();

        std::fs::create_dir_all(&root).map_err(|e| {
            StoreError::new(StoreErrorKind::DirectoryCreation(format!(
                "{}: {}",
                root.display(),
                e
            )))
        })?;
        let root = std::fs::canonicalize(&root).map_err(|e| {
            StoreError::new(StoreErrorKind::InvalidPath(format!(
                "{}: {}",
                root.display(),
                e
            )))
        })?;

        tracing::info!(path = %root.display(), "Created filesystem artifact store");
        Ok(Self {
            root,
            public_base_url: public_base_url.map(|u| u.trim_end_matches('/').to_string()),
        })
    }

    /// Root directory artifacts are written under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative store path, rejecting anything that escapes the root.
    fn resolve(&self, path: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(path);
        let is_plain = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(StoreError::new(StoreErrorKind::InvalidPath(path.to_string())));
        }
        Ok(self.root.join(relative))
    }

    fn locator(&self, path: &str, full_path: &Path) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/{}", base, path),
            None => format!("file://{}", full_path.display()),
        }
    }

    async fn write_atomic(full_path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StoreError::new(StoreErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        let temp_path = full_path.with_file_name(format!(
            ".{}.{}.tmp",
            full_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            Uuid::new_v4().simple()
        ));
        tokio::fs::write(&temp_path, bytes).await.map_err(|e| {
            StoreError::new(StoreErrorKind::FileWrite(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;

        if let Err(e) = tokio::fs::rename(&temp_path, full_path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(StoreError::new(StoreErrorKind::FileWrite(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                full_path.display(),
                e
            ))));
        }
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for FileSystemArtifactStore {
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn put(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, StoreError> {
        let full_path = self.resolve(path)?;
        Self::write_atomic(&full_path, bytes).await?;

        let locator = self.locator(path, &full_path);
        tracing::info!(
            path = %full_path.display(),
            size = bytes.len(),
            content_type,
            "Stored artifact"
        );
        Ok(locator)
    }

    #[tracing::instrument(skip(self), fields(root = %self.root.display()))]
    async fn check_ready(&self) -> Result<(), StoreError> {
        let marker = self.root.join(READY_MARKER);
        tokio::fs::write(&marker, b"ok").await.map_err(|e| {
            StoreError::new(StoreErrorKind::Unavailable(format!(
                "{} is not writable: {}",
                self.root.display(),
                e
            )))
        })?;
        let _ = tokio::fs::remove_file(&marker).await;
        tracing::debug!("Artifact store is ready");
        Ok(())
    }
}
