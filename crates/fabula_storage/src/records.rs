//! Story record sinks.

use async_trait::async_trait;
use fabula_core::StoryRecord;
use fabula_error::{FabulaResult, JsonError, StoreError, StoreErrorKind};
use fabula_interface::StoryRecordStore;
use std::path::PathBuf;
use std::sync::Mutex;

/// Writes each story's latest record to `{dir}/{story_id}.json`.
#[derive(Debug, Clone)]
pub struct JsonRecordStore {
    dir: PathBuf,
}

impl JsonRecordStore {
    /// Create a record store writing into `dir`.
    ///
    /// The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn record_path(&self, story_id: &str) -> Result<PathBuf, StoreError> {
        let valid = !story_id.is_empty()
            && story_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::new(StoreErrorKind::InvalidPath(
                story_id.to_string(),
            )));
        }
        Ok(self.dir.join(format!("{}.json", story_id)))
    }

    /// Read back the stored record of a story.
    #[tracing::instrument(skip(self))]
    pub async fn load(&self, story_id: &str) -> FabulaResult<Option<StoryRecord>> {
        let path = self.record_path(story_id)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::new(StoreErrorKind::Unavailable(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
                .into());
            }
        };
        let record = serde_json::from_slice(&bytes).map_err(JsonError::from)?;
        Ok(Some(record))
    }
}

#[async_trait]
impl StoryRecordStore for JsonRecordStore {
    #[tracing::instrument(skip(self, record), fields(story_id = %record.story_id(), status = %record.status()))]
    async fn record_story(&self, record: &StoryRecord) -> FabulaResult<()> {
        let path = self.record_path(record.story_id())?;
        let json = serde_json::to_vec_pretty(record).map_err(JsonError::from)?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            StoreError::new(StoreErrorKind::DirectoryCreation(format!(
                "{}: {}",
                self.dir.display(),
                e
            )))
        })?;

        let temp_path = path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, &json).await.map_err(|e| {
            StoreError::new(StoreErrorKind::FileWrite(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;
        tokio::fs::rename(&temp_path, &path).await.map_err(|e| {
            StoreError::new(StoreErrorKind::FileWrite(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            )))
        })?;

        tracing::debug!(path = %path.display(), "Wrote story record");
        Ok(())
    }
}

/// Keeps every written record snapshot in memory.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<Vec<StoryRecord>>,
}

impl MemoryRecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every snapshot written for `story_id`, oldest first.
    pub fn history(&self, story_id: &str) -> Vec<StoryRecord> {
        self.records
            .lock()
            .map(|records| {
                records
                    .iter()
                    .filter(|r| r.story_id() == story_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Most recent snapshot of any story.
    pub fn last(&self) -> Option<StoryRecord> {
        self.records.lock().ok()?.last().cloned()
    }
}

#[async_trait]
impl StoryRecordStore for MemoryRecordStore {
    async fn record_story(&self, record: &StoryRecord) -> FabulaResult<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|e| StoreError::new(StoreErrorKind::Unavailable(e.to_string())))?;
        records.push(record.clone());
        Ok(())
    }
}
