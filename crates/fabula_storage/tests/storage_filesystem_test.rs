//! Tests for the filesystem artifact store.

use fabula_error::StoreErrorKind;
use fabula_interface::ArtifactStore;
use fabula_core::{ArtifactKey, ArtifactKind};
use fabula_storage::FileSystemArtifactStore;
use tempfile::TempDir;

#[tokio::test]
async fn test_put_writes_file_and_returns_file_url() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let store = FileSystemArtifactStore::new(temp_dir.path(), None)?;

    let path = ArtifactKey::new("story_abc12345", 0, ArtifactKind::Audio).path("wav");
    let url = store.put(&path, b"RIFF", "audio/wav").await?;

    let written = store.root().join("stories/story_abc12345/audio/scene_0.wav");
    assert_eq!(std::fs::read(&written)?, b"RIFF");
    assert_eq!(url, format!("file://{}", written.display()));
    Ok(())
}

#[tokio::test]
async fn test_put_uses_public_base_url() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let store = FileSystemArtifactStore::new(
        temp_dir.path(),
        Some("https://cdn.example.com/media/".to_string()),
    )?;

    let url = store
        .put("stories/s/images/scene_1.png", b"png", "image/png")
        .await?;
    assert_eq!(url, "https://cdn.example.com/media/stories/s/images/scene_1.png");
    Ok(())
}

#[tokio::test]
async fn test_put_overwrites_atomically_without_leftovers() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let store = FileSystemArtifactStore::new(temp_dir.path(), None)?;

    store.put("stories/s/audio/scene_0.wav", b"first", "audio/wav").await?;
    store.put("stories/s/audio/scene_0.wav", b"second", "audio/wav").await?;

    let dir = store.root().join("stories/s/audio");
    let entries: Vec<_> = std::fs::read_dir(&dir)?
        .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<Result<_, _>>()?;
    assert_eq!(entries, vec!["scene_0.wav".to_string()]);
    assert_eq!(std::fs::read(dir.join("scene_0.wav"))?, b"second");
    Ok(())
}

#[tokio::test]
async fn test_put_rejects_escaping_paths() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileSystemArtifactStore::new(temp_dir.path(), None).unwrap();

    for path in ["../outside.wav", "/etc/passwd", "stories/../../x", ""] {
        let err = store.put(path, b"x", "audio/wav").await.unwrap_err();
        assert!(
            matches!(err.kind, StoreErrorKind::InvalidPath(_)),
            "{path} should be rejected"
        );
    }
}

#[tokio::test]
async fn test_check_ready_leaves_no_marker() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileSystemArtifactStore::new(temp_dir.path(), None).unwrap();

    store.check_ready().await.unwrap();
    assert_eq!(std::fs::read_dir(store.root()).unwrap().count(), 0);
}
