//! Offline inspection commands.

use fabula_core::Manifest;
use fabula_error::{FabulaResult, StoreError, StoreErrorKind};
use fabula_pipeline::SceneSegmenter;
use std::path::Path;

pub(super) fn read_text(path: &Path) -> FabulaResult<String> {
    std::fs::read_to_string(path).map_err(|e| {
        StoreError::new(StoreErrorKind::NotFound(format!("{}: {}", path.display(), e))).into()
    })
}

/// Print the scene split of a narrative file.
pub fn segment_narrative(path: &Path, max_scenes: usize) -> FabulaResult<()> {
    let narrative = read_text(path)?;
    let scenes = SceneSegmenter::segment(&narrative, max_scenes)?;

    for scene in &scenes {
        println!("--- Scene {} ---", scene.index + 1);
        println!("{}", scene.text);
        println!();
    }
    tracing::info!(scenes = scenes.len(), "Narrative segmented");
    Ok(())
}

/// Check a manifest file and print a timeline summary.
pub fn validate_manifest(path: &Path) -> FabulaResult<()> {
    let manifest = Manifest::from_json(&read_text(path)?)?;
    manifest.validate()?;

    println!(
        "{}: {} scene(s), {} segment(s), {} ms",
        manifest.story_id,
        manifest.scene_count(),
        manifest.segments.len(),
        manifest.end_ms()
    );
    for segment in manifest.sorted_segments() {
        println!("{:>8} ms  {:<5}  {}", segment.start_ms, segment.kind, segment.url);
    }
    Ok(())
}
