//! Story generation command handler.

use super::load_config;
use fabula_core::{ScenePolicy, StoryRequest};
use fabula_error::{FabulaResult, StoreError, StoreErrorKind};
use fabula_models::{OpenAiClient, OpenAiConfig};
use fabula_pipeline::{PipelineConfig, PipelineOrchestrator, PipelineServices};
use fabula_storage::{FileSystemArtifactStore, JsonRecordStore};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Generate one story and write its manifest.
///
/// Ctrl-C cancels the story; the failed record is still written.
pub async fn generate_story(
    prompt: &str,
    user: &str,
    config_path: Option<&Path>,
    output: Option<&Path>,
    best_effort: bool,
) -> FabulaResult<()> {
    let mut config = load_config(config_path)?;
    if best_effort {
        config.pipeline.scene_policy = ScenePolicy::BestEffort;
    }

    let api_key = std::env::var("OPENAI_API_KEY").ok();
    if api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set, requests will be sent without credentials");
    }
    let client = Arc::new(OpenAiClient::new(OpenAiConfig::from_settings(
        &config.models,
        api_key,
    ))?);

    let services = PipelineServices {
        narrative: client.clone(),
        speech: client.clone(),
        image: client,
        store: Arc::new(FileSystemArtifactStore::new(
            &config.storage.root,
            config.storage.public_base_url.clone(),
        )?),
        records: Arc::new(JsonRecordStore::new(&config.storage.records_dir)),
    };
    let pipeline =
        PipelineOrchestrator::connect(services, PipelineConfig::from_config(&config)).await?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling story");
            on_interrupt.cancel();
        }
    });

    let story = pipeline
        .run(&StoryRequest::new(user, prompt), cancel)
        .await?;
    let json = story.manifest.to_json()?;

    match output {
        Some(path) => {
            tokio::fs::write(path, &json).await.map_err(|e| {
                StoreError::new(StoreErrorKind::FileWrite(format!("{}: {}", path.display(), e)))
            })?;
            tracing::info!(
                story_id = %story.story_id,
                path = %path.display(),
                "Manifest written"
            );
        }
        None => println!("{}", json),
    }

    if !story.dropped_scenes.is_empty() {
        tracing::warn!(dropped = ?story.dropped_scenes, "Some scenes were dropped");
    }
    Ok(())
}
