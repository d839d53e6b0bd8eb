//! End-to-end pipeline runs against scripted collaborators.

mod test_utils;

use fabula_core::{
    Manifest, PipelineState, ScenePolicy, SegmentKind, StoryId, StoryRequest, StoryStatus,
};
use fabula_error::{
    FabulaErrorKind, FailureStage, PipelineErrorKind, SceneFailureCause, SegmentationErrorKind,
    ServiceErrorKind,
};
use fabula_pipeline::{
    DeviceImageProfile, PipelineConfig, PipelineOrchestrator, PipelineServices,
};
use image::GenericImageView;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use test_utils::*;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

fn request() -> StoryRequest {
    StoryRequest::new("user-42", "a rabbit and a spaceship")
}

fn starts(manifest: &Manifest) -> Vec<u64> {
    manifest.segments.iter().map(|s| s.start_ms).collect()
}

/// Scenes two and three report zero and negative speech durations.
const BAD_DURATIONS: &str = "Scene 1: The rabbit finds a rocket [4000].\n\n\
Scene 2: The rocket will not start [0].\n\n\
Scene 3: The fuel gauge runs backwards [-250].\n\n\
Scene 4: The rabbit lands back home [5000].";

#[tokio::test]
async fn three_scenes_share_one_timeline() -> anyhow::Result<()> {
    let harness = Harness::new(ScriptedNarrative::new(THREE_SCENES));
    let pipeline = PipelineOrchestrator::connect(harness.services(), test_config()).await?;

    let story = pipeline.run(&request(), CancellationToken::new()).await?;

    assert_eq!(starts(&story.manifest), vec![0, 0, 4000, 4000, 10000, 10000]);
    assert_eq!(story.manifest.end_ms(), 15000);
    assert!(story.dropped_scenes.is_empty());
    story.manifest.validate()?;

    let pairs: HashSet<_> = story
        .manifest
        .segments
        .iter()
        .map(|s| (s.scene, s.kind))
        .collect();
    assert_eq!(pairs.len(), 6);

    let first_image = &story.manifest.segments[0];
    assert_eq!(first_image.kind, SegmentKind::Image);
    assert_eq!(
        first_image.url,
        format!("memory://stories/{}/images/scene_0.png", story.story_id)
    );
    assert_eq!(harness.store.inner.len(), 6);
    Ok(())
}

#[tokio::test]
async fn records_move_from_processing_to_completed() -> anyhow::Result<()> {
    let harness = Harness::new(ScriptedNarrative::new(THREE_SCENES));
    let pipeline = PipelineOrchestrator::connect(harness.services(), test_config()).await?;

    let story = pipeline.run(&request(), CancellationToken::new()).await?;

    let history = harness.records.history(story.story_id.as_str());
    assert_eq!(history.len(), 2);
    assert_eq!(*history[0].status(), StoryStatus::Processing);
    assert_eq!(*history[1].status(), StoryStatus::Completed);
    assert_eq!(*history[1].scene_count(), 3);
    assert_eq!(*history[1].total_duration_ms(), 15000);
    assert_eq!(history[1], story.record);
    Ok(())
}

#[tokio::test]
async fn single_paragraph_fails_while_segmenting() -> anyhow::Result<()> {
    let harness = Harness::new(ScriptedNarrative::new(
        "Once upon a time a rabbit built a spaceship and flew away.",
    ));
    let pipeline = PipelineOrchestrator::connect(harness.services(), test_config()).await?;

    let err = pipeline
        .run(&request(), CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.stage, FailureStage::Segmenting);
    match &err.kind {
        PipelineErrorKind::Segmentation(e) => assert_eq!(
            e.kind,
            SegmentationErrorKind::InsufficientBoundaries { found: 1 }
        ),
        other => panic!("unexpected failure: {other}"),
    }
    assert_eq!(harness.speech.calls.load(Ordering::SeqCst), 0);

    let failed = harness.records.last().expect("terminal record");
    assert_eq!(*failed.status(), StoryStatus::Failed);
    assert_eq!(failed.failure().as_ref().unwrap().stage, "segmenting");
    Ok(())
}

#[tokio::test]
async fn single_scene_fallback_yields_one_scene() -> anyhow::Result<()> {
    let harness = Harness::new(ScriptedNarrative::new(
        "Once upon a time a rabbit built a spaceship [2500].",
    ));
    let config = PipelineConfig::builder()
        .retry(fast_retry())
        .limits(fabula_rate_limit::ServicesConfig::default())
        .single_scene_fallback(true)
        .build()?;
    let pipeline = PipelineOrchestrator::connect(harness.services(), config).await?;

    let story = pipeline.run(&request(), CancellationToken::new()).await?;

    assert_eq!(starts(&story.manifest), vec![0, 0]);
    assert_eq!(story.manifest.end_ms(), 2500);
    Ok(())
}

#[tokio::test]
async fn strict_policy_fails_story_on_upload_failure() -> anyhow::Result<()> {
    let harness = Harness::new(ScriptedNarrative::new(THREE_SCENES))
        .with_store(FlakyStore::failing_on("images/scene_2"));
    let pipeline = PipelineOrchestrator::connect(harness.services(), test_config()).await?;

    let err = pipeline
        .run(&request(), CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.stage, FailureStage::GeneratingScenes);
    match &err.kind {
        PipelineErrorKind::Scenes { failed, attempted } => {
            assert_eq!(*attempted, 3);
            assert_eq!(failed.len(), 1);
            assert_eq!(failed[0].scene_index, 2);
            assert!(matches!(failed[0].cause, SceneFailureCause::Upload(_)));
        }
        other => panic!("unexpected failure: {other}"),
    }
    // First attempt plus two retries.
    assert_eq!(harness.store.failed_attempts.load(Ordering::SeqCst), 3);

    let history = harness.records.history(&err.story_id);
    assert_eq!(*history.last().unwrap().status(), StoryStatus::Failed);
    Ok(())
}

#[tokio::test]
async fn best_effort_drops_failed_scene_without_gaps() -> anyhow::Result<()> {
    let harness = Harness::new(ScriptedNarrative::new(THREE_SCENES))
        .with_store(FlakyStore::failing_on("images/scene_1"));
    let config = PipelineConfig::builder()
        .retry(fast_retry())
        .limits(fabula_rate_limit::ServicesConfig::default())
        .scene_policy(ScenePolicy::BestEffort)
        .build()?;
    let pipeline = PipelineOrchestrator::connect(harness.services(), config).await?;

    let story = pipeline.run(&request(), CancellationToken::new()).await?;

    assert_eq!(story.dropped_scenes, vec![1]);
    assert_eq!(starts(&story.manifest), vec![0, 0, 4000, 4000]);
    assert_eq!(story.manifest.end_ms(), 9000);
    let scenes: Vec<_> = story.manifest.segments.iter().map(|s| s.scene).collect();
    assert_eq!(scenes, vec![Some(0), Some(0), Some(1), Some(1)]);
    story.manifest.validate()?;
    assert_eq!(*story.record.scene_count(), 2);
    Ok(())
}

#[tokio::test]
async fn best_effort_survives_last_image_upload_failure() -> anyhow::Result<()> {
    let harness = Harness::new(ScriptedNarrative::new(THREE_SCENES))
        .with_store(FlakyStore::failing_on("images/scene_2"));
    let config = PipelineConfig::builder()
        .retry(fast_retry())
        .limits(fabula_rate_limit::ServicesConfig::default())
        .scene_policy(ScenePolicy::BestEffort)
        .build()?;
    let pipeline = PipelineOrchestrator::connect(harness.services(), config).await?;

    let story = pipeline.run(&request(), CancellationToken::new()).await?;

    assert_eq!(story.dropped_scenes, vec![2]);
    assert_eq!(story.manifest.scene_count(), 2);
    assert_eq!(starts(&story.manifest), vec![0, 0, 4000, 4000]);
    assert_eq!(story.manifest.end_ms(), 10000);
    assert_eq!(harness.store.failed_attempts.load(Ordering::SeqCst), 3);
    Ok(())
}

#[tokio::test]
async fn best_effort_fails_when_every_scene_fails() -> anyhow::Result<()> {
    let harness = Harness::new(ScriptedNarrative::new(THREE_SCENES)).with_image(ScriptedImage {
        error: Some(ServiceErrorKind::InvalidInput("content policy".to_string())),
        ..Default::default()
    });
    let config = PipelineConfig::builder()
        .retry(fast_retry())
        .limits(fabula_rate_limit::ServicesConfig::default())
        .scene_policy(ScenePolicy::BestEffort)
        .build()?;
    let pipeline = PipelineOrchestrator::connect(harness.services(), config).await?;

    let err = pipeline
        .run(&request(), CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.stage, FailureStage::GeneratingScenes);
    match &err.kind {
        PipelineErrorKind::Scenes { failed, attempted } => {
            assert_eq!(*attempted, 3);
            let indices: Vec<_> = failed.iter().map(|f| f.scene_index).collect();
            assert_eq!(indices, vec![0, 1, 2]);
        }
        other => panic!("unexpected failure: {other}"),
    }
    // Permanent errors are not retried.
    assert_eq!(harness.image.calls.load(Ordering::SeqCst), 3);
    Ok(())
}

#[tokio::test]
async fn permanent_narrative_error_is_not_retried() -> anyhow::Result<()> {
    let harness = Harness::new(ScriptedNarrative::failing(ServiceErrorKind::QuotaExhausted(
        "insufficient_quota".to_string(),
    )));
    let pipeline = PipelineOrchestrator::connect(harness.services(), test_config()).await?;

    let err = pipeline
        .run(&request(), CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.stage, FailureStage::Narrating);
    assert!(matches!(err.kind, PipelineErrorKind::Narrative(_)));
    assert_eq!(harness.narrative.calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn transient_narrative_error_exhausts_retries() -> anyhow::Result<()> {
    let harness = Harness::new(ScriptedNarrative::failing(ServiceErrorKind::Unavailable(
        "503".to_string(),
    )));
    let pipeline = PipelineOrchestrator::connect(harness.services(), test_config()).await?;

    let err = pipeline
        .run(&request(), CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.stage, FailureStage::Narrating);
    assert_eq!(harness.narrative.calls.load(Ordering::SeqCst), 3);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn cancellation_fails_with_active_stage() -> anyhow::Result<()> {
    let harness = Harness::new(ScriptedNarrative::new(THREE_SCENES)).with_speech(ScriptedSpeech {
        delay: Duration::from_secs(30),
        ..Default::default()
    });
    let pipeline = PipelineOrchestrator::connect(harness.services(), test_config()).await?;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = pipeline.run(&request(), cancel).await.unwrap_err();

    assert_eq!(err.kind, PipelineErrorKind::Cancelled);
    assert_eq!(err.stage, FailureStage::GeneratingScenes);
    let failed = harness.records.last().expect("terminal record");
    assert_eq!(failed.failure().as_ref().unwrap().stage, "generating_scenes");
    Ok(())
}

#[tokio::test]
async fn cancelled_before_start_never_calls_services() -> anyhow::Result<()> {
    let harness = Harness::new(ScriptedNarrative::new(THREE_SCENES));
    let pipeline = PipelineOrchestrator::connect(harness.services(), test_config()).await?;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = pipeline.run(&request(), cancel).await.unwrap_err();

    assert_eq!(err.kind, PipelineErrorKind::Cancelled);
    assert_eq!(err.stage, FailureStage::Narrating);
    assert_eq!(harness.narrative.calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn slow_story_times_out() -> anyhow::Result<()> {
    let harness = Harness::new(ScriptedNarrative::slow(
        THREE_SCENES,
        Duration::from_secs(60),
    ));
    let config = PipelineConfig::builder()
        .retry(fast_retry())
        .limits(fabula_rate_limit::ServicesConfig::default())
        .timeout(Duration::from_millis(100))
        .build()?;
    let pipeline = PipelineOrchestrator::connect(harness.services(), config).await?;

    let err = pipeline
        .run(&request(), CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind, PipelineErrorKind::TimedOut { limit_ms: 100 });
    assert_eq!(err.stage, FailureStage::Narrating);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn scene_concurrency_is_bounded() -> anyhow::Result<()> {
    let narrative = (1..=5)
        .map(|i| format!("Scene {i}: Leg {i} of the voyage [1000]."))
        .collect::<Vec<_>>()
        .join("\n\n");
    let harness = Harness::new(ScriptedNarrative::new(&narrative)).with_speech(ScriptedSpeech {
        delay: Duration::from_millis(50),
        ..Default::default()
    });
    let config = PipelineConfig::builder()
        .retry(fast_retry())
        .limits(fabula_rate_limit::ServicesConfig::default())
        .scene_concurrency(2usize)
        .build()?;
    let pipeline = PipelineOrchestrator::connect(harness.services(), config).await?;

    let story = pipeline.run(&request(), CancellationToken::new()).await?;

    assert_eq!(story.manifest.scene_count(), 5);
    assert!(harness.speech.in_flight.peak() <= 2);
    assert_eq!(harness.speech.calls.load(Ordering::SeqCst), 5);
    Ok(())
}

#[tokio::test]
async fn same_story_builds_identical_manifest() -> anyhow::Result<()> {
    let harness = Harness::new(ScriptedNarrative::new(THREE_SCENES));
    let pipeline = PipelineOrchestrator::connect(harness.services(), test_config()).await?;
    let id = StoryId::from("story_fixed01");

    let first = pipeline
        .run_with_id(id.clone(), &request(), CancellationToken::new())
        .await?;
    let second = pipeline
        .run_with_id(id, &request(), CancellationToken::new())
        .await?;

    assert_eq!(first.manifest.to_json()?, second.manifest.to_json()?);
    Ok(())
}

#[tokio::test]
async fn observed_state_ends_completed() -> anyhow::Result<()> {
    let harness = Harness::new(ScriptedNarrative::new(THREE_SCENES));
    let pipeline = PipelineOrchestrator::connect(harness.services(), test_config()).await?;
    let (state, observer) = watch::channel(PipelineState::Started);

    pipeline
        .run_observed(StoryId::generate(), &request(), CancellationToken::new(), &state)
        .await?;

    assert_eq!(*observer.borrow(), PipelineState::Completed);
    Ok(())
}

#[tokio::test]
async fn unready_store_blocks_construction() {
    let harness = Harness::new(ScriptedNarrative::new(THREE_SCENES));
    let services = PipelineServices {
        store: Arc::new(OfflineStore),
        ..harness.services()
    };

    let err = PipelineOrchestrator::connect(services, test_config())
        .await
        .unwrap_err();

    assert!(matches!(err.kind(), FabulaErrorKind::Store(_)));
}

#[tokio::test]
async fn strict_policy_fails_on_zero_duration() -> anyhow::Result<()> {
    let harness = Harness::new(ScriptedNarrative::new(
        "Scene 1: The rabbit finds a rocket [4000].\n\n\
Scene 2: The rocket will not start [0].",
    ));
    let pipeline = PipelineOrchestrator::connect(harness.services(), test_config()).await?;

    let err = pipeline
        .run(&request(), CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.stage, FailureStage::GeneratingScenes);
    match &err.kind {
        PipelineErrorKind::Scenes { failed, attempted } => {
            assert_eq!(*attempted, 2);
            assert_eq!(failed.len(), 1);
            assert_eq!(failed[0].scene_index, 1);
            assert_eq!(failed[0].cause, SceneFailureCause::InvalidDuration(0));
        }
        other => panic!("unexpected failure: {other}"),
    }
    let failed = harness.records.last().expect("terminal record");
    assert_eq!(*failed.status(), StoryStatus::Failed);
    assert_eq!(failed.failure().as_ref().unwrap().stage, "generating_scenes");
    Ok(())
}

#[tokio::test]
async fn best_effort_drops_zero_and_negative_durations() -> anyhow::Result<()> {
    let harness = Harness::new(ScriptedNarrative::new(BAD_DURATIONS));
    let config = PipelineConfig::builder()
        .retry(fast_retry())
        .limits(fabula_rate_limit::ServicesConfig::default())
        .scene_policy(ScenePolicy::BestEffort)
        .build()?;
    let pipeline = PipelineOrchestrator::connect(harness.services(), config).await?;

    let story = pipeline.run(&request(), CancellationToken::new()).await?;

    assert_eq!(story.dropped_scenes, vec![1, 2]);
    assert_eq!(starts(&story.manifest), vec![0, 0, 4000, 4000]);
    assert_eq!(story.manifest.end_ms(), 9000);
    let scenes: Vec<_> = story.manifest.segments.iter().map(|s| s.scene).collect();
    assert_eq!(scenes, vec![Some(0), Some(0), Some(1), Some(1)]);
    story.manifest.validate()?;
    // Scenes with unusable audio are never uploaded.
    assert_eq!(harness.store.inner.len(), 4);
    assert!(
        harness
            .store
            .inner
            .paths()
            .iter()
            .all(|p| !p.contains("scene_1") && !p.contains("scene_2"))
    );
    Ok(())
}

#[tokio::test]
async fn illustrations_are_stored_as_device_jpegs() -> anyhow::Result<()> {
    let harness = Harness::new(ScriptedNarrative::new(THREE_SCENES)).with_image(ScriptedImage {
        png: Some(solid_png(64, 48)),
        ..Default::default()
    });
    let config = PipelineConfig::builder()
        .retry(fast_retry())
        .limits(fabula_rate_limit::ServicesConfig::default())
        .device_image(DeviceImageProfile::builder().width(32u32).height(16u32).build()?)
        .build()?;
    let pipeline = PipelineOrchestrator::connect(harness.services(), config).await?;

    let story = pipeline.run(&request(), CancellationToken::new()).await?;

    let images: Vec<_> = story
        .manifest
        .segments
        .iter()
        .filter(|s| s.kind == SegmentKind::Image)
        .collect();
    assert_eq!(images.len(), 3);
    for segment in images {
        let path = segment
            .url
            .strip_prefix("memory://")
            .expect("memory locator");
        assert!(path.ends_with(".jpg"), "unexpected path {path}");

        let (bytes, content_type) = harness.store.inner.get(path).expect("stored image");
        assert_eq!(content_type, "image/jpeg");
        let decoded = image::load_from_memory_with_format(&bytes, image::ImageFormat::Jpeg)?;
        assert_eq!(decoded.dimensions(), (32, 16));
        assert_eq!(decoded.color(), image::ColorType::L8);
    }
    Ok(())
}

#[tokio::test]
async fn undecodable_illustration_fails_scene() -> anyhow::Result<()> {
    let harness = Harness::new(ScriptedNarrative::new(THREE_SCENES));
    let config = PipelineConfig::builder()
        .retry(fast_retry())
        .limits(fabula_rate_limit::ServicesConfig::default())
        .device_image(DeviceImageProfile::default())
        .build()?;
    let pipeline = PipelineOrchestrator::connect(harness.services(), config).await?;

    let err = pipeline
        .run(&request(), CancellationToken::new())
        .await
        .unwrap_err();

    match &err.kind {
        PipelineErrorKind::Scenes { failed, .. } => {
            assert!(matches!(failed[0].cause, SceneFailureCause::ImageProcessing(_)));
        }
        other => panic!("unexpected failure: {other}"),
    }
    assert!(harness.store.inner.is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn stuck_record_store_does_not_block_story() -> anyhow::Result<()> {
    let harness = Harness::new(ScriptedNarrative::new(THREE_SCENES));
    let records = Arc::new(StuckRecords::default());
    let services = PipelineServices {
        records: records.clone(),
        ..harness.services()
    };
    let config = PipelineConfig::builder()
        .retry(fast_retry())
        .limits(fabula_rate_limit::ServicesConfig::default())
        .timeout(Duration::from_secs(10))
        .record_timeout(Duration::from_millis(50))
        .build()?;
    let pipeline = PipelineOrchestrator::connect(services, config).await?;

    let story = pipeline.run(&request(), CancellationToken::new()).await?;

    assert_eq!(story.manifest.scene_count(), 3);
    assert_eq!(*story.record.status(), StoryStatus::Completed);
    // Processing and completed snapshots were both attempted.
    assert_eq!(records.attempts.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn cancel_interrupts_hung_record_write() -> anyhow::Result<()> {
    let harness = Harness::new(ScriptedNarrative::new(THREE_SCENES));
    let services = PipelineServices {
        records: Arc::new(StuckRecords::default()),
        ..harness.services()
    };
    let config = PipelineConfig::builder()
        .retry(fast_retry())
        .limits(fabula_rate_limit::ServicesConfig::default())
        .timeout(Duration::from_secs(600))
        .record_timeout(Duration::from_secs(60))
        .build()?;
    let pipeline = PipelineOrchestrator::connect(services, config).await?;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let started = tokio::time::Instant::now();
    let err = pipeline.run(&request(), cancel).await.unwrap_err();

    assert_eq!(err.kind, PipelineErrorKind::Cancelled);
    assert_eq!(err.stage, FailureStage::Narrating);
    assert_eq!(harness.narrative.calls.load(Ordering::SeqCst), 0);
    // Cancel at 20ms plus one bounded write of the failed snapshot.
    assert!(started.elapsed() < Duration::from_secs(61));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn story_deadline_covers_hung_record_write() -> anyhow::Result<()> {
    let harness = Harness::new(ScriptedNarrative::new(THREE_SCENES));
    let services = PipelineServices {
        records: Arc::new(StuckRecords::default()),
        ..harness.services()
    };
    let config = PipelineConfig::builder()
        .retry(fast_retry())
        .limits(fabula_rate_limit::ServicesConfig::default())
        .timeout(Duration::from_millis(100))
        .record_timeout(Duration::from_secs(60))
        .build()?;
    let pipeline = PipelineOrchestrator::connect(services, config).await?;

    let err = pipeline
        .run(&request(), CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind, PipelineErrorKind::TimedOut { limit_ms: 100 });
    assert_eq!(harness.narrative.calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn precancelled_run_finishes_despite_hung_record_store() -> anyhow::Result<()> {
    let harness = Harness::new(ScriptedNarrative::new(THREE_SCENES));
    let records = Arc::new(StuckRecords::default());
    let services = PipelineServices {
        records: records.clone(),
        ..harness.services()
    };
    let config = PipelineConfig::builder()
        .retry(fast_retry())
        .limits(fabula_rate_limit::ServicesConfig::default())
        .timeout(Duration::from_secs(1))
        .build()?;
    let pipeline = PipelineOrchestrator::connect(services, config).await?;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = tokio::time::timeout(
        Duration::from_secs(3600),
        pipeline.run(&request(), cancel),
    )
    .await?;

    assert_eq!(outcome.unwrap_err().kind, PipelineErrorKind::Cancelled);
    // Only the failed snapshot was attempted.
    assert_eq!(records.attempts.load(Ordering::SeqCst), 1);
    Ok(())
}
