//! Scripted collaborators for pipeline tests.

#![allow(dead_code)]

use async_trait::async_trait;
use fabula_core::{AudioFormat, ImageFormat, StoryRecord, SynthesizedAudio, SynthesizedImage};
use fabula_error::{
    FabulaResult, ServiceError, ServiceErrorKind, ServiceKind, StoreError, StoreErrorKind,
};
use fabula_interface::{
    ArtifactStore, ImageSynthesizer, NarrativeGenerator, SpeechSynthesizer, StoryRecordStore,
};
use fabula_pipeline::{PipelineConfig, PipelineServices};
use fabula_rate_limit::{RetryPolicy, ServicesConfig};
use fabula_storage::{MemoryArtifactStore, MemoryRecordStore};
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Three headed scenes whose texts mention their speech durations.
pub const THREE_SCENES: &str = "Scene 1: The rabbit finds a rocket [4000].\n\n\
Scene 2: The rabbit flies past the moon [6000].\n\n\
Scene 3: The rabbit lands back home [5000].";

/// Retry quickly and deterministically.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::builder()
        .max_retries(2usize)
        .initial_backoff_ms(1u64)
        .max_delay_ms(2u64)
        .jitter(false)
        .build()
        .expect("valid retry policy")
}

/// Unlimited services and fast retries.
pub fn test_config() -> PipelineConfig {
    PipelineConfig::builder()
        .retry(fast_retry())
        .limits(ServicesConfig::default())
        .timeout(Duration::from_secs(10))
        .build()
        .expect("valid pipeline config")
}

/// Tracks concurrent callers and the highest concurrency seen.
#[derive(Debug, Default)]
pub struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlight {
    pub fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    pub fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

pub struct ScriptedNarrative {
    pub text: String,
    pub delay: Duration,
    pub error: Option<ServiceErrorKind>,
    pub calls: AtomicUsize,
}

impl ScriptedNarrative {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            delay: Duration::ZERO,
            error: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(kind: ServiceErrorKind) -> Self {
        Self {
            error: Some(kind),
            ..Self::new("")
        }
    }

    pub fn slow(text: &str, delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new(text)
        }
    }
}

#[async_trait]
impl NarrativeGenerator for ScriptedNarrative {
    async fn generate_text(&self, _prompt: &str) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.error {
            Some(kind) => Err(ServiceError::new(ServiceKind::Narrative, kind.clone())),
            None => Ok(self.text.clone()),
        }
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}

/// Speech whose duration is the bracketed number in the scene text.
#[derive(Default)]
pub struct ScriptedSpeech {
    pub delay: Duration,
    pub in_flight: InFlight,
    pub calls: AtomicUsize,
}

fn bracketed_duration(text: &str) -> i64 {
    text.split_once('[')
        .and_then(|(_, rest)| rest.split_once(']'))
        .and_then(|(n, _)| n.parse().ok())
        .unwrap_or(1000)
}

#[async_trait]
impl SpeechSynthesizer for ScriptedSpeech {
    async fn synthesize_speech(&self, text: &str) -> Result<SynthesizedAudio, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.in_flight.enter();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.exit();
        Ok(SynthesizedAudio {
            bytes: text.as_bytes().to_vec(),
            duration_ms: bracketed_duration(text),
            format: AudioFormat::Wav,
        })
    }
}

/// A solid-color PNG of the given size.
pub fn solid_png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::RgbaImage::from_pixel(width, height, image::Rgba([30, 120, 200, 255]))
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encodable png");
    bytes
}

/// Image service returning `png` when set, otherwise placeholder bytes.
#[derive(Default)]
pub struct ScriptedImage {
    pub error: Option<ServiceErrorKind>,
    pub png: Option<Vec<u8>>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl ImageSynthesizer for ScriptedImage {
    async fn synthesize_image(&self, text: &str) -> Result<SynthesizedImage, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match (&self.error, &self.png) {
            (Some(kind), _) => Err(ServiceError::new(ServiceKind::Image, kind.clone())),
            (None, Some(png)) => Ok(SynthesizedImage {
                bytes: png.clone(),
                format: ImageFormat::Png,
            }),
            (None, None) => Ok(SynthesizedImage {
                bytes: format!("png:{}", text).into_bytes(),
                format: ImageFormat::Png,
            }),
        }
    }
}

/// Memory store that fails uploads whose path contains `fail_on`.
pub struct FlakyStore {
    pub inner: MemoryArtifactStore,
    pub fail_on: Option<String>,
    pub failed_attempts: AtomicUsize,
}

impl FlakyStore {
    pub fn reliable() -> Self {
        Self {
            inner: MemoryArtifactStore::new(),
            fail_on: None,
            failed_attempts: AtomicUsize::new(0),
        }
    }

    pub fn failing_on(fragment: &str) -> Self {
        Self {
            fail_on: Some(fragment.to_string()),
            ..Self::reliable()
        }
    }
}

#[async_trait]
impl ArtifactStore for FlakyStore {
    async fn put(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<String, StoreError> {
        if let Some(fragment) = &self.fail_on
            && path.contains(fragment.as_str())
        {
            self.failed_attempts.fetch_add(1, Ordering::SeqCst);
            return Err(StoreError::new(StoreErrorKind::FileWrite(format!(
                "injected failure for {}",
                path
            ))));
        }
        self.inner.put(path, bytes, content_type).await
    }

    async fn check_ready(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Store that refuses writes outright.
pub struct OfflineStore;

#[async_trait]
impl ArtifactStore for OfflineStore {
    async fn put(&self, _path: &str, _bytes: &[u8], _content_type: &str) -> Result<String, StoreError> {
        Err(StoreError::new(StoreErrorKind::Unavailable("offline".to_string())))
    }

    async fn check_ready(&self) -> Result<(), StoreError> {
        Err(StoreError::new(StoreErrorKind::Unavailable("offline".to_string())))
    }
}

/// Record store whose writes never complete.
#[derive(Debug, Default)]
pub struct StuckRecords {
    pub attempts: AtomicUsize,
}

#[async_trait]
impl StoryRecordStore for StuckRecords {
    async fn record_story(&self, _record: &StoryRecord) -> FabulaResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

/// Handles to every collaborator of one test pipeline.
pub struct Harness {
    pub narrative: Arc<ScriptedNarrative>,
    pub speech: Arc<ScriptedSpeech>,
    pub image: Arc<ScriptedImage>,
    pub store: Arc<FlakyStore>,
    pub records: Arc<MemoryRecordStore>,
}

impl Harness {
    pub fn new(narrative: ScriptedNarrative) -> Self {
        Self {
            narrative: Arc::new(narrative),
            speech: Arc::new(ScriptedSpeech::default()),
            image: Arc::new(ScriptedImage::default()),
            store: Arc::new(FlakyStore::reliable()),
            records: Arc::new(MemoryRecordStore::new()),
        }
    }

    pub fn with_store(mut self, store: FlakyStore) -> Self {
        self.store = Arc::new(store);
        self
    }

    pub fn with_speech(mut self, speech: ScriptedSpeech) -> Self {
        self.speech = Arc::new(speech);
        self
    }

    pub fn with_image(mut self, image: ScriptedImage) -> Self {
        self.image = Arc::new(image);
        self
    }

    pub fn services(&self) -> PipelineServices {
        PipelineServices {
            narrative: self.narrative.clone(),
            speech: self.speech.clone(),
            image: self.image.clone(),
            store: self.store.clone(),
            records: self.records.clone(),
        }
    }
}
