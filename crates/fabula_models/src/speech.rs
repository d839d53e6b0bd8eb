//! Speech synthesis via `/v1/audio/speech`.

use crate::{OpenAiClient, SpeechRequest, classify_transport, mp3_duration_ms, wav_duration_ms};
use async_trait::async_trait;
use fabula_core::{AudioFormat, SynthesizedAudio};
use fabula_error::{ServiceError, ServiceKind};
use fabula_interface::SpeechSynthesizer;
use tracing::instrument;

#[async_trait]
impl SpeechSynthesizer for OpenAiClient {
    #[instrument(skip(self, text), fields(model = %self.config().speech_model(), chars = text.len()))]
    async fn synthesize_speech(&self, text: &str) -> Result<SynthesizedAudio, ServiceError> {
        let config = self.config();
        let format = *config.audio_format();
        let request = SpeechRequest {
            model: config.speech_model().clone(),
            input: text.to_string(),
            voice: config.voice().clone(),
            response_format: format.to_string(),
        };

        let response = self
            .post_json(ServiceKind::Speech, "/v1/audio/speech", &request)
            .await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ServiceError::new(ServiceKind::Speech, classify_transport(&e)))?
            .to_vec();

        let duration_ms = match format {
            AudioFormat::Wav => wav_duration_ms(&bytes)
                .map_err(|kind| ServiceError::new(ServiceKind::Speech, kind))?,
            AudioFormat::Mp3 => mp3_duration_ms(&bytes),
        };

        tracing::debug!(size = bytes.len(), duration_ms, "Speech synthesized");
        Ok(SynthesizedAudio {
            bytes,
            duration_ms,
            format,
        })
    }
}
