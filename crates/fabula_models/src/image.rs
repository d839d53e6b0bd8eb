//! Image synthesis via `/v1/images/generations`.

use crate::{ImageRequest, ImageResponse, OpenAiClient, classify_transport};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use fabula_core::SynthesizedImage;
use fabula_error::{ServiceError, ServiceErrorKind, ServiceKind};
use fabula_interface::ImageSynthesizer;
use tracing::instrument;

impl OpenAiClient {
    /// Image request for a scene's text.
    pub fn image_request(&self, text: &str) -> ImageRequest {
        let config = self.config();
        let prompt = if config.image_style().is_empty() {
            text.to_string()
        } else {
            format!("{}: {}", config.image_style(), text)
        };
        ImageRequest {
            model: config.image_model().clone(),
            prompt,
            n: 1,
            size: config.image_size().clone(),
            response_format: "b64_json".to_string(),
        }
    }
}

/// Decode the first image of a generation response.
pub(crate) fn decode_first_image(response: &ImageResponse) -> Result<Vec<u8>, ServiceErrorKind> {
    let encoded = response
        .data
        .first()
        .and_then(|d| d.b64_json.as_deref())
        .ok_or_else(|| ServiceErrorKind::MalformedResponse("response has no image data".to_string()))?;
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| ServiceErrorKind::MalformedResponse(format!("invalid base64 image: {}", e)))?;
    if bytes.is_empty() {
        return Err(ServiceErrorKind::MalformedResponse("image is empty".to_string()));
    }
    Ok(bytes)
}

#[async_trait]
impl ImageSynthesizer for OpenAiClient {
    #[instrument(skip(self, text), fields(model = %self.config().image_model(), chars = text.len()))]
    async fn synthesize_image(&self, text: &str) -> Result<SynthesizedImage, ServiceError> {
        let request = self.image_request(text);
        let response = self
            .post_json(ServiceKind::Image, "/v1/images/generations", &request)
            .await?;

        let parsed: ImageResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::new(ServiceKind::Image, classify_transport(&e)))?;
        let bytes =
            decode_first_image(&parsed).map_err(|kind| ServiceError::new(ServiceKind::Image, kind))?;

        tracing::debug!(size = bytes.len(), "Image synthesized");
        Ok(SynthesizedImage {
            bytes,
            format: *self.config().image_format(),
        })
    }
}
