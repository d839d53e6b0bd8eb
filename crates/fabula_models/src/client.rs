//! Shared HTTP client.

use crate::{OpenAiConfig, classify_status, classify_transport};
use fabula_error::{FabulaResult, HttpError, ServiceError, ServiceKind};
use serde::Serialize;
use std::time::Duration;
use tracing::instrument;

/// Client for OpenAI-compatible generation endpoints.
///
/// One client serves all three generation services; it implements
/// [`NarrativeGenerator`], [`SpeechSynthesizer`] and [`ImageSynthesizer`].
///
/// [`NarrativeGenerator`]: fabula_interface::NarrativeGenerator
/// [`SpeechSynthesizer`]: fabula_interface::SpeechSynthesizer
/// [`ImageSynthesizer`]: fabula_interface::ImageSynthesizer
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be constructed.
    #[instrument(skip(config), fields(base_url = %config.base_url()))]
    pub fn new(config: OpenAiConfig) -> FabulaResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(*config.timeout_secs()))
            .build()
            .map_err(|e| HttpError::new(format!("Failed to build HTTP client: {}", e)))?;
        tracing::debug!("Created OpenAI-compatible client");
        Ok(Self { config, client })
    }

    /// Get the client configuration
    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    /// POST a JSON body and return the successful response.
    ///
    /// Non-success statuses and transport failures are classified into
    /// service errors attributed to `service`.
    #[instrument(skip(self, body), fields(service = %service))]
    pub(crate) async fn post_json<B: Serialize + ?Sized>(
        &self,
        service: ServiceKind,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, ServiceError> {
        let url = self.config.endpoint(path);
        tracing::debug!(url = %url, "Sending request");

        let mut req = self.client.post(&url).json(body);
        if let Some(api_key) = self.config.api_key() {
            req = req.bearer_auth(api_key);
        }

        let response = req.send().await.map_err(|e| {
            tracing::error!(error = %e, "Request failed");
            ServiceError::new(service, classify_transport(&e))
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let kind = classify_status(status.as_u16(), &body);
        tracing::warn!(status = status.as_u16(), kind = %kind, "Service returned error");
        Err(ServiceError::new(service, kind))
    }
}
