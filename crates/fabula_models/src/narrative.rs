//! Narrative generation via chat completions.

use crate::{ChatCompletionRequest, ChatCompletionResponse, Message, OpenAiClient, classify_transport};
use async_trait::async_trait;
use fabula_error::{ServiceError, ServiceErrorKind, ServiceKind};
use fabula_interface::NarrativeGenerator;
use tracing::instrument;

impl OpenAiClient {
    /// Chat request for a narrative prompt.
    pub fn narrative_request(&self, prompt: &str) -> ChatCompletionRequest {
        let config = self.config();
        ChatCompletionRequest {
            model: config.text_model().clone(),
            messages: vec![
                Message::system(config.system_prompt().clone()),
                Message::user(prompt),
            ],
            max_tokens: Some(*config.max_tokens()),
            temperature: Some(*config.temperature()),
        }
    }
}

#[async_trait]
impl NarrativeGenerator for OpenAiClient {
    #[instrument(skip(self, prompt), fields(model = %self.config().text_model(), prompt_len = prompt.len()))]
    async fn generate_text(&self, prompt: &str) -> Result<String, ServiceError> {
        let request = self.narrative_request(prompt);
        let response = self
            .post_json(ServiceKind::Narrative, "/v1/chat/completions", &request)
            .await?;

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            ServiceError::new(ServiceKind::Narrative, classify_transport(&e))
        })?;

        let text = completion.first_content().ok_or_else(|| {
            ServiceError::new(
                ServiceKind::Narrative,
                ServiceErrorKind::MalformedResponse("completion has no content".to_string()),
            )
        })?;

        tracing::debug!(chars = text.len(), "Narrative generated");
        Ok(text.to_string())
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}
