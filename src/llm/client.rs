// src/llm/client.rs
use async_trait::async_trait;
use std::time::Duration;

use crate::llm::models::{
    ApiErrorBody, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ResponseFormat,
};
use crate::llm::prompt::{user_message, SYSTEM_PROMPT};
use crate::utils::config::ExtractorConfig;
use crate::utils::error::ExtractionError;

const USER_AGENT: &str = concat!("termsheet_extractor/", env!("CARGO_PKG_VERSION"));
// Longest error body kept in an HTTP error message.
const ERROR_PREVIEW_LEN: usize = 300;

/// Anything that can turn one document's filtered text into a completion.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Raw completion content for `filtered_text`, or `None` if the service
    /// answered without any.
    async fn complete(&self, filtered_text: &str) -> Result<Option<String>, ExtractionError>;
}

#[async_trait]
impl<T: CompletionService + ?Sized> CompletionService for &T {
    async fn complete(&self, filtered_text: &str) -> Result<Option<String>, ExtractionError> {
        (**self).complete(filtered_text).await
    }
}

/// Chat completion client for OpenAI-compatible endpoints.
pub struct OpenAiClient {
    config: ExtractorConfig,
    api_key: String,
    http: reqwest::Client,
}

impl OpenAiClient {
    /// Fails with [`ExtractionError::MissingApiKey`] when no key is configured.
    pub fn new(config: ExtractorConfig) -> Result<Self, ExtractionError> {
        let api_key = config.api_key.clone().ok_or(ExtractionError::MissingApiKey)?;
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { config, api_key, http })
    }

    /// Sends one request without retrying.
    async fn send_once(&self, filtered_text: &str) -> Result<Option<String>, ExtractionError> {
        let user_content = user_message(filtered_text);
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: &user_content },
            ],
            response_format: ResponseFormat::json_object(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            top_p: self.config.top_p,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        };

        let response = self
            .http
            .post(self.config.chat_completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?; // Propagates reqwest::Error as ExtractionError::Network

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(api_error) => api_error.error.message,
                Err(_) => body.chars().take(ERROR_PREVIEW_LEN).collect(),
            };
            return Err(ExtractionError::Http { status, message });
        }

        let completion: ChatCompletionResponse =
            serde_json::from_str(&body).map_err(|e| ExtractionError::Parse(e.to_string()))?;
        Ok(completion.into_content())
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.config.retry_base_delay.saturating_mul(1u32 << attempt.min(16))
    }
}

#[async_trait]
impl CompletionService for OpenAiClient {
    async fn complete(&self, filtered_text: &str) -> Result<Option<String>, ExtractionError> {
        let max_retries = self.config.max_retries;
        let mut attempt = 0u32;

        loop {
            match self.send_once(filtered_text).await {
                Ok(content) => return Ok(content),
                Err(e) if e.is_transient() && attempt < max_retries => {
                    let delay = self.backoff(attempt);
                    attempt += 1;
                    tracing::warn!(
                        "Completion request failed ({}), retry {}/{} in {:?}",
                        e,
                        attempt,
                        max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(ExtractionError::Http { status, .. })
                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS =>
                {
                    return Err(ExtractionError::RateLimited(attempt + 1));
                }
                Err(e) => return Err(e),
            }
        }
    }
}
