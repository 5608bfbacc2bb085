//! Chat-completions backend for the ranker.

use crate::config::RankerConfig;
use crate::core::ranker::RankingPrompt;
use crate::core::{CoreError, RankingBackend};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

pub struct OpenAiBackend {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl OpenAiBackend {
    pub fn new(config: &RankerConfig, api_key: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl RankingBackend for OpenAiBackend {
    async fn complete(&self, prompt: &RankingPrompt) -> Result<String, CoreError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request_body(&self.model, prompt))
            .send()
            .await
            .map_err(|e| CoreError::RankerUnavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CoreError::RankerUnavailable(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| CoreError::RankerUnavailable(format!("unreadable response: {}", e)))?;

        message_content(&body)
            .ok_or_else(|| CoreError::RankerUnavailable("response has no message content".to_string()))
    }
}

/// Builds the request payload in chat completions format.
pub fn request_body(model: &str, prompt: &RankingPrompt) -> Value {
    json!({
        "model": model,
        "messages": [
            { "role": "system", "content": prompt.system },
            { "role": "user", "content": prompt.user }
        ],
        "temperature": 0,
        "max_tokens": prompt.max_tokens
    })
}

/// Extracts the trimmed text of the first choice.
pub fn message_content(body: &Value) -> Option<String> {
    body.get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .map(|content| content.trim().to_string())
}
