use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::core::config::settings::{non_blank, LlmSettings};
use crate::core::errors::ApiError;
use super::provider::LlmProvider;
use super::types::{ChatMessage, ChatRequest};

/// Chat completions against Together AI's OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct TogetherProvider {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: Client,
}

impl TogetherProvider {
    pub fn new(settings: &LlmSettings) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(ApiError::internal)?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: non_blank(&settings.api_key).map(str::to_string),
            model: settings.model.clone(),
            client,
        })
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[async_trait]
impl LlmProvider for TogetherProvider {
    fn name(&self) -> &str {
        "together"
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ApiError::Upstream("TOGETHER_API_KEY is not set".to_string()))?;

        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = CompletionRequest {
            model: &self.model,
            messages: &request.messages,
        };

        let res = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::upstream)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Upstream(format!(
                "Together chat error {}: {}",
                status, text
            )));
        }

        let text = res.text().await.map_err(ApiError::upstream)?;
        parse_completion(&text)
    }
}

fn parse_completion(body: &str) -> Result<String, ApiError> {
    let payload: CompletionResponse = serde_json::from_str(body)
        .map_err(|err| ApiError::Upstream(format!("Malformed chat completion: {}", err)))?;

    payload
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ApiError::Upstream("Chat completion contained no content".to_string()))
}
