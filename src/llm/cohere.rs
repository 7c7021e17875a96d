use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::core::config::settings::{non_blank, EmbeddingSettings};
use crate::core::errors::ApiError;
use super::provider::{EmbeddingError, EmbeddingProvider};
use super::types::EmbeddingMode;

/// Cohere `/v1/embed` client.
#[derive(Clone)]
pub struct CohereProvider {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: Client,
}

impl CohereProvider {
    pub fn new(settings: &EmbeddingSettings) -> Result<Self, ApiError> {
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
struct EmbedRequest<'a> {
    texts: &'a [String],
    model: &'a str,
    input_type: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl EmbeddingProvider for CohereProvider {
    fn name(&self) -> &str {
        "cohere"
    }

    async fn embed(
        &self,
        texts: &[String],
        mode: EmbeddingMode,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(EmbeddingError::MissingCredentials)?;

        let url = format!("{}/v1/embed", self.base_url);
        let body = EmbedRequest {
            texts,
            model: &self.model,
            input_type: mode.input_type(),
        };

        let res = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_builder() {
                    EmbeddingError::Fatal(err.to_string())
                } else {
                    EmbeddingError::Transport(err.to_string())
                }
            })?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|err| EmbeddingError::Transport(err.to_string()))?;

        if !status.is_success() {
            return Err(EmbeddingError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_embeddings(&text, texts.len())
    }
}

fn parse_embeddings(body: &str, expected: usize) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let payload: EmbedResponse =
        serde_json::from_str(body).map_err(|err| EmbeddingError::Schema(err.to_string()))?;

    if payload.embeddings.len() != expected {
        return Err(EmbeddingError::Schema(format!(
            "expected {} embeddings, got {}",
            expected,
            payload.embeddings.len()
        )));
    }
    Ok(payload.embeddings)
}
