use async_trait::async_trait;
use thiserror::Error;

use crate::core::errors::ApiError;
use super::types::{ChatRequest, EmbeddingMode};

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "together")
    fn name(&self) -> &str;

    /// chat completion (non-streaming); any failure is fatal for the caller
    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError>;
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding API key is not configured")]
    MissingCredentials,
    #[error("embedding request failed: {0}")]
    Transport(String),
    #[error("embedding API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected embedding response: {0}")]
    Schema(String),
    /// The request could not even be constructed; retrying cannot help.
    #[error("embedding request could not be built: {0}")]
    Fatal(String),
}

impl EmbeddingError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, EmbeddingError::Fatal(_))
    }
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &str;

    /// One call per batch; the result is aligned with `texts`.
    async fn embed(
        &self,
        texts: &[String],
        mode: EmbeddingMode,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}
