//! Degrading wrapper around an [`EmbeddingProvider`].
//!
//! Provider failures become [`Embeddings::Unavailable`] so callers can fall
//! back to ungrounded answers. Only [`EmbeddingError::Fatal`] is returned as
//! an error.

use std::sync::Arc;

use super::provider::{EmbeddingError, EmbeddingProvider};
use super::types::EmbeddingMode;

#[derive(Debug, Clone, PartialEq)]
pub enum Embeddings {
    Available(Vec<Vec<f32>>),
    Unavailable,
}

impl Embeddings {
    pub fn into_vectors(self) -> Vec<Vec<f32>> {
        match self {
            Embeddings::Available(vectors) => vectors,
            Embeddings::Unavailable => Vec::new(),
        }
    }
}

#[derive(Clone)]
pub struct EmbeddingClient {
    provider: Arc<dyn EmbeddingProvider>,
}

impl EmbeddingClient {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    pub async fn embed(
        &self,
        texts: &[String],
        mode: EmbeddingMode,
    ) -> Result<Embeddings, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Embeddings::Available(Vec::new()));
        }

        match self.provider.embed(texts, mode).await {
            Ok(vectors) if vectors.len() == texts.len() => {
                tracing::debug!(
                    "{} returned {} {:?} embeddings",
                    self.provider.name(),
                    vectors.len(),
                    mode
                );
                Ok(Embeddings::Available(vectors))
            }
            Ok(vectors) => {
                tracing::error!(
                    "{} returned {} embeddings for {} texts; discarding",
                    self.provider.name(),
                    vectors.len(),
                    texts.len()
                );
                Ok(Embeddings::Unavailable)
            }
            Err(err) if err.is_fatal() => Err(err),
            Err(EmbeddingError::MissingCredentials) => {
                tracing::error!("COHERE_API_KEY is not set. Cannot generate embeddings.");
                Ok(Embeddings::Unavailable)
            }
            Err(err) => {
                tracing::error!("Embedding call to {} failed: {}", self.provider.name(), err);
                Ok(Embeddings::Unavailable)
            }
        }
    }

    /// Embeds a single text; `None` means no embedding was produced.
    pub async fn embed_one(
        &self,
        text: &str,
        mode: EmbeddingMode,
    ) -> Result<Option<Vec<f32>>, EmbeddingError> {
        let embeddings = self.embed(&[text.to_string()], mode).await?;
        Ok(embeddings
            .into_vectors()
            .into_iter()
            .next()
            .filter(|vector| !vector.is_empty()))
    }
}
