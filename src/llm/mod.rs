pub mod cohere;
pub mod embedding;
pub mod provider;
pub mod together;
pub mod types;

pub use cohere::CohereProvider;
pub use embedding::{EmbeddingClient, Embeddings};
pub use provider::{EmbeddingError, EmbeddingProvider, LlmProvider};
pub use together::TogetherProvider;
pub use types::{ChatMessage, ChatRequest, EmbeddingMode};
