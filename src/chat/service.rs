use std::sync::Arc;

use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use crate::context::prompt::{assemble, PromptKind};
use crate::core::errors::ApiError;
use crate::llm::{ChatRequest, EmbeddingError, LlmProvider};
use crate::rag::Retriever;

const ERROR_PREFIX: &str = "An error occurred while processing your request. ";

/// Stages a chat request moves through. `Failed` is reachable from any stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatStage {
    Received,
    EmbeddingQuery,
    Retrieving,
    Prompting,
    Generating,
    Responded,
    Failed,
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("message exceeds the maximum length of {max} characters")]
    MessageTooLong { max: usize },
    #[error("Failed to generate embedding for the user's query: {0}")]
    Embedding(#[source] EmbeddingError),
    #[error("{0}")]
    Generation(#[source] ApiError),
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::EmptyMessage | ChatError::MessageTooLong { .. } => {
                ApiError::BadRequest(err.to_string())
            }
            ChatError::Embedding(_) => ApiError::Internal(format!("{}{}", ERROR_PREFIX, err)),
            ChatError::Generation(inner) => {
                let detail = match inner {
                    ApiError::ServiceUnavailable(msg)
                    | ApiError::BadRequest(msg)
                    | ApiError::Upstream(msg)
                    | ApiError::Internal(msg) => msg,
                };
                ApiError::Upstream(format!("{}{}", ERROR_PREFIX, detail))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub message: String,
    pub prompt_kind: PromptKind,
    pub faq_entries: usize,
}

/// Answers chat messages, grounding them on retrieved FAQ entries when possible.
#[derive(Clone)]
pub struct ChatService {
    retriever: Retriever,
    llm: Arc<dyn LlmProvider>,
    max_input_length: usize,
}

impl ChatService {
    pub fn new(retriever: Retriever, llm: Arc<dyn LlmProvider>, max_input_length: usize) -> Self {
        Self {
            retriever,
            llm,
            max_input_length,
        }
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub async fn respond(&self, message: &str) -> Result<ChatReply, ChatError> {
        let span = tracing::info_span!("chat", request_id = %Uuid::new_v4());

        async move {
            let mut run = StageLog::new();
            let result = self.run(message, &mut run).await;
            match &result {
                Ok(reply) => {
                    run.advance(ChatStage::Responded);
                    tracing::info!(
                        "Chat answered ({:?}, {} FAQ entries)",
                        reply.prompt_kind,
                        reply.faq_entries
                    );
                }
                Err(err) => {
                    let failed_at = run.current();
                    run.advance(ChatStage::Failed);
                    tracing::error!("Chat request failed during {:?}: {}", failed_at, err);
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(&self, message: &str, run: &mut StageLog) -> Result<ChatReply, ChatError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if message.chars().count() > self.max_input_length {
            return Err(ChatError::MessageTooLong {
                max: self.max_input_length,
            });
        }
        tracing::info!("User message received: {}", message);

        run.advance(ChatStage::EmbeddingQuery);
        let query_vector = self
            .retriever
            .embed_query(message)
            .await
            .map_err(ChatError::Embedding)?;

        run.advance(ChatStage::Retrieving);
        let faqs: Vec<String> = match query_vector {
            Some(vector) => self
                .retriever
                .search(&vector, self.retriever.top_k())
                .into_iter()
                .map(|chunk| chunk.text)
                .collect(),
            None => Vec::new(),
        };

        run.advance(ChatStage::Prompting);
        let prompt = assemble(&faqs, message);
        let prompt_kind = prompt.kind;

        run.advance(ChatStage::Generating);
        let reply = self
            .llm
            .chat(ChatRequest::new(prompt.into_messages()))
            .await
            .map_err(ChatError::Generation)?;
        tracing::debug!("LLM response: {}", reply);

        Ok(ChatReply {
            message: reply,
            prompt_kind,
            faq_entries: faqs.len(),
        })
    }
}

struct StageLog {
    current: ChatStage,
}

impl StageLog {
    fn new() -> Self {
        Self {
            current: ChatStage::Received,
        }
    }

    fn current(&self) -> ChatStage {
        self.current
    }

    fn advance(&mut self, next: ChatStage) {
        tracing::debug!("chat stage {:?} -> {:?}", self.current, next);
        self.current = next;
    }
}
