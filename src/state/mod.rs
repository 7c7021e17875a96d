use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::chat::ChatService;
use crate::core::config::service::parse_settings;
use crate::core::config::{AppConfig, AppPaths, ConfigService};
use crate::documents::{DocumentAiExtractor, DocumentValidator, TextExtractor};
use crate::llm::{
    CohereProvider, EmbeddingClient, EmbeddingProvider, LlmProvider, TogetherProvider,
};
use crate::rag::{KnowledgeBase, Retriever};
use crate::server::rate_limit::ChatRateLimiter;

pub mod error;

use error::InitializationError;

/// The external collaborators behind the services.
#[derive(Clone)]
pub struct Providers {
    pub embeddings: Arc<dyn EmbeddingProvider>,
    pub llm: Arc<dyn LlmProvider>,
    pub extractor: Arc<dyn TextExtractor>,
}

impl Providers {
    pub fn from_settings(settings: &AppConfig) -> Result<Self, InitializationError> {
        let embeddings = CohereProvider::new(&settings.embedding).map_err(|source| {
            InitializationError::Provider {
                name: "embedding",
                source,
            }
        })?;
        let llm = TogetherProvider::new(&settings.llm).map_err(|source| {
            InitializationError::Provider {
                name: "language model",
                source,
            }
        })?;
        let extractor =
            DocumentAiExtractor::new(&settings.ocr).map_err(InitializationError::Ocr)?;
        if !extractor.is_configured() {
            tracing::warn!("OCR endpoint or access token missing; document validation will fail");
        }

        Ok(Self {
            embeddings: Arc::new(embeddings),
            llm: Arc::new(llm),
            extractor: Arc::new(extractor),
        })
    }
}

/// Shared state handed to every handler.
///
/// Built once at startup; the FAQ knowledge base is read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    pub settings: AppConfig,
    pub chat: ChatService,
    pub documents: DocumentValidator,
    pub rate_limiter: Arc<ChatRateLimiter>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Loads configuration, builds the providers and indexes the FAQ file
    /// before returning. FAQ or embedding problems degrade to an ungrounded
    /// service; only bad configuration fails.
    pub async fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone());
        let raw = config.load_config().map_err(InitializationError::Config)?;
        tracing::info!(
            "Configuration loaded: {}",
            config.redact_sensitive_values(&raw)
        );
        let settings = parse_settings(raw).map_err(InitializationError::Config)?;
        let providers = Providers::from_settings(&settings)?;
        Ok(Self::build(&paths, settings, providers).await)
    }

    pub async fn build(
        paths: &AppPaths,
        settings: AppConfig,
        providers: Providers,
    ) -> Arc<Self> {
        let embeddings = EmbeddingClient::new(providers.embeddings.clone());
        let faq_path = paths.resolve(&settings.rag.faq_path);
        let knowledge = KnowledgeBase::load(&faq_path, &embeddings).await;
        tracing::info!(
            "FAQ index status: {}",
            if knowledge.is_searchable() {
                "initialized"
            } else {
                "not initialized"
            }
        );
        Self::with_knowledge(settings, providers, knowledge)
    }

    pub fn with_knowledge(
        settings: AppConfig,
        providers: Providers,
        knowledge: KnowledgeBase,
    ) -> Arc<Self> {
        let retriever = Retriever::new(
            Arc::new(knowledge),
            EmbeddingClient::new(providers.embeddings),
            settings.rag.top_k,
        );
        let chat = ChatService::new(
            retriever,
            providers.llm.clone(),
            settings.app.max_input_length,
        );
        let documents = DocumentValidator::new(providers.extractor, providers.llm);
        let rate_limiter = Arc::new(ChatRateLimiter::new(&settings.rate_limit));

        Arc::new(AppState {
            settings,
            chat,
            documents,
            rate_limiter,
            started_at: Utc::now(),
        })
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        self.chat.retriever().knowledge()
    }
}
