use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::core::config::AppConfig;
use crate::documents::ocr::fakes::FixedExtractor;
use crate::llm::embedding::fakes::TableEmbedder;
use crate::llm::provider::fakes::RecordingLlm;
use crate::rag::KnowledgeBase;
use crate::state::{AppState, Providers};

pub const RESET: &str = "Reset password: go to settings.";
pub const CONTACT: &str = "Contact support at help@example.com.";

/// App state over a two-entry FAQ with fake providers.
pub struct TestApp {
    pub state: Arc<AppState>,
    pub llm: Arc<RecordingLlm>,
}

impl TestApp {
    pub fn new(reply: &str) -> Self {
        let llm = Arc::new(RecordingLlm::new(reply));
        let providers = Providers {
            embeddings: Arc::new(TableEmbedder::new(
                &[("how do I reset my password", vec![0.8, 0.2, 0.0])],
                vec![0.0, 0.0, 1.0],
            )),
            llm: llm.clone(),
            extractor: Arc::new(FixedExtractor {
                text: Some("PASSPORT\nLEE SAM".to_string()),
            }),
        };
        let knowledge = KnowledgeBase::from_parts(
            vec![RESET.to_string(), CONTACT.to_string()],
            &[vec![0.9, 0.1, 0.0], vec![0.1, 0.9, 0.0]],
        )
        .expect("knowledge");

        let mut settings = AppConfig::default();
        settings.rate_limit.enabled = false;
        let state = AppState::with_knowledge(settings, providers, knowledge);

        Self { state, llm }
    }
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}
