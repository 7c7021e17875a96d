use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn healthcheck() -> &'static str {
    "OK"
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let knowledge = state.knowledge();
    Json(json!({
        "status": "ok",
        "faq_chunks": knowledge.len(),
        "index_ready": knowledge.is_searchable(),
        "embedding_dimension": knowledge.index().map(|index| index.dimension()),
        "started_at": state.started_at.to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::handlers::test_support::{body_json, TestApp};

    #[tokio::test]
    async fn reports_the_loaded_index() {
        let app = TestApp::new("unused");
        let json = body_json(health(State(app.state.clone())).await.into_response()).await;

        assert_eq!(json["status"], "ok");
        assert_eq!(json["faq_chunks"], 2);
        assert_eq!(json["index_ready"], true);
        assert_eq!(json["embedding_dimension"], 3);
        assert!(json["started_at"].is_string());
    }

    #[tokio::test]
    async fn healthcheck_is_plain_ok() {
        assert_eq!(healthcheck().await, "OK");
    }
}
