use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    #[serde(default)]
    pub message: Option<String>,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload?;
    let message = body.message.unwrap_or_default();
    let reply = state.chat.respond(&message).await?;
    Ok(Json(json!({ "message": reply.message })))
}
