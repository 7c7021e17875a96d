use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::documents::DocumentError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateBody {
    #[serde(default)]
    pub document_type: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Base64-encoded file.
    #[serde(default)]
    pub content: String,
}

pub async fn validate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ValidateBody>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "isValid": "invalid",
                    "message": "Invalid request body.",
                    "error": rejection.body_text(),
                })),
            )
                .into_response();
        }
    };

    let result = state
        .documents
        .validate(&body.document_type, body.mime_type.as_deref(), &body.content)
        .await;

    match result {
        Ok(validation) => (
            StatusCode::OK,
            Json(json!({
                "isValid": validation.verdict.is_valid(),
                "message": validation.verdict.message(),
                "ocrResult": validation.ocr_result,
            })),
        )
            .into_response(),
        Err(DocumentError::NoFile) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "isValid": "invalid",
                "message": "No file uploaded.",
            })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "isValid": "invalid",
                "message": "Failed to process document with OCR.",
                "error": err.to_string(),
            })),
        )
            .into_response(),
    }
}
