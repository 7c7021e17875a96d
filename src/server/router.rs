use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::core::config::settings::ServerSettings;
use crate::server::handlers::{chat, documents, health};
use crate::server::rate_limit::throttle;
use crate::state::AppState;

/// Creates the application router.
///
/// Only the chat route is rate limited; CORS and request tracing apply to
/// every route.
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state.settings.server);

    let chat_routes: Router<Arc<AppState>> = Router::new()
        .route("/api/chatbot/chat", post(chat::chat))
        .route_layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            throttle,
        ));

    Router::new()
        .route("/health", get(health::health))
        .route("/api/healthcheck", get(health::healthcheck))
        .route("/api/processDocs/validate", post(documents::validate))
        .merge(chat_routes)
        .with_state(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(settings: &ServerSettings) -> CorsLayer {
    let origins = resolve_allowed_origins(settings)
        .into_iter()
        .filter_map(|origin| HeaderValue::from_str(&origin).ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE, header::AUTHORIZATION])
}

fn resolve_allowed_origins(settings: &ServerSettings) -> Vec<String> {
    let origins = settings
        .cors_allowed_origins
        .iter()
        .map(|origin| origin.trim())
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();

    if origins.is_empty() {
        return default_local_origins();
    }
    origins
}

fn default_local_origins() -> Vec<String> {
    vec![
        "http://localhost".to_string(),
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
        "http://127.0.0.1".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:5173".to_string(),
    ]
}
