// src/api/http/router.rs
// HTTP router composition for the conversational endpoint and its siblings

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{chat_handler, refresh_knowledge_handler, root_handler, stats_handler};
use crate::state::AppState;

/// Main HTTP router: liveness, stats, chat, and the knowledge-refresh trigger.
pub fn http_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/stats", get(stats_handler))
        .route("/chat", post(chat_handler))
        .route("/refresh-knowledge", post(refresh_knowledge_handler))
        // Permissive CORS, as in development; lock to the frontend origin in production
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
