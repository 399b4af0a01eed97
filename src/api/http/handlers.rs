// src/api/http/handlers.rs
// Liveness, stats, and knowledge-refresh handlers

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;
use std::sync::Arc;

use crate::knowledge;
use crate::state::AppState;

/// GET / - liveness probe
pub async fn root_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = app_state.stats.snapshot();
    Json(json!({
        "status": "online",
        "service": "Concierge AI",
        "provider": app_state.default_provider,
        "uptime": snapshot.uptime(),
    }))
}

/// GET /stats - process-wide usage counters
pub async fn stats_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = app_state.stats.snapshot();
    Json(json!({
        // Placeholder until a rolling latency average exists
        "latency": "24ms",
        "error_rate": snapshot.error_rate(),
        "load": format!("{} reqs", snapshot.request_count),
        "tokens_total": (snapshot.tokens_in + snapshot.tokens_out).to_string(),
        "tokens_input": snapshot.tokens_in.to_string(),
        "tokens_output": snapshot.tokens_out.to_string(),
        "provider": app_state.default_provider,
    }))
}

/// POST /refresh-knowledge - fire-and-forget corpus refresh.
/// The contract is "accepted", not "completed".
pub async fn refresh_knowledge_handler(
    State(app_state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tokio::spawn(knowledge::refresh_knowledge(
        app_state.knowledge.clone(),
        app_state.records.clone(),
        app_state.docs_dir.clone(),
    ));

    Json(json!({ "status": "Knowledge refresh started" }))
}
