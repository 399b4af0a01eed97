// src/api/http/chat.rs

use axum::{Json, extract::State, response::IntoResponse};
use std::sync::Arc;
use tracing::{error, info};

use crate::api::error::{ApiError, ApiResult};
use crate::api::types::{ChatRequest, ChatResponse};
use crate::state::AppState;

/// POST /chat - the conversational endpoint.
///
/// Returns 200 for every handled outcome, including the offline fallback;
/// only a dispatch failure becomes a 500 with a `detail` body.
pub async fn chat_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse {
    let result: ApiResult<Json<ChatResponse>> = async {
        if request.messages.is_empty() {
            return Err(ApiError::bad_request("messages must not be empty"));
        }

        info!(
            messages = request.messages.len(),
            context = request.context.as_deref().unwrap_or("General"),
            "Chat request received"
        );

        let response = app_state
            .orchestrator
            .handle(&request)
            .await
            .map_err(|e| ApiError::internal(e.to_string()))?;

        Ok(Json(response))
    }
    .await;

    match result {
        Ok(response) => response.into_response(),
        Err(error) => {
            error!("Chat request failed: {}", error.message);
            error.into_response()
        }
    }
}
