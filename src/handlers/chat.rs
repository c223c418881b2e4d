use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::Reply;
use crate::services::assistant;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub tenant: String,
    pub session_id: String,
    pub text: String,
}

// POST /api/chat
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<Reply>, AppError> {
    let session_id = payload.session_id.trim();
    if session_id.is_empty() {
        return Err(AppError::Validation("session_id is required".to_string()));
    }

    let reply =
        assistant::process_message(&state, &payload.tenant, session_id, payload.text.trim())
            .await?;

    Ok(Json(reply))
}
