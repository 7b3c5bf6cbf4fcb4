use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub user_message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub bot_reply: String,
    pub session_id: String,
}

/// `POST /chat`. Always answers 200; provider failures become the fallback reply.
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let exchange = state
        .gateway
        .chat(&payload.user_message, payload.session_id)
        .await;

    if !exchange.is_success() {
        tracing::info!(session_id = %exchange.session_id, "Answering with fallback reply");
    }

    let (bot_reply, session_id) = exchange.reply_or(&state.fallback_reply);
    Json(ChatResponse {
        bot_reply,
        session_id,
    })
}
