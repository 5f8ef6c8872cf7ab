use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};

use crate::{
    dto::chat::{ChatRequest, ChatResponse},
    error::{AppError, AppResult},
    services::chat_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/chat", post(chat))
}

#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply for the submitted message", body = ChatResponse),
        (status = 400, description = "Email and message are required"),
        (status = 404, description = "Invalid conversation ID"),
        (status = 500, description = "User, conversation or LLM processing failed"),
    ),
    tag = "Chat"
)]
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> AppResult<Json<ChatResponse>> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected chat body");
        AppError::BadRequest("Email and message are required".to_string())
    })?;
    let resp = chat_service::handle_chat(&state, payload).await?;
    Ok(Json(resp))
}
