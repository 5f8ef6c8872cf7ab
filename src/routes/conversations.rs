use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    error::AppResult,
    models::{ConversationSummary, MessageView},
    services::conversation_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/conversations/{user_id}", get(list_conversations))
        .route("/messages/{conversation_id}", get(list_messages))
}

#[utoipa::path(
    get,
    path = "/api/conversations/{user_id}",
    params(
        ("user_id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Conversations of the user, most recent first", body = Vec<ConversationSummary>)
    ),
    tag = "Conversations"
)]
pub async fn list_conversations(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<ConversationSummary>>> {
    let items = conversation_service::list_conversations(&state.pool, user_id).await?;
    Ok(Json(items))
}

#[utoipa::path(
    get,
    path = "/api/messages/{conversation_id}",
    params(
        ("conversation_id" = i64, Path, description = "Conversation ID")
    ),
    responses(
        (status = 200, description = "Messages in insertion order", body = Vec<MessageView>)
    ),
    tag = "Conversations"
)]
pub async fn list_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<i64>,
) -> AppResult<Json<Vec<MessageView>>> {
    let items = conversation_service::list_messages(&state.pool, conversation_id).await?;
    Ok(Json(items))
}
