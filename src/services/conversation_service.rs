use crate::{
    db::DbPool,
    error::AppResult,
    models::{ConversationSummary, MessageView},
};

/// Conversations of a user, most recently active first.
pub async fn list_conversations(pool: &DbPool, user_id: i64) -> AppResult<Vec<ConversationSummary>> {
    let rows = sqlx::query_as::<_, ConversationSummary>(
        r#"
        SELECT c.id, c.title, c.updated_at, COUNT(m.id) AS message_count
        FROM conversations c
        LEFT JOIN messages m ON m.conversation_id = c.id
        WHERE c.user_id = $1
        GROUP BY c.id, c.title, c.updated_at
        ORDER BY c.updated_at DESC, c.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Messages of a conversation in the order they were written.
pub async fn list_messages(pool: &DbPool, conversation_id: i64) -> AppResult<Vec<MessageView>> {
    let rows = sqlx::query_as::<_, MessageView>(
        r#"
        SELECT id, content, is_from_user, created_at
        FROM messages
        WHERE conversation_id = $1
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(conversation_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
