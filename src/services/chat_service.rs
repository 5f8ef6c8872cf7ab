use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use serde_json::json;

use crate::{
    dto::chat::{ChatRequest, ChatResponse, ConversationRef},
    entity::{
        conversations::{
            ActiveModel as ConversationActive, Entity as Conversations, Model as ConversationModel,
        },
        messages::{ActiveModel as MessageActive, Column as MessageCol, Entity as Messages},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    llm::{ChatTurn, Intent, LlmError, SYSTEM_PROMPT},
    services::order_service::{
        extract_order_digits, find_order_summary, format_order_message, order_number,
    },
    state::AppState,
};

pub const DEFAULT_CONVERSATION_TITLE: &str = "New Conversation";
const FALLBACK_REPLY: &str = "I couldn't process that request.";

pub async fn handle_chat(state: &AppState, payload: ChatRequest) -> AppResult<ChatResponse> {
    let ChatRequest {
        email,
        message,
        username,
        conversation_id,
        metadata,
    } = payload;

    let (Some(email), Some(message)) = (non_blank(email), non_blank(message)) else {
        return Err(AppError::BadRequest(
            "Email and message are required".to_string(),
        ));
    };
    let username = non_blank(username).unwrap_or_else(|| email.clone());

    let user = get_or_create_user(&state.orm, &username, &email)
        .await
        .map_err(AppError::UserProcessing)?;
    tracing::debug!(user_id = user.id, "resolved user");

    let conversation_ref = ConversationRef::from_value(conversation_id.as_ref());
    let conversation = resolve_conversation(&state.orm, user.id, conversation_ref).await?;
    tracing::debug!(conversation_id = conversation.id, "resolved conversation");

    let mut turns = vec![ChatTurn::system(SYSTEM_PROMPT)];
    turns.extend(conversation_history(&state.orm, conversation.id).await?);
    turns.push(ChatTurn::user(message.clone()));
    let received_at = Utc::now();

    // No connection is held while the model answers. A failed completion
    // returns before anything of this exchange is written.
    let content = state.llm.complete_json(&turns).await?;
    let intent = Intent::parse(&content)?;
    tracing::info!(
        conversation_id = conversation.id,
        action = intent.action(),
        "llm intent"
    );

    let txn = state.orm.begin().await?;

    let user_message = MessageActive {
        id: NotSet,
        conversation_id: Set(conversation.id),
        content: Set(message.clone()),
        is_from_user: Set(true),
        created_at: Set(received_at.into()),
        message_data: Set(metadata),
    }
    .insert(&txn)
    .await?;

    let mut order = None;
    let ai_response = match &intent {
        Intent::OrderDetails { id } => {
            let (label, order_id) = match id {
                Some(id) => (id.to_string(), Some(*id)),
                None => {
                    let digits = extract_order_digits(&message).ok_or_else(|| {
                        LlmError::InvalidReply("order_details without a usable order id".into())
                    })?;
                    order_number(digits)
                }
            };
            // ids beyond i64 cannot exist in the table
            if let Some(order_id) = order_id {
                order = find_order_summary(&txn, order_id).await?;
            }
            if order.is_some() {
                format!("Here are details for order #{label}:")
            } else {
                format!("Order #{label} not found.")
            }
        }
        Intent::GeneralResponse(text) => text.clone(),
        Intent::Unrecognized(action) => {
            tracing::warn!(action = %action, "unrecognized intent");
            FALLBACK_REPLY.to_string()
        }
    };
    let database_used = order.is_some();

    let ai_message = MessageActive {
        id: NotSet,
        conversation_id: Set(conversation.id),
        content: Set(ai_response.clone()),
        is_from_user: Set(false),
        created_at: Set(Utc::now().into()),
        message_data: Set(Some(json!({
            "action": intent.action(),
            "database_used": database_used,
        }))),
    }
    .insert(&txn)
    .await?;

    let conversation_id = conversation.id;
    let mut active: ConversationActive = conversation.into();
    active.updated_at = Set(Utc::now().into());
    active.update(&txn).await?;

    txn.commit().await?;

    let message = order
        .as_ref()
        .map(format_order_message)
        .unwrap_or_else(|| ai_response.clone());

    Ok(ChatResponse {
        conversation_id,
        user_message_id: user_message.id,
        ai_response,
        ai_message_id: ai_message.id,
        action: intent.action().to_string(),
        database_used,
        data: order,
        message,
    })
}

pub async fn get_or_create_user<C>(conn: &C, username: &str, email: &str) -> Result<UserModel, DbErr>
where
    C: ConnectionTrait,
{
    let existing = Users::find()
        .filter(UserCol::Email.eq(email))
        .order_by_asc(UserCol::Id)
        .one(conn)
        .await?;
    if let Some(user) = existing {
        return Ok(user);
    }

    let first_name = username.split('@').next().unwrap_or(username);
    UserActive {
        id: NotSet,
        first_name: Set(first_name.to_string()),
        last_name: Set(String::new()),
        email: Set(email.to_string()),
        created_at: Set(Some(Utc::now().into())),
        ..Default::default()
    }
    .insert(conn)
    .await
}

/// Look up a conversation owned by `user_id`, or start a new one when no id
/// was supplied.
pub async fn resolve_conversation<C>(
    conn: &C,
    user_id: i64,
    conversation: ConversationRef,
) -> AppResult<ConversationModel>
where
    C: ConnectionTrait,
{
    match conversation {
        ConversationRef::Existing(id) => {
            let conversation = Conversations::find_by_id(id)
                .one(conn)
                .await
                .map_err(AppError::ConversationProcessing)?;
            match conversation {
                Some(c) if c.user_id == user_id => Ok(c),
                _ => Err(AppError::NotFound("Invalid conversation ID".into())),
            }
        }
        ConversationRef::Invalid => Err(AppError::NotFound("Invalid conversation ID".into())),
        ConversationRef::New => create_conversation(conn, user_id, DEFAULT_CONVERSATION_TITLE)
            .await
            .map_err(AppError::ConversationProcessing),
    }
}

async fn create_conversation<C>(conn: &C, user_id: i64, title: &str) -> Result<ConversationModel, DbErr>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    ConversationActive {
        id: NotSet,
        user_id: Set(user_id),
        title: Set(Some(title.to_string())),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(conn)
    .await
}

async fn conversation_history<C>(conn: &C, conversation_id: i64) -> Result<Vec<ChatTurn>, DbErr>
where
    C: ConnectionTrait,
{
    let messages = Messages::find()
        .filter(MessageCol::ConversationId.eq(conversation_id))
        .order_by_asc(MessageCol::CreatedAt)
        .order_by_asc(MessageCol::Id)
        .all(conn)
        .await?;

    Ok(messages
        .into_iter()
        .map(|m| {
            if m.is_from_user {
                ChatTurn::user(m.content)
            } else {
                ChatTurn::assistant(m.content)
            }
        })
        .collect())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::non_blank;

    #[test]
    fn blank_strings_count_as_missing() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some("a@b.c".into())), Some("a@b.c".into()));
    }
}
