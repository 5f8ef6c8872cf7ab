use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::models::OrderSummary;

/// Inbound chat turn. Every field is optional at the wire level so that a
/// missing `email` or `message` surfaces as a 400 from validation rather
/// than as an extractor rejection.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub email: Option<String>,
    pub message: Option<String>,
    pub username: Option<String>,
    /// Numeric id, numeric string, or a falsy value (`0`, `""`, `null`)
    /// to start a new conversation.
    #[schema(value_type = Option<i64>)]
    pub conversation_id: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,
}

/// What the client asked for in `conversation_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationRef {
    New,
    Existing(i64),
    /// Present but not an id; no conversation can match it.
    Invalid,
}

impl ConversationRef {
    pub fn from_value(value: Option<&Value>) -> Self {
        let Some(value) = value else {
            return ConversationRef::New;
        };
        match value {
            Value::Null | Value::Bool(false) => ConversationRef::New,
            Value::Number(n) => match n.as_i64() {
                Some(0) => ConversationRef::New,
                Some(id) => ConversationRef::Existing(id),
                None => match n.as_f64() {
                    Some(f) if f == 0.0 => ConversationRef::New,
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                        ConversationRef::Existing(f as i64)
                    }
                    _ => ConversationRef::Invalid,
                },
            },
            Value::String(s) if s.is_empty() => ConversationRef::New,
            Value::String(s) => s
                .trim()
                .parse()
                .map(ConversationRef::Existing)
                .unwrap_or(ConversationRef::Invalid),
            Value::Array(items) if items.is_empty() => ConversationRef::New,
            Value::Object(fields) if fields.is_empty() => ConversationRef::New,
            _ => ConversationRef::Invalid,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    pub conversation_id: i64,
    pub user_message_id: i64,
    pub ai_response: String,
    pub ai_message_id: i64,
    pub action: String,
    pub database_used: bool,
    pub data: Option<OrderSummary>,
    pub message: String,
}
