//! Chat-completion client and the structured intent protocol spoken with it.
//!
//! The model is asked to answer with a JSON object of the shape
//! `{"action": "...", "payload": {...}}`. [`Intent::parse`] turns that text
//! into something the chat service can dispatch on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::config::LlmConfig;

pub const ORDER_DETAILS_ACTION: &str = "order_details";
pub const GENERAL_RESPONSE_ACTION: &str = "general_response";

pub const SYSTEM_PROMPT: &str = r#"You are an API assistant that responds with JSON only.
Analyze the user's request and respond with one of these structures:

For order inquiries:
{
    "action": "order_details",
    "payload": {"id": <order_id>}
}

For general chat:
{
    "action": "general_response",
    "payload": {"response": "your_response_here"}
}

Extract order IDs from any format (Order #123, ID: 456, etc.)"#;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("empty completion")]
    EmptyReply,

    #[error("invalid reply: {0}")]
    InvalidReply(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A provider that answers a conversation with a single JSON object.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send the conversation and return the raw content of the first choice.
    async fn complete_json(&self, messages: &[ChatTurn]) -> Result<String, LlmError>;
}

/// OpenAI-compatible chat-completions endpoint (Groq by default).
pub struct GroqClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl GroqClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl CompletionClient for GroqClient {
    async fn complete_json(&self, messages: &[ChatTurn]) -> Result<String, LlmError> {
        let body = json!({
            "model": self.model,
            "messages": messages,
            // low temperature keeps the JSON shape stable
            "temperature": 0.1,
            "response_format": { "type": "json_object" }
        });

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status, body });
        }

        let parsed: CompletionResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(LlmError::EmptyReply)
    }
}

/// The model's classification of the latest user message.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// `id` is `None` when the payload carried nothing usable as an order id.
    OrderDetails { id: Option<i64> },
    GeneralResponse(String),
    Unrecognized(String),
}

#[derive(Deserialize)]
struct RawIntent {
    action: String,
    #[serde(default)]
    payload: Value,
}

impl Intent {
    pub fn parse(content: &str) -> Result<Self, LlmError> {
        let raw: RawIntent = serde_json::from_str(content)
            .map_err(|e| LlmError::InvalidReply(e.to_string()))?;

        match raw.action.as_str() {
            ORDER_DETAILS_ACTION => Ok(Intent::OrderDetails {
                id: raw.payload.get("id").and_then(order_id_from_value),
            }),
            GENERAL_RESPONSE_ACTION => raw
                .payload
                .get("response")
                .and_then(Value::as_str)
                .map(|text| Intent::GeneralResponse(text.to_string()))
                .ok_or_else(|| {
                    LlmError::InvalidReply("general_response without payload.response".into())
                }),
            _ => Ok(Intent::Unrecognized(raw.action)),
        }
    }

    pub fn action(&self) -> &str {
        match self {
            Intent::OrderDetails { .. } => ORDER_DETAILS_ACTION,
            Intent::GeneralResponse(_) => GENERAL_RESPONSE_ACTION,
            Intent::Unrecognized(action) => action,
        }
    }
}

fn order_id_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().trim_start_matches('#').parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_order_details_with_numeric_or_string_id() {
        let intent = Intent::parse(r#"{"action":"order_details","payload":{"id":42}}"#).unwrap();
        assert_eq!(intent, Intent::OrderDetails { id: Some(42) });

        let intent =
            Intent::parse(r##"{"action":"order_details","payload":{"id":"#77"}}"##).unwrap();
        assert_eq!(intent, Intent::OrderDetails { id: Some(77) });
    }

    #[test]
    fn order_details_without_id_is_kept_for_fallback() {
        let intent = Intent::parse(r#"{"action":"order_details","payload":{}}"#).unwrap();
        assert_eq!(intent, Intent::OrderDetails { id: None });
        assert_eq!(intent.action(), "order_details");
    }

    #[test]
    fn parses_general_response() {
        let intent = Intent::parse(
            r#"{"action":"general_response","payload":{"response":"Hi there"}}"#,
        )
        .unwrap();
        assert_eq!(intent, Intent::GeneralResponse("Hi there".into()));
    }

    #[test]
    fn unknown_action_is_not_an_error() {
        let intent = Intent::parse(r#"{"action":"refund","payload":{}}"#).unwrap();
        assert_eq!(intent.action(), "refund");
        assert!(matches!(intent, Intent::Unrecognized(_)));
    }

    #[test]
    fn rejects_non_json_and_incomplete_replies() {
        assert!(matches!(
            Intent::parse("sure, here you go"),
            Err(LlmError::InvalidReply(_))
        ));
        assert!(matches!(
            Intent::parse(r#"{"action":"general_response","payload":{}}"#),
            Err(LlmError::InvalidReply(_))
        ));
    }

    #[test]
    fn chat_turns_serialize_with_lowercase_roles() {
        let value = serde_json::to_value(ChatTurn::system("x")).unwrap();
        assert_eq!(value, json!({"role": "system", "content": "x"}));
    }
}
