use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, FromRow)]
pub struct ConversationSummary {
    pub id: i64,
    pub title: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub message_count: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, FromRow)]
pub struct MessageView {
    pub id: i64,
    pub content: String,
    pub is_from_user: bool,
    pub created_at: DateTime<Utc>,
}

/// What the assistant reports back about a looked-up order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderSummary {
    pub order_id: i64,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
    pub num_items: i32,
    pub items: Vec<OrderItemSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItemSummary {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub price: Option<f64>,
    pub status: String,
}
