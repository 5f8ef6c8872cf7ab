use utoipa::{OpenApi, openapi::OpenApi as OpenApiSpec};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::chat::{ChatRequest, ChatResponse},
    models::{ConversationSummary, MessageView, OrderItemSummary, OrderSummary},
    response::ApiResponse,
    routes::{chat, conversations, health},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        chat::chat,
        conversations::list_conversations,
        conversations::list_messages
    ),
    components(
        schemas(
            ChatRequest,
            ChatResponse,
            ConversationSummary,
            MessageView,
            OrderSummary,
            OrderItemSummary,
            health::HealthData,
            ApiResponse<health::HealthData>
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Chat", description = "Support chat endpoint"),
        (name = "Conversations", description = "Conversation history endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
