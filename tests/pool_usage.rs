mod common;

use std::{sync::Arc, time::Duration};

use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use support_chat_api::{
    dto::chat::ChatRequest,
    services::{chat_service, conversation_service},
};

use common::{ScriptedLlm, db_state_with};

// The completion call runs with no pooled connection checked out, so a pool
// of one can still serve other queries while the model is answering.
#[tokio::test]
async fn completion_runs_without_holding_a_connection() -> anyhow::Result<()> {
    let llm = Arc::new(ScriptedLlm::default());
    let options = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(2));
    let Some(state) = db_state_with(llm.clone(), options).await? else {
        return Ok(());
    };
    llm.check_pool_during_calls(state.pool.clone());

    llm.push(json!({ "action": "general_response", "payload": { "response": "Hello!" } }));
    let request = ChatRequest {
        email: Some("solo@example.com".into()),
        message: Some("hi".into()),
        ..Default::default()
    };
    let reply = chat_service::handle_chat(&state, request).await?;
    assert_eq!(reply.ai_response, "Hello!");
    assert_eq!(llm.pool_checks(), vec![true]);

    let messages = conversation_service::list_messages(&state.pool, reply.conversation_id).await?;
    assert_eq!(messages.len(), 2);
    Ok(())
}
