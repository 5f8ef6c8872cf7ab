#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, Statement};
use sqlx::postgres::PgPoolOptions;
use support_chat_api::{
    db::{DbPool, orm_from_pool, run_migrations},
    llm::{ChatTurn, CompletionClient, LlmError},
    state::AppState,
};

/// Completion client that replays queued replies and records what it was sent.
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Option<String>>>,
    calls: Mutex<Vec<Vec<ChatTurn>>>,
    pool: Mutex<Option<DbPool>>,
    pool_checks: Mutex<Vec<bool>>,
}

impl ScriptedLlm {
    pub fn push(&self, reply: serde_json::Value) {
        self.replies.lock().unwrap().push_back(Some(reply.to_string()));
    }

    pub fn push_raw(&self, reply: &str) {
        self.replies.lock().unwrap().push_back(Some(reply.to_string()));
    }

    pub fn push_failure(&self) {
        self.replies.lock().unwrap().push_back(None);
    }

    pub fn last_call(&self) -> Vec<ChatTurn> {
        self.calls.lock().unwrap().last().cloned().unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// While answering, also run a query on `pool` and record whether a
    /// connection could be acquired.
    pub fn check_pool_during_calls(&self, pool: DbPool) {
        *self.pool.lock().unwrap() = Some(pool);
    }

    pub fn pool_checks(&self) -> Vec<bool> {
        self.pool_checks.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedLlm {
    async fn complete_json(&self, messages: &[ChatTurn]) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        let pool = self.pool.lock().unwrap().clone();
        if let Some(pool) = pool {
            let acquired = sqlx::query("SELECT 1").execute(&pool).await.is_ok();
            self.pool_checks.lock().unwrap().push(acquired);
        }
        match self.replies.lock().unwrap().pop_front() {
            Some(Some(reply)) => Ok(reply),
            _ => Err(LlmError::Status {
                status: 503,
                body: "scripted failure".into(),
            }),
        }
    }
}

/// State whose pool never connects; fine for paths that fail before the database.
pub fn lazy_state(llm: Arc<ScriptedLlm>) -> AppState {
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(500))
        .connect_lazy("postgres://postgres@127.0.0.1:1/unused")
        .expect("lazy pool");
    AppState {
        orm: orm_from_pool(&pool),
        pool,
        llm,
    }
}

/// Connects to `TEST_DATABASE_URL`, applies the schema and empties every table.
/// Returns `None` when no test database is configured.
pub async fn db_state(llm: Arc<ScriptedLlm>) -> anyhow::Result<Option<AppState>> {
    db_state_with(llm, PgPoolOptions::new().max_connections(5)).await
}

/// Like [`db_state`], with a caller-sized pool.
pub async fn db_state_with(
    llm: Arc<ScriptedLlm>,
    options: PgPoolOptions,
) -> anyhow::Result<Option<AppState>> {
    let Ok(database_url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("Skipping test: set TEST_DATABASE_URL to run database tests.");
        return Ok(None);
    };

    let pool = options.connect(&database_url).await?;
    let orm = orm_from_pool(&pool);
    run_migrations(&orm, concat!(env!("CARGO_MANIFEST_DIR"), "/migrations")).await?;

    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE messages, conversations, order_items, orders, inventory_items, products, distribution_centers, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(Some(AppState { pool, orm, llm }))
}
