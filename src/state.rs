use std::sync::Arc;

use crate::{
    db::{DbPool, OrmConn},
    llm::CompletionClient,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub llm: Arc<dyn CompletionClient>,
}
