use std::{net::SocketAddr, sync::Arc};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use support_chat_api::{
    build_app,
    config::{self, AppConfig},
    db::{create_pool, orm_from_pool, run_migrations},
    llm::GroqClient,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(config::env_filter())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url).await?;
    let orm = orm_from_pool(&pool);

    run_migrations(&orm, "migrations").await?;

    let llm = GroqClient::from_config(&config.llm)?;
    tracing::info!(model = %config.llm.model, endpoint = %config.llm.api_url, "llm client ready");

    let state = AppState {
        pool,
        orm,
        llm: Arc::new(llm),
    };
    let app = build_app(state);

    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));
    tracing::info!("listening on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
