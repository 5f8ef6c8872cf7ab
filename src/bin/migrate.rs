use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use support_chat_api::{
    config::env_filter,
    db::{create_pool, orm_from_pool, run_migrations},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL")?;
    let pool = create_pool(&database_url).await?;
    run_migrations(&orm_from_pool(&pool), "migrations").await?;
    println!("Schema applied");
    Ok(())
}
