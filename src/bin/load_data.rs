use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use support_chat_api::{
    config::env_filter,
    db::create_pool,
    loader::{Table, load_file, load_order},
};

/// Import the e-commerce CSV dataset into the database.
#[derive(Parser)]
#[command(name = "load_data", version, about)]
struct Cli {
    /// Directory holding `<table>.csv` files
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// Tables to load; always processed in dependency order
    #[arg(long, value_enum, value_delimiter = ',')]
    tables: Vec<Table>,

    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let tables = if cli.tables.is_empty() {
        Table::ALL.to_vec()
    } else {
        cli.tables
    };

    let pool = create_pool(&cli.database_url).await?;
    // Each file commits on its own, so report it as soon as it lands.
    for table in load_order(&tables) {
        match load_file(&pool, &cli.data_dir, table).await {
            Ok(rows) => println!("Loaded {rows} {table}"),
            Err(err) => {
                tracing::error!(error = %err, "load aborted, current table rolled back");
                return Err(err.into());
            }
        }
    }
    println!("All data loaded successfully!");
    Ok(())
}
