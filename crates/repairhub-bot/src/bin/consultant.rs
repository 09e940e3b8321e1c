use anyhow::Context;
use teloxide::Bot;
use tracing_subscriber::EnvFilter;

use repairhub_bot::BotConfig;
use repairhub_bot::consultant::{self, ConsultantContext};
use repairhub_db::{Database, DatabaseConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("repairhub=info".parse()?))
        .with_target(false)
        .init();

    let config = BotConfig::from_env().context("Invalid bot configuration")?;
    let db = Database::connect(&DatabaseConfig::new(config.database_url.clone()))
        .await
        .context("Failed to connect to the database")?;

    tracing::info!("Starting consultation bot");
    consultant::run(Bot::new(config.token), ConsultantContext { db }).await;

    Ok(())
}
