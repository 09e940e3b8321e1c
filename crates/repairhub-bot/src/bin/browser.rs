use std::sync::Arc;

use anyhow::Context;
use teloxide::Bot;
use tracing_subscriber::EnvFilter;

use repairhub_bot::BotConfig;
use repairhub_bot::browser::{self, BrowserContext};
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

    let bot = Bot::new(config.token.clone());
    tracing::info!(admins = config.admin_ids.len(), "Starting service-center bot");
    browser::run(
        bot,
        BrowserContext {
            db,
            config: Arc::new(config),
        },
    )
    .await;

    Ok(())
}
