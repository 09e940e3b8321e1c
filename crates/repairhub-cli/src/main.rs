use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use repairhub_client::{ApiSink, PedantParser, PriceSelectors, ReqwestFetcher, ZoonParser};
use repairhub_core::crawl::{CrawlService, PriceCrawlService, TracingCrawlReporter};
use repairhub_core::models::{NewUser, UserRole};
use repairhub_core::throttle::{ThrottleConfig, ThrottledFetcher};
use repairhub_core::traits::{CatalogSink, NullSink};
use repairhub_db::{Database, DatabaseConfig};

#[derive(Parser)]
#[command(name = "repairhub", version, about = "RepairHub crawlers and maintenance tasks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct SinkArgs {
    /// Base URL of the RepairHub API, including `/api/v1`
    #[arg(
        long,
        env = "REPAIRHUB_API_URL",
        default_value = "http://localhost:3000/api/v1"
    )]
    api_url: String,

    /// Bearer token sent with every API request
    #[arg(long, env = "REPAIRHUB_API_TOKEN")]
    api_token: Option<String>,

    /// Parse and log only; send nothing to the API
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Minimum delay between two requests to the scraped site, in milliseconds
    #[arg(long, env = "REPAIRHUB_CRAWL_DELAY_MS", default_value_t = 1000)]
    delay_ms: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a zoon.ru service-center listing and replay it into the API
    Zoon {
        /// First listing page, e.g. https://zoon.ru/msk/electronics/type/remont_telefonov/.
        /// Repeat for several cities.
        #[arg(short, long = "url", required = true)]
        urls: Vec<String>,

        #[command(flatten)]
        sink: SinkArgs,
    },

    /// Scrape a pedant.ru price page and replay reference prices into the API
    Pedant {
        /// Device price page URL
        #[arg(short, long)]
        url: String,

        /// CSS selector of one price row
        #[arg(long)]
        row_selector: Option<String>,

        /// CSS selector of the repair name inside a row
        #[arg(long)]
        name_selector: Option<String>,

        /// CSS selector of the price inside a row
        #[arg(long)]
        price_selector: Option<String>,

        #[command(flatten)]
        sink: SinkArgs,
    },

    /// Apply pending database migrations
    Migrate,

    /// Create an admin account, or promote an existing one
    CreateAdmin {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "REPAIRHUB_ADMIN_PASSWORD")]
        password: String,

        #[arg(long)]
        full_name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("repairhub=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Zoon { urls, sink } => {
            let cancel = cancel_on_ctrl_c();
            let fetcher = throttled_fetcher(sink.delay_ms)?;
            if sink.dry_run {
                cmd_zoon(&urls, fetcher, NullSink, &cancel).await?;
            } else {
                let api = ApiSink::new(&sink.api_url, sink.api_token)?;
                cmd_zoon(&urls, fetcher, api, &cancel).await?;
            }
        }
        Commands::Pedant {
            url,
            row_selector,
            name_selector,
            price_selector,
            sink,
        } => {
            let defaults = PriceSelectors::default();
            let selectors = PriceSelectors {
                row: row_selector.unwrap_or(defaults.row),
                name: name_selector.unwrap_or(defaults.name),
                price: price_selector.unwrap_or(defaults.price),
            };
            let parser = PedantParser::with_selectors(&selectors)?;
            let fetcher = throttled_fetcher(sink.delay_ms)?;
            if sink.dry_run {
                cmd_pedant(&url, fetcher, parser, NullSink).await?;
            } else {
                let api = ApiSink::new(&sink.api_url, sink.api_token)?;
                cmd_pedant(&url, fetcher, parser, api).await?;
            }
        }
        Commands::Migrate => {
            let db = connect_db().await?;
            db.migrate().await?;
            tracing::info!("Migrations applied");
        }
        Commands::CreateAdmin {
            email,
            password,
            full_name,
        } => {
            let db = connect_db().await?;
            cmd_create_admin(&db, &email, &password, full_name).await?;
        }
    }

    Ok(())
}

/// Connect to PostgreSQL using DATABASE_URL.
async fn connect_db() -> Result<Database> {
    let config = DatabaseConfig::from_env().context("DATABASE_URL not set")?;
    Database::connect(&config)
        .await
        .context("Failed to connect to database")
}

fn throttled_fetcher(delay_ms: u64) -> Result<ThrottledFetcher<ReqwestFetcher>> {
    let fetcher = ReqwestFetcher::new().context("Failed to create HTTP client")?;
    let config = ThrottleConfig::new(Duration::from_millis(delay_ms))
        .with_jitter(Duration::from_millis(delay_ms / 2));
    Ok(ThrottledFetcher::new(fetcher, config))
}

/// A token cancelled on the first Ctrl+C; the crawl stops after the
/// center it is working on.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, finishing the current item");
            token.cancel();
        }
    });
    cancel
}

async fn cmd_zoon<S: CatalogSink>(
    urls: &[String],
    fetcher: ThrottledFetcher<ReqwestFetcher>,
    sink: S,
    cancel: &CancellationToken,
) -> Result<()> {
    let parser = ZoonParser::new()?;
    let service = CrawlService::new(fetcher, parser, sink);
    let results = service.crawl_all(urls, cancel, &TracingCrawlReporter).await;
    println!("{}", serde_json::to_string_pretty(&results)?);
    if !results.is_empty() && results.iter().all(|r| r.error.is_some()) {
        anyhow::bail!("Every start URL failed");
    }
    Ok(())
}

async fn cmd_pedant<S: CatalogSink>(
    url: &str,
    fetcher: ThrottledFetcher<ReqwestFetcher>,
    parser: PedantParser,
    sink: S,
) -> Result<()> {
    let service = PriceCrawlService::new(fetcher, parser, sink);
    let summary = service.crawl_prices(url).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn cmd_create_admin(
    db: &Database,
    email: &str,
    password: &str,
    full_name: Option<String>,
) -> Result<()> {
    if password.chars().count() < 8 {
        anyhow::bail!("Password must be at least 8 characters long");
    }
    let password_hash =
        bcrypt::hash(password, bcrypt::DEFAULT_COST).context("Failed to hash password")?;

    let users = db.user_repo();
    let user = match users.get_by_email(email).await? {
        Some(existing) => {
            users.set_password_hash(existing.id, &password_hash).await?;
            let user = users.set_role(existing.id, UserRole::Admin).await?;
            tracing::info!(user_id = user.id, "Existing user promoted to admin");
            user
        }
        None => {
            let user = users
                .create(&NewUser {
                    email: Some(email.to_string()),
                    password_hash: Some(password_hash),
                    full_name,
                    role: UserRole::Admin,
                    is_active: true,
                    ..NewUser::default()
                })
                .await?;
            tracing::info!(user_id = user.id, "Admin created");
            user
        }
    };

    println!("{}", serde_json::to_string_pretty(&user)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn dry_run_flag_parses() {
        let cli = Cli::try_parse_from([
            "repairhub",
            "zoon",
            "--url",
            "https://zoon.ru/msk/electronics/",
            "-u",
            "https://zoon.ru/spb/electronics/",
            "--dry-run",
            "--delay-ms",
            "250",
        ])
        .unwrap();
        match cli.command {
            Commands::Zoon { urls, sink } => {
                assert_eq!(
                    urls,
                    ["https://zoon.ru/msk/electronics/", "https://zoon.ru/spb/electronics/"]
                );
                assert!(sink.dry_run);
                assert_eq!(sink.delay_ms, 250);
            }
            _ => panic!("expected zoon"),
        }
    }
}
