use std::collections::HashSet;

use repairhub_core::AppError;

/// Settings shared by both bots.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    /// Telegram user ids allowed to approve and reject ownership claims.
    pub admin_ids: HashSet<i64>,
    pub database_url: String,
}

impl BotConfig {
    /// Reads `TELEGRAM_BOT_TOKEN` and `DATABASE_URL` (both required) and
    /// the comma-separated `REPAIRHUB_ADMIN_IDS`.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let token = required(&lookup, "TELEGRAM_BOT_TOKEN")?;
        let database_url = required(&lookup, "DATABASE_URL")?;
        let admin_ids = match lookup("REPAIRHUB_ADMIN_IDS") {
            Some(raw) => parse_admin_ids(&raw)?,
            None => HashSet::new(),
        };
        Ok(Self {
            token,
            admin_ids,
            database_url,
        })
    }

    pub fn is_admin(&self, telegram_id: i64) -> bool {
        self.admin_ids.contains(&telegram_id)
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, AppError> {
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::ConfigError(format!("{key} not set")))
}

fn parse_admin_ids(raw: &str) -> Result<HashSet<i64>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .map_err(|_| AppError::ConfigError(format!("Invalid admin id '{s}'")))
        })
        .collect()
}
