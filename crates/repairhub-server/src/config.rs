use repairhub_core::AppError;

const DEFAULT_PORT: u16 = 3000;
/// Seven days.
const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 7;

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
}

impl ServerConfig {
    /// Reads `REPAIRHUB_PORT`, `REPAIRHUB_JWT_SECRET` (required) and
    /// `REPAIRHUB_TOKEN_TTL_MINUTES`.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let jwt_secret = lookup("REPAIRHUB_JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::ConfigError("REPAIRHUB_JWT_SECRET not set".into()))?;

        let port = match lookup("REPAIRHUB_PORT") {
            None => DEFAULT_PORT,
            Some(raw) => raw.trim().parse().map_err(|_| {
                AppError::ConfigError(format!("Invalid REPAIRHUB_PORT '{raw}'"))
            })?,
        };

        let token_ttl_minutes = match lookup("REPAIRHUB_TOKEN_TTL_MINUTES") {
            None => DEFAULT_TOKEN_TTL_MINUTES,
            Some(raw) => {
                let minutes: i64 = raw.trim().parse().map_err(|_| {
                    AppError::ConfigError(format!("Invalid REPAIRHUB_TOKEN_TTL_MINUTES '{raw}'"))
                })?;
                if minutes <= 0 {
                    return Err(AppError::ConfigError(
                        "REPAIRHUB_TOKEN_TTL_MINUTES must be positive".into(),
                    ));
                }
                minutes
            }
        };

        Ok(Self {
            port,
            jwt_secret,
            token_ttl_minutes,
        })
    }
}
