use thiserror::Error;

/// Application-wide error types for RepairHub.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed (fetching a page or calling the API).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// HTML could not be parsed into the expected structure.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The requested entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The request violates a business rule or fails validation.
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("{0}")]
    Forbidden(String),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Builds the canonical "X with ID n not found" error.
    pub fn not_found(entity: &str, id: i64) -> Self {
        AppError::NotFound(format!("{entity} with ID {id} not found"))
    }

    /// Returns true if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::NetworkError(_) | AppError::Timeout(_) | AppError::RateLimitExceeded => true,
            AppError::HttpError(msg) => {
                msg.contains("HTTP 5")
                    || msg.contains("HTTP 429")
                    || msg.contains("timeout")
                    || msg.contains("connect")
                    || msg.contains("reset")
            }
            _ => false,
        }
    }
}
