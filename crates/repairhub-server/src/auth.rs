use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use repairhub_core::AppError;
use repairhub_core::models::User;

use crate::error::ApiError;
use crate::state::AppState;

const ACCESS_TOKEN_TYPE: &str = "access_token";

/// JWT claims carried by access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub exp: i64,
    #[serde(rename = "type")]
    pub token_type: String,
    pub jti: String,
}

/// Issues and validates HS256 access tokens and hashes passwords.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    bcrypt_cost: u32,
}

impl TokenService {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(ttl_minutes),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Lowers the bcrypt work factor; tests use the minimum.
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    /// Returns a signed token for `user` and its expiry.
    pub fn issue(&self, user: &User) -> Result<(String, DateTime<Utc>), AppError> {
        let expires_at = Utc::now() + self.ttl;
        let claims = Claims {
            sub: user.id.to_string(),
            exp: expires_at.timestamp(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Generic(format!("Failed to sign token: {e}")))?;
        Ok((token, expires_at))
    }

    /// Validates a token and returns the user id it was issued for.
    pub fn verify(&self, token: &str) -> Result<i64, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|_| credentials_error())?;
        if data.claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(credentials_error());
        }
        data.claims.sub.parse().map_err(|_| credentials_error())
    }

    pub async fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let password = password.to_owned();
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AppError::Generic(format!("Password hashing task failed: {e}")))?
            .map_err(|e| AppError::Generic(format!("Failed to hash password: {e}")))
    }

    /// `false` for a wrong password or a malformed hash.
    pub async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
            .await
            .map_err(|e| AppError::Generic(format!("Password check task failed: {e}")))
    }
}

fn credentials_error() -> AppError {
    AppError::Unauthorized("Could not validate credentials".into())
}

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

/// The active user identified by the request's bearer token.
pub struct CurrentUser(pub User);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(credentials_error)?;

        let user_id = state.tokens.verify(token.trim())?;
        let user = state
            .db
            .user_repo()
            .get(user_id)
            .await?
            .ok_or_else(credentials_error)?;
        if !user.is_active {
            return Err(AppError::BadRequest("Inactive user".into()).into());
        }
        Ok(Self(user))
    }
}

/// An active user with the admin role.
pub struct AdminUser(pub User);

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AppError::Forbidden("Not enough permissions".into()).into());
        }
        Ok(Self(user))
    }
}
