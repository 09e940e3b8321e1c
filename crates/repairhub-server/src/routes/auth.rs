use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};

use repairhub_core::AppError;
use repairhub_core::models::{NewUser, UserRole, UserUpdate};

use crate::auth::CurrentUser;
use crate::dto::{
    LoginRequest, MessageResponse, PasswordChangeRequest, ProfileUpdate, RegisterRequest,
    TokenResponse,
};
use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/me", get(me).put(update_me))
        .route("/auth/me/password", put(change_password))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access token", body = TokenResponse),
        (status = 400, description = "Inactive user", body = crate::dto::ErrorResponse),
        (status = 401, description = "Incorrect email or password", body = crate::dto::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let rejected = || AppError::Unauthorized("Incorrect email or password".into());

    let user = state
        .db
        .user_repo()
        .get_by_email(&body.email)
        .await?
        .ok_or_else(rejected)?;
    let hash = user.password_hash.as_deref().ok_or_else(rejected)?;
    if !state.tokens.verify_password(&body.password, hash).await? {
        return Err(rejected().into());
    }
    if !user.is_active {
        return Err(AppError::BadRequest("Inactive user".into()).into());
    }

    let (access_token, expires_at) = state.tokens.issue(&user)?;
    tracing::info!(user_id = user.id, "User logged in");
    Ok(axum::Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_at,
        user,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered user", body = repairhub_core::models::User),
        (status = 400, description = "Invalid input or email taken", body = crate::dto::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    body.validate()?;
    let password_hash = state.tokens.hash_password(&body.password).await?;
    let user = state
        .db
        .user_repo()
        .create(&NewUser {
            email: Some(body.email.trim().to_string()),
            password_hash: Some(password_hash),
            full_name: body.full_name,
            phone: body.phone,
            role: UserRole::User,
            is_active: true,
            ..NewUser::default()
        })
        .await?;
    Ok((StatusCode::CREATED, axum::Json(user)))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current user", body = repairhub_core::models::User),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn me(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    axum::Json(user)
}

#[utoipa::path(
    put,
    path = "/api/v1/auth/me",
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Updated user", body = repairhub_core::models::User),
        (status = 400, description = "Email taken", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    axum::Json(body): axum::Json<ProfileUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let update = UserUpdate {
        email: body.email,
        full_name: body.full_name,
        phone: body.phone,
        ..UserUpdate::default()
    };
    let user = state.db.user_repo().update(user.id, &update).await?;
    Ok(axum::Json(user))
}

#[utoipa::path(
    put,
    path = "/api/v1/auth/me/password",
    request_body = PasswordChangeRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Wrong current password or mismatch", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    axum::Json(body): axum::Json<PasswordChangeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let current_ok = match user.password_hash.as_deref() {
        Some(hash) => state.tokens.verify_password(&body.current_password, hash).await?,
        None => false,
    };
    if !current_ok {
        return Err(AppError::BadRequest("Incorrect password".into()).into());
    }
    body.validate()?;

    let hash = state.tokens.hash_password(&body.new_password).await?;
    state.db.user_repo().set_password_hash(user.id, &hash).await?;
    Ok(axum::Json(MessageResponse {
        message: "Password updated successfully".to_string(),
    }))
}
