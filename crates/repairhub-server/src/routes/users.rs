use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};

use repairhub_core::models::{NewUser, UserRole, UserUpdate};
use repairhub_core::{AppError, PageParams};

use crate::auth::AdminUser;
use crate::dto::{KeywordQuery, UserCreateRequest};
use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/", get(list_users).post(create_user))
        .route("/users/search/", get(search_users))
        .route("/users/service-owners/", get(list_service_owners))
        .route("/users/by-email/{email}", get(get_user_by_email))
        .route(
            "/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/users/{id}/deactivate", put(deactivate_user))
        .route(
            "/users/{id}/promote-to-service-owner",
            put(promote_to_service_owner),
        )
        .route("/users/{id}/promote-to-admin", put(promote_to_admin))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/",
    params(PageParams),
    responses(
        (status = 200, description = "Users", body = repairhub_core::Page<repairhub_core::models::User>),
        (status = 403, description = "Admin only"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(state.db.user_repo().list(params).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/search/",
    params(KeywordQuery, PageParams),
    responses(
        (status = 200, description = "Users matching email or full name", body = repairhub_core::Page<repairhub_core::models::User>),
        (status = 403, description = "Admin only"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn search_users(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(query): Query<KeywordQuery>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.user_repo().search(&query.keyword, params).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/service-owners/",
    params(PageParams),
    responses(
        (status = 200, description = "Users with the service_owner role", body = repairhub_core::Page<repairhub_core::models::User>),
        (status = 403, description = "Admin only"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn list_service_owners(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(state.db.user_repo().service_owners(params).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/",
    request_body = UserCreateRequest,
    responses(
        (status = 201, description = "Created user", body = repairhub_core::models::User),
        (status = 400, description = "Invalid input or email taken", body = crate::dto::ErrorResponse),
        (status = 403, description = "Admin only"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    axum::Json(body): axum::Json<UserCreateRequest>,
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
            role: body.role.unwrap_or_default(),
            is_active: body.is_active.unwrap_or(true),
            ..NewUser::default()
        })
        .await?;
    Ok((StatusCode::CREATED, axum::Json(user)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = repairhub_core::models::User),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(state.db.user_repo().require(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/by-email/{email}",
    params(("email" = String, Path, description = "Email address")),
    responses(
        (status = 200, description = "User", body = repairhub_core::models::User),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn get_user_by_email(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .user_repo()
        .get_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with email {email} not found")))?;
    Ok(axum::Json(user))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "Updated user", body = repairhub_core::models::User),
        (status = 400, description = "Email taken", body = crate::dto::ErrorResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    axum::Json(body): axum::Json<UserUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(state.db.user_repo().update(id, &body).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/deactivate",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Deactivated user", body = repairhub_core::models::User),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn deactivate_user(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(state.db.user_repo().deactivate(id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Deleted user", body = repairhub_core::models::User),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = state.db.user_repo();
    let user = repo.require(id).await?;
    repo.delete(id).await?;
    Ok(axum::Json(user))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/promote-to-service-owner",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Promoted user", body = repairhub_core::models::User),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn promote_to_service_owner(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .user_repo()
        .set_role(id, UserRole::ServiceOwner)
        .await?;
    Ok(axum::Json(user))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/promote-to-admin",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Promoted user", body = repairhub_core::models::User),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn promote_to_admin(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.db.user_repo().set_role(id, UserRole::Admin).await?;
    tracing::info!(user_id = id, promoted_by = admin.id, "User promoted to admin");
    Ok(axum::Json(user))
}
