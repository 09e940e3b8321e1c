use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};

use repairhub_core::models::{
    NewClaimRequest, NewReview, NewServiceCenter, NewServiceCenterAddress, NewServiceCenterLink,
    ServiceCenterAddressUpdate, ServiceCenterLinkUpdate, ServiceCenterUpdate,
};
use repairhub_core::{AppError, PageParams};

use crate::auth::{AdminUser, CurrentUser};
use crate::dto::{ApproveQuery, CenterSearchQuery, ClaimBody, LimitQuery};
use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/service-centers/",
            get(list_service_centers).post(create_service_center),
        )
        .route("/service-centers/search/", get(search_service_centers))
        .route("/service-centers/by-city/{id}", get(service_centers_by_city))
        .route("/service-centers/by-owner/{id}", get(service_centers_by_owner))
        .route("/service-centers/top-rated/", get(top_rated_service_centers))
        .route(
            "/service-centers/{id}",
            get(get_service_center)
                .put(update_service_center)
                .delete(delete_service_center),
        )
        .route("/service-centers/{id}/detail", get(get_service_center_detail))
        .route(
            "/service-centers/{id}/addresses/",
            get(list_addresses).post(create_address),
        )
        .route(
            "/service-centers/addresses/{id}",
            get(get_address).put(update_address).delete(delete_address),
        )
        .route(
            "/service-centers/{id}/links/",
            get(list_links).post(create_link),
        )
        .route(
            "/service-centers/links/{id}",
            get(get_link).put(update_link).delete(delete_link),
        )
        .route(
            "/service-centers/{id}/reviews/",
            get(list_reviews).post(create_review),
        )
        .route("/service-centers/{id}/rating/", get(get_rating))
        .route("/service-centers/{id}/claims/", post(create_claim))
        .route("/service-centers/requests/{id}/approve", put(approve_claim))
        .route("/service-centers/requests/{id}/reject", put(reject_claim))
}

fn ensure_path_matches(path_id: i64, body_id: i64) -> Result<(), AppError> {
    if path_id != body_id {
        return Err(AppError::BadRequest(
            "service_center_id in the body does not match the path".into(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Service centers
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/service-centers/",
    params(PageParams),
    responses((status = 200, description = "Service centers", body = repairhub_core::Page<repairhub_core::models::ServiceCenterSummary>)),
    tag = "service-centers"
)]
pub async fn list_service_centers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(state.db.service_center_repo().list(params).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/service-centers/search/",
    params(CenterSearchQuery, PageParams),
    responses((status = 200, description = "Matching service centers", body = repairhub_core::Page<repairhub_core::models::ServiceCenterSummary>)),
    tag = "service-centers"
)]
pub async fn search_service_centers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CenterSearchQuery>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .db
        .service_center_repo()
        .search(&query.keyword, query.city_id, params)
        .await?;
    Ok(axum::Json(page))
}

#[utoipa::path(
    get,
    path = "/api/v1/service-centers/by-city/{id}",
    params(("id" = i64, Path, description = "City ID"), PageParams),
    responses((status = 200, description = "Service centers in the city", body = repairhub_core::Page<repairhub_core::models::ServiceCenterSummary>)),
    tag = "service-centers"
)]
pub async fn service_centers_by_city(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.service_center_repo().by_city(id, params).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/service-centers/by-owner/{id}",
    params(("id" = i64, Path, description = "Owner user ID"), PageParams),
    responses((status = 200, description = "Service centers owned by the user", body = repairhub_core::Page<repairhub_core::models::ServiceCenterSummary>)),
    tag = "service-centers"
)]
pub async fn service_centers_by_owner(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.service_center_repo().by_owner(id, params).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/service-centers/top-rated/",
    params(LimitQuery),
    responses((status = 200, description = "Centers ordered by average review rating", body = Vec<repairhub_core::models::ServiceCenterSummary>)),
    tag = "service-centers"
)]
pub async fn top_rated_service_centers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.service_center_repo().top_rated(query.limit).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/service-centers/",
    request_body = NewServiceCenter,
    responses(
        (status = 201, description = "Created service center", body = repairhub_core::models::ServiceCenter),
        (status = 400, description = "Name already used in the city", body = crate::dto::ErrorResponse),
        (status = 403, description = "Admin only"),
    ),
    security(("bearer" = [])),
    tag = "service-centers"
)]
pub async fn create_service_center(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    axum::Json(body): axum::Json<NewServiceCenter>,
) -> Result<impl IntoResponse, ApiError> {
    let center = state.db.service_center_repo().create(&body).await?;
    Ok((StatusCode::CREATED, axum::Json(center)))
}

#[utoipa::path(
    get,
    path = "/api/v1/service-centers/{id}",
    params(("id" = i64, Path, description = "Service center ID")),
    responses(
        (status = 200, description = "Service center", body = repairhub_core::models::ServiceCenter),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "service-centers"
)]
pub async fn get_service_center(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(state.db.service_center_repo().require(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/service-centers/{id}/detail",
    params(("id" = i64, Path, description = "Service center ID")),
    responses(
        (status = 200, description = "Center with city, owner, addresses, links, reviews and prices", body = repairhub_core::models::ServiceCenterDetail),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "service-centers"
)]
pub async fn get_service_center_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(state.db.service_center_repo().detail(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/service-centers/{id}",
    params(("id" = i64, Path, description = "Service center ID")),
    request_body = ServiceCenterUpdate,
    responses(
        (status = 200, description = "Updated service center", body = repairhub_core::models::ServiceCenter),
        (status = 400, description = "Name already used in the city", body = crate::dto::ErrorResponse),
        (status = 403, description = "Neither owner nor admin"),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "service-centers"
)]
pub async fn update_service_center(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    axum::Json(body): axum::Json<ServiceCenterUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = state.db.service_center_repo();
    let center = repo.require(id).await?;
    if !user.is_admin() && center.owner_id != Some(user.id) {
        return Err(AppError::Forbidden("Not enough permissions".into()).into());
    }
    Ok(axum::Json(repo.update(id, &body).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/service-centers/{id}",
    params(("id" = i64, Path, description = "Service center ID")),
    responses(
        (status = 200, description = "Deleted service center", body = repairhub_core::models::ServiceCenter),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "service-centers"
)]
pub async fn delete_service_center(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = state.db.service_center_repo();
    let center = repo.require(id).await?;
    repo.delete(id).await?;
    tracing::info!(service_center_id = id, "Service center deleted");
    Ok(axum::Json(center))
}

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/service-centers/{id}/addresses/",
    params(("id" = i64, Path, description = "Service center ID")),
    responses((status = 200, description = "Addresses of the center", body = Vec<repairhub_core::models::ServiceCenterAddress>)),
    tag = "service-centers"
)]
pub async fn list_addresses(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(state.db.service_center_repo().addresses(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/service-centers/{id}/addresses/",
    params(("id" = i64, Path, description = "Service center ID")),
    request_body = NewServiceCenterAddress,
    responses(
        (status = 201, description = "Created address", body = repairhub_core::models::ServiceCenterAddress),
        (status = 400, description = "Path and body disagree", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "service-centers"
)]
pub async fn create_address(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<i64>,
    axum::Json(body): axum::Json<NewServiceCenterAddress>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_path_matches(id, body.service_center_id)?;
    let address = state.db.service_center_repo().add_address(&body).await?;
    Ok((StatusCode::CREATED, axum::Json(address)))
}

#[utoipa::path(
    get,
    path = "/api/v1/service-centers/addresses/{id}",
    params(("id" = i64, Path, description = "Address ID")),
    responses(
        (status = 200, description = "Address", body = repairhub_core::models::ServiceCenterAddress),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "service-centers"
)]
pub async fn get_address(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.service_center_repo().require_address(id).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/service-centers/addresses/{id}",
    params(("id" = i64, Path, description = "Address ID")),
    request_body = ServiceCenterAddressUpdate,
    responses(
        (status = 200, description = "Updated address", body = repairhub_core::models::ServiceCenterAddress),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "service-centers"
)]
pub async fn update_address(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<i64>,
    axum::Json(body): axum::Json<ServiceCenterAddressUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state
            .db
            .service_center_repo()
            .update_address(id, &body)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/service-centers/addresses/{id}",
    params(("id" = i64, Path, description = "Address ID")),
    responses(
        (status = 200, description = "Deleted address", body = repairhub_core::models::ServiceCenterAddress),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "service-centers"
)]
pub async fn delete_address(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = state.db.service_center_repo();
    let address = repo.require_address(id).await?;
    repo.delete_address(id).await?;
    Ok(axum::Json(address))
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/service-centers/{id}/links/",
    params(("id" = i64, Path, description = "Service center ID")),
    responses((status = 200, description = "Links of the center", body = Vec<repairhub_core::models::ServiceCenterLink>)),
    tag = "service-centers"
)]
pub async fn list_links(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(state.db.service_center_repo().links(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/service-centers/{id}/links/",
    params(("id" = i64, Path, description = "Service center ID")),
    request_body = NewServiceCenterLink,
    responses(
        (status = 201, description = "Created link", body = repairhub_core::models::ServiceCenterLink),
        (status = 400, description = "Path and body disagree", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "service-centers"
)]
pub async fn create_link(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<i64>,
    axum::Json(body): axum::Json<NewServiceCenterLink>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_path_matches(id, body.service_center_id)?;
    let link = state.db.service_center_repo().add_link(&body).await?;
    Ok((StatusCode::CREATED, axum::Json(link)))
}

#[utoipa::path(
    get,
    path = "/api/v1/service-centers/links/{id}",
    params(("id" = i64, Path, description = "Link ID")),
    responses(
        (status = 200, description = "Link", body = repairhub_core::models::ServiceCenterLink),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "service-centers"
)]
pub async fn get_link(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.service_center_repo().require_link(id).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/service-centers/links/{id}",
    params(("id" = i64, Path, description = "Link ID")),
    request_body = ServiceCenterLinkUpdate,
    responses(
        (status = 200, description = "Updated link", body = repairhub_core::models::ServiceCenterLink),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "service-centers"
)]
pub async fn update_link(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<i64>,
    axum::Json(body): axum::Json<ServiceCenterLinkUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.service_center_repo().update_link(id, &body).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/service-centers/links/{id}",
    params(("id" = i64, Path, description = "Link ID")),
    responses(
        (status = 200, description = "Deleted link", body = repairhub_core::models::ServiceCenterLink),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "service-centers"
)]
pub async fn delete_link(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = state.db.service_center_repo();
    let link = repo.require_link(id).await?;
    repo.delete_link(id).await?;
    Ok(axum::Json(link))
}

// ---------------------------------------------------------------------------
// Reviews
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/service-centers/{id}/reviews/",
    params(("id" = i64, Path, description = "Service center ID"), PageParams),
    responses((status = 200, description = "Reviews, newest first", body = repairhub_core::Page<repairhub_core::models::Review>)),
    tag = "service-centers"
)]
pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.service_center_repo().reviews(id, params).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/service-centers/{id}/reviews/",
    params(("id" = i64, Path, description = "Service center ID")),
    request_body = NewReview,
    responses(
        (status = 201, description = "Created review", body = repairhub_core::models::Review),
        (status = 400, description = "Path and body disagree or rating outside 0..=5", body = crate::dto::ErrorResponse),
    ),
    tag = "service-centers"
)]
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    axum::Json(body): axum::Json<NewReview>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_path_matches(id, body.service_center_id)?;
    let review = state.db.service_center_repo().add_review(&body).await?;
    Ok((StatusCode::CREATED, axum::Json(review)))
}

#[utoipa::path(
    get,
    path = "/api/v1/service-centers/{id}/rating/",
    params(("id" = i64, Path, description = "Service center ID")),
    responses((status = 200, description = "Average rating and number of rated reviews", body = repairhub_core::models::RatingSummary)),
    tag = "service-centers"
)]
pub async fn get_rating(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(state.db.service_center_repo().rating(id).await?))
}

// ---------------------------------------------------------------------------
// Claim requests
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/v1/service-centers/{id}/claims/",
    params(("id" = i64, Path, description = "Service center ID")),
    request_body = ClaimBody,
    responses(
        (status = 201, description = "Pending claim request", body = repairhub_core::models::ClaimRequest),
        (status = 400, description = "Center already has an owner", body = crate::dto::ErrorResponse),
        (status = 404, description = "Center not found", body = crate::dto::ErrorResponse),
    ),
    tag = "service-centers"
)]
pub async fn create_claim(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    axum::Json(body): axum::Json<ClaimBody>,
) -> Result<impl IntoResponse, ApiError> {
    let claim = state
        .db
        .service_center_repo()
        .create_claim(&NewClaimRequest {
            service_center_id: id,
            telegram_id: body.telegram_id,
            message: body.message,
            contact: body.contact,
        })
        .await?;
    Ok((StatusCode::CREATED, axum::Json(claim)))
}

#[utoipa::path(
    put,
    path = "/api/v1/service-centers/requests/{id}/approve",
    params(("id" = i64, Path, description = "Claim request ID"), ApproveQuery),
    responses(
        (status = 200, description = "Approved claim request", body = repairhub_core::models::ClaimRequest),
        (status = 400, description = "Request is not pending", body = crate::dto::ErrorResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Request or owner not found", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "service-centers"
)]
pub async fn approve_claim(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Query(query): Query<ApproveQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state
            .db
            .service_center_repo()
            .approve_claim(id, query.owner_id)
            .await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/service-centers/requests/{id}/reject",
    params(("id" = i64, Path, description = "Claim request ID")),
    responses(
        (status = 200, description = "Rejected claim request", body = repairhub_core::models::ClaimRequest),
        (status = 400, description = "Request is not pending", body = crate::dto::ErrorResponse),
        (status = 403, description = "Admin only"),
    ),
    security(("bearer" = [])),
    tag = "service-centers"
)]
pub async fn reject_claim(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.service_center_repo().reject_claim(id).await?,
    ))
}
