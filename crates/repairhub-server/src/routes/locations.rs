use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;

use repairhub_core::PageParams;
use repairhub_core::models::{CityUpdate, NewCity, NewRegion, RegionUpdate};

use crate::dto::{CitySearchQuery, KeywordQuery, LimitQuery};
use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/locations/regions/", get(list_regions).post(create_region))
        .route("/locations/regions/search/", get(search_regions))
        .route(
            "/locations/regions/{id}",
            get(get_region).put(update_region).delete(delete_region),
        )
        .route(
            "/locations/regions/{id}/with-cities",
            get(get_region_with_cities),
        )
        .route("/locations/regions/{id}/cities/", get(list_region_cities))
        .route("/locations/cities/", get(list_cities).post(create_city))
        .route("/locations/cities/largest/", get(largest_cities))
        .route("/locations/cities/search/", get(search_cities))
        .route(
            "/locations/cities/{id}",
            get(get_city).put(update_city).delete(delete_city),
        )
}

// ---------------------------------------------------------------------------
// Regions
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/locations/regions/",
    params(PageParams),
    responses((status = 200, description = "Regions", body = repairhub_core::Page<repairhub_core::models::Region>)),
    tag = "locations"
)]
pub async fn list_regions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.location_repo().list_regions(params).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/locations/regions/search/",
    params(KeywordQuery, PageParams),
    responses((status = 200, description = "Regions whose name contains the keyword", body = repairhub_core::Page<repairhub_core::models::Region>)),
    tag = "locations"
)]
pub async fn search_regions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<KeywordQuery>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state
            .db
            .location_repo()
            .search_regions(&query.keyword, params)
            .await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/locations/regions/",
    request_body = NewRegion,
    responses(
        (status = 201, description = "Created region", body = repairhub_core::models::Region),
        (status = 400, description = "Name taken", body = crate::dto::ErrorResponse),
    ),
    tag = "locations"
)]
pub async fn create_region(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<NewRegion>,
) -> Result<impl IntoResponse, ApiError> {
    let region = state.db.location_repo().create_region(&body).await?;
    Ok((StatusCode::CREATED, axum::Json(region)))
}

#[utoipa::path(
    get,
    path = "/api/v1/locations/regions/{id}",
    params(("id" = i64, Path, description = "Region ID")),
    responses(
        (status = 200, description = "Region", body = repairhub_core::models::Region),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "locations"
)]
pub async fn get_region(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(state.db.location_repo().require_region(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/locations/regions/{id}/with-cities",
    params(("id" = i64, Path, description = "Region ID")),
    responses(
        (status = 200, description = "Region with its cities", body = repairhub_core::models::RegionWithCities),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "locations"
)]
pub async fn get_region_with_cities(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.location_repo().region_with_cities(id).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/locations/regions/{id}",
    params(("id" = i64, Path, description = "Region ID")),
    request_body = RegionUpdate,
    responses(
        (status = 200, description = "Updated region", body = repairhub_core::models::Region),
        (status = 400, description = "Name taken", body = crate::dto::ErrorResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "locations"
)]
pub async fn update_region(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    axum::Json(body): axum::Json<RegionUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.location_repo().update_region(id, &body).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/locations/regions/{id}",
    params(("id" = i64, Path, description = "Region ID")),
    responses(
        (status = 200, description = "Deleted region", body = repairhub_core::models::Region),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "locations"
)]
pub async fn delete_region(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = state.db.location_repo();
    let region = repo.require_region(id).await?;
    repo.delete_region(id).await?;
    Ok(axum::Json(region))
}

// ---------------------------------------------------------------------------
// Cities
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/locations/cities/",
    params(PageParams),
    responses((status = 200, description = "Cities", body = repairhub_core::Page<repairhub_core::models::City>)),
    tag = "locations"
)]
pub async fn list_cities(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(state.db.location_repo().list_cities(params).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/locations/cities/largest/",
    params(LimitQuery),
    responses((status = 200, description = "Cities ordered by population, largest first", body = Vec<repairhub_core::models::City>)),
    tag = "locations"
)]
pub async fn largest_cities(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.location_repo().largest_cities(query.limit).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/locations/regions/{id}/cities/",
    params(("id" = i64, Path, description = "Region ID"), PageParams),
    responses(
        (status = 200, description = "Cities of the region", body = repairhub_core::Page<repairhub_core::models::City>),
        (status = 404, description = "Region not found", body = crate::dto::ErrorResponse),
    ),
    tag = "locations"
)]
pub async fn list_region_cities(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.location_repo().cities_by_region(id, params).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/locations/cities/search/",
    params(CitySearchQuery, PageParams),
    responses((status = 200, description = "Matching cities", body = repairhub_core::Page<repairhub_core::models::City>)),
    tag = "locations"
)]
pub async fn search_cities(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CitySearchQuery>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .db
        .location_repo()
        .search_cities(query.keyword.as_deref(), query.region_id, params)
        .await?;
    Ok(axum::Json(page))
}

#[utoipa::path(
    post,
    path = "/api/v1/locations/cities/",
    request_body = NewCity,
    responses(
        (status = 201, description = "Created city", body = repairhub_core::models::City),
        (status = 404, description = "Region not found", body = crate::dto::ErrorResponse),
    ),
    tag = "locations"
)]
pub async fn create_city(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<NewCity>,
) -> Result<impl IntoResponse, ApiError> {
    let city = state.db.location_repo().create_city(&body).await?;
    Ok((StatusCode::CREATED, axum::Json(city)))
}

#[utoipa::path(
    get,
    path = "/api/v1/locations/cities/{id}",
    params(("id" = i64, Path, description = "City ID")),
    responses(
        (status = 200, description = "City", body = repairhub_core::models::City),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "locations"
)]
pub async fn get_city(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(state.db.location_repo().require_city(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/locations/cities/{id}",
    params(("id" = i64, Path, description = "City ID")),
    request_body = CityUpdate,
    responses(
        (status = 200, description = "Updated city", body = repairhub_core::models::City),
        (status = 404, description = "City or region not found", body = crate::dto::ErrorResponse),
    ),
    tag = "locations"
)]
pub async fn update_city(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    axum::Json(body): axum::Json<CityUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.location_repo().update_city(id, &body).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/locations/cities/{id}",
    params(("id" = i64, Path, description = "City ID")),
    responses(
        (status = 200, description = "Deleted city", body = repairhub_core::models::City),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "locations"
)]
pub async fn delete_city(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = state.db.location_repo();
    let city = repo.require_city(id).await?;
    repo.delete_city(id).await?;
    Ok(axum::Json(city))
}
