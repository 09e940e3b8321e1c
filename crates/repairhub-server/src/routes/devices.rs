use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;

use repairhub_core::PageParams;
use repairhub_core::models::{
    DeviceBrandUpdate, DeviceModelUpdate, NewDeviceBrand, NewDeviceModel,
};

use crate::dto::{KeywordQuery, ModelSearchQuery};
use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/devices/brands/", get(list_brands).post(create_brand))
        .route("/devices/brands/search/", get(search_brands))
        .route(
            "/devices/brands/{id}",
            get(get_brand).put(update_brand).delete(delete_brand),
        )
        .route("/devices/brands/{id}/with-models", get(get_brand_with_models))
        .route("/devices/brands/{id}/models/", get(list_brand_models))
        .route("/devices/models/", get(list_models).post(create_model))
        .route("/devices/models/search/", get(search_models))
        .route(
            "/devices/models/{id}",
            get(get_model).put(update_model).delete(delete_model),
        )
}

// ---------------------------------------------------------------------------
// Brands
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/devices/brands/",
    params(PageParams),
    responses((status = 200, description = "Brands", body = repairhub_core::Page<repairhub_core::models::DeviceBrand>)),
    tag = "devices"
)]
pub async fn list_brands(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(state.db.device_repo().list_brands(params).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/devices/brands/search/",
    params(KeywordQuery, PageParams),
    responses((status = 200, description = "Brands whose name contains the keyword", body = repairhub_core::Page<repairhub_core::models::DeviceBrand>)),
    tag = "devices"
)]
pub async fn search_brands(
    State(state): State<Arc<AppState>>,
    Query(query): Query<KeywordQuery>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state
            .db
            .device_repo()
            .search_brands(&query.keyword, params)
            .await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/devices/brands/",
    request_body = NewDeviceBrand,
    responses(
        (status = 201, description = "Created brand", body = repairhub_core::models::DeviceBrand),
        (status = 400, description = "Name taken", body = crate::dto::ErrorResponse),
    ),
    tag = "devices"
)]
pub async fn create_brand(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<NewDeviceBrand>,
) -> Result<impl IntoResponse, ApiError> {
    let brand = state.db.device_repo().create_brand(&body).await?;
    Ok((StatusCode::CREATED, axum::Json(brand)))
}

#[utoipa::path(
    get,
    path = "/api/v1/devices/brands/{id}",
    params(("id" = i64, Path, description = "Brand ID")),
    responses(
        (status = 200, description = "Brand", body = repairhub_core::models::DeviceBrand),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "devices"
)]
pub async fn get_brand(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(state.db.device_repo().require_brand(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/devices/brands/{id}/with-models",
    params(("id" = i64, Path, description = "Brand ID")),
    responses(
        (status = 200, description = "Brand with its models", body = repairhub_core::models::BrandWithModels),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "devices"
)]
pub async fn get_brand_with_models(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(state.db.device_repo().brand_with_models(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/devices/brands/{id}",
    params(("id" = i64, Path, description = "Brand ID")),
    request_body = DeviceBrandUpdate,
    responses(
        (status = 200, description = "Updated brand", body = repairhub_core::models::DeviceBrand),
        (status = 400, description = "Name taken", body = crate::dto::ErrorResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "devices"
)]
pub async fn update_brand(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    axum::Json(body): axum::Json<DeviceBrandUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.device_repo().update_brand(id, &body).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/devices/brands/{id}",
    params(("id" = i64, Path, description = "Brand ID")),
    responses(
        (status = 200, description = "Deleted brand", body = repairhub_core::models::DeviceBrand),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "devices"
)]
pub async fn delete_brand(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = state.db.device_repo();
    let brand = repo.require_brand(id).await?;
    repo.delete_brand(id).await?;
    Ok(axum::Json(brand))
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/devices/models/",
    params(PageParams),
    responses((status = 200, description = "Device models", body = repairhub_core::Page<repairhub_core::models::DeviceModel>)),
    tag = "devices"
)]
pub async fn list_models(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(state.db.device_repo().list_models(params).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/devices/brands/{id}/models/",
    params(("id" = i64, Path, description = "Brand ID"), PageParams),
    responses(
        (status = 200, description = "Models of the brand", body = repairhub_core::Page<repairhub_core::models::DeviceModel>),
        (status = 404, description = "Brand not found", body = crate::dto::ErrorResponse),
    ),
    tag = "devices"
)]
pub async fn list_brand_models(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.device_repo().models_by_brand(id, params).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/devices/models/search/",
    params(ModelSearchQuery, PageParams),
    responses((status = 200, description = "Matching models", body = repairhub_core::Page<repairhub_core::models::DeviceModel>)),
    tag = "devices"
)]
pub async fn search_models(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ModelSearchQuery>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .db
        .device_repo()
        .search_models(query.keyword.as_deref(), query.brand_id, params)
        .await?;
    Ok(axum::Json(page))
}

#[utoipa::path(
    post,
    path = "/api/v1/devices/models/",
    request_body = NewDeviceModel,
    responses(
        (status = 201, description = "Created model", body = repairhub_core::models::DeviceModel),
        (status = 404, description = "Brand not found", body = crate::dto::ErrorResponse),
    ),
    tag = "devices"
)]
pub async fn create_model(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<NewDeviceModel>,
) -> Result<impl IntoResponse, ApiError> {
    let model = state.db.device_repo().create_model(&body).await?;
    Ok((StatusCode::CREATED, axum::Json(model)))
}

#[utoipa::path(
    get,
    path = "/api/v1/devices/models/{id}",
    params(("id" = i64, Path, description = "Model ID")),
    responses(
        (status = 200, description = "Device model", body = repairhub_core::models::DeviceModel),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "devices"
)]
pub async fn get_model(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(state.db.device_repo().require_model(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/devices/models/{id}",
    params(("id" = i64, Path, description = "Model ID")),
    request_body = DeviceModelUpdate,
    responses(
        (status = 200, description = "Updated model", body = repairhub_core::models::DeviceModel),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "devices"
)]
pub async fn update_model(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    axum::Json(body): axum::Json<DeviceModelUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.device_repo().update_model(id, &body).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/devices/models/{id}",
    params(("id" = i64, Path, description = "Model ID")),
    responses(
        (status = 200, description = "Deleted model", body = repairhub_core::models::DeviceModel),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "devices"
)]
pub async fn delete_model(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = state.db.device_repo();
    let model = repo.require_model(id).await?;
    repo.delete_model(id).await?;
    Ok(axum::Json(model))
}
