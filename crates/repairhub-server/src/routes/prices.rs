use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};

use repairhub_core::PageParams;
use repairhub_core::models::{
    ModelRepairUpdate, NewModelRepair, NewPrice, NewRepairPrice, PriceUpdate, RepairPriceUpdate,
};

use crate::dto::{ModelRepairPairQuery, PriceHistoryQuery, StatisticsQuery};
use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/prices/model-repairs/", post(create_model_repair))
        .route(
            "/prices/model-repairs/by-model/{id}",
            get(model_repairs_by_model),
        )
        .route(
            "/prices/model-repairs/by-repair-type/{id}",
            get(model_repairs_by_repair_type),
        )
        .route(
            "/prices/model-repairs/{id}",
            get(get_model_repair)
                .put(update_model_repair)
                .delete(delete_model_repair),
        )
        .route("/prices/repair-prices/", post(create_repair_price))
        .route(
            "/prices/repair-prices/by-model/{id}",
            get(repair_prices_by_model),
        )
        .route(
            "/prices/repair-prices/by-repair/{id}",
            get(repair_prices_by_repair),
        )
        .route(
            "/prices/repair-prices/statistics/",
            get(repair_price_statistics),
        )
        .route(
            "/prices/repair-prices/{id}",
            get(get_repair_price)
                .put(update_repair_price)
                .delete(delete_repair_price),
        )
        .route("/prices/prices/", post(create_price))
        .route(
            "/prices/prices/by-service-center/{id}",
            get(prices_by_service_center),
        )
        .route(
            "/prices/prices/by-model-and-repair/",
            get(prices_by_model_and_repair),
        )
        .route("/prices/prices/comparison/", get(compare_prices))
        .route("/prices/prices/history/", get(price_history))
        .route(
            "/prices/prices/{id}",
            get(get_price).put(update_price).delete(delete_price),
        )
}

// ---------------------------------------------------------------------------
// Model repairs
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/prices/model-repairs/by-model/{id}",
    params(("id" = i64, Path, description = "Device model ID"), PageParams),
    responses((status = 200, description = "Repairs applicable to the model", body = repairhub_core::Page<repairhub_core::models::ModelRepair>)),
    tag = "prices"
)]
pub async fn model_repairs_by_model(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.price_repo().model_repairs_by_model(id, params).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/prices/model-repairs/by-repair-type/{id}",
    params(("id" = i64, Path, description = "Repair type ID"), PageParams),
    responses((status = 200, description = "Models the repair type applies to", body = repairhub_core::Page<repairhub_core::models::ModelRepair>)),
    tag = "prices"
)]
pub async fn model_repairs_by_repair_type(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state
            .db
            .price_repo()
            .model_repairs_by_repair_type(id, params)
            .await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/prices/model-repairs/",
    request_body = NewModelRepair,
    responses(
        (status = 201, description = "Created model repair", body = repairhub_core::models::ModelRepair),
        (status = 400, description = "Pair already exists", body = crate::dto::ErrorResponse),
        (status = 404, description = "Model or repair type not found", body = crate::dto::ErrorResponse),
    ),
    tag = "prices"
)]
pub async fn create_model_repair(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<NewModelRepair>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = state.db.price_repo().create_model_repair(&body).await?;
    Ok((StatusCode::CREATED, axum::Json(entry)))
}

#[utoipa::path(
    get,
    path = "/api/v1/prices/model-repairs/{id}",
    params(("id" = i64, Path, description = "Model repair ID")),
    responses(
        (status = 200, description = "Model repair", body = repairhub_core::models::ModelRepair),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "prices"
)]
pub async fn get_model_repair(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.price_repo().require_model_repair(id).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/prices/model-repairs/{id}",
    params(("id" = i64, Path, description = "Model repair ID")),
    request_body = ModelRepairUpdate,
    responses(
        (status = 200, description = "Updated model repair", body = repairhub_core::models::ModelRepair),
        (status = 400, description = "Pair already exists", body = crate::dto::ErrorResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "prices"
)]
pub async fn update_model_repair(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    axum::Json(body): axum::Json<ModelRepairUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.price_repo().update_model_repair(id, &body).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/prices/model-repairs/{id}",
    params(("id" = i64, Path, description = "Model repair ID")),
    responses(
        (status = 200, description = "Deleted model repair", body = repairhub_core::models::ModelRepair),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "prices"
)]
pub async fn delete_model_repair(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = state.db.price_repo();
    let entry = repo.require_model_repair(id).await?;
    repo.delete_model_repair(id).await?;
    Ok(axum::Json(entry))
}

// ---------------------------------------------------------------------------
// Repair prices
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/prices/repair-prices/by-model/{id}",
    params(("id" = i64, Path, description = "Device model ID"), PageParams),
    responses((status = 200, description = "Reference prices for the model", body = repairhub_core::Page<repairhub_core::models::RepairPrice>)),
    tag = "prices"
)]
pub async fn repair_prices_by_model(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.price_repo().repair_prices_by_model(id, params).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/prices/repair-prices/by-repair/{id}",
    params(("id" = i64, Path, description = "Repair ID"), PageParams),
    responses((status = 200, description = "Reference prices for the repair", body = repairhub_core::Page<repairhub_core::models::RepairPrice>)),
    tag = "prices"
)]
pub async fn repair_prices_by_repair(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.price_repo().repair_prices_by_repair(id, params).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/prices/repair-prices/statistics/",
    params(StatisticsQuery),
    responses((status = 200, description = "Aggregate over matching reference prices", body = repairhub_core::models::PriceStatistics)),
    tag = "prices"
)]
pub async fn repair_price_statistics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatisticsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = state
        .db
        .price_repo()
        .repair_price_statistics(query.repair_id, query.device_model_id)
        .await?;
    Ok(axum::Json(stats))
}

#[utoipa::path(
    post,
    path = "/api/v1/prices/repair-prices/",
    request_body = NewRepairPrice,
    responses(
        (status = 201, description = "Created repair price", body = repairhub_core::models::RepairPrice),
        (status = 400, description = "Pair already exists", body = crate::dto::ErrorResponse),
        (status = 404, description = "Model or repair not found", body = crate::dto::ErrorResponse),
    ),
    tag = "prices"
)]
pub async fn create_repair_price(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<NewRepairPrice>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = state.db.price_repo().create_repair_price(&body).await?;
    Ok((StatusCode::CREATED, axum::Json(entry)))
}

#[utoipa::path(
    get,
    path = "/api/v1/prices/repair-prices/{id}",
    params(("id" = i64, Path, description = "Repair price ID")),
    responses(
        (status = 200, description = "Repair price", body = repairhub_core::models::RepairPrice),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "prices"
)]
pub async fn get_repair_price(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.price_repo().require_repair_price(id).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/prices/repair-prices/{id}",
    params(("id" = i64, Path, description = "Repair price ID")),
    request_body = RepairPriceUpdate,
    responses(
        (status = 200, description = "Updated repair price", body = repairhub_core::models::RepairPrice),
        (status = 400, description = "Pair already exists", body = crate::dto::ErrorResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "prices"
)]
pub async fn update_repair_price(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    axum::Json(body): axum::Json<RepairPriceUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.price_repo().update_repair_price(id, &body).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/prices/repair-prices/{id}",
    params(("id" = i64, Path, description = "Repair price ID")),
    responses(
        (status = 200, description = "Deleted repair price", body = repairhub_core::models::RepairPrice),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "prices"
)]
pub async fn delete_repair_price(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = state.db.price_repo();
    let entry = repo.require_repair_price(id).await?;
    repo.delete_repair_price(id).await?;
    Ok(axum::Json(entry))
}

// ---------------------------------------------------------------------------
// Service center prices
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/prices/prices/by-service-center/{id}",
    params(("id" = i64, Path, description = "Service center ID"), PageParams),
    responses((status = 200, description = "Prices offered by the center", body = repairhub_core::Page<repairhub_core::models::Price>)),
    tag = "prices"
)]
pub async fn prices_by_service_center(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state
            .db
            .price_repo()
            .prices_by_service_center(id, params)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/prices/prices/by-model-and-repair/",
    params(ModelRepairPairQuery, PageParams),
    responses((status = 200, description = "Center prices for the model and repair", body = repairhub_core::Page<repairhub_core::models::Price>)),
    tag = "prices"
)]
pub async fn prices_by_model_and_repair(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ModelRepairPairQuery>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .db
        .price_repo()
        .prices_by_model_and_repair(query.device_model_id, query.repair_id, params)
        .await?;
    Ok(axum::Json(page))
}

#[utoipa::path(
    get,
    path = "/api/v1/prices/prices/comparison/",
    params(ModelRepairPairQuery),
    responses((status = 200, description = "Price spread across service centers, cheapest first", body = repairhub_core::models::PriceComparison)),
    tag = "prices"
)]
pub async fn compare_prices(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ModelRepairPairQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let comparison = state
        .db
        .price_repo()
        .compare_prices(query.device_model_id, query.repair_id)
        .await?;
    Ok(axum::Json(comparison))
}

#[utoipa::path(
    get,
    path = "/api/v1/prices/prices/history/",
    params(PriceHistoryQuery),
    responses((status = 200, description = "Recorded price changes, newest first", body = Vec<repairhub_core::models::PriceAnalytic>)),
    tag = "prices"
)]
pub async fn price_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PriceHistoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let history = state
        .db
        .price_repo()
        .price_history(query.repair_price_id, query.service_center_id)
        .await?;
    Ok(axum::Json(history))
}

#[utoipa::path(
    post,
    path = "/api/v1/prices/prices/",
    request_body = NewPrice,
    responses(
        (status = 201, description = "Created price", body = repairhub_core::models::Price),
        (status = 400, description = "The center already prices this repair", body = crate::dto::ErrorResponse),
        (status = 404, description = "Center or repair price not found", body = crate::dto::ErrorResponse),
    ),
    tag = "prices"
)]
pub async fn create_price(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<NewPrice>,
) -> Result<impl IntoResponse, ApiError> {
    let price = state.db.price_repo().create_price(&body).await?;
    Ok((StatusCode::CREATED, axum::Json(price)))
}

#[utoipa::path(
    get,
    path = "/api/v1/prices/prices/{id}",
    params(("id" = i64, Path, description = "Price ID")),
    responses(
        (status = 200, description = "Price", body = repairhub_core::models::Price),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "prices"
)]
pub async fn get_price(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(state.db.price_repo().require_price(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/prices/prices/{id}",
    params(("id" = i64, Path, description = "Price ID")),
    request_body = PriceUpdate,
    responses(
        (status = 200, description = "Updated price", body = repairhub_core::models::Price),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "prices"
)]
pub async fn update_price(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    axum::Json(body): axum::Json<PriceUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(state.db.price_repo().update_price(id, &body).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/prices/prices/{id}",
    params(("id" = i64, Path, description = "Price ID")),
    responses(
        (status = 200, description = "Deleted price", body = repairhub_core::models::Price),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "prices"
)]
pub async fn delete_price(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = state.db.price_repo();
    let price = repo.require_price(id).await?;
    repo.delete_price(id).await?;
    Ok(axum::Json(price))
}
