use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;

use repairhub_core::models::{
    NewPart, NewRepair, NewRepairPart, NewRepairType, PartUpdate, RepairPartUpdate,
    RepairTypeUpdate, RepairUpdate,
};
use repairhub_core::{AppError, PageParams};

use crate::dto::{KeywordQuery, PriceRangeQuery, RepairTypeSearchQuery};
use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/repairs/", get(list_repairs).post(create_repair))
        .route("/repairs/search/", get(search_repairs))
        .route(
            "/repairs/{id}",
            get(get_repair).put(update_repair).delete(delete_repair),
        )
        .route("/repairs/{id}/with-types", get(get_repair_with_types))
        .route("/repairs/types/", get(list_repair_types).post(create_repair_type))
        .route("/repairs/types/by-group/{group_name}", get(repair_types_by_group))
        .route("/repairs/types/search/", get(search_repair_types))
        .route(
            "/repairs/types/{id}",
            get(get_repair_type)
                .put(update_repair_type)
                .delete(delete_repair_type),
        )
        .route("/repairs/types/{id}/with-parts", get(get_repair_type_with_parts))
        .route(
            "/repairs/types/{id}/parts/",
            get(list_repair_parts).post(create_repair_part),
        )
        .route("/repairs/parts/", get(list_parts).post(create_part))
        .route("/repairs/parts/by-price-range/", get(parts_by_price_range))
        .route("/repairs/parts/search/", get(search_parts))
        .route("/repairs/parts/by-sku/{sku}", get(get_part_by_sku))
        .route(
            "/repairs/parts/{id}",
            get(get_part).put(update_part).delete(delete_part),
        )
        .route(
            "/repairs/repair-parts/{id}",
            get(get_repair_part)
                .put(update_repair_part)
                .delete(delete_repair_part),
        )
}

// ---------------------------------------------------------------------------
// Repairs
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/repairs/",
    params(PageParams),
    responses((status = 200, description = "Repairs", body = repairhub_core::Page<repairhub_core::models::Repair>)),
    tag = "repairs"
)]
pub async fn list_repairs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(state.db.repair_repo().list_repairs(params).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/repairs/search/",
    params(KeywordQuery, PageParams),
    responses((status = 200, description = "Repairs matching name or description", body = repairhub_core::Page<repairhub_core::models::Repair>)),
    tag = "repairs"
)]
pub async fn search_repairs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<KeywordQuery>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state
            .db
            .repair_repo()
            .search_repairs(&query.keyword, params)
            .await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/repairs/",
    request_body = NewRepair,
    responses(
        (status = 201, description = "Created repair", body = repairhub_core::models::Repair),
        (status = 404, description = "Repair type not found", body = crate::dto::ErrorResponse),
    ),
    tag = "repairs"
)]
pub async fn create_repair(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<NewRepair>,
) -> Result<impl IntoResponse, ApiError> {
    let repair = state.db.repair_repo().create_repair(&body).await?;
    Ok((StatusCode::CREATED, axum::Json(repair)))
}

#[utoipa::path(
    get,
    path = "/api/v1/repairs/{id}",
    params(("id" = i64, Path, description = "Repair ID")),
    responses(
        (status = 200, description = "Repair", body = repairhub_core::models::Repair),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "repairs"
)]
pub async fn get_repair(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(state.db.repair_repo().require_repair(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/repairs/{id}/with-types",
    params(("id" = i64, Path, description = "Repair ID")),
    responses(
        (status = 200, description = "Repair with its repair types", body = repairhub_core::models::RepairWithTypes),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "repairs"
)]
pub async fn get_repair_with_types(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(state.db.repair_repo().repair_with_types(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/repairs/{id}",
    params(("id" = i64, Path, description = "Repair ID")),
    request_body = RepairUpdate,
    responses(
        (status = 200, description = "Updated repair", body = repairhub_core::models::Repair),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "repairs"
)]
pub async fn update_repair(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    axum::Json(body): axum::Json<RepairUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.repair_repo().update_repair(id, &body).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/repairs/{id}",
    params(("id" = i64, Path, description = "Repair ID")),
    responses(
        (status = 200, description = "Deleted repair", body = repairhub_core::models::Repair),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "repairs"
)]
pub async fn delete_repair(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = state.db.repair_repo();
    let repair = repo.require_repair(id).await?;
    repo.delete_repair(id).await?;
    Ok(axum::Json(repair))
}

// ---------------------------------------------------------------------------
// Repair types
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/repairs/types/",
    params(PageParams),
    responses((status = 200, description = "Repair types", body = repairhub_core::Page<repairhub_core::models::RepairType>)),
    tag = "repairs"
)]
pub async fn list_repair_types(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.repair_repo().list_repair_types(params).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/repairs/types/by-group/{group_name}",
    params(("group_name" = String, Path, description = "Repair type group"), PageParams),
    responses((status = 200, description = "Repair types in the group", body = repairhub_core::Page<repairhub_core::models::RepairType>)),
    tag = "repairs"
)]
pub async fn repair_types_by_group(
    State(state): State<Arc<AppState>>,
    Path(group_name): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state
            .db
            .repair_repo()
            .repair_types_by_group(&group_name, params)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/repairs/types/search/",
    params(RepairTypeSearchQuery, PageParams),
    responses((status = 200, description = "Matching repair types", body = repairhub_core::Page<repairhub_core::models::RepairType>)),
    tag = "repairs"
)]
pub async fn search_repair_types(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RepairTypeSearchQuery>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .db
        .repair_repo()
        .search_repair_types(&query.keyword, query.group_name.as_deref(), params)
        .await?;
    Ok(axum::Json(page))
}

#[utoipa::path(
    post,
    path = "/api/v1/repairs/types/",
    request_body = NewRepairType,
    responses((status = 201, description = "Created repair type", body = repairhub_core::models::RepairType)),
    tag = "repairs"
)]
pub async fn create_repair_type(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<NewRepairType>,
) -> Result<impl IntoResponse, ApiError> {
    let repair_type = state.db.repair_repo().create_repair_type(&body).await?;
    Ok((StatusCode::CREATED, axum::Json(repair_type)))
}

#[utoipa::path(
    get,
    path = "/api/v1/repairs/types/{id}",
    params(("id" = i64, Path, description = "Repair type ID")),
    responses(
        (status = 200, description = "Repair type", body = repairhub_core::models::RepairType),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "repairs"
)]
pub async fn get_repair_type(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.repair_repo().require_repair_type(id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/repairs/types/{id}/with-parts",
    params(("id" = i64, Path, description = "Repair type ID")),
    responses(
        (status = 200, description = "Repair type with its parts", body = repairhub_core::models::RepairTypeWithParts),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "repairs"
)]
pub async fn get_repair_type_with_parts(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.repair_repo().repair_type_with_parts(id).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/repairs/types/{id}",
    params(("id" = i64, Path, description = "Repair type ID")),
    request_body = RepairTypeUpdate,
    responses(
        (status = 200, description = "Updated repair type", body = repairhub_core::models::RepairType),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "repairs"
)]
pub async fn update_repair_type(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    axum::Json(body): axum::Json<RepairTypeUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.repair_repo().update_repair_type(id, &body).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/repairs/types/{id}",
    params(("id" = i64, Path, description = "Repair type ID")),
    responses(
        (status = 200, description = "Deleted repair type", body = repairhub_core::models::RepairType),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "repairs"
)]
pub async fn delete_repair_type(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = state.db.repair_repo();
    let repair_type = repo.require_repair_type(id).await?;
    repo.delete_repair_type(id).await?;
    Ok(axum::Json(repair_type))
}

// ---------------------------------------------------------------------------
// Parts
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/repairs/parts/",
    params(PageParams),
    responses((status = 200, description = "Parts", body = repairhub_core::Page<repairhub_core::models::Part>)),
    tag = "repairs"
)]
pub async fn list_parts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(state.db.repair_repo().list_parts(params).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/repairs/parts/by-price-range/",
    params(PriceRangeQuery, PageParams),
    responses(
        (status = 200, description = "Parts within the retail price range", body = repairhub_core::Page<repairhub_core::models::Part>),
        (status = 400, description = "max_price below min_price", body = crate::dto::ErrorResponse),
    ),
    tag = "repairs"
)]
pub async fn parts_by_price_range(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PriceRangeQuery>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .db
        .repair_repo()
        .parts_by_price_range(query.min_price, query.max_price, params)
        .await?;
    Ok(axum::Json(page))
}

#[utoipa::path(
    get,
    path = "/api/v1/repairs/parts/search/",
    params(KeywordQuery, PageParams),
    responses((status = 200, description = "Matching parts", body = repairhub_core::Page<repairhub_core::models::Part>)),
    tag = "repairs"
)]
pub async fn search_parts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<KeywordQuery>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state
            .db
            .repair_repo()
            .search_parts(&query.keyword, params)
            .await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/repairs/parts/",
    request_body = NewPart,
    responses(
        (status = 201, description = "Created part", body = repairhub_core::models::Part),
        (status = 400, description = "Invalid price", body = crate::dto::ErrorResponse),
    ),
    tag = "repairs"
)]
pub async fn create_part(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<NewPart>,
) -> Result<impl IntoResponse, ApiError> {
    let part = state.db.repair_repo().create_part(&body).await?;
    Ok((StatusCode::CREATED, axum::Json(part)))
}

#[utoipa::path(
    get,
    path = "/api/v1/repairs/parts/{id}",
    params(("id" = i64, Path, description = "Part ID")),
    responses(
        (status = 200, description = "Part", body = repairhub_core::models::Part),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "repairs"
)]
pub async fn get_part(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(state.db.repair_repo().require_part(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/repairs/parts/by-sku/{sku}",
    params(("sku" = String, Path, description = "Stock keeping unit")),
    responses(
        (status = 200, description = "Part", body = repairhub_core::models::Part),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "repairs"
)]
pub async fn get_part_by_sku(
    State(state): State<Arc<AppState>>,
    Path(sku): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let part = state
        .db
        .repair_repo()
        .part_by_sku(&sku)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Part with SKU {sku} not found")))?;
    Ok(axum::Json(part))
}

#[utoipa::path(
    put,
    path = "/api/v1/repairs/parts/{id}",
    params(("id" = i64, Path, description = "Part ID")),
    request_body = PartUpdate,
    responses(
        (status = 200, description = "Updated part", body = repairhub_core::models::Part),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "repairs"
)]
pub async fn update_part(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    axum::Json(body): axum::Json<PartUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(state.db.repair_repo().update_part(id, &body).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/repairs/parts/{id}",
    params(("id" = i64, Path, description = "Part ID")),
    responses(
        (status = 200, description = "Deleted part", body = repairhub_core::models::Part),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "repairs"
)]
pub async fn delete_part(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = state.db.repair_repo();
    let part = repo.require_part(id).await?;
    repo.delete_part(id).await?;
    Ok(axum::Json(part))
}

// ---------------------------------------------------------------------------
// Repair parts
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/repairs/types/{id}/parts/",
    params(("id" = i64, Path, description = "Repair type ID")),
    responses((status = 200, description = "Parts used by the repair type", body = Vec<repairhub_core::models::RepairPart>)),
    tag = "repairs"
)]
pub async fn list_repair_parts(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.repair_repo().repair_parts_by_type(id).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/repairs/types/{id}/parts/",
    params(("id" = i64, Path, description = "Repair type ID")),
    request_body = NewRepairPart,
    responses(
        (status = 201, description = "Created repair part", body = repairhub_core::models::RepairPart),
        (status = 400, description = "Path and body disagree", body = crate::dto::ErrorResponse),
        (status = 404, description = "Repair type or part not found", body = crate::dto::ErrorResponse),
    ),
    tag = "repairs"
)]
pub async fn create_repair_part(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    axum::Json(body): axum::Json<NewRepairPart>,
) -> Result<impl IntoResponse, ApiError> {
    if body.repair_type_id != id {
        return Err(AppError::BadRequest(
            "repair_type_id in the body does not match the path".into(),
        )
        .into());
    }
    let repair_part = state.db.repair_repo().create_repair_part(&body).await?;
    Ok((StatusCode::CREATED, axum::Json(repair_part)))
}

#[utoipa::path(
    get,
    path = "/api/v1/repairs/repair-parts/{id}",
    params(("id" = i64, Path, description = "Repair part ID")),
    responses(
        (status = 200, description = "Repair part", body = repairhub_core::models::RepairPart),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "repairs"
)]
pub async fn get_repair_part(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.repair_repo().require_repair_part(id).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/repairs/repair-parts/{id}",
    params(("id" = i64, Path, description = "Repair part ID")),
    request_body = RepairPartUpdate,
    responses(
        (status = 200, description = "Updated repair part", body = repairhub_core::models::RepairPart),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "repairs"
)]
pub async fn update_repair_part(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    axum::Json(body): axum::Json<RepairPartUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(axum::Json(
        state.db.repair_repo().update_repair_part(id, &body).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/repairs/repair-parts/{id}",
    params(("id" = i64, Path, description = "Repair part ID")),
    responses(
        (status = 200, description = "Deleted repair part", body = repairhub_core::models::RepairPart),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "repairs"
)]
pub async fn delete_repair_part(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = state.db.repair_repo();
    let repair_part = repo.require_repair_part(id).await?;
    repo.delete_repair_part(id).await?;
    Ok(axum::Json(repair_part))
}
