use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::openapi::ApiDoc;
use crate::state::AppState;

pub mod auth;
pub mod devices;
pub mod locations;
pub mod prices;
pub mod repairs;
pub mod service_centers;
pub mod system;
pub mod users;

/// Build the full router with all routes.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .merge(auth::routes())
        .merge(users::routes())
        .merge(devices::routes())
        .merge(locations::routes())
        .merge(repairs::routes())
        .merge(prices::routes())
        .merge(service_centers::routes());

    let public = Router::new()
        .route("/health", get(system::health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    public.nest("/api/v1", api).with_state(state)
}
