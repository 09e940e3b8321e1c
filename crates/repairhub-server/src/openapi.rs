use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "RepairHub API",
        version = "0.1.0",
        description = "Device repair catalog, service centers and price comparison."
    ),
    paths(
        crate::routes::auth::login,
        crate::routes::auth::register,
        crate::routes::auth::me,
        crate::routes::auth::update_me,
        crate::routes::auth::change_password,
        crate::routes::users::list_users,
        crate::routes::users::search_users,
        crate::routes::users::list_service_owners,
        crate::routes::users::create_user,
        crate::routes::users::get_user,
        crate::routes::users::get_user_by_email,
        crate::routes::users::update_user,
        crate::routes::users::deactivate_user,
        crate::routes::users::delete_user,
        crate::routes::users::promote_to_service_owner,
        crate::routes::users::promote_to_admin,
        crate::routes::devices::list_brands,
        crate::routes::devices::search_brands,
        crate::routes::devices::create_brand,
        crate::routes::devices::get_brand,
        crate::routes::devices::get_brand_with_models,
        crate::routes::devices::update_brand,
        crate::routes::devices::delete_brand,
        crate::routes::devices::list_models,
        crate::routes::devices::list_brand_models,
        crate::routes::devices::search_models,
        crate::routes::devices::create_model,
        crate::routes::devices::get_model,
        crate::routes::devices::update_model,
        crate::routes::devices::delete_model,
        crate::routes::locations::list_regions,
        crate::routes::locations::search_regions,
        crate::routes::locations::create_region,
        crate::routes::locations::get_region,
        crate::routes::locations::get_region_with_cities,
        crate::routes::locations::update_region,
        crate::routes::locations::delete_region,
        crate::routes::locations::list_cities,
        crate::routes::locations::largest_cities,
        crate::routes::locations::list_region_cities,
        crate::routes::locations::search_cities,
        crate::routes::locations::create_city,
        crate::routes::locations::get_city,
        crate::routes::locations::update_city,
        crate::routes::locations::delete_city,
        crate::routes::repairs::list_repairs,
        crate::routes::repairs::search_repairs,
        crate::routes::repairs::create_repair,
        crate::routes::repairs::get_repair,
        crate::routes::repairs::get_repair_with_types,
        crate::routes::repairs::update_repair,
        crate::routes::repairs::delete_repair,
        crate::routes::repairs::list_repair_types,
        crate::routes::repairs::repair_types_by_group,
        crate::routes::repairs::search_repair_types,
        crate::routes::repairs::create_repair_type,
        crate::routes::repairs::get_repair_type,
        crate::routes::repairs::get_repair_type_with_parts,
        crate::routes::repairs::update_repair_type,
        crate::routes::repairs::delete_repair_type,
        crate::routes::repairs::list_parts,
        crate::routes::repairs::parts_by_price_range,
        crate::routes::repairs::search_parts,
        crate::routes::repairs::create_part,
        crate::routes::repairs::get_part,
        crate::routes::repairs::get_part_by_sku,
        crate::routes::repairs::update_part,
        crate::routes::repairs::delete_part,
        crate::routes::repairs::list_repair_parts,
        crate::routes::repairs::create_repair_part,
        crate::routes::repairs::get_repair_part,
        crate::routes::repairs::update_repair_part,
        crate::routes::repairs::delete_repair_part,
        crate::routes::prices::model_repairs_by_model,
        crate::routes::prices::model_repairs_by_repair_type,
        crate::routes::prices::create_model_repair,
        crate::routes::prices::get_model_repair,
        crate::routes::prices::update_model_repair,
        crate::routes::prices::delete_model_repair,
        crate::routes::prices::repair_prices_by_model,
        crate::routes::prices::repair_prices_by_repair,
        crate::routes::prices::repair_price_statistics,
        crate::routes::prices::create_repair_price,
        crate::routes::prices::get_repair_price,
        crate::routes::prices::update_repair_price,
        crate::routes::prices::delete_repair_price,
        crate::routes::prices::prices_by_service_center,
        crate::routes::prices::prices_by_model_and_repair,
        crate::routes::prices::compare_prices,
        crate::routes::prices::price_history,
        crate::routes::prices::create_price,
        crate::routes::prices::get_price,
        crate::routes::prices::update_price,
        crate::routes::prices::delete_price,
        crate::routes::service_centers::list_service_centers,
        crate::routes::service_centers::search_service_centers,
        crate::routes::service_centers::service_centers_by_city,
        crate::routes::service_centers::service_centers_by_owner,
        crate::routes::service_centers::top_rated_service_centers,
        crate::routes::service_centers::create_service_center,
        crate::routes::service_centers::get_service_center,
        crate::routes::service_centers::get_service_center_detail,
        crate::routes::service_centers::update_service_center,
        crate::routes::service_centers::delete_service_center,
        crate::routes::service_centers::list_addresses,
        crate::routes::service_centers::create_address,
        crate::routes::service_centers::get_address,
        crate::routes::service_centers::update_address,
        crate::routes::service_centers::delete_address,
        crate::routes::service_centers::list_links,
        crate::routes::service_centers::create_link,
        crate::routes::service_centers::get_link,
        crate::routes::service_centers::update_link,
        crate::routes::service_centers::delete_link,
        crate::routes::service_centers::list_reviews,
        crate::routes::service_centers::create_review,
        crate::routes::service_centers::get_rating,
        crate::routes::service_centers::create_claim,
        crate::routes::service_centers::approve_claim,
        crate::routes::service_centers::reject_claim,
        crate::routes::system::health,
    ),
    components(schemas(
        crate::dto::LoginRequest,
        crate::dto::TokenResponse,
        crate::dto::RegisterRequest,
        crate::dto::PasswordChangeRequest,
        crate::dto::ProfileUpdate,
        crate::dto::MessageResponse,
        crate::dto::UserCreateRequest,
        crate::dto::ClaimBody,
        crate::dto::HealthResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "auth", description = "Login, registration and the current account"),
        (name = "users", description = "User administration"),
        (name = "devices", description = "Device brands and models"),
        (name = "locations", description = "Regions and cities"),
        (name = "repairs", description = "Repairs, repair types and parts"),
        (name = "prices", description = "Reference prices and service center prices"),
        (name = "service-centers", description = "Service centers, reviews and ownership claims"),
        (name = "system", description = "Health and system status"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds the JWT bearer security scheme to the OpenAPI document.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token from POST /api/v1/auth/login."))
                        .build(),
                ),
            );
        }
    }
}
