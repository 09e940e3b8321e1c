use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use repairhub_core::models::UserRole;

use crate::integration::common::{ADMIN_EMAIL, ADMIN_PASSWORD, setup_test_app};

#[tokio::test]
async fn health_returns_200() {
    let app = setup_test_app().await;

    let (status, json) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["database"], "ok");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = setup_test_app().await;

    let (status, json) = app.get("/api-docs/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["info"]["title"], "RepairHub API");
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_login_and_me() {
    let app = setup_test_app().await;

    let (status, user) = app
        .post(
            "/api/v1/auth/register",
            json!({
                "email": "ivan@example.ru",
                "password": "supersecret",
                "password_confirm": "supersecret",
                "full_name": "Иван Петров"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["role"], "user");
    assert!(user.get("password_hash").is_none());

    let (status, token) = app
        .post(
            "/api/v1/auth/login",
            json!({"email": "IVAN@example.ru", "password": "supersecret"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(token["token_type"], "bearer");
    let access_token = token["access_token"].as_str().unwrap();

    let (status, me) = app
        .send(Method::GET, "/api/v1/auth/me", Some(access_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "ivan@example.ru");
    assert_eq!(me["full_name"], "Иван Петров");
}

#[tokio::test]
async fn register_rejects_mismatch_and_duplicates() {
    let app = setup_test_app().await;

    let (status, _) = app
        .post(
            "/api/v1/auth/register",
            json!({"email": "a@b.ru", "password": "password1", "password_confirm": "password2"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body = json!({"email": "a@b.ru", "password": "password1", "password_confirm": "password1"});
    let (status, _) = app.post("/api/v1/auth/register", body.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, json) = app.post("/api/v1/auth/register", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "bad_request");
}

#[tokio::test]
async fn wrong_password_returns_401() {
    let app = setup_test_app().await;
    app.admin_token().await;

    let (status, json) = app
        .post(
            "/api/v1/auth/login",
            json!({"email": ADMIN_EMAIL, "password": "not-the-password"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "unauthorized");

    let (status, _) = app
        .post(
            "/api/v1/auth/login",
            json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn missing_token_returns_401_with_challenge() {
    let app = setup_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(Request::get("/api/v1/auth/me").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()["www-authenticate"], "Bearer");

    let (status, _) = app
        .send(Method::GET, "/api/v1/auth/me", Some("garbage"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn inactive_user_is_rejected() {
    let app = setup_test_app().await;
    let token = app
        .user_token("sleepy@example.ru", "password1", UserRole::User)
        .await;
    let user = app
        .db
        .user_repo()
        .get_by_email("sleepy@example.ru")
        .await
        .unwrap()
        .unwrap();
    app.db.user_repo().deactivate(user.id).await.unwrap();

    let (status, json) = app
        .send(Method::GET, "/api/v1/auth/me", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Inactive user");
}

#[tokio::test]
async fn change_password_checks_current_password() {
    let app = setup_test_app().await;
    let token = app
        .user_token("pw@example.ru", "password1", UserRole::User)
        .await;

    let (status, _) = app
        .send(
            Method::PUT,
            "/api/v1/auth/me/password",
            Some(&token),
            Some(json!({
                "current_password": "wrong-one",
                "new_password": "password2",
                "new_password_confirm": "password2"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::PUT,
            "/api/v1/auth/me/password",
            Some(&token),
            Some(json!({
                "current_password": "password1",
                "new_password": "password2",
                "new_password_confirm": "password2"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/api/v1/auth/login",
            json!({"email": "pw@example.ru", "password": "password2"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[tokio::test]
async fn users_are_admin_only() {
    let app = setup_test_app().await;
    let user_token = app
        .user_token("plain@example.ru", "password1", UserRole::User)
        .await;
    let admin_token = app.admin_token().await;

    let (status, json) = app
        .send(Method::GET, "/api/v1/users/", Some(&user_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error"], "forbidden");

    let (status, page) = app
        .send(Method::GET, "/api/v1/users/", Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 2);

    let plain_id = app
        .db
        .user_repo()
        .get_by_email("plain@example.ru")
        .await
        .unwrap()
        .unwrap()
        .id;
    let (status, promoted) = app
        .send(
            Method::PUT,
            &format!("/api/v1/users/{plain_id}/promote-to-service-owner"),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(promoted["role"], "service_owner");

    let (status, owners) = app
        .send(
            Method::GET,
            "/api/v1/users/service-owners/",
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(owners["items"][0]["email"], "plain@example.ru");

    let (status, json) = app
        .send(Method::GET, "/api/v1/users/9999", Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "User with ID 9999 not found");
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[tokio::test]
async fn regions_and_cities() {
    let app = setup_test_app().await;

    let (status, region) = app
        .post("/api/v1/locations/regions/", json!({"name": "Московская область"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let region_id = region["id"].as_i64().unwrap();

    let (status, _) = app
        .post("/api/v1/locations/regions/", json!({"name": "московская область"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for (name, population) in [("Химки", 259_550), ("Подольск", 308_130)] {
        let (status, _) = app
            .post(
                "/api/v1/locations/cities/",
                json!({"name": name, "region_id": region_id, "population": population}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, json) = app
        .post(
            "/api/v1/locations/cities/",
            json!({"name": "Нигде", "region_id": 9999}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Region with ID 9999 not found");

    let (status, largest) = app.get("/api/v1/locations/cities/largest/?limit=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(largest.as_array().unwrap().len(), 1);
    assert_eq!(largest[0]["name"], "Подольск");

    let (status, with_cities) = app
        .get(&format!("/api/v1/locations/regions/{region_id}/with-cities"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(with_cities["cities"].as_array().unwrap().len(), 2);

    let (status, page) = app
        .get(&format!(
            "/api/v1/locations/cities/search/?keyword=Хим&region_id={region_id}"
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["page"], 1);
}

#[tokio::test]
async fn brands_models_and_pagination() {
    let app = setup_test_app().await;

    let (_, brand) = app
        .post("/api/v1/devices/brands/", json!({"name": "Apple"}))
        .await;
    let brand_id = brand["id"].as_i64().unwrap();

    for name in ["iPhone 12", "iPhone 13", "iPad Air"] {
        let (status, _) = app
            .post(
                "/api/v1/devices/models/",
                json!({"device_brand_id": brand_id, "name": name}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, page) = app
        .get(&format!(
            "/api/v1/devices/brands/{brand_id}/models/?skip=2&limit=2"
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 3);
    assert_eq!(page["page"], 2);
    assert_eq!(page["pages"], 2);
    assert_eq!(page["items"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .get("/api/v1/devices/brands/9999/models/")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, deleted) = app
        .send(
            Method::DELETE,
            &format!("/api/v1/devices/brands/{brand_id}"),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["name"], "Apple");

    let (status, _) = app.get(&format!("/api/v1/devices/brands/{brand_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn repair_part_path_must_match_body() {
    let app = setup_test_app().await;

    let (_, repair_type) = app
        .post(
            "/api/v1/repairs/types/",
            json!({"group_name": "Экран", "name": "Замена дисплея"}),
        )
        .await;
    let type_id = repair_type["id"].as_i64().unwrap();
    let (_, part) = app
        .post(
            "/api/v1/repairs/parts/",
            json!({"name": "Дисплей", "retail_price": 4500.0, "sku": "LCD-1"}),
        )
        .await;
    let part_id = part["id"].as_i64().unwrap();

    let (status, _) = app
        .post(
            &format!("/api/v1/repairs/types/{}/parts/", type_id + 1),
            json!({"repair_type_id": type_id, "part_id": part_id}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, created) = app
        .post(
            &format!("/api/v1/repairs/types/{type_id}/parts/"),
            json!({"repair_type_id": type_id, "part_id": part_id, "quantity": 2}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["quantity"], 2);

    let (status, by_sku) = app.get("/api/v1/repairs/parts/by-sku/LCD-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_sku["id"], part_id);

    let (status, _) = app
        .get("/api/v1/repairs/parts/by-price-range/?min_price=100&max_price=10")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Prices
// ---------------------------------------------------------------------------

#[tokio::test]
async fn price_comparison_across_centers() {
    let app = setup_test_app().await;
    let admin = app.admin_token().await;

    let (_, brand) = app
        .post("/api/v1/devices/brands/", json!({"name": "Samsung"}))
        .await;
    let (_, model) = app
        .post(
            "/api/v1/devices/models/",
            json!({"device_brand_id": brand["id"], "name": "Galaxy S21"}),
        )
        .await;
    let (_, repair) = app
        .post("/api/v1/repairs/", json!({"name": "Замена стекла"}))
        .await;
    let model_id = model["id"].as_i64().unwrap();
    let repair_id = repair["id"].as_i64().unwrap();

    let (status, comparison) = app
        .get(&format!(
            "/api/v1/prices/prices/comparison/?device_model_id={model_id}&repair_id={repair_id}"
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(comparison["count"], 0);
    assert!(comparison["service_centers"].as_array().unwrap().is_empty());

    let (status, repair_price) = app
        .post(
            "/api/v1/prices/repair-prices/",
            json!({"device_model_id": model_id, "repair_id": repair_id, "price": 5000.0}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let repair_price_id = repair_price["id"].as_i64().unwrap();

    let (status, _) = app
        .post(
            "/api/v1/prices/repair-prices/",
            json!({"device_model_id": model_id, "repair_id": repair_id}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut created = Vec::new();
    for (name, price) in [("Мастер", 4000.0), ("Профи", 6000.0)] {
        let (status, center) = app
            .send(
                Method::POST,
                "/api/v1/service-centers/",
                Some(&admin),
                Some(json!({"name": name})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, entry) = app
            .post(
                "/api/v1/prices/prices/",
                json!({
                    "service_center_id": center["id"],
                    "repair_price_id": repair_price_id,
                    "price": price
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        created.push((center["id"].as_i64().unwrap(), entry["id"].as_i64().unwrap()));
    }

    let (status, comparison) = app
        .get(&format!(
            "/api/v1/prices/prices/comparison/?device_model_id={model_id}&repair_id={repair_id}"
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(comparison["count"], 2);
    assert_eq!(comparison["min_price"], 4000.0);
    assert_eq!(comparison["max_price"], 6000.0);
    assert_eq!(comparison["avg_price"], 5000.0);
    assert_eq!(comparison["service_centers"][0]["service_center_name"], "Мастер");

    let (status, stats) = app
        .get(&format!(
            "/api/v1/prices/repair-prices/statistics/?repair_id={repair_id}"
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["count"], 1);
    assert_eq!(stats["avg_price"], 5000.0);

    let (center_id, price_id) = created[0];
    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/v1/prices/prices/{price_id}"),
            None,
            Some(json!({"price": 4500.0})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, history) = app
        .get(&format!(
            "/api/v1/prices/prices/history/?repair_price_id={repair_price_id}&service_center_id={center_id}"
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let points: Vec<f64> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["price"].as_f64().unwrap())
        .collect();
    assert_eq!(points, [4500.0, 4000.0]);
}

// ---------------------------------------------------------------------------
// Service centers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn service_center_permissions() {
    let app = setup_test_app().await;
    let admin = app.admin_token().await;
    let stranger = app
        .user_token("stranger@example.ru", "password1", UserRole::User)
        .await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/v1/service-centers/",
            Some(&stranger),
            Some(json!({"name": "Чужой"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, center) = app
        .send(
            Method::POST,
            "/api/v1/service-centers/",
            Some(&admin),
            Some(json!({"name": "Ремонт Плюс", "phone": "+7 495 000-00-00"})),
        )
        .await;
    let center_id = center["id"].as_i64().unwrap();

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/v1/service-centers/{center_id}"),
            Some(&stranger),
            Some(json!({"phone": "+7 000"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = app
        .send(
            Method::PUT,
            &format!("/api/v1/service-centers/{center_id}"),
            Some(&admin),
            Some(json!({"phone": "+7 495 111-11-11"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["phone"], "+7 495 111-11-11");

    let (status, _) = app
        .post(
            &format!("/api/v1/service-centers/{center_id}/addresses/"),
            json!({"service_center_id": center_id, "name": "ул. Ленина, 1"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/v1/service-centers/{center_id}/addresses/"),
            Some(&stranger),
            Some(json!({"service_center_id": center_id, "name": "ул. Ленина, 1"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, detail) = app
        .get(&format!("/api/v1/service-centers/{center_id}/detail"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["name"], "Ремонт Плюс");
    assert_eq!(detail["addresses"][0]["name"], "ул. Ленина, 1");
    assert_eq!(detail["reviews_count"], 0);
}

#[tokio::test]
async fn reviews_and_rating() {
    let app = setup_test_app().await;
    let admin = app.admin_token().await;
    let (_, center) = app
        .send(
            Method::POST,
            "/api/v1/service-centers/",
            Some(&admin),
            Some(json!({"name": "Отзывчивый"})),
        )
        .await;
    let center_id = center["id"].as_i64().unwrap();

    let (status, rating) = app
        .get(&format!("/api/v1/service-centers/{center_id}/rating/"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rating["average_rating"], 0.0);
    assert_eq!(rating["count"], 0);

    let (status, _) = app
        .post(
            &format!("/api/v1/service-centers/{center_id}/reviews/"),
            json!({"service_center_id": center_id, "author": "Анна", "rating": 7.0}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            &format!("/api/v1/service-centers/{}/reviews/", center_id + 1),
            json!({"service_center_id": center_id, "author": "Анна", "rating": 5.0}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for (author, rating) in [("Анна", 5.0), ("Борис", 4.0)] {
        let (status, _) = app
            .post(
                &format!("/api/v1/service-centers/{center_id}/reviews/"),
                json!({"service_center_id": center_id, "author": author, "rating": rating}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, rating) = app
        .get(&format!("/api/v1/service-centers/{center_id}/rating/"))
        .await;
    assert_eq!(rating["average_rating"], 4.5);
    assert_eq!(rating["count"], 2);

    let (_, reviews) = app
        .get(&format!("/api/v1/service-centers/{center_id}/reviews/"))
        .await;
    assert_eq!(reviews["total"], 2);
    assert_eq!(reviews["items"][0]["author"], "Борис");
}

#[tokio::test]
async fn claim_request_lifecycle() {
    let app = setup_test_app().await;
    let admin = app.admin_token().await;
    app.user_token("owner@example.ru", "password1", UserRole::User)
        .await;
    let owner = app
        .db
        .user_repo()
        .get_by_email("owner@example.ru")
        .await
        .unwrap()
        .unwrap();

    let (_, center) = app
        .send(
            Method::POST,
            "/api/v1/service-centers/",
            Some(&admin),
            Some(json!({"name": "Ничей"})),
        )
        .await;
    let center_id = center["id"].as_i64().unwrap();

    let (status, claim) = app
        .post(
            &format!("/api/v1/service-centers/{center_id}/claims/"),
            json!({"telegram_id": 123456, "message": "Это мой сервис", "contact": "+79990000000"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(claim["status"], "pending");
    let claim_id = claim["id"].as_i64().unwrap();

    let (status, approved) = app
        .send(
            Method::PUT,
            &format!(
                "/api/v1/service-centers/requests/{claim_id}/approve?owner_id={}",
                owner.id
            ),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");

    let (_, center) = app
        .get(&format!("/api/v1/service-centers/{center_id}"))
        .await;
    assert_eq!(center["owner_id"], owner.id);

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/v1/service-centers/requests/{claim_id}/reject"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = app
        .post(
            &format!("/api/v1/service-centers/{center_id}/claims/"),
            json!({"telegram_id": 654321, "message": "И мой тоже", "contact": "@someone"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "bad_request");
}
