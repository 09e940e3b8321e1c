use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};
use tower::ServiceExt;

use repairhub_core::models::{NewUser, UserRole};
use repairhub_db::Database;
use repairhub_server::auth::TokenService;
use repairhub_server::routes;
use repairhub_server::state::AppState;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret";
pub const ADMIN_EMAIL: &str = "admin@repairhub.test";
pub const ADMIN_PASSWORD: &str = "admin-password";

pub struct TestApp {
    pub router: Router,
    pub db: Database,
    pub tokens: TokenService,
    _container: ContainerAsync<GenericImage>,
}

/// Spin up a PostgreSQL container and return the test app.
pub async fn setup_test_app() -> TestApp {
    let container = GenericImage::new("postgres", "16")
        .with_exposed_port(ContainerPort::Tcp(5432))
        .with_wait_for(WaitFor::message_on_stderr(
            "database system is ready to accept connections",
        ))
        .with_env_var("POSTGRES_PASSWORD", "postgres")
        .with_env_var("POSTGRES_DB", "repairhub_test")
        .start()
        .await
        .expect("Failed to start PostgreSQL container");

    let host = container.get_host().await.expect("Failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get port");

    let url = format!("postgresql://postgres:postgres@{host}:{port}/repairhub_test");
    let pool = retry_connect(&url).await;

    let db = Database::from_pool(pool);
    db.migrate().await.expect("Failed to run migrations");

    let tokens = TokenService::new(TEST_JWT_SECRET, 60).with_bcrypt_cost(4);
    let state = Arc::new(AppState {
        db: db.clone(),
        tokens: tokens.clone(),
    });

    TestApp {
        router: routes::router(state),
        db,
        tokens,
        _container: container,
    }
}

async fn retry_connect(url: &str) -> PgPool {
    for _ in 0..30 {
        if let Ok(pool) = PgPoolOptions::new().max_connections(5).connect(url).await {
            return pool;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    panic!("Failed to connect to test database");
}

impl TestApp {
    /// Sends a request and returns the status and the parsed JSON body
    /// (`Value::Null` when the body is empty).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, None, Some(body)).await
    }

    /// Inserts a user with the given role and returns a valid access token.
    pub async fn user_token(&self, email: &str, password: &str, role: UserRole) -> String {
        let hash = self.tokens.hash_password(password).await.unwrap();
        let user = self
            .db
            .user_repo()
            .create(&NewUser {
                email: Some(email.to_string()),
                password_hash: Some(hash),
                role,
                is_active: true,
                ..NewUser::default()
            })
            .await
            .unwrap();
        self.tokens.issue(&user).unwrap().0
    }

    pub async fn admin_token(&self) -> String {
        self.user_token(ADMIN_EMAIL, ADMIN_PASSWORD, UserRole::Admin)
            .await
    }
}
