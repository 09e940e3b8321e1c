use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use repairhub_core::error::AppError;
use repairhub_core::models::{
    City, DeviceModel, LinkType, NewRepairPrice, NewReview, NewServiceCenter,
    NewServiceCenterAddress, NewServiceCenterLink, Repair, ServiceCenter,
};
use repairhub_core::pagination::Page;
use repairhub_core::retry::RetryPolicy;
use repairhub_core::scraped::{PriceRow, ScrapedCenter, ScrapedReview};
use repairhub_core::traits::CatalogSink;

use crate::fetcher::map_send_error;

const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(30);
const LOOKUP_LIMIT: &str = "100";

/// Replays scraped records into the RepairHub REST API.
///
/// Every side effect is one HTTP call. Transient failures are retried
/// according to the configured [`RetryPolicy`].
#[derive(Clone)]
pub struct ApiSink {
    client: Client,
    base_url: String,
    token: Option<String>,
    timeout_secs: u64,
    retry: RetryPolicy,
    /// City name (lowercased) to id, including misses.
    cities: Arc<Mutex<HashMap<String, Option<i64>>>>,
}

// ---- API types ----

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl ApiSink {
    /// `base_url` is the API root including the version prefix,
    /// e.g. `http://localhost:3000/api/v1`.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(DEFAULT_API_TIMEOUT)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            timeout_secs: DEFAULT_API_TIMEOUT.as_secs(),
            retry: RetryPolicy::default(),
            cities: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, AppError> {
        let url = self.url(path);
        let response = self
            .authorize(self.client.get(&url).query(query))
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout_secs))?;
        decode(response, &url).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let url = self.url(path);
        let response = self
            .authorize(self.client.post(&url).json(body))
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout_secs))?;
        decode(response, &url).await
    }

    /// Resolves a city name to its id by exact, case-insensitive match.
    async fn resolve_city(&self, name: &str) -> Result<Option<i64>, AppError> {
        let key = name.to_lowercase();
        let cached = self.cities.lock().map_err(poisoned)?.get(&key).copied();
        if let Some(id) = cached {
            return Ok(id);
        }

        let query = [("keyword", name), ("limit", LOOKUP_LIMIT)];
        let page: Page<City> = self
            .retry
            .run("city lookup", || {
                self.get_json("/locations/cities/search/", &query)
            })
            .await?;
        let id = page
            .items
            .iter()
            .find(|c| c.name.to_lowercase() == key)
            .map(|c| c.id);
        if id.is_none() {
            tracing::warn!(city = %name, "City is not in the catalog");
        }

        self.cities.lock().map_err(poisoned)?.insert(key, id);
        Ok(id)
    }

    async fn resolve_model(&self, name: &str) -> Result<i64, AppError> {
        let query = [("keyword", name), ("limit", LOOKUP_LIMIT)];
        let page: Page<DeviceModel> = self
            .retry
            .run("model lookup", || {
                self.get_json("/devices/models/search/", &query)
            })
            .await?;
        best_match(&page.items, name, |m| m.name.as_str())
            .map(|m| m.id)
            .ok_or_else(|| AppError::NotFound(format!("Device model '{name}' not found")))
    }

    async fn resolve_repair(&self, name: &str) -> Result<i64, AppError> {
        let query = [("keyword", name), ("limit", LOOKUP_LIMIT)];
        let page: Page<Repair> = self
            .retry
            .run("repair lookup", || self.get_json("/repairs/search/", &query))
            .await?;
        best_match(&page.items, name, |r| r.name.as_str())
            .map(|r| r.id)
            .ok_or_else(|| AppError::NotFound(format!("Repair '{name}' not found")))
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> AppError {
    AppError::Generic("city cache lock poisoned".to_string())
}

/// Exact case-insensitive match. Search results are substring hits, so a
/// near miss ("iPhone 12 Pro" for "iPhone 12") must not be taken.
fn best_match<'a, T>(items: &'a [T], name: &str, key: impl Fn(&T) -> &str) -> Option<&'a T> {
    let wanted = name.to_lowercase();
    items.iter().find(|item| key(item).to_lowercase() == wanted)
}

async fn decode<T: DeserializeOwned>(response: Response, url: &str) -> Result<T, AppError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to parse response from {url}: {e}")));
    }
    if status.as_u16() == 429 {
        return Err(AppError::RateLimitExceeded);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|e| e.message)
        .unwrap_or(body);
    Err(AppError::HttpError(format!("HTTP {status} for {url}: {message}")))
}

impl CatalogSink for ApiSink {
    async fn create_service_center(&self, center: &ScrapedCenter) -> Result<i64, AppError> {
        let city_id = match &center.city {
            Some(city) => self.resolve_city(city).await?,
            None => None,
        };

        let body = NewServiceCenter {
            name: center.name.clone(),
            city_id,
            owner_id: None,
            phone: center.phone.clone(),
        };
        let created: ServiceCenter = self
            .retry
            .run("create service center", || {
                self.post_json("/service-centers/", &body)
            })
            .await?;

        if let Some(address) = &center.address {
            let path = format!("/service-centers/{}/addresses/", created.id);
            let body = NewServiceCenterAddress::from_line(created.id, address.clone());
            let result: Result<serde_json::Value, AppError> = self
                .retry
                .run("create address", || self.post_json(&path, &body))
                .await;
            // The center exists by now; its links and reviews still need writing.
            if let Err(e) = result {
                tracing::warn!(
                    service_center_id = created.id,
                    error = %e,
                    "Failed to save address"
                );
            }
        }

        Ok(created.id)
    }

    async fn add_link(
        &self,
        service_center_id: i64,
        link_type: LinkType,
        link: &str,
    ) -> Result<(), AppError> {
        let path = format!("/service-centers/{service_center_id}/links/");
        let body = NewServiceCenterLink {
            service_center_id,
            link_type: Some(link_type),
            link: link.to_string(),
        };
        let _: serde_json::Value = self
            .retry
            .run("create link", || self.post_json(&path, &body))
            .await?;
        Ok(())
    }

    async fn add_review(
        &self,
        service_center_id: i64,
        review: &ScrapedReview,
    ) -> Result<(), AppError> {
        let path = format!("/service-centers/{service_center_id}/reviews/");
        let body = NewReview {
            service_center_id,
            author: review.author.clone(),
            rating: review.rating.map(f64::from),
            text: Some(review.text.clone()),
        };
        let _: serde_json::Value = self
            .retry
            .run("create review", || self.post_json(&path, &body))
            .await?;
        Ok(())
    }

    async fn add_repair_price(&self, model_name: &str, row: &PriceRow) -> Result<(), AppError> {
        let device_model_id = self.resolve_model(model_name).await?;
        let repair_id = self.resolve_repair(&row.repair_name).await?;
        let body = NewRepairPrice {
            device_model_id,
            repair_id,
            price: Some(row.price),
        };
        let _: serde_json::Value = self
            .retry
            .run("create repair price", || {
                self.post_json("/prices/repair-prices/", &body)
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU32, Ordering};

    use axum::extract::{Path, Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use tokio::net::TcpListener;

    #[derive(Clone, Default)]
    struct Recorded {
        calls: Arc<Mutex<Vec<(String, Value)>>>,
        failures_left: Arc<AtomicU32>,
    }

    fn page(items: Value) -> Value {
        let total = items.as_array().map(|a| a.len()).unwrap_or(0);
        json!({"items": items, "total": total, "page": 1, "size": 100, "pages": 1})
    }

    async fn serve(state: Recorded) -> String {
        let app = Router::new()
            .route(
                "/api/v1/locations/cities/search/",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    let items = if q.get("keyword").map(String::as_str) == Some("Москва") {
                        json!([
                            {"id": 2, "name": "Москва-Сити", "region_id": 1, "population": 0,
                             "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"},
                            {"id": 7, "name": "москва", "region_id": 1, "population": 0,
                             "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"}
                        ])
                    } else {
                        json!([])
                    };
                    Json(page(items))
                }),
            )
            .route(
                "/api/v1/service-centers/",
                post(
                    |State(s): State<Recorded>, headers: HeaderMap, Json(body): Json<Value>| async move {
                        if s.failures_left.load(Ordering::SeqCst) > 0 {
                            s.failures_left.fetch_sub(1, Ordering::SeqCst);
                            return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"error": "x", "message": "busy"})));
                        }
                        assert_eq!(headers["authorization"], "Bearer secret");
                        s.calls.lock().unwrap().push(("center".into(), body.clone()));
                        (
                            StatusCode::CREATED,
                            Json(json!({"id": 11, "name": body["name"], "city_id": body["city_id"],
                                "owner_id": null, "phone": body["phone"],
                                "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"})),
                        )
                    },
                ),
            )
            .route(
                "/api/v1/service-centers/{id}/{kind}/",
                post(
                    |State(s): State<Recorded>, Path((id, kind)): Path<(i64, String)>, Json(body): Json<Value>| async move {
                        if kind == "addresses" && body["name"] == "Нет такого адреса" {
                            return (StatusCode::NOT_FOUND, Json(json!({"error": "not_found", "message": "gone"})));
                        }
                        if kind == "links" && body["link"] == "https://bad.example" {
                            return (StatusCode::BAD_REQUEST, Json(json!({"error": "bad_request", "message": "nope"})));
                        }
                        s.calls.lock().unwrap().push((format!("{kind}:{id}"), body.clone()));
                        (StatusCode::CREATED, Json(body))
                    },
                ),
            )
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api/v1/")
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            max_delay: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn creates_center_with_city_and_address() {
        let state = Recorded::default();
        let base = serve(state.clone()).await;
        let sink = ApiSink::new(&base, Some("secret".into()))
            .unwrap()
            .with_retry(fast_retry());

        let id = sink
            .create_service_center(&ScrapedCenter {
                city: Some("Москва".into()),
                name: "FixIt".into(),
                address: Some("Тверская, 1".into()),
                phone: Some("+7 495 000-00-00".into()),
            })
            .await
            .unwrap();

        assert_eq!(id, 11);
        let calls = state.calls.lock().unwrap();
        assert_eq!(calls[0].0, "center");
        assert_eq!(calls[0].1["city_id"], 7);
        assert_eq!(calls[1].0, "addresses:11");
        assert_eq!(calls[1].1["name"], "Тверская, 1");
    }

    #[tokio::test]
    async fn unknown_city_posts_center_without_city() {
        let state = Recorded::default();
        let base = serve(state.clone()).await;
        let sink = ApiSink::new(&base, Some("secret".into())).unwrap();

        sink.create_service_center(&ScrapedCenter {
            city: Some("Атлантида".into()),
            name: "FixIt".into(),
            address: None,
            phone: None,
        })
        .await
        .unwrap();

        let calls = state.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].1["city_id"].is_null());
    }

    #[tokio::test]
    async fn retries_server_errors() {
        let state = Recorded::default();
        state.failures_left.store(2, Ordering::SeqCst);
        let base = serve(state.clone()).await;
        let sink = ApiSink::new(&base, Some("secret".into()))
            .unwrap()
            .with_retry(fast_retry());

        let id = sink
            .create_service_center(&ScrapedCenter {
                name: "FixIt".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(id, 11);
    }

    #[tokio::test]
    async fn client_errors_carry_server_message() {
        let base = serve(Recorded::default()).await;
        let sink = ApiSink::new(&base, Some("secret".into()))
            .unwrap()
            .with_retry(fast_retry());

        let err = sink
            .add_link(11, LinkType::Website, "https://bad.example")
            .await
            .unwrap_err();
        assert!(matches!(&err, AppError::HttpError(msg) if msg.contains("400") && msg.ends_with("nope")));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn posts_links_and_reviews() {
        let state = Recorded::default();
        let base = serve(state.clone()).await;
        let sink = ApiSink::new(&base, Some("secret".into())).unwrap();

        sink.add_link(11, LinkType::Vk, "https://vk.com/fixit").await.unwrap();
        sink.add_review(
            11,
            &ScrapedReview {
                author: "Мария".into(),
                rating: Some(4),
                text: "Хорошо".into(),
            },
        )
        .await
        .unwrap();

        let calls = state.calls.lock().unwrap();
        assert_eq!(calls[0].0, "links:11");
        assert_eq!(calls[0].1["type"], "vk");
        assert_eq!(calls[1].0, "reviews:11");
        assert_eq!(calls[1].1["rating"], 4.0);
    }

    #[tokio::test]
    async fn failed_address_keeps_the_center() {
        let state = Recorded::default();
        let base = serve(state.clone()).await;
        let sink = ApiSink::new(&base, Some("secret".into()))
            .unwrap()
            .with_retry(fast_retry());

        let id = sink
            .create_service_center(&ScrapedCenter {
                name: "FixIt".into(),
                address: Some("Нет такого адреса".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(id, 11);
        let calls = state.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "center");
    }

    #[test]
    fn best_match_requires_exact_name() {
        let names = vec!["iPhone 12 Pro Max".to_string(), "iPhone 12 Pro".to_string()];
        assert_eq!(
            best_match(&names, "iphone 12 pro", |s| s.as_str()),
            Some(&names[1])
        );
        assert_eq!(best_match(&names, "iPhone 12", |s| s.as_str()), None);
        assert_eq!(best_match(&names, "iPhone", |s| s.as_str()), None);
        assert_eq!(best_match(&Vec::<String>::new(), "x", |s| s.as_str()), None);
    }
}
