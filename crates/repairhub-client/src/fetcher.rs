use std::time::Duration;

use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use reqwest::{Client, Proxy};
use url::Url;

use repairhub_core::error::AppError;
use repairhub_core::traits::Fetcher;

/// Desktop browser User-Agent. Listing sites serve a stripped page to
/// unknown clients.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.36";

const ACCEPT_LANGUAGE_VALUE: &str = "ru,en;q=0.9";

/// Page fetcher for listing sites, built on reqwest.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
    timeout_secs: u64,
}

/// Builder for [`ReqwestFetcher`].
#[derive(Debug, Clone)]
pub struct FetcherBuilder {
    timeout: Duration,
    proxy: Option<String>,
    user_agent: String,
}

impl Default for FetcherBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            proxy: None,
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

impl FetcherBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Route all requests through a proxy (`http://`, `https://` or `socks5://`).
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> Result<ReqwestFetcher, AppError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE),
        );

        let mut builder = Client::builder()
            .user_agent(self.user_agent)
            .default_headers(headers)
            .timeout(self.timeout);
        if let Some(proxy) = &self.proxy {
            let proxy = Proxy::all(proxy)
                .map_err(|e| AppError::ConfigError(format!("Invalid proxy '{proxy}': {e}")))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(ReqwestFetcher {
            client,
            timeout_secs: self.timeout.as_secs(),
        })
    }
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, AppError> {
        Self::builder().build()
    }

    pub fn builder() -> FetcherBuilder {
        FetcherBuilder::default()
    }
}

impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        let parsed = Url::parse(url).map_err(|e| AppError::HttpError(format!("Invalid URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::HttpError(format!(
                "URL scheme '{}' is not allowed (only http/https)",
                parsed.scheme()
            )));
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpError(format!("HTTP {status} for {url}")));
        }

        response
            .text()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to read response body: {e}")))
    }
}

/// Maps a reqwest transport error onto the application error kinds.
pub(crate) fn map_send_error(e: reqwest::Error, timeout_secs: u64) -> AppError {
    if e.is_timeout() {
        AppError::Timeout(timeout_secs)
    } else if e.is_connect() {
        AppError::NetworkError(format!("Connection failed: {e}"))
    } else {
        AppError::HttpError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::Router;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::routing::get;
    use tokio::net::TcpListener;

    async fn serve(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn sends_browser_headers() {
        let app = Router::new().route(
            "/",
            get(|headers: AxumHeaders| async move {
                format!(
                    "{}|{}",
                    headers["user-agent"].to_str().unwrap(),
                    headers["accept-language"].to_str().unwrap()
                )
            }),
        );
        let base = serve(app).await;

        let body = ReqwestFetcher::new().unwrap().fetch(&base).await.unwrap();
        assert_eq!(body, format!("{BROWSER_USER_AGENT}|ru,en;q=0.9"));
    }

    #[tokio::test]
    async fn non_success_status_is_http_error() {
        let app = Router::new().route("/", get(|| async { StatusCode::SERVICE_UNAVAILABLE }));
        let base = serve(app).await;

        let err = ReqwestFetcher::new().unwrap().fetch(&base).await.unwrap_err();
        assert!(matches!(&err, AppError::HttpError(msg) if msg.starts_with("HTTP 503")));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn rejects_non_http_schemes() {
        let err = ReqwestFetcher::new()
            .unwrap()
            .fetch("file:///etc/passwd")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not allowed"));
    }

    #[test]
    fn invalid_proxy_is_config_error() {
        let err = ReqwestFetcher::builder()
            .proxy("::not a proxy::")
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, AppError::ConfigError(_)));
    }
}
