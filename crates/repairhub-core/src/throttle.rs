//! Per-host politeness delay for crawling listing sites.
//!
//! [`ThrottledFetcher`] wraps any [`Fetcher`] and spaces out requests that
//! hit the same host. Each request reserves the next free slot for its host
//! while holding the lock, then sleeps outside of it, so concurrent callers
//! queue up instead of firing together.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use repairhub_core::throttle::{ThrottleConfig, ThrottledFetcher};
//! # use repairhub_core::traits::Fetcher;
//! # #[derive(Clone)] struct SiteFetcher;
//! # impl Fetcher for SiteFetcher {
//! #     async fn fetch(&self, _: &str) -> Result<String, repairhub_core::AppError> { todo!() }
//! # }
//!
//! let config = ThrottleConfig::new(Duration::from_secs(2))
//!     .with_jitter(Duration::from_millis(750));
//! let fetcher = ThrottledFetcher::new(SiteFetcher, config);
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

use crate::error::AppError;
use crate::traits::Fetcher;

#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// Minimum spacing between two requests to the same host.
    pub delay: Duration,
    /// Upper bound of the random extra delay added per request.
    pub jitter: Duration,
}

impl ThrottleConfig {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            jitter: Duration::ZERO,
        }
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    fn spacing(&self) -> Duration {
        let max = self.jitter.as_millis() as u64;
        if max == 0 {
            self.delay
        } else {
            self.delay + Duration::from_millis(jitter_ms(max))
        }
    }
}

impl Default for ThrottleConfig {
    /// 1s spacing plus up to 500ms jitter.
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            jitter: Duration::from_millis(500),
        }
    }
}

/// A [`Fetcher`] that enforces a minimum delay between requests per host.
#[derive(Clone)]
pub struct ThrottledFetcher<F> {
    inner: F,
    config: ThrottleConfig,
    /// Earliest instant at which the next request to each host may start.
    next_slot: Arc<Mutex<HashMap<String, Instant>>>,
}

impl<F: Fetcher> ThrottledFetcher<F> {
    pub fn new(inner: F, config: ThrottleConfig) -> Self {
        Self {
            inner,
            config,
            next_slot: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// `scheme://host:port` of a URL, or `None` if it cannot be parsed.
    fn host_key(url: &str) -> Option<String> {
        let url = Url::parse(url).ok()?;
        let host = url.host_str()?;
        let port = url.port_or_known_default()?;
        Some(format!("{}://{host}:{port}", url.scheme()))
    }

    /// Reserves the next slot for `host` and returns how long to wait for it.
    async fn reserve(&self, host: &str) -> Duration {
        let now = Instant::now();
        let mut slots = self.next_slot.lock().await;
        let start = match slots.get(host) {
            Some(&slot) if slot > now => slot,
            _ => now,
        };
        slots.insert(host.to_string(), start + self.config.spacing());
        start - now
    }
}

impl<F: Fetcher> Fetcher for ThrottledFetcher<F> {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        if let Some(host) = Self::host_key(url) {
            let wait = self.reserve(&host).await;
            if !wait.is_zero() {
                tracing::debug!(%host, wait_ms = %wait.as_millis(), "Throttling request");
                tokio::time::sleep(wait).await;
            }
        }
        self.inner.fetch(url).await
    }
}

// ---------------------------------------------------------------------------
// Jitter: xorshift64 over the clock's nanoseconds. Not for cryptography.
// ---------------------------------------------------------------------------

fn jitter_ms(max_ms: u64) -> u64 {
    let mut x = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
        | 1;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x % max_ms
}
