//! Test utilities: handwritten mocks of the crawl traits.
//!
//! Mocks keep their state in `Arc<Mutex<_>>` so clones handed to a service
//! share it with the test, which can then assert on recorded calls.

use std::sync::{Arc, Mutex};

use crate::error::AppError;
use crate::models::LinkType;
use crate::scraped::{CenterDetail, ListingPage, PriceRow, PriceSheet, ScrapedCenter, ScrapedReview};
use crate::traits::{CatalogSink, Fetcher, ListingParser, PriceParser};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Mock fetcher that returns queued responses.
#[derive(Clone)]
pub struct MockFetcher {
    /// Each call pops the first element; an empty queue yields default HTML.
    responses: Arc<Mutex<Vec<Result<String, AppError>>>>,
    /// URLs requested, in order.
    pub requested: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new(html: &str) -> Self {
        Self::with_responses(vec![Ok(html.to_string())])
    }

    pub fn with_error(error: AppError) -> Self {
        Self::with_responses(vec![Err(error)])
    }

    pub fn with_responses(responses: Vec<Result<String, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        self.requested.lock().unwrap().push(url.to_string());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok("<html><body>default</body></html>".to_string())
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockParser
// ---------------------------------------------------------------------------

/// Parser that ignores its input and returns queued pages.
#[derive(Clone)]
pub struct MockParser {
    listings: Arc<Mutex<Vec<ListingPage>>>,
    details: Arc<Mutex<Vec<CenterDetail>>>,
}

impl MockParser {
    pub fn new(listings: Vec<ListingPage>, details: Vec<CenterDetail>) -> Self {
        Self {
            listings: Arc::new(Mutex::new(listings)),
            details: Arc::new(Mutex::new(details)),
        }
    }
}

impl ListingParser for MockParser {
    fn parse_listing(&self, _html: &str, _page_url: &str) -> Result<ListingPage, AppError> {
        let mut listings = self.listings.lock().unwrap();
        if listings.is_empty() {
            Ok(ListingPage::default())
        } else {
            Ok(listings.remove(0))
        }
    }

    fn parse_detail(&self, _html: &str) -> Result<CenterDetail, AppError> {
        let mut details = self.details.lock().unwrap();
        if details.is_empty() {
            Ok(CenterDetail::default())
        } else {
            Ok(details.remove(0))
        }
    }
}

// ---------------------------------------------------------------------------
// MockPriceParser
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct MockPriceParser {
    sheet: Option<PriceSheet>,
}

impl MockPriceParser {
    pub fn new(sheet: Option<PriceSheet>) -> Self {
        Self { sheet }
    }
}

impl PriceParser for MockPriceParser {
    fn parse_prices(&self, _html: &str) -> Result<Option<PriceSheet>, AppError> {
        Ok(self.sheet.clone())
    }
}

// ---------------------------------------------------------------------------
// MockSink
// ---------------------------------------------------------------------------

/// Sink that records every call. Center ids are assigned sequentially from 1.
#[derive(Clone, Default)]
pub struct MockSink {
    pub centers: Arc<Mutex<Vec<ScrapedCenter>>>,
    pub links: Arc<Mutex<Vec<(i64, LinkType, String)>>>,
    pub reviews: Arc<Mutex<Vec<(i64, ScrapedReview)>>>,
    pub prices: Arc<Mutex<Vec<(String, PriceRow)>>>,
    /// Errors returned by the next `create_service_center` calls.
    center_errors: Arc<Mutex<Vec<AppError>>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_centers(errors: Vec<AppError>) -> Self {
        Self {
            center_errors: Arc::new(Mutex::new(errors)),
            ..Self::default()
        }
    }
}

impl CatalogSink for MockSink {
    async fn create_service_center(&self, center: &ScrapedCenter) -> Result<i64, AppError> {
        {
            let mut errors = self.center_errors.lock().unwrap();
            if !errors.is_empty() {
                return Err(errors.remove(0));
            }
        }
        let mut centers = self.centers.lock().unwrap();
        centers.push(center.clone());
        Ok(centers.len() as i64)
    }

    async fn add_link(
        &self,
        service_center_id: i64,
        link_type: LinkType,
        link: &str,
    ) -> Result<(), AppError> {
        self.links
            .lock()
            .unwrap()
            .push((service_center_id, link_type, link.to_string()));
        Ok(())
    }

    async fn add_review(
        &self,
        service_center_id: i64,
        review: &ScrapedReview,
    ) -> Result<(), AppError> {
        self.reviews
            .lock()
            .unwrap()
            .push((service_center_id, review.clone()));
        Ok(())
    }

    async fn add_repair_price(&self, model_name: &str, row: &PriceRow) -> Result<(), AppError> {
        self.prices
            .lock()
            .unwrap()
            .push((model_name.to_string(), row.clone()));
        Ok(())
    }
}
