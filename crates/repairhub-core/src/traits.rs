use std::future::Future;

use crate::error::AppError;
use crate::models::LinkType;
use crate::scraped::{CenterDetail, ListingPage, PriceRow, PriceSheet, ScrapedCenter, ScrapedReview};

/// Fetches raw HTML content from a URL.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Extracts service centers from a listing site's HTML.
pub trait ListingParser: Send + Sync + Clone {
    /// Parses a listing page. Relative URLs are resolved against `page_url`.
    fn parse_listing(&self, html: &str, page_url: &str) -> Result<ListingPage, AppError>;

    /// Parses a service center's detail page.
    fn parse_detail(&self, html: &str) -> Result<CenterDetail, AppError>;
}

/// Extracts a device model's repair prices from HTML.
pub trait PriceParser: Send + Sync + Clone {
    /// Returns `None` when the page does not name a device model.
    fn parse_prices(&self, html: &str) -> Result<Option<PriceSheet>, AppError>;
}

/// Destination for scraped records. Each call is one side effect.
pub trait CatalogSink: Send + Sync + Clone {
    /// Creates a service center and returns its id.
    fn create_service_center(
        &self,
        center: &ScrapedCenter,
    ) -> impl Future<Output = Result<i64, AppError>> + Send;

    fn add_link(
        &self,
        service_center_id: i64,
        link_type: LinkType,
        link: &str,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    fn add_review(
        &self,
        service_center_id: i64,
        review: &ScrapedReview,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    fn add_repair_price(
        &self,
        model_name: &str,
        row: &PriceRow,
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// A sink that discards everything, for dry runs.
#[derive(Debug, Clone)]
pub struct NullSink;

impl CatalogSink for NullSink {
    async fn create_service_center(&self, _center: &ScrapedCenter) -> Result<i64, AppError> {
        Ok(0)
    }

    async fn add_link(
        &self,
        _service_center_id: i64,
        _link_type: LinkType,
        _link: &str,
    ) -> Result<(), AppError> {
        Ok(())
    }

    async fn add_review(
        &self,
        _service_center_id: i64,
        _review: &ScrapedReview,
    ) -> Result<(), AppError> {
        Ok(())
    }

    async fn add_repair_price(&self, _model_name: &str, _row: &PriceRow) -> Result<(), AppError> {
        Ok(())
    }
}
