pub mod crawl;
pub mod error;
pub mod models;
pub mod pagination;
pub mod retry;
pub mod scraped;
pub mod throttle;
pub mod traits;

#[cfg(test)]
mod testutil;

pub use error::AppError;
pub use pagination::{Page, PageParams};
pub use traits::{CatalogSink, Fetcher, ListingParser, PriceParser};
