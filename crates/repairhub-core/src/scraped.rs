//! Records extracted from third-party listing sites, before they are
//! replayed into the catalog.

use serde::{Deserialize, Serialize};

/// One page of a paginated service-center listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingPage {
    /// City name from the page breadcrumbs.
    pub city: Option<String>,
    pub items: Vec<ListingItem>,
    /// Absolute URL of the next page, if any.
    pub next_page: Option<String>,
}

/// A service-center card on a listing page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingItem {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    /// Absolute URL of the center's detail page.
    pub detail_url: Option<String>,
}

/// Data found on a service center's detail page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CenterDetail {
    /// Website first (when present), then social links, in page order.
    pub links: Vec<String>,
    pub reviews: Vec<ScrapedReview>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedReview {
    pub author: String,
    /// 1 to 5; absent when the stars could not be read or were zero.
    pub rating: Option<u8>,
    pub text: String,
}

/// A service center ready to be written to the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapedCenter {
    pub city: Option<String>,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl ScrapedCenter {
    pub fn from_item(city: Option<&str>, item: &ListingItem) -> Self {
        Self {
            city: city.map(str::to_string),
            name: item.name.clone(),
            address: item.address.clone(),
            phone: item.phone.clone(),
        }
    }
}

/// Repair prices listed for a single device model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSheet {
    pub model_name: String,
    pub rows: Vec<PriceRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub repair_name: String,
    pub price: f64,
}
