use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use url::Url;

use crate::error::AppError;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Lifecycle of a service-center ownership claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Approved | RequestStatus::Rejected)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "rejected" => Ok(RequestStatus::Rejected),
            _ => Err(format!("Unknown request status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    #[default]
    Smartphone,
    Tablet,
    Laptop,
    Desktop,
    Smartwatch,
    Other,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Smartphone => "smartphone",
            DeviceType::Tablet => "tablet",
            DeviceType::Laptop => "laptop",
            DeviceType::Desktop => "desktop",
            DeviceType::Smartwatch => "smartwatch",
            DeviceType::Other => "other",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "smartphone" => Ok(DeviceType::Smartphone),
            "tablet" => Ok(DeviceType::Tablet),
            "laptop" => Ok(DeviceType::Laptop),
            "desktop" => Ok(DeviceType::Desktop),
            "smartwatch" => Ok(DeviceType::Smartwatch),
            "other" => Ok(DeviceType::Other),
            _ => Err(format!("Unknown device type: {}", s)),
        }
    }
}

/// Kind of an external link attached to a service center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Website,
    Telegram,
    Vk,
    Instagram,
    Facebook,
    Phone,
    Other,
}

impl LinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkType::Website => "website",
            LinkType::Telegram => "telegram",
            LinkType::Vk => "vk",
            LinkType::Instagram => "instagram",
            LinkType::Facebook => "facebook",
            LinkType::Phone => "phone",
            LinkType::Other => "other",
        }
    }

    /// Classifies a scraped link by its scheme and host.
    ///
    /// `tel:` links are phones; known social hosts map to their network;
    /// any other http(s) URL is a website. Everything else is `Other`.
    pub fn classify(link: &str) -> Self {
        if link.starts_with("tel:") {
            return LinkType::Phone;
        }
        let Ok(url) = Url::parse(link) else {
            return LinkType::Other;
        };
        let host = url.host_str().unwrap_or_default();
        if host.contains("facebook.com") {
            LinkType::Facebook
        } else if host.contains("instagram.com") {
            LinkType::Instagram
        } else if host.contains("t.me") {
            LinkType::Telegram
        } else if host.contains("vk.com") {
            LinkType::Vk
        } else if matches!(url.scheme(), "http" | "https") {
            LinkType::Website
        } else {
            LinkType::Other
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LinkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "website" => Ok(LinkType::Website),
            "telegram" => Ok(LinkType::Telegram),
            "vk" => Ok(LinkType::Vk),
            "instagram" => Ok(LinkType::Instagram),
            "facebook" => Ok(LinkType::Facebook),
            "phone" => Ok(LinkType::Phone),
            "other" => Ok(LinkType::Other),
            _ => Err(format!("Unknown link type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    User,
    ServiceOwner,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::ServiceOwner => "service_owner",
            UserRole::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(UserRole::User),
            "service_owner" => Ok(UserRole::ServiceOwner),
            "admin" => Ok(UserRole::Admin),
            _ => Err(format!("Unknown user role: {}", s)),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn ensure_not_blank(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(())
}

fn ensure_non_negative(field: &str, value: f64) -> Result<(), AppError> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::BadRequest(format!(
            "{field} must be greater than or equal to 0"
        )));
    }
    Ok(())
}

fn ensure_rating(rating: Option<f64>) -> Result<(), AppError> {
    match rating {
        Some(r) if !(0.0..=5.0).contains(&r) => Err(AppError::BadRequest(
            "rating must be between 0 and 5".into(),
        )),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Region {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewRegion {
    pub name: String,
}

impl NewRegion {
    pub fn validate(&self) -> Result<(), AppError> {
        ensure_not_blank("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RegionUpdate {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegionWithCities {
    #[serde(flatten)]
    pub region: Region,
    pub cities: Vec<City>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct City {
    pub id: i64,
    pub name: String,
    pub region_id: i64,
    pub population: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewCity {
    pub name: String,
    pub region_id: i64,
    #[serde(default)]
    pub population: i64,
}

impl NewCity {
    pub fn validate(&self) -> Result<(), AppError> {
        ensure_not_blank("name", &self.name)?;
        if self.population < 0 {
            return Err(AppError::BadRequest(
                "population must be greater than or equal to 0".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CityUpdate {
    pub name: Option<String>,
    pub region_id: Option<i64>,
    pub population: Option<i64>,
}

// ---------------------------------------------------------------------------
// Service centers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceCenter {
    pub id: i64,
    pub city_id: Option<i64>,
    pub owner_id: Option<i64>,
    pub name: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewServiceCenter {
    pub name: String,
    pub city_id: Option<i64>,
    pub owner_id: Option<i64>,
    pub phone: Option<String>,
}

impl NewServiceCenter {
    pub fn validate(&self) -> Result<(), AppError> {
        ensure_not_blank("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ServiceCenterUpdate {
    pub name: Option<String>,
    pub city_id: Option<i64>,
    pub owner_id: Option<i64>,
    pub phone: Option<String>,
}

/// A service center as listed to users, with its rating summary and
/// primary address.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceCenterSummary {
    pub id: i64,
    pub name: String,
    pub city_id: Option<i64>,
    pub owner_id: Option<i64>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub avg_rating: f64,
    pub reviews_count: i64,
}

/// Everything known about a service center, for the detail view.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceCenterDetail {
    #[serde(flatten)]
    pub center: ServiceCenter,
    pub city: Option<City>,
    pub owner: Option<User>,
    pub addresses: Vec<ServiceCenterAddress>,
    pub links: Vec<ServiceCenterLink>,
    pub reviews: Vec<Review>,
    pub prices: Vec<Price>,
    pub avg_rating: f64,
    pub reviews_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceCenterAddress {
    pub id: i64,
    pub service_center_id: i64,
    pub name: String,
    pub street: Option<String>,
    pub building: Option<String>,
    pub apartment: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewServiceCenterAddress {
    pub service_center_id: i64,
    pub name: String,
    pub street: Option<String>,
    pub building: Option<String>,
    pub apartment: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl NewServiceCenterAddress {
    /// Address with only a display line, as scraped from listing pages.
    pub fn from_line(service_center_id: i64, line: impl Into<String>) -> Self {
        Self {
            service_center_id,
            name: line.into(),
            street: None,
            building: None,
            apartment: None,
            postal_code: None,
            latitude: None,
            longitude: None,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        ensure_not_blank("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ServiceCenterAddressUpdate {
    pub name: Option<String>,
    pub street: Option<String>,
    pub building: Option<String>,
    pub apartment: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceCenterLink {
    pub id: i64,
    pub service_center_id: i64,
    #[serde(rename = "type")]
    pub link_type: Option<LinkType>,
    pub link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewServiceCenterLink {
    pub service_center_id: i64,
    #[serde(rename = "type")]
    pub link_type: Option<LinkType>,
    pub link: String,
}

impl NewServiceCenterLink {
    pub fn validate(&self) -> Result<(), AppError> {
        ensure_not_blank("link", &self.link)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ServiceCenterLinkUpdate {
    #[serde(rename = "type")]
    pub link_type: Option<LinkType>,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Review {
    pub id: i64,
    pub service_center_id: i64,
    pub author: String,
    /// 0 to 5, absent when the author left no stars.
    pub rating: Option<f64>,
    pub text: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewReview {
    pub service_center_id: i64,
    pub author: String,
    pub rating: Option<f64>,
    pub text: Option<String>,
}

impl NewReview {
    pub fn validate(&self) -> Result<(), AppError> {
        ensure_not_blank("author", &self.author)?;
        ensure_rating(self.rating)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RatingSummary {
    pub average_rating: f64,
    pub count: i64,
}

/// A request to become the owner of an unclaimed service center.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClaimRequest {
    pub id: i64,
    pub service_center_id: i64,
    pub telegram_id: i64,
    pub message: String,
    pub contact: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewClaimRequest {
    pub service_center_id: i64,
    pub telegram_id: i64,
    pub message: String,
    pub contact: String,
}

impl NewClaimRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        ensure_not_blank("contact", &self.contact)?;
        ensure_not_blank("message", &self.message)
    }
}

// ---------------------------------------------------------------------------
// Devices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeviceBrand {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewDeviceBrand {
    pub name: String,
}

impl NewDeviceBrand {
    pub fn validate(&self) -> Result<(), AppError> {
        ensure_not_blank("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DeviceBrandUpdate {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BrandWithModels {
    #[serde(flatten)]
    pub brand: DeviceBrand,
    pub models: Vec<DeviceModel>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeviceModel {
    pub id: i64,
    pub device_brand_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub release_year: Option<i32>,
    /// Diagonal in inches.
    pub display_size: Option<f64>,
    pub processor: Option<String>,
    /// RAM in GB.
    pub ram: Option<i32>,
    /// Storage in GB.
    pub storage: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewDeviceModel {
    pub device_brand_id: i64,
    pub name: String,
    #[serde(rename = "type", default)]
    pub device_type: DeviceType,
    pub release_year: Option<i32>,
    pub display_size: Option<f64>,
    pub processor: Option<String>,
    pub ram: Option<i32>,
    pub storage: Option<i32>,
}

impl NewDeviceModel {
    pub fn validate(&self) -> Result<(), AppError> {
        ensure_not_blank("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DeviceModelUpdate {
    pub device_brand_id: Option<i64>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub device_type: Option<DeviceType>,
    pub release_year: Option<i32>,
    pub display_size: Option<f64>,
    pub processor: Option<String>,
    pub ram: Option<i32>,
    pub storage: Option<i32>,
}

// ---------------------------------------------------------------------------
// Repair catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Repair {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewRepair {
    pub name: String,
    pub description: Option<String>,
    /// Repair types this repair belongs to.
    #[serde(default)]
    pub repair_type_ids: Vec<i64>,
}

impl NewRepair {
    pub fn validate(&self) -> Result<(), AppError> {
        ensure_not_blank("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RepairUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Replaces the linked repair types when present.
    pub repair_type_ids: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RepairWithTypes {
    #[serde(flatten)]
    pub repair: Repair,
    pub repair_types: Vec<RepairType>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RepairType {
    pub id: i64,
    pub group_name: String,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewRepairType {
    pub group_name: String,
    pub name: String,
    pub description: Option<String>,
}

impl NewRepairType {
    pub fn validate(&self) -> Result<(), AppError> {
        ensure_not_blank("group_name", &self.group_name)?;
        ensure_not_blank("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RepairTypeUpdate {
    pub group_name: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RepairTypeWithParts {
    #[serde(flatten)]
    pub repair_type: RepairType,
    pub repair_parts: Vec<RepairPart>,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Part {
    pub id: i64,
    pub name: String,
    pub retail_price: f64,
    pub currency: String,
    pub manufacturer: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
}

fn default_currency() -> String {
    "RUB".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewPart {
    pub name: String,
    pub retail_price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub manufacturer: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
}

impl NewPart {
    pub fn validate(&self) -> Result<(), AppError> {
        ensure_not_blank("name", &self.name)?;
        ensure_non_negative("retail_price", self.retail_price)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PartUpdate {
    pub name: Option<String>,
    pub retail_price: Option<f64>,
    pub currency: Option<String>,
    pub manufacturer: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
}

impl PartUpdate {
    pub fn validate(&self) -> Result<(), AppError> {
        match self.retail_price {
            Some(p) => ensure_non_negative("retail_price", p),
            None => Ok(()),
        }
    }
}

/// A part consumed by a repair type, with the quantity needed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RepairPart {
    pub id: i64,
    pub repair_type_id: i64,
    pub part_id: i64,
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewRepairPart {
    pub repair_type_id: i64,
    pub part_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

impl NewRepairPart {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.quantity <= 0 {
            return Err(AppError::BadRequest("quantity must be greater than 0".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RepairPartUpdate {
    pub part_id: Option<i64>,
    pub quantity: Option<i32>,
}

impl RepairPartUpdate {
    pub fn validate(&self) -> Result<(), AppError> {
        match self.quantity {
            Some(q) if q <= 0 => Err(AppError::BadRequest(
                "quantity must be greater than 0".into(),
            )),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

/// Applicability of a repair type to a device model.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModelRepair {
    pub id: i64,
    pub model_id: i64,
    pub repair_type_id: i64,
    pub complexity: Option<String>,
    /// Minutes.
    pub estimated_time: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewModelRepair {
    pub model_id: i64,
    pub repair_type_id: i64,
    pub complexity: Option<String>,
    pub estimated_time: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ModelRepairUpdate {
    pub model_id: Option<i64>,
    pub repair_type_id: Option<i64>,
    pub complexity: Option<String>,
    pub estimated_time: Option<i32>,
}

/// Reference price of a repair on a device model.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RepairPrice {
    pub id: i64,
    pub device_model_id: i64,
    pub repair_id: i64,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewRepairPrice {
    pub device_model_id: i64,
    pub repair_id: i64,
    pub price: Option<f64>,
}

impl NewRepairPrice {
    pub fn validate(&self) -> Result<(), AppError> {
        match self.price {
            Some(p) => ensure_non_negative("price", p),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RepairPriceUpdate {
    pub device_model_id: Option<i64>,
    pub repair_id: Option<i64>,
    pub price: Option<f64>,
}

impl RepairPriceUpdate {
    pub fn validate(&self) -> Result<(), AppError> {
        match self.price {
            Some(p) => ensure_non_negative("price", p),
            None => Ok(()),
        }
    }
}

/// Price a particular service center charges for a repair price entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Price {
    pub id: i64,
    pub service_center_id: i64,
    pub repair_price_id: i64,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewPrice {
    pub service_center_id: i64,
    pub repair_price_id: i64,
    pub price: f64,
}

impl NewPrice {
    pub fn validate(&self) -> Result<(), AppError> {
        ensure_non_negative("price", self.price)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PriceUpdate {
    pub price: Option<f64>,
}

impl PriceUpdate {
    pub fn validate(&self) -> Result<(), AppError> {
        match self.price {
            Some(p) => ensure_non_negative("price", p),
            None => Ok(()),
        }
    }
}

/// Aggregate over a set of prices. All fields are 0 for an empty set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PriceStatistics {
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ServiceCenterPrice {
    pub service_center_id: i64,
    pub service_center_name: String,
    pub price: f64,
}

/// Price comparison across service centers, cheapest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PriceComparison {
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub count: i64,
    pub service_centers: Vec<ServiceCenterPrice>,
}

impl PriceComparison {
    pub fn new(stats: PriceStatistics, service_centers: Vec<ServiceCenterPrice>) -> Self {
        Self {
            avg_price: stats.avg_price,
            min_price: stats.min_price,
            max_price: stats.max_price,
            count: stats.count,
            service_centers,
        }
    }
}

/// Historical price point, written whenever a center's price changes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PriceAnalytic {
    pub id: i64,
    pub repair_price_id: i64,
    pub service_center_id: i64,
    pub price: f64,
    pub change_date: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: i64,
    pub email: Option<String>,
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub role: UserRole,
    pub telegram_id: Option<i64>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language_code: Option<String>,
    pub city_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn is_service_owner(&self) -> bool {
        self.role == UserRole::ServiceOwner
    }
}

/// Persistence input for a user. Accounts created through the API carry an
/// email and password hash; accounts created by the bot carry Telegram data.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub telegram_id: Option<i64>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
    pub role: Option<UserRole>,
    pub city_id: Option<i64>,
}

// ---------------------------------------------------------------------------
// Bot logs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BotLog {
    pub id: i64,
    pub telegram_user_id: i64,
    pub request_text: String,
    pub response_text: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBotLog {
    pub telegram_user_id: i64,
    pub request_text: String,
    pub response_text: serde_json::Value,
}
