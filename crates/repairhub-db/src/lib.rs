pub mod bot_log_repository;
pub mod config;
pub mod database;
pub mod device_repository;
pub mod location_repository;
pub mod price_repository;
pub mod repair_repository;
pub mod service_center_repository;
mod sql;
pub mod user_repository;

pub use bot_log_repository::BotLogRepository;
pub use config::DatabaseConfig;
pub use database::Database;
pub use device_repository::DeviceRepository;
pub use location_repository::LocationRepository;
pub use price_repository::PriceRepository;
pub use repair_repository::RepairRepository;
pub use service_center_repository::ServiceCenterRepository;
pub use user_repository::UserRepository;
