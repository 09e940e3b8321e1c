pub mod common;

mod catalog_tests;
mod location_tests;
mod price_tests;
mod service_center_tests;
mod user_tests;
