pub mod browser;
pub mod config;
pub mod consultant;
pub mod error;
pub mod journal;

pub use config::BotConfig;
pub use error::{BotError, HandlerResult};
