use teloxide::dispatching::dialogue::InMemStorageError;
use thiserror::Error;

use repairhub_core::AppError;

/// Errors surfaced by bot handlers.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error(transparent)]
    App(#[from] AppError),

    #[error("Dialogue storage error: {0}")]
    Storage(#[from] InMemStorageError),
}

pub type HandlerResult = Result<(), BotError>;
