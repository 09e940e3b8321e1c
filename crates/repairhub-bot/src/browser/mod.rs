//! The service-center browser bot: search, center cards, reviews, default
//! city and ownership claims.

pub mod callback;
pub mod commands;
pub mod format;
mod handlers;
pub mod keyboards;

use std::sync::Arc;

use teloxide::dispatching::UpdateHandler;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;

use repairhub_db::Database;

use crate::config::BotConfig;
use crate::error::BotError;

/// Centers per search page.
pub const PAGE_SIZE: i64 = 5;
/// Centers per page of the owner's list.
pub const OWNER_PAGE_SIZE: i64 = 1;
/// Reviews shown under a center.
pub const REVIEWS_SHOWN: i64 = 5;

/// Dependencies injected into every handler.
#[derive(Clone)]
pub struct BrowserContext {
    pub db: Database,
    pub config: Arc<BotConfig>,
}

/// Per-chat state kept between updates.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub claim: ClaimStep,
    /// Where "Назад" under a center card returns to.
    pub last_search: Option<LastSearch>,
}

/// Progress of the ownership-claim dialogue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ClaimStep {
    #[default]
    Idle,
    AwaitingContact {
        center_id: i64,
    },
    AwaitingMessage {
        center_id: i64,
        contact: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LastSearch {
    /// 0-based.
    pub page: i64,
    pub query: String,
    pub city_id: Option<i64>,
}

pub type SessionDialogue = Dialogue<Session, InMemStorage<Session>>;

pub fn schema() -> UpdateHandler<BotError> {
    let messages = Update::filter_message()
        .enter_dialogue::<Message, InMemStorage<Session>, Session>()
        .endpoint(handlers::on_message);

    let callbacks = Update::filter_callback_query()
        .enter_dialogue::<CallbackQuery, InMemStorage<Session>, Session>()
        .endpoint(handlers::on_callback);

    dptree::entry().branch(messages).branch(callbacks)
}

/// Polls Telegram until Ctrl+C.
pub async fn run(bot: Bot, context: BrowserContext) {
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![context, InMemStorage::<Session>::new()])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
