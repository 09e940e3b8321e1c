//! The consultation bot: walks a customer from their city to a repair
//! booking, or answers one of the informational questions.

pub mod funnel;

use teloxide::dispatching::UpdateHandler;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use teloxide::types::{ButtonRequest, KeyboardButton, KeyboardMarkup, KeyboardRemove, ReplyMarkup};

use repairhub_core::{AppError, PageParams};
use repairhub_db::Database;

use self::funnel::{CityChoice, Directory, Input, Keyboard, Reply, State};
use crate::error::{BotError, HandlerResult};
use crate::journal;

const SHARE_PHONE: &str = "Поделиться номером";
const CITY_LOOKUP_LIMIT: i64 = 20;
const CENTER_LOOKUP_LIMIT: i64 = 10;

pub type ConsultantDialogue = Dialogue<State, InMemStorage<State>>;

/// Dependencies injected into every handler.
#[derive(Clone)]
pub struct ConsultantContext {
    pub db: Database,
}

/// Catalog lookups backed by the database.
pub struct DbDirectory<'a> {
    db: &'a Database,
}

impl<'a> DbDirectory<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }
}

impl Directory for DbDirectory<'_> {
    async fn find_cities(&self, name: &str) -> Result<Vec<CityChoice>, AppError> {
        let page = self
            .db
            .location_repo()
            .search_cities(Some(name), None, PageParams::new(0, CITY_LOOKUP_LIMIT))
            .await?;
        Ok(page
            .items
            .into_iter()
            .map(|city| CityChoice {
                id: city.id,
                name: city.name,
            })
            .collect())
    }

    async fn centers_in(&self, city_id: i64) -> Result<Vec<String>, AppError> {
        let page = self
            .db
            .service_center_repo()
            .by_city(city_id, PageParams::new(0, CENTER_LOOKUP_LIMIT))
            .await?;
        Ok(page.items.into_iter().map(|center| center.name).collect())
    }
}

pub fn schema() -> UpdateHandler<BotError> {
    Update::filter_message()
        .enter_dialogue::<Message, InMemStorage<State>, State>()
        .endpoint(on_message)
}

/// Polls Telegram until Ctrl+C.
pub async fn run(bot: Bot, context: ConsultantContext) {
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![context, InMemStorage::<State>::new()])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

fn read_input(msg: &Message) -> Option<Input<'_>> {
    if let Some(contact) = msg.contact() {
        return Some(Input::Contact(&contact.phone_number));
    }
    let text = msg.text()?;
    let command = text.split_whitespace().next().unwrap_or_default();
    let command = command.split('@').next().unwrap_or_default();
    Some(match command {
        "/start" => Input::Start,
        "/cancel" => Input::Cancel,
        _ => Input::Text(text),
    })
}

fn reply_markup(keyboard: &Keyboard) -> Option<ReplyMarkup> {
    match keyboard {
        Keyboard::Keep => None,
        Keyboard::Options(options) => {
            let rows: Vec<Vec<KeyboardButton>> = options
                .iter()
                .map(|option| vec![KeyboardButton::new(option.clone())])
                .collect();
            Some(ReplyMarkup::Keyboard(
                KeyboardMarkup::new(rows).resize_keyboard(),
            ))
        }
        Keyboard::RequestContact => {
            let button = KeyboardButton::new(SHARE_PHONE).request(ButtonRequest::Contact);
            Some(ReplyMarkup::Keyboard(
                KeyboardMarkup::new(vec![vec![button]])
                    .resize_keyboard()
                    .one_time_keyboard(),
            ))
        }
        Keyboard::Remove => Some(ReplyMarkup::KeyboardRemove(KeyboardRemove::new())),
    }
}

async fn send(bot: &Bot, chat: ChatId, reply: &Reply) -> Result<(), BotError> {
    let mut request = bot.send_message(chat, &reply.text);
    if let Some(markup) = reply_markup(&reply.keyboard) {
        request = request.reply_markup(markup);
    }
    request.await?;
    Ok(())
}

async fn on_message(
    bot: Bot,
    dialogue: ConsultantDialogue,
    msg: Message,
    context: ConsultantContext,
) -> HandlerResult {
    let Some(input) = read_input(&msg) else {
        return Ok(());
    };
    let telegram_id = msg.from.as_ref().map_or(msg.chat.id.0, |u| u.id.0 as i64);
    let request = match input {
        Input::Contact(phone) => phone.to_string(),
        _ => msg.text().unwrap_or_default().to_string(),
    };

    let state = dialogue.get_or_default().await?;
    let directory = DbDirectory::new(&context.db);
    let transition = funnel::advance(&state, input, &directory).await;
    tracing::debug!(
        telegram_id,
        from = ?state,
        to = ?transition.next,
        "Consultation step"
    );

    for reply in &transition.replies {
        send(&bot, msg.chat.id, reply).await?;
        journal::record(&context.db, telegram_id, &request, &reply.text).await;
    }

    match transition.next {
        Some(next) => dialogue.update(next).await?,
        None => dialogue.exit().await?,
    }
    Ok(())
}
