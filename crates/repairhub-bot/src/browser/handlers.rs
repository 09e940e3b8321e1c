use teloxide::prelude::*;
use teloxide::types::{
    ChatId, InlineKeyboardMarkup, KeyboardMarkup, MessageId, ParseMode, User as TelegramUser,
};
use teloxide::utils::html::escape;
use teloxide::{ApiError, RequestError};

use repairhub_core::models::{ClaimRequest, NewClaimRequest, NewUser, User, UserRole};
use repairhub_core::{AppError, PageParams};

use super::callback::Callback;
use super::commands::{ClaimIdArg, Command, SearchArgs, parse_claim_id};
use super::format::{self, ResultsPage};
use super::keyboards::{
    self, MENU_BACK, MENU_CHOOSE_CITY, MENU_MANAGE, MENU_SERVICE_CENTERS, MENU_SETTINGS,
};
use super::{
    BrowserContext, ClaimStep, LastSearch, OWNER_PAGE_SIZE, PAGE_SIZE, REVIEWS_SHOWN,
    SessionDialogue,
};
use crate::error::{BotError, HandlerResult};
use crate::journal;

/// Regions and cities fit on one keyboard.
const PICKER_LIMIT: i64 = 100;

/// Where a reply goes: a new message, or an edit of the message that
/// carried the pressed button.
#[derive(Debug, Clone, Copy)]
enum Target {
    Chat(ChatId),
    Edit(ChatId, MessageId),
}

enum Markup {
    None,
    Inline(InlineKeyboardMarkup),
    Reply(KeyboardMarkup),
}

/// Sends replies for one update and journals each of them.
struct Responder {
    bot: Bot,
    context: BrowserContext,
    target: Target,
    telegram_id: i64,
    request: String,
}

impl Responder {
    async fn text(&self, text: impl Into<String>, markup: Markup) -> HandlerResult {
        self.send(text.into(), markup, None).await
    }

    async fn html(&self, text: impl Into<String>, markup: Markup) -> HandlerResult {
        self.send(text.into(), markup, Some(ParseMode::Html)).await
    }

    async fn send(
        &self,
        text: String,
        markup: Markup,
        parse_mode: Option<ParseMode>,
    ) -> HandlerResult {
        let result = match (self.target, markup) {
            (Target::Edit(chat, message_id), Markup::Inline(keyboard)) => {
                let mut request = self
                    .bot
                    .edit_message_text(chat, message_id, &text)
                    .reply_markup(keyboard);
                if let Some(mode) = parse_mode {
                    request = request.parse_mode(mode);
                }
                request.await.map(drop)
            }
            (Target::Edit(chat, message_id), Markup::None) => {
                let mut request = self.bot.edit_message_text(chat, message_id, &text);
                if let Some(mode) = parse_mode {
                    request = request.parse_mode(mode);
                }
                request.await.map(drop)
            }
            // Reply keyboards cannot be attached to an edited message.
            (Target::Chat(chat) | Target::Edit(chat, _), markup) => {
                let mut request = self.bot.send_message(chat, &text);
                if let Some(mode) = parse_mode {
                    request = request.parse_mode(mode);
                }
                match markup {
                    Markup::Inline(keyboard) => request = request.reply_markup(keyboard),
                    Markup::Reply(keyboard) => request = request.reply_markup(keyboard),
                    Markup::None => {}
                }
                request.await.map(drop)
            }
        };

        match result {
            Ok(()) | Err(RequestError::Api(ApiError::MessageNotModified)) => {}
            Err(e) => return Err(e.into()),
        }
        journal::record(&self.context.db, self.telegram_id, &self.request, &text).await;
        Ok(())
    }
}

/// Loads the bot user behind a Telegram account, registering it on first
/// contact.
async fn ensure_user(context: &BrowserContext, from: &TelegramUser) -> Result<User, AppError> {
    let profile = NewUser {
        telegram_id: Some(from.id.0 as i64),
        username: from.username.clone(),
        first_name: Some(from.first_name.clone()),
        last_name: from.last_name.clone(),
        language_code: from
            .language_code
            .clone()
            .or_else(|| Some("en".to_string())),
        role: UserRole::User,
        is_active: true,
        ..NewUser::default()
    };
    context.db.user_repo().get_or_create_telegram(&profile).await
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

pub(super) async fn on_message(
    bot: Bot,
    context: BrowserContext,
    dialogue: SessionDialogue,
    msg: Message,
) -> HandlerResult {
    let (Some(from), Some(text)) = (msg.from.as_ref(), msg.text()) else {
        return Ok(());
    };
    let responder = Responder {
        bot,
        context: context.clone(),
        target: Target::Chat(msg.chat.id),
        telegram_id: from.id.0 as i64,
        request: text.to_string(),
    };

    if let Some(command) = Command::parse(text) {
        return on_command(&responder, &context, &dialogue, from, command).await;
    }

    let session = dialogue.get_or_default().await?;
    match session.claim {
        ClaimStep::AwaitingContact { center_id } => {
            claim_contact(&responder, &dialogue, center_id, text).await
        }
        ClaimStep::AwaitingMessage { center_id, contact } => {
            claim_message(&responder, &context, &dialogue, from, center_id, &contact, text).await
        }
        ClaimStep::Idle => on_menu_text(&responder, &context, &dialogue, from, text).await,
    }
}

async fn on_command(
    r: &Responder,
    context: &BrowserContext,
    dialogue: &SessionDialogue,
    from: &TelegramUser,
    command: Command,
) -> HandlerResult {
    tracing::info!(telegram_id = r.telegram_id, ?command, "Command received");
    match command {
        Command::Start => {
            ensure_user(context, from).await?;
            let mut session = dialogue.get_or_default().await?;
            session.claim = ClaimStep::Idle;
            dialogue.update(session).await?;
            r.text("Главное меню", Markup::Reply(keyboards::main_menu()))
                .await
        }
        Command::Settings => {
            ensure_user(context, from).await?;
            r.text(
                "Настройки пользователя",
                Markup::Reply(keyboards::settings_menu()),
            )
            .await
        }
        Command::ServiceCenters(args) => search_centers(r, context, dialogue, from, args).await,
        Command::ApproveClaim(args) => approve_claim(r, context, &args).await,
        Command::RejectClaim(args) => reject_claim(r, context, &args).await,
        Command::ServiceCenter(id) => show_center(r, context, from, id).await,
        Command::ManageServiceCenter(id) => show_managed_center(r, context, from, id).await,
    }
}

async fn on_menu_text(
    r: &Responder,
    context: &BrowserContext,
    dialogue: &SessionDialogue,
    from: &TelegramUser,
    text: &str,
) -> HandlerResult {
    match text {
        MENU_SERVICE_CENTERS => {
            search_centers(r, context, dialogue, from, SearchArgs::default()).await
        }
        MENU_SETTINGS => on_command(r, context, dialogue, from, Command::Settings).await,
        MENU_CHOOSE_CITY => show_regions(r, context).await,
        MENU_MANAGE => {
            let user = ensure_user(context, from).await?;
            if user.city_id.is_none() {
                return r
                    .text("Сначала укажите город в настройках!", Markup::None)
                    .await;
            }
            show_owned_page(r, context, &user, 0, true).await
        }
        MENU_BACK => on_command(r, context, dialogue, from, Command::Start).await,
        _ => {
            tracing::debug!(telegram_id = r.telegram_id, %text, "Unhandled message");
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

async fn search_centers(
    r: &Responder,
    context: &BrowserContext,
    dialogue: &SessionDialogue,
    from: &TelegramUser,
    args: SearchArgs,
) -> HandlerResult {
    if args.bad_city_id {
        return r
            .text("Неверный ID города. Используйте: city_id=Y", Markup::None)
            .await;
    }
    let user = ensure_user(context, from).await?;

    if args.is_empty() && user.city_id.is_none() {
        let regions = context
            .db
            .location_repo()
            .list_regions(PageParams::new(0, PICKER_LIMIT))
            .await?;
        return r
            .text(
                "Укажите ваш город для поиска центров по умолчанию.\n\
                 Использование: /service_centers <запрос> [city_id=Y]",
                Markup::Inline(keyboards::regions(&regions.items)),
            )
            .await;
    }

    let search = LastSearch {
        page: 0,
        query: args.query,
        city_id: args.city_id.or(user.city_id),
    };
    show_search_page(r, context, dialogue, search).await
}

async fn show_search_page(
    r: &Responder,
    context: &BrowserContext,
    dialogue: &SessionDialogue,
    search: LastSearch,
) -> HandlerResult {
    let page = context
        .db
        .service_center_repo()
        .search(
            &search.query,
            search.city_id,
            PageParams::new(search.page * PAGE_SIZE, PAGE_SIZE),
        )
        .await?;
    let city_name = match search.city_id {
        Some(city_id) => context
            .db
            .location_repo()
            .get_city(city_id)
            .await?
            .map(|c| c.name),
        None => None,
    };

    let results = ResultsPage {
        centers: &page.items,
        page: search.page,
        per_page: PAGE_SIZE,
        total: page.total,
        last_page: page.pages,
    };
    let (text, keyboard) = format::search_results_message(
        &results,
        &search.query,
        search.city_id,
        city_name.as_deref(),
    );

    let mut session = dialogue.get_or_default().await?;
    session.last_search = Some(search);
    dialogue.update(session).await?;

    r.html(text, Markup::Inline(keyboard)).await
}

async fn show_regions(r: &Responder, context: &BrowserContext) -> HandlerResult {
    let regions = context
        .db
        .location_repo()
        .list_regions(PageParams::new(0, PICKER_LIMIT))
        .await?;
    let text = if regions.items.is_empty() {
        "Регионы не найдены."
    } else {
        "Выберите регион:"
    };
    r.text(text, Markup::Inline(keyboards::regions(&regions.items)))
        .await
}

async fn show_cities(r: &Responder, context: &BrowserContext, region_id: i64) -> HandlerResult {
    let cities = match context
        .db
        .location_repo()
        .cities_by_region(region_id, PageParams::new(0, PICKER_LIMIT))
        .await
    {
        Ok(page) => page.items,
        Err(AppError::NotFound(_)) => {
            return r
                .text("Ошибка: некорректный ID региона.", Markup::None)
                .await;
        }
        Err(e) => return Err(e.into()),
    };
    let text = if cities.is_empty() {
        "Города не найдены."
    } else {
        "Выберите город:"
    };
    r.text(text, Markup::Inline(keyboards::cities(&cities))).await
}

// ---------------------------------------------------------------------------
// Center cards
// ---------------------------------------------------------------------------

async fn show_center(
    r: &Responder,
    context: &BrowserContext,
    from: &TelegramUser,
    center_id: i64,
) -> HandlerResult {
    let user = ensure_user(context, from).await?;
    let detail = match context.db.service_center_repo().detail(center_id).await {
        Ok(detail) => detail,
        Err(AppError::NotFound(_)) => {
            return r.text("Сервисный центр не найден.", Markup::None).await;
        }
        Err(e) => return Err(e.into()),
    };
    let is_owner = detail.center.owner_id == Some(user.id);
    r.html(
        format::format_service_center_message(&detail),
        Markup::Inline(keyboards::center_actions(center_id, is_owner)),
    )
    .await
}

async fn show_managed_center(
    r: &Responder,
    context: &BrowserContext,
    from: &TelegramUser,
    center_id: i64,
) -> HandlerResult {
    let user = ensure_user(context, from).await?;
    let detail = match context.db.service_center_repo().detail(center_id).await {
        Ok(detail) => detail,
        Err(AppError::NotFound(_)) => {
            return r.text("Сервисный центр не найден.", Markup::None).await;
        }
        Err(e) => return Err(e.into()),
    };
    if detail.center.owner_id != Some(user.id) {
        return r
            .text(
                "Вы не являетесь владельцем этого сервисного центра.",
                Markup::None,
            )
            .await;
    }
    r.html(
        format::format_service_center_message(&detail),
        Markup::Inline(keyboards::manage_center_actions(center_id)),
    )
    .await
}

/// One owned center per page. `announce_empty` distinguishes the menu
/// entry, which explains an empty list, from paging.
async fn show_owned_page(
    r: &Responder,
    context: &BrowserContext,
    user: &User,
    page: i64,
    announce_empty: bool,
) -> HandlerResult {
    let owned = context
        .db
        .service_center_repo()
        .by_owner(user.id, PageParams::new(page * OWNER_PAGE_SIZE, OWNER_PAGE_SIZE))
        .await?;
    if owned.items.is_empty() && announce_empty && page == 0 {
        return r
            .text("У вас пока нет сервисных центров.", Markup::None)
            .await;
    }
    let results = ResultsPage {
        centers: &owned.items,
        page,
        per_page: OWNER_PAGE_SIZE,
        total: owned.total,
        last_page: owned.pages,
    };
    let (text, keyboard) = format::service_admin_results_message(&results);
    r.html(text, Markup::Inline(keyboard)).await
}

async fn show_reviews(r: &Responder, context: &BrowserContext, center_id: i64) -> HandlerResult {
    let centers = context.db.service_center_repo();
    let Some(center) = centers.get(center_id).await? else {
        return r.text("Сервисный центр не найден.", Markup::None).await;
    };
    let reviews = centers
        .reviews(center_id, PageParams::new(0, REVIEWS_SHOWN))
        .await?;
    r.html(
        format::format_reviews_message(&center.name, &reviews.items),
        Markup::Inline(keyboards::reviews_back(center_id)),
    )
    .await
}

// ---------------------------------------------------------------------------
// Ownership claims
// ---------------------------------------------------------------------------

async fn start_claim(
    bot: &Bot,
    r: &Responder,
    context: &BrowserContext,
    dialogue: &SessionDialogue,
    query_id: String,
    center_id: i64,
) -> HandlerResult {
    let alert = |text: &'static str| {
        bot.answer_callback_query(query_id.clone())
            .text(text)
            .show_alert(true)
    };

    let Some(center) = context.db.service_center_repo().get(center_id).await? else {
        alert("Сервисный центр не найден.").await?;
        return Ok(());
    };
    if center.owner_id.is_some() {
        alert("Этот сервис уже привязан к другому пользователю.").await?;
        return Ok(());
    }
    bot.answer_callback_query(query_id.clone()).await?;

    let mut session = dialogue.get_or_default().await?;
    session.claim = ClaimStep::AwaitingContact { center_id };
    dialogue.update(session).await?;

    r.text(
        "Пожалуйста, укажите контакт для связи (например, телефон):",
        Markup::Inline(keyboards::cancel_claim()),
    )
    .await
}

async fn claim_contact(
    r: &Responder,
    dialogue: &SessionDialogue,
    center_id: i64,
    text: &str,
) -> HandlerResult {
    let contact = text.trim();
    if contact.is_empty() {
        return r
            .text(
                "Контакт не может быть пустым. Попробуйте ещё раз:",
                Markup::None,
            )
            .await;
    }

    let mut session = dialogue.get_or_default().await?;
    session.claim = ClaimStep::AwaitingMessage {
        center_id,
        contact: contact.to_string(),
    };
    dialogue.update(session).await?;

    r.text(
        "Укажите сообщение для заявки:",
        Markup::Inline(keyboards::cancel_claim()),
    )
    .await
}

async fn claim_message(
    r: &Responder,
    context: &BrowserContext,
    dialogue: &SessionDialogue,
    from: &TelegramUser,
    center_id: i64,
    contact: &str,
    text: &str,
) -> HandlerResult {
    let message = text.trim();
    if message.is_empty() {
        return r
            .text(
                "Сообщение не может быть пустым. Попробуйте ещё раз:",
                Markup::None,
            )
            .await;
    }

    let mut session = dialogue.get_or_default().await?;
    session.claim = ClaimStep::Idle;
    dialogue.update(session).await?;

    let centers = context.db.service_center_repo();
    let Some(center) = centers.get(center_id).await? else {
        return r.text("Сервисный центр не найден.", Markup::None).await;
    };

    let claim = NewClaimRequest {
        service_center_id: center_id,
        telegram_id: from.id.0 as i64,
        message: message.to_string(),
        contact: contact.to_string(),
    };
    match centers.create_claim(&claim).await {
        Ok(created) => {
            notify_admins(r, context, created.id, &center.name, contact, message).await;
            r.text(
                format!(
                    "Заявка на владение сервисом '{}' отправлена!\nКонтакт: {contact}\nСообщение: {message}",
                    center.name
                ),
                Markup::None,
            )
            .await
        }
        Err(e @ (AppError::BadRequest(_) | AppError::NotFound(_))) => {
            tracing::warn!(center_id, error = %e, "Claim rejected");
            r.text("Ошибка при создании заявки.", Markup::None).await
        }
        Err(e) => Err(e.into()),
    }
}

/// Tells every moderator about a new claim. Delivery failures are logged.
async fn notify_admins(
    r: &Responder,
    context: &BrowserContext,
    claim_id: i64,
    center_name: &str,
    contact: &str,
    message: &str,
) {
    let text = format!(
        "Новая заявка #{claim_id} на владение сервисом <b>{}</b>\n\
         Контакт: {}\nСообщение: {}\n\n\
         /approve_claim {claim_id}\n/reject_claim {claim_id}",
        escape(center_name),
        escape(contact),
        escape(message),
    );
    for admin_id in &context.config.admin_ids {
        if let Err(e) = r
            .bot
            .send_message(ChatId(*admin_id), &text)
            .parse_mode(ParseMode::Html)
            .await
        {
            tracing::warn!(admin_id, error = %e, "Failed to notify moderator");
        }
    }
}

async fn cancel_claim(r: &Responder, dialogue: &SessionDialogue) -> HandlerResult {
    let mut session = dialogue.get_or_default().await?;
    session.claim = ClaimStep::Idle;
    dialogue.update(session).await?;
    r.text("Действие отменено.", Markup::None).await
}

/// Sends an HTML message to the claimant. Delivery failures are logged.
async fn notify_claimant(r: &Responder, telegram_id: i64, text: String) {
    if let Err(e) = r
        .bot
        .send_message(ChatId(telegram_id), text)
        .parse_mode(ParseMode::Html)
        .await
    {
        tracing::warn!(telegram_id, error = %e, "Failed to notify claimant");
    }
}

async fn center_name(context: &BrowserContext, center_id: i64) -> Result<String, AppError> {
    Ok(context
        .db
        .service_center_repo()
        .get(center_id)
        .await?
        .map(|c| c.name)
        .unwrap_or_else(|| "Неизвестный центр".to_string()))
}

/// Validates the moderator and the claim id. `Ok(None)` means a reply was
/// already sent.
async fn moderated_claim_id(
    r: &Responder,
    context: &BrowserContext,
    args: &str,
    usage: &str,
) -> Result<Option<i64>, BotError> {
    if !context.config.is_admin(r.telegram_id) {
        r.text("У вас нет прав для этой команды.", Markup::None)
            .await?;
        return Ok(None);
    }
    match parse_claim_id(args) {
        ClaimIdArg::Id(id) => Ok(Some(id)),
        ClaimIdArg::Missing => {
            r.text(format!("Использование: {usage}"), Markup::None)
                .await?;
            Ok(None)
        }
        ClaimIdArg::Invalid => {
            r.text("Неверный ID заявки.", Markup::None).await?;
            Ok(None)
        }
    }
}

/// Approves a claim; the claimant becomes the owner when they have an
/// account.
async fn approve_for_claimant(
    context: &BrowserContext,
    claim_id: i64,
) -> Result<ClaimRequest, AppError> {
    let centers = context.db.service_center_repo();
    let claim = centers.require_claim(claim_id).await?;
    let owner_id = context
        .db
        .user_repo()
        .get_by_telegram_id(claim.telegram_id)
        .await?
        .map(|u| u.id);
    centers.approve_claim(claim_id, owner_id).await
}

async fn approve_claim(r: &Responder, context: &BrowserContext, args: &str) -> HandlerResult {
    let Some(claim_id) =
        moderated_claim_id(r, context, args, "/approve_claim {claim_id}").await?
    else {
        return Ok(());
    };

    let claim = match approve_for_claimant(context, claim_id).await {
        Ok(claim) => claim,
        Err(e) => {
            tracing::warn!(claim_id, error = %e, "Claim approval failed");
            return r
                .text("Ошибка при подтверждении заявки.", Markup::None)
                .await;
        }
    };

    let name = center_name(context, claim.service_center_id).await?;
    notify_claimant(
        r,
        claim.telegram_id,
        format!(
            "Ваша заявка на владение сервисом <b>{}</b> подтверждена!\n\
             Теперь вы можете управлять им через меню 'Управление сервисом 🛠️'.",
            escape(&name)
        ),
    )
    .await;
    r.text(format!("Заявка {claim_id} подтверждена."), Markup::None)
        .await
}

async fn reject_claim(r: &Responder, context: &BrowserContext, args: &str) -> HandlerResult {
    let Some(claim_id) =
        moderated_claim_id(r, context, args, "/reject_claim {claim_id}").await?
    else {
        return Ok(());
    };

    let claim = match context.db.service_center_repo().reject_claim(claim_id).await {
        Ok(claim) => claim,
        Err(e) => {
            tracing::warn!(claim_id, error = %e, "Claim rejection failed");
            return r.text("Ошибка при отмене заявки.", Markup::None).await;
        }
    };

    let name = center_name(context, claim.service_center_id).await?;
    notify_claimant(
        r,
        claim.telegram_id,
        format!(
            "Ваша заявка на владение сервисом <b>{}</b> отменена.\n\
             За более подробной информацией обращайтесь в поддержку - /help.",
            escape(&name)
        ),
    )
    .await;
    r.text(format!("Заявка {claim_id} отменена."), Markup::None)
        .await
}

// ---------------------------------------------------------------------------
// Callbacks
// ---------------------------------------------------------------------------

pub(super) async fn on_callback(
    bot: Bot,
    context: BrowserContext,
    dialogue: SessionDialogue,
    q: CallbackQuery,
) -> HandlerResult {
    let telegram_id = q.from.id.0 as i64;
    let target = q
        .message
        .as_ref()
        .map(|m| Target::Edit(m.chat().id, m.id()))
        .unwrap_or(Target::Chat(ChatId(telegram_id)));
    let data = q.data.clone().unwrap_or_default();

    let Some(callback) = Callback::parse(&data) else {
        tracing::debug!(telegram_id, %data, "Unknown callback");
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    let r = Responder {
        bot: bot.clone(),
        context: context.clone(),
        target,
        telegram_id,
        request: data,
    };

    if let Callback::ClaimService(center_id) = callback {
        return start_claim(&bot, &r, &context, &dialogue, q.id.clone(), center_id).await;
    }
    bot.answer_callback_query(q.id.clone()).await?;

    match callback {
        Callback::Region(region_id) => show_cities(&r, &context, region_id).await,
        Callback::City(city_id) => {
            let user = ensure_user(&context, &q.from).await?;
            match context.db.user_repo().set_city(user.id, city_id).await {
                Ok(_) => {}
                Err(AppError::NotFound(_)) => {
                    return r
                        .text("Ошибка: некорректный ID города.", Markup::None)
                        .await;
                }
                Err(e) => return Err(e.into()),
            }
            tracing::info!(telegram_id, city_id, "Default city saved");
            let search = LastSearch {
                page: 0,
                query: String::new(),
                city_id: Some(city_id),
            };
            show_search_page(&r, &context, &dialogue, search).await
        }
        Callback::Center(center_id) => show_center(&r, &context, &q.from, center_id).await,
        Callback::Reviews(center_id) => show_reviews(&r, &context, center_id).await,
        Callback::CancelClaim => cancel_claim(&r, &dialogue).await,
        Callback::SearchPage {
            page,
            query,
            city_id,
        } => {
            let search = LastSearch {
                page: page.max(0),
                query,
                city_id,
            };
            show_search_page(&r, &context, &dialogue, search).await
        }
        Callback::ServiceAdminPage(page) => {
            let user = ensure_user(&context, &q.from).await?;
            show_owned_page(&r, &context, &user, page.max(0), false).await
        }
        Callback::BackToList => {
            let session = dialogue.get_or_default().await?;
            let search = match session.last_search {
                Some(search) => search,
                None => {
                    let user = ensure_user(&context, &q.from).await?;
                    LastSearch {
                        city_id: user.city_id,
                        ..LastSearch::default()
                    }
                }
            };
            show_search_page(&r, &context, &dialogue, search).await
        }
        Callback::BackRegionList => show_regions(&r, &context).await,
        Callback::ClaimService(_) => Ok(()),
    }
}
