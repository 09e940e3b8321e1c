//! HTML message bodies for the browser bot.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::utils::html::escape;

use repairhub_core::models::{LinkType, Review, ServiceCenterDetail, ServiceCenterSummary};

use super::callback::Callback;

const SEPARATOR_WIDTH: usize = 10;
const ITEM_RULE_WIDTH: usize = 20;

/// Russian plural form of "review" for `count`.
pub fn pluralize_reviews(count: i64) -> &'static str {
    let count = count.abs();
    if count % 10 == 1 && count % 100 != 11 {
        "отзыв"
    } else if (2..=4).contains(&(count % 10)) && (count % 100 < 10 || count % 100 >= 20) {
        "отзыва"
    } else {
        "отзывов"
    }
}

fn separator() -> String {
    format!("\n{}\n", "─".repeat(SEPARATOR_WIDTH))
}

/// The center card shown for `/service_center_{id}` and `center_{id}`.
pub fn format_service_center_message(detail: &ServiceCenterDetail) -> String {
    let address = detail
        .addresses
        .first()
        .map(|a| escape(&a.name))
        .unwrap_or_else(|| "Не указан".to_string());
    let phone = detail
        .center
        .phone
        .as_deref()
        .map(escape)
        .unwrap_or_else(|| "Не указан".to_string());

    let mut message = format!(
        "🏢 <b>{name}</b>\n\n\
         ⭐️ <b>Рейтинг:</b> {rating:.1} ({count} {plural})\n\n\
         📍 <b>Адрес:</b> {address}\n\n\
         📞 <b>Телефон:</b> {phone}\n\n",
        name = escape(&detail.center.name),
        rating = detail.avg_rating,
        count = detail.reviews_count,
        plural = pluralize_reviews(detail.reviews_count),
    );

    message.push_str(&separator());

    let links: Vec<String> = detail
        .links
        .iter()
        .filter_map(|link| {
            let label = match link.link_type? {
                LinkType::Vk => "🔗 <b>ВКонтакте:</b>",
                LinkType::Instagram => "📸 <b>Instagram:</b>",
                LinkType::Telegram => "📱 <b>Telegram:</b>",
                LinkType::Website => "🌐 <b>Сайт:</b>",
                _ => return None,
            };
            Some(format!(
                "{label} <a href='{}'>Перейти</a>\n\n",
                escape(&link.link)
            ))
        })
        .collect();

    if links.is_empty() {
        message.push_str("<i>Нет доступных ссылок</i>\n");
    } else {
        message.push_str("<b>Ссылки:</b>\n\n");
        message.push_str(&links.concat());
    }

    message.push_str(&separator());
    message.push_str("<b>Не нашли нужную информацию?</b> Напишите нам, и мы поможем!");
    message
}

/// Up to the given reviews, newest first, under the center name.
pub fn format_reviews_message(center_name: &str, reviews: &[Review]) -> String {
    let mut text = format!("Отзывы о сервисном центре: <b>{}</b>\n\n", escape(center_name));
    if reviews.is_empty() {
        text.push_str("Отзывов пока нет.");
        return text;
    }
    for review in reviews {
        let stars = review.rating.map(|r| r.round().clamp(0.0, 5.0) as usize).unwrap_or(0);
        if stars > 0 {
            text.push_str(&"⭐".repeat(stars));
            text.push_str("\n\n");
        }
        text.push_str(&format!(
            "<b>{}</b>: {}\n\n{}\n",
            escape(&review.author),
            escape(review.text.as_deref().unwrap_or_default()),
            "─".repeat(SEPARATOR_WIDTH)
        ));
    }
    text.trim_end().to_string()
}

/// One page of a center listing.
#[derive(Debug, Clone)]
pub struct ResultsPage<'a> {
    pub centers: &'a [ServiceCenterSummary],
    /// 0-based.
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub last_page: i64,
}

impl ResultsPage<'_> {
    fn first_index(&self) -> i64 {
        self.page * self.per_page + 1
    }

    fn has_prev(&self) -> bool {
        self.page > 0
    }

    fn has_next(&self) -> bool {
        self.page < self.last_page - 1
    }
}

fn center_line(marker: &str, center: &ServiceCenterSummary, command: &str) -> String {
    let address = center
        .address
        .as_deref()
        .map(escape)
        .unwrap_or_else(|| "Не указан".to_string());
    format!(
        "{marker} ⭐️{:.1} ({} {})\n{address}\n/{command}_{} - подробнее\n{}",
        center.avg_rating,
        center.reviews_count,
        pluralize_reviews(center.reviews_count),
        center.id,
        "-".repeat(ITEM_RULE_WIDTH)
    )
}

fn nav_row(prev: Option<String>, next: Option<String>) -> InlineKeyboardMarkup {
    let mut row = Vec::new();
    if let Some(data) = prev {
        row.push(InlineKeyboardButton::callback("⬅️ Назад", data));
    }
    if let Some(data) = next {
        row.push(InlineKeyboardButton::callback("Вперед ➡️", data));
    }
    if row.is_empty() {
        InlineKeyboardMarkup::default()
    } else {
        InlineKeyboardMarkup::new(vec![row])
    }
}

/// Search results with paging buttons. Without a query the first page
/// highlights the three best entries.
pub fn search_results_message(
    results: &ResultsPage<'_>,
    query: &str,
    city_id: Option<i64>,
    city_name: Option<&str>,
) -> (String, InlineKeyboardMarkup) {
    if results.centers.is_empty() {
        return (
            "Сервисные центры не найдены.".to_string(),
            InlineKeyboardMarkup::default(),
        );
    }

    let page_label = format!("страница {} из {}", results.page + 1, results.last_page);
    let header = match (query.is_empty(), city_name) {
        (true, Some(city)) => format!("<b>Лучшие сервисы в {} ({page_label}):</b>\n", escape(city)),
        (true, None) => format!("<b>Лучшие сервисы ({page_label}):</b>\n"),
        (false, _) => format!(
            "Сервисы по запросу - <b>{}</b> ({page_label})\n",
            escape(query)
        ),
    };

    let mut lines = vec![header];
    for (index, center) in (results.first_index()..).zip(results.centers) {
        let name = escape(&center.name);
        let marker = match index {
            1 if results.page == 0 && query.is_empty() => format!("🏆 <b>{name}</b>"),
            2 | 3 if results.page == 0 && query.is_empty() => format!("🔹 <b>{name}</b>"),
            _ => format!("{index}. {name}"),
        };
        lines.push(center_line(&marker, center, "service_center"));
    }
    lines.push(format!("\nВсего сервисных центров: {}\n", results.total));

    let page_button = |page: i64| {
        Callback::SearchPage {
            page,
            query: query.to_string(),
            city_id,
        }
        .encode()
    };
    let keyboard = nav_row(
        results.has_prev().then(|| page_button(results.page - 1)),
        results.has_next().then(|| page_button(results.page + 1)),
    );

    (lines.join("\n"), keyboard)
}

/// The owner's centers, linking to the management card.
pub fn service_admin_results_message(results: &ResultsPage<'_>) -> (String, InlineKeyboardMarkup) {
    if results.centers.is_empty() {
        return (
            "Сервисные центры не найдены.".to_string(),
            InlineKeyboardMarkup::default(),
        );
    }

    let mut lines = vec![format!(
        "<b>Ваши сервисные центры (страница {} из {}):</b>",
        results.page + 1,
        results.last_page
    )];
    for (index, center) in (results.first_index()..).zip(results.centers) {
        let marker = format!("{index}. {}", escape(&center.name));
        lines.push(center_line(&marker, center, "manage_service_center"));
    }
    lines.push(format!("\nВсего сервисных центров: {}\n", results.total));

    let keyboard = nav_row(
        results
            .has_prev()
            .then(|| Callback::ServiceAdminPage(results.page - 1).encode()),
        results
            .has_next()
            .then(|| Callback::ServiceAdminPage(results.page + 1).encode()),
    );

    (lines.join("\n"), keyboard)
}
