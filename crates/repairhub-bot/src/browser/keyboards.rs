use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use repairhub_core::models::{City, Region};

use super::callback::Callback;

pub const MENU_SERVICE_CENTERS: &str = "Сервисные центры 🛠️";
pub const MENU_SETTINGS: &str = "Настройки пользователя ⚙️";
pub const MENU_CHOOSE_CITY: &str = "Выбрать город по умолчанию 🌍";
pub const MENU_MANAGE: &str = "Управление сервисом 🛠️";
pub const MENU_BACK: &str = "Назад 🔙";

fn reply_keyboard(labels: &[&str]) -> KeyboardMarkup {
    let rows: Vec<Vec<KeyboardButton>> = labels
        .iter()
        .map(|label| vec![KeyboardButton::new(*label)])
        .collect();
    KeyboardMarkup::new(rows).resize_keyboard()
}

pub fn main_menu() -> KeyboardMarkup {
    reply_keyboard(&[MENU_SERVICE_CENTERS, MENU_SETTINGS])
}

pub fn settings_menu() -> KeyboardMarkup {
    reply_keyboard(&[MENU_CHOOSE_CITY, MENU_MANAGE, MENU_BACK])
}

/// Lays buttons out `columns` per row.
fn grid(buttons: Vec<InlineKeyboardButton>, columns: usize) -> Vec<Vec<InlineKeyboardButton>> {
    buttons
        .chunks(columns.max(1))
        .map(<[InlineKeyboardButton]>::to_vec)
        .collect()
}

pub fn regions(regions: &[Region]) -> InlineKeyboardMarkup {
    let buttons = regions
        .iter()
        .map(|r| InlineKeyboardButton::callback(r.name.clone(), Callback::Region(r.id).encode()))
        .collect();
    InlineKeyboardMarkup::new(grid(buttons, 2))
}

pub fn cities(cities: &[City]) -> InlineKeyboardMarkup {
    let buttons = cities
        .iter()
        .map(|c| InlineKeyboardButton::callback(c.name.clone(), Callback::City(c.id).encode()))
        .collect();
    let mut rows = grid(buttons, 2);
    rows.push(vec![InlineKeyboardButton::callback(
        "Назад",
        Callback::BackRegionList.encode(),
    )]);
    InlineKeyboardMarkup::new(rows)
}

/// Buttons under a center card. Owners are not offered to claim their own
/// center.
pub fn center_actions(center_id: i64, is_owner: bool) -> InlineKeyboardMarkup {
    let mut rows = vec![vec![InlineKeyboardButton::callback(
        "Отзывы 📝",
        Callback::Reviews(center_id).encode(),
    )]];
    if !is_owner {
        rows.push(vec![InlineKeyboardButton::callback(
            "Это мой сервис 🛠️",
            Callback::ClaimService(center_id).encode(),
        )]);
    }
    rows.push(vec![InlineKeyboardButton::callback(
        MENU_BACK,
        Callback::BackToList.encode(),
    )]);
    InlineKeyboardMarkup::new(rows)
}

pub fn manage_center_actions(center_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "Отзывы 📝",
            Callback::Reviews(center_id).encode(),
        )],
        vec![InlineKeyboardButton::callback(
            MENU_BACK,
            Callback::ServiceAdminPage(0).encode(),
        )],
    ])
}

pub fn reviews_back(center_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        MENU_BACK,
        Callback::Center(center_id).encode(),
    )]])
}

pub fn cancel_claim() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "Отмена",
        Callback::CancelClaim.encode(),
    )]])
}
