//! The consultation funnel as a transition function.
//!
//! Each user input moves the dialogue from one [`State`] to the next and
//! yields the replies to send. Data lookups go through [`Directory`] so the
//! funnel can run against the database or an in-memory fake.

use std::future::Future;
use std::sync::LazyLock;

use regex::Regex;

use repairhub_core::AppError;

pub const WELCOME: &str = "Для того, чтобы мы могли Вас проконсультировать, напишите Ваш город. \
     Только название! Пример: Санкт-Петербург, Ростов-на-Дону, Уфа";
pub const CANCELLED: &str = "Диалог отменен. Чтобы начать заново, используйте /start.";
pub const PROMO_PRICE: &str = "🔥 Стоимость по акции 👉 5490 руб.";

pub const SERVICE_REPAIR: &str = "Нужен ремонт / Диагностика";
pub const SERVICE_FILM: &str = "Бронирование гидрогелевой плёнкой";
pub const SERVICE_ACCESSORIES: &str = "Стоимость кабеля/чехла/защита экрана";
pub const SERVICE_IN_SERVICE: &str = "Мое устройство в сервисе";
pub const SERVICE_WARRANTY: &str = "Хочу обратиться по гарантии";
pub const SERVICE_TRADE: &str = "Продажа/покупка телефона";

pub const SERVICE_OPTIONS: [&str; 6] = [
    SERVICE_REPAIR,
    SERVICE_FILM,
    SERVICE_ACCESSORIES,
    SERVICE_IN_SERVICE,
    SERVICE_WARRANTY,
    SERVICE_TRADE,
];

pub const DATE_OPTIONS: [&str; 3] = ["Сегодня", "Завтра", "Другой день"];

/// Offered when the chosen city has no centers in the catalog.
pub const FALLBACK_CENTERS: [&str; 3] = ["M1-сервис", "Сервис Плюс", "Мастер Гаджет"];

const MAX_CITY_SUGGESTIONS: usize = 5;
const MAX_CENTER_OPTIONS: usize = 10;

static ORDER_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}-\d{5}$").expect("valid order regex"));
static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L} ]+$").expect("valid name regex"));

/// A city the user picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityChoice {
    pub id: i64,
    pub name: String,
}

/// What the user has told us on the way to a booking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Booking {
    pub city: String,
    pub service: String,
    pub model: String,
    pub issue: String,
    pub service_center: String,
    pub visit_date: String,
    pub visit_time: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum State {
    #[default]
    Start,
    City,
    Service {
        city: CityChoice,
    },
    RepairDetails {
        city: CityChoice,
    },
    ChooseServiceCenter {
        booking: Booking,
    },
    ChooseDate {
        booking: Booking,
    },
    ChooseTime {
        booking: Booking,
    },
    EnterName {
        booking: Booking,
    },
    EnterPhone {
        booking: Booking,
    },
    DeviceInService {
        city: CityChoice,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input<'a> {
    Start,
    Cancel,
    Text(&'a str),
    /// Phone number of a shared contact.
    Contact(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Keep whatever keyboard the client shows.
    Keep,
    /// One option per row.
    Options(Vec<String>),
    /// A single "share my number" button.
    RequestContact,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Keyboard,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: Keyboard::Keep,
        }
    }

    fn with_options<S: AsRef<str>>(text: impl Into<String>, options: &[S]) -> Self {
        Self {
            text: text.into(),
            keyboard: Keyboard::Options(options.iter().map(|o| o.as_ref().to_string()).collect()),
        }
    }

    fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard,
        }
    }
}

/// Result of one step. `next == None` ends the dialogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: Option<State>,
    pub replies: Vec<Reply>,
}

impl Transition {
    fn stay(state: State, reply: Reply) -> Self {
        Self {
            next: Some(state),
            replies: vec![reply],
        }
    }

    fn to(state: State, replies: Vec<Reply>) -> Self {
        Self {
            next: Some(state),
            replies,
        }
    }

    fn end(reply: Reply) -> Self {
        Self {
            next: None,
            replies: vec![reply],
        }
    }
}

/// Catalog lookups the funnel needs.
pub trait Directory: Send + Sync {
    /// Cities whose name contains `name`, case-insensitively.
    fn find_cities(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Vec<CityChoice>, AppError>> + Send;

    /// Names of the service centers in a city.
    fn centers_in(&self, city_id: i64)
    -> impl Future<Output = Result<Vec<String>, AppError>> + Send;
}

/// Keeps digits only and maps a leading 8 to 7. Valid numbers are 11
/// digits starting with 7.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let mut digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 11 && digits.starts_with('8') {
        digits.replace_range(..1, "7");
    }
    (digits.len() == 11 && digits.starts_with('7')).then_some(digits)
}

/// "9:00 - 9:30" … "19:30 - 20:00", then "20:00".
pub fn time_slots() -> Vec<String> {
    let mut slots: Vec<String> = (9..20)
        .flat_map(|hour| {
            [
                format!("{hour}:00 - {hour}:30"),
                format!("{hour}:30 - {}:00", hour + 1),
            ]
        })
        .collect();
    slots.push("20:00".to_string());
    slots
}

fn is_valid_name(name: &str) -> bool {
    name.chars().count() >= 2 && NAME.is_match(name)
}

/// Advances the dialogue by one input.
pub async fn advance<D: Directory>(state: &State, input: Input<'_>, directory: &D) -> Transition {
    match input {
        Input::Start => {
            return Transition::to(
                State::City,
                vec![Reply::with_keyboard(WELCOME, Keyboard::Remove)],
            );
        }
        Input::Cancel => {
            return Transition::end(Reply::with_keyboard(CANCELLED, Keyboard::Remove));
        }
        Input::Text(_) | Input::Contact(_) => {}
    }

    match state {
        // Any first message opens the dialogue, like /start.
        State::Start => Transition::to(
            State::City,
            vec![Reply::with_keyboard(WELCOME, Keyboard::Remove)],
        ),
        State::City => match input {
            Input::Text(text) => choose_city(text.trim(), directory).await,
            _ => Transition::stay(State::City, Reply::text(WELCOME)),
        },
        State::Service { city } => match input {
            Input::Text(text) => choose_service(city, text.trim()),
            _ => reask_service(city),
        },
        State::RepairDetails { city } => match input {
            Input::Text(text) => repair_details(city, text, directory).await,
            _ => Transition::stay(state.clone(), Reply::text(REPAIR_DETAILS_FORMAT)),
        },
        State::ChooseServiceCenter { booking } => match input {
            Input::Text(text) if !text.trim().is_empty() => {
                let center = text.trim().to_string();
                let reply = Reply::with_options(
                    format!("Вы выбрали сервис: {center}. Когда планируете посетить?"),
                    &DATE_OPTIONS,
                );
                let booking = Booking {
                    service_center: center,
                    ..booking.clone()
                };
                Transition::to(State::ChooseDate { booking }, vec![reply])
            }
            _ => Transition::stay(
                state.clone(),
                Reply::text("Пожалуйста, выберите сервисный центр из списка."),
            ),
        },
        State::ChooseDate { booking } => match input {
            Input::Text(text) if !text.trim().is_empty() => {
                let date = text.trim().to_string();
                let reply = Reply::with_options(
                    format!("Вы выбрали день: {date}. В какое время вам удобно?"),
                    &time_slots(),
                );
                let booking = Booking {
                    visit_date: date,
                    ..booking.clone()
                };
                Transition::to(State::ChooseTime { booking }, vec![reply])
            }
            _ => Transition::stay(
                state.clone(),
                Reply::with_options("Когда планируете посетить?", &DATE_OPTIONS),
            ),
        },
        State::ChooseTime { booking } => match input {
            Input::Text(text) if !text.trim().is_empty() => {
                let booking = Booking {
                    visit_time: text.trim().to_string(),
                    ..booking.clone()
                };
                Transition::to(
                    State::EnterName { booking },
                    vec![Reply::with_keyboard(
                        "Пожалуйста, укажите ваше имя для записи (минимум 2 буквы, только буквы и пробелы).",
                        Keyboard::Remove,
                    )],
                )
            }
            _ => Transition::stay(
                state.clone(),
                Reply::with_options("В какое время вам удобно?", &time_slots()),
            ),
        },
        State::EnterName { booking } => match input {
            Input::Text(text) if is_valid_name(text.trim()) => {
                let booking = Booking {
                    name: text.trim().to_string(),
                    ..booking.clone()
                };
                Transition::to(
                    State::EnterPhone { booking },
                    vec![Reply::with_keyboard(
                        "Введите Ваш номер телефона в формате 79999999999 или нажмите на кнопку Поделиться номером 👇",
                        Keyboard::RequestContact,
                    )],
                )
            }
            _ => Transition::stay(
                state.clone(),
                Reply::text(
                    "Некорректное имя. Пожалуйста, введите имя длиной минимум 2 буквы, используя только буквы и пробелы (например, Анна, Иван Петров).",
                ),
            ),
        },
        State::EnterPhone { booking } => enter_phone(state, booking, input),
        State::DeviceInService { city } => match input {
            Input::Text(text) | Input::Contact(text) => device_in_service(city, text.trim()),
            _ => Transition::stay(state.clone(), Reply::text(DEVICE_IN_SERVICE_FORMAT)),
        },
    }
}

const REPAIR_DETAILS_FORMAT: &str =
    "Пожалуйста, укажите модель и проблему через запятую, например: iPhone 12 Pro Max, быстро разряжается";
const DEVICE_IN_SERVICE_FORMAT: &str = "Некорректный формат. Пожалуйста, введите номер заказа в формате XXX-XXXXX (например, 253-59912) \
     или контактный номер телефона в формате 79999999999 (например, 79217578234).";

async fn choose_city<D: Directory>(name: &str, directory: &D) -> Transition {
    if name.is_empty() {
        return Transition::stay(State::City, Reply::text(WELCOME));
    }
    let cities = match directory.find_cities(name).await {
        Ok(cities) => cities,
        Err(e) => {
            tracing::error!(city = %name, error = %e, "City lookup failed");
            return Transition::stay(
                State::City,
                Reply::text("Что-то пошло не так. Попробуйте снова."),
            );
        }
    };

    let wanted = name.to_lowercase();
    if let Some(city) = cities.iter().find(|c| c.name.to_lowercase() == wanted) {
        tracing::info!(city_id = city.id, city = %city.name, "City chosen");
        return Transition::to(
            State::Service { city: city.clone() },
            vec![Reply::with_options(
                format!("Отлично, вы выбрали город: {}. Что вам нужно?", city.name),
                &SERVICE_OPTIONS,
            )],
        );
    }

    let suggestions: Vec<&str> = cities
        .iter()
        .filter(|c| c.name.to_lowercase().contains(&wanted))
        .map(|c| c.name.as_str())
        .take(MAX_CITY_SUGGESTIONS)
        .collect();
    if suggestions.is_empty() {
        return Transition::stay(
            State::City,
            Reply::text(
                "Город не найден. Пожалуйста, укажите существующий город. Например: Санкт-Петербург, Ростов-на-Дону, Уфа",
            ),
        );
    }
    Transition::stay(
        State::City,
        Reply::with_options(
            format!(
                "Город '{name}' не найден. Возможно, вы имели в виду один из этих городов?\n\
                 Выберите вариант или введите город заново:"
            ),
            &suggestions,
        ),
    )
}

fn reask_service(city: &CityChoice) -> Transition {
    Transition::stay(
        State::Service { city: city.clone() },
        Reply::with_options(
            "Что-то пошло не так. Пожалуйста, выберите услугу из предложенных.",
            &SERVICE_OPTIONS,
        ),
    )
}

fn choose_service(city: &CityChoice, service: &str) -> Transition {
    let name = &city.name;
    match service {
        SERVICE_REPAIR => Transition::to(
            State::RepairDetails { city: city.clone() },
            vec![Reply::with_keyboard(
                "Какая у Вас модель? Что с устройством?\nНапример: iPhone 12 Pro Max, быстро разряжается",
                Keyboard::Remove,
            )],
        ),
        SERVICE_IN_SERVICE => Transition::to(
            State::DeviceInService { city: city.clone() },
            vec![Reply::with_keyboard(
                "Моё устройство в сервисе\n\
                 Напишите номер заказа в формате XXX-XXXXX или контактный номер телефона указанный в заказе в формате 79999999999\n\n\
                 Например: 253-59912 или 79217578234",
                Keyboard::Remove,
            )],
        ),
        SERVICE_FILM => Transition::end(Reply::with_keyboard(
            format!(
                "🔥 Бронирование гидрогелевой пленкой.\n\
                 Она плотно ложится на поверхность и стягивает дефекты (царапины).\n\n\
                 + дополнительная защита устройства.\n\
                 + срок службы в 4-5 раз дольше любого стекла\n\
                 + защита от влаги\n\n\
                 🔥 Одна сторона Устройства – от 990 руб\n\n\
                 Пленка вырезается плоттером под Ваше устройство, точную стоимость сможем озвучить в сервисном центре\n\n\
                 В городе {name} несколько сервисов, приходите!"
            ),
            Keyboard::Remove,
        )),
        SERVICE_ACCESSORIES => Transition::end(Reply::with_keyboard(
            format!(
                "Стоимость кабеля/чехла/защита экрана\n\
                 ✅ Защита экрана:\n\n\
                 Защитное стекло\n\
                 - на телефон от 390 руб.\n\
                 - iPad от 990 руб.\n\n\
                 ✅ Кабели от 590 руб.\n\
                 ✅ Чехлы от 390 руб.\n\n\
                 В городе {name} несколько сервисов.\n\n\
                 Приходите, будем ждать Вас! 🙂"
            ),
            Keyboard::Remove,
        )),
        SERVICE_WARRANTY => Transition::end(Reply::with_keyboard(
            "Гарантия\n\
             Если у вас имеются вопросы по качеству обслуживания или качеству установленных запчастей, \
             просим Вас обратиться в сервисный центр, в котором был произведен ремонт. \
             Желательно при себе иметь документы, которые выдали Вам после ремонта.",
            Keyboard::Remove,
        )),
        SERVICE_TRADE => Transition::end(Reply::with_keyboard(
            "Выкуп телефонов\n\
             По данным вопросам Вас смогут проконсультировать наши коллеги в Pedant.Market.\n\n\
             Горячая линия: 8 (800) 301-33-09",
            Keyboard::Remove,
        )),
        _ => {
            tracing::warn!(%service, "Unknown service option");
            reask_service(city)
        }
    }
}

async fn repair_details<D: Directory>(city: &CityChoice, text: &str, directory: &D) -> Transition {
    let Some((model, issue)) = text.split_once(',') else {
        return Transition::stay(
            State::RepairDetails { city: city.clone() },
            Reply::text(REPAIR_DETAILS_FORMAT),
        );
    };
    let (model, issue) = (model.trim(), issue.trim());

    let mut centers = match directory.centers_in(city.id).await {
        Ok(centers) => centers,
        Err(e) => {
            tracing::warn!(city_id = city.id, error = %e, "Center lookup failed, using fallback");
            Vec::new()
        }
    };
    centers.truncate(MAX_CENTER_OPTIONS);
    if centers.is_empty() {
        centers = FALLBACK_CENTERS.iter().map(|c| c.to_string()).collect();
    }

    let booking = Booking {
        city: city.name.clone(),
        service: SERVICE_REPAIR.to_string(),
        model: model.to_string(),
        issue: issue.to_string(),
        ..Booking::default()
    };
    Transition::to(
        State::ChooseServiceCenter { booking },
        vec![
            Reply::text(PROMO_PRICE),
            Reply::with_options(
                format!(
                    "Нажмите на нужную кнопку, чтобы выбрать сервис в городе {}👇",
                    city.name
                ),
                &centers,
            ),
        ],
    )
}

fn enter_phone(state: &State, booking: &Booking, input: Input<'_>) -> Transition {
    let (raw, retry) = match input {
        Input::Contact(raw) => (
            raw,
            "Номер телефона из контакта некорректен. Пожалуйста, введите номер вручную \
             (например, +79991234567, 8 (999) 123-45-67, 79991234567).",
        ),
        Input::Text(raw) => (
            raw,
            "Некорректный номер телефона. Пожалуйста, введите номер в любом формате \
             (например, +79991234567, 8 (999) 123-45-67, 79991234567).",
        ),
        Input::Start | Input::Cancel => return Transition::stay(state.clone(), Reply::text(WELCOME)),
    };

    let Some(phone) = normalize_phone(raw) else {
        return Transition::stay(
            state.clone(),
            Reply::with_keyboard(retry, Keyboard::RequestContact),
        );
    };

    tracing::info!(city = %booking.city, center = %booking.service_center, "Booking completed");
    Transition::end(Reply::with_keyboard(
        format!(
            "Вы выбрали:\n\
             Город: {}\n\
             Услуга: {}\n\
             Модель: {}\n\
             Проблема: {}\n\
             Сервисный центр: {}\n\
             День посещения: {}\n\
             Время посещения: {}\n\
             Имя: {}\n\
             Номер телефона: {phone}\n\
             Спасибо! Скоро с вами свяжутся для подтверждения.",
            booking.city,
            booking.service,
            booking.model,
            booking.issue,
            booking.service_center,
            booking.visit_date,
            booking.visit_time,
            booking.name,
        ),
        Keyboard::Remove,
    ))
}

fn device_in_service(city: &CityChoice, text: &str) -> Transition {
    let detail = if ORDER_NUMBER.is_match(text) {
        format!("Номер заказа: {text}")
    } else if let Some(phone) = normalize_phone(text) {
        format!("Контактный номер телефона: {phone}")
    } else {
        return Transition::stay(
            State::DeviceInService { city: city.clone() },
            Reply::text(DEVICE_IN_SERVICE_FORMAT),
        );
    };

    Transition::end(Reply::text(format!(
        "Вы выбрали:\n\
         Город: {}\n\
         Услуга: {SERVICE_IN_SERVICE}\n\
         {detail}\n\
         Мы проверим статус вашего устройства и свяжемся с вами!",
        city.name
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeDirectory {
        cities: Vec<CityChoice>,
        centers: Vec<String>,
    }

    impl FakeDirectory {
        fn new() -> Self {
            let city = |id, name: &str| CityChoice {
                id,
                name: name.to_string(),
            };
            Self {
                cities: vec![
                    city(1, "Москва"),
                    city(2, "Краснодар"),
                    city(3, "Красноярск"),
                    city(4, "Красногорск"),
                ],
                centers: vec!["Сервис на Тверской".to_string()],
            }
        }
    }

    impl Directory for FakeDirectory {
        async fn find_cities(&self, name: &str) -> Result<Vec<CityChoice>, AppError> {
            let name = name.to_lowercase();
            Ok(self
                .cities
                .iter()
                .filter(|c| c.name.to_lowercase().contains(&name))
                .cloned()
                .collect())
        }

        async fn centers_in(&self, city_id: i64) -> Result<Vec<String>, AppError> {
            Ok(if city_id == 1 {
                self.centers.clone()
            } else {
                Vec::new()
            })
        }
    }

    fn moscow() -> CityChoice {
        CityChoice {
            id: 1,
            name: "Москва".into(),
        }
    }

    fn booking() -> Booking {
        Booking {
            city: "Москва".into(),
            service: SERVICE_REPAIR.into(),
            model: "iPhone 12".into(),
            issue: "разбит экран".into(),
            service_center: "Сервис на Тверской".into(),
            visit_date: "Завтра".into(),
            visit_time: "9:00 - 9:30".into(),
            name: "Анна".into(),
        }
    }

    async fn step(state: &State, input: Input<'_>) -> Transition {
        advance(state, input, &FakeDirectory::new()).await
    }

    #[test]
    fn phone_normalization() {
        assert_eq!(normalize_phone("+79991234567").as_deref(), Some("79991234567"));
        assert_eq!(normalize_phone("89991234567").as_deref(), Some("79991234567"));
        assert_eq!(
            normalize_phone("+7 (999) 123-45-67").as_deref(),
            Some("79991234567")
        );
        assert_eq!(normalize_phone("+79991234"), None);
        assert_eq!(normalize_phone("19991234567"), None);
    }

    #[test]
    fn time_slots_cover_the_working_day() {
        let slots = time_slots();
        assert_eq!(slots.len(), 23);
        assert_eq!(slots[0], "9:00 - 9:30");
        assert_eq!(slots[1], "9:30 - 10:00");
        assert_eq!(slots[21], "19:30 - 20:00");
        assert_eq!(slots[22], "20:00");
    }

    #[test]
    fn names_are_letters_and_spaces() {
        assert!(is_valid_name("Алексей"));
        assert!(is_valid_name("Иван Петров"));
        assert!(is_valid_name("Ann"));
        assert!(!is_valid_name("А"));
        assert!(!is_valid_name("Алексей123"));
    }

    #[tokio::test]
    async fn start_and_cancel_work_from_any_state() {
        let state = State::EnterName { booking: booking() };
        let t = step(&state, Input::Start).await;
        assert_eq!(t.next, Some(State::City));
        assert_eq!(t.replies[0].text, WELCOME);

        let t = step(&state, Input::Cancel).await;
        assert_eq!(t.next, None);
        assert_eq!(t.replies[0].text, CANCELLED);
    }

    #[tokio::test]
    async fn exact_city_advances_to_services() {
        let t = step(&State::City, Input::Text("москва")).await;
        assert_eq!(t.next, Some(State::Service { city: moscow() }));
        assert_eq!(
            t.replies[0].keyboard,
            Keyboard::Options(SERVICE_OPTIONS.iter().map(|s| s.to_string()).collect())
        );
    }

    #[tokio::test]
    async fn partial_city_offers_suggestions() {
        let t = step(&State::City, Input::Text("Крас")).await;
        assert_eq!(t.next, Some(State::City));
        let Keyboard::Options(options) = &t.replies[0].keyboard else {
            panic!("expected suggestions");
        };
        assert_eq!(options.len(), 3);
        assert!(options.contains(&"Краснодар".to_string()));
    }

    #[tokio::test]
    async fn unknown_city_reasks() {
        let t = step(&State::City, Input::Text("Атлантида")).await;
        assert_eq!(t.next, Some(State::City));
        assert!(t.replies[0].text.starts_with("Город не найден."));
        assert_eq!(t.replies[0].keyboard, Keyboard::Keep);
    }

    #[tokio::test]
    async fn informational_services_end_the_dialogue() {
        let state = State::Service { city: moscow() };
        for option in [SERVICE_FILM, SERVICE_ACCESSORIES, SERVICE_WARRANTY, SERVICE_TRADE] {
            let t = step(&state, Input::Text(option)).await;
            assert_eq!(t.next, None, "{option}");
        }
        let t = step(&state, Input::Text("Что-то ещё")).await;
        assert_eq!(t.next, Some(state));
    }

    #[tokio::test]
    async fn repair_details_need_a_comma() {
        let state = State::RepairDetails { city: moscow() };
        let t = step(&state, Input::Text("iPhone 12 разбит экран")).await;
        assert_eq!(t.next, Some(state.clone()));

        let t = step(&state, Input::Text(" iPhone 12 , разбит, экран ")).await;
        let Some(State::ChooseServiceCenter { booking }) = t.next else {
            panic!("expected center choice");
        };
        assert_eq!(booking.model, "iPhone 12");
        assert_eq!(booking.issue, "разбит, экран");
        assert_eq!(t.replies[0].text, PROMO_PRICE);
        assert_eq!(
            t.replies[1].keyboard,
            Keyboard::Options(vec!["Сервис на Тверской".to_string()])
        );
    }

    #[tokio::test]
    async fn cities_without_centers_get_the_fallback_list() {
        let city = CityChoice {
            id: 2,
            name: "Краснодар".into(),
        };
        let t = step(
            &State::RepairDetails { city },
            Input::Text("Samsung A51, не заряжается"),
        )
        .await;
        assert_eq!(
            t.replies[1].keyboard,
            Keyboard::Options(FALLBACK_CENTERS.iter().map(|s| s.to_string()).collect())
        );
    }

    #[tokio::test]
    async fn booking_walks_through_date_time_and_name() {
        let mut state = State::ChooseServiceCenter {
            booking: Booking {
                visit_date: String::new(),
                visit_time: String::new(),
                name: String::new(),
                service_center: String::new(),
                ..booking()
            },
        };
        for input in ["Сервис на Тверской", "Завтра", "9:00 - 9:30"] {
            state = step(&state, Input::Text(input)).await.next.unwrap();
        }
        assert!(matches!(state, State::EnterName { .. }));

        let t = step(&state, Input::Text("А1")).await;
        assert_eq!(t.next, Some(state.clone()));

        let t = step(&state, Input::Text("Анна")).await;
        assert_eq!(t.next, Some(State::EnterPhone { booking: booking() }));
        assert_eq!(t.replies[0].keyboard, Keyboard::RequestContact);
    }

    #[tokio::test]
    async fn phone_completes_the_booking() {
        let state = State::EnterPhone { booking: booking() };

        let t = step(&state, Input::Text("12345")).await;
        assert_eq!(t.next, Some(state.clone()));

        let t = step(&state, Input::Contact("+7 (999) 123-45-67")).await;
        assert_eq!(t.next, None);
        let summary = &t.replies[0].text;
        assert!(summary.contains("Город: Москва"));
        assert!(summary.contains("Сервисный центр: Сервис на Тверской"));
        assert!(summary.contains("Номер телефона: 79991234567"));
    }

    #[tokio::test]
    async fn device_in_service_accepts_order_or_phone() {
        let state = State::DeviceInService { city: moscow() };

        let t = step(&state, Input::Text("253-59912")).await;
        assert_eq!(t.next, None);
        assert!(t.replies[0].text.contains("Номер заказа: 253-59912"));

        let t = step(&state, Input::Text("8 921 757 82 34")).await;
        assert_eq!(t.next, None);
        assert!(t.replies[0].text.contains("79217578234"));

        let t = step(&state, Input::Text("253-599")).await;
        assert_eq!(t.next, Some(state));
    }
}
