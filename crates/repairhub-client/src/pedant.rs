//! Parser for pedant.ru device repair price lists.

use scraper::{ElementRef, Html, Selector};

use repairhub_core::error::AppError;
use repairhub_core::scraped::{PriceRow, PriceSheet};
use repairhub_core::traits::PriceParser;

const MODEL_PREFIX: &str = "Выбрано устройство: ";

/// CSS selectors locating the price table. The model title is fixed; the
/// row layout changes between site redesigns, so it is configurable.
#[derive(Debug, Clone)]
pub struct PriceSelectors {
    pub row: String,
    pub name: String,
    pub price: String,
}

impl Default for PriceSelectors {
    fn default() -> Self {
        Self {
            row: "div.price-item".to_string(),
            name: ".price-item__name".to_string(),
            price: ".price-item__price".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PedantParser {
    title: Selector,
    row: Selector,
    name: Selector,
    price: Selector,
}

fn selector(css: &str) -> Result<Selector, AppError> {
    Selector::parse(css).map_err(|e| AppError::ParseError(format!("Invalid selector '{css}': {e}")))
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

impl PedantParser {
    pub fn new() -> Result<Self, AppError> {
        Self::with_selectors(&PriceSelectors::default())
    }

    pub fn with_selectors(selectors: &PriceSelectors) -> Result<Self, AppError> {
        Ok(Self {
            title: selector("div.title")?,
            row: selector(&selectors.row)?,
            name: selector(&selectors.name)?,
            price: selector(&selectors.price)?,
        })
    }
}

impl PriceParser for PedantParser {
    fn parse_prices(&self, html: &str) -> Result<Option<PriceSheet>, AppError> {
        let doc = Html::parse_document(html);

        let Some(model_name) = doc
            .select(&self.title)
            .next()
            .map(text_of)
            .map(|t| t.replace(MODEL_PREFIX, "").trim().to_string())
            .filter(|t| !t.is_empty())
        else {
            return Ok(None);
        };

        let rows = doc
            .select(&self.row)
            .filter_map(|row| {
                let repair_name = row.select(&self.name).next().map(text_of)?;
                let price = row
                    .select(&self.price)
                    .next()
                    .map(text_of)
                    .and_then(|p| parse_price(&p))?;
                if repair_name.is_empty() {
                    return None;
                }
                Some(PriceRow { repair_name, price })
            })
            .collect();

        Ok(Some(PriceSheet { model_name, rows }))
    }
}

/// Parses a displayed price like `"от 1 990 ₽"` by keeping only its digits.
pub fn parse_price(text: &str) -> Option<f64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<f64>().ok()
}
