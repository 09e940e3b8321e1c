//! Parser for zoon.ru service-center listings.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use repairhub_core::error::AppError;
use repairhub_core::scraped::{CenterDetail, ListingItem, ListingPage, ScrapedReview};
use repairhub_core::traits::ListingParser;

const ANONYMOUS_AUTHOR: &str = "Анонимный пользователь";
const MISSING_REVIEW_TEXT: &str = "Текст отзыва не указан";
const REDIRECT_MARKER: &str = "zoon.ru/redirect/";

fn selector(css: &str) -> Result<Selector, AppError> {
    Selector::parse(css).map_err(|e| AppError::ParseError(format!("Invalid selector '{css}': {e}")))
}

/// Trimmed text of an element with inner whitespace collapsed.
fn clean_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

/// Selectors for zoon.ru listing and detail pages, compiled once.
#[derive(Debug, Clone)]
pub struct ZoonParser {
    breadcrumb_link: Selector,
    item: Selector,
    title: Selector,
    address: Selector,
    phone: Selector,
    item_url: Selector,
    next_page: Selector,
    website: Selector,
    social: Selector,
    review: Selector,
    stars: Selector,
    review_text: Selector,
}

impl ZoonParser {
    pub fn new() -> Result<Self, AppError> {
        Ok(Self {
            breadcrumb_link: selector("div.breadcrumbs a")?,
            item: selector("li.minicard-item.js-results-item")?,
            title: selector("a.title-link")?,
            address: selector("span.address")?,
            phone: selector("span.js-phone[data-number]")?,
            item_url: selector("a.title-link.js-item-url")?,
            next_page: selector("div.paging.js-paging-block-pages a.paging__control._next")?,
            website: selector("div.service-website-value a")?,
            social: selector("a.js-service-social")?,
            review: selector("li.comment-item.js-comment")?,
            stars: selector("div.z-stars.z-stars--16")?,
            review_text: selector("span.js-comment-content")?,
        })
    }

    fn parse_item(&self, el: ElementRef<'_>, base: &Url) -> Option<ListingItem> {
        let name = el.select(&self.title).next().map(clean_text)?;
        if name.is_empty() {
            return None;
        }
        let address = el
            .select(&self.address)
            .next()
            .map(clean_text)
            .and_then(non_empty);
        let phone = el
            .select(&self.phone)
            .next()
            .and_then(|p| p.value().attr("data-number"))
            .map(|n| n.replace('\u{a0}', " ").trim().to_string())
            .and_then(non_empty);
        let detail_url = el
            .select(&self.item_url)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| base.join(href).ok())
            .map(String::from);

        Some(ListingItem {
            name,
            address,
            phone,
            detail_url,
        })
    }

    fn parse_review(&self, el: ElementRef<'_>) -> ScrapedReview {
        let author = el
            .value()
            .attr("data-author")
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(ANONYMOUS_AUTHOR)
            .to_string();
        let rating = el
            .select(&self.stars)
            .next()
            .and_then(|stars| stars.value().attr("style"))
            .and_then(parse_star_style);
        let text = el
            .select(&self.review_text)
            .next()
            .map(clean_text)
            .and_then(non_empty)
            .unwrap_or_else(|| MISSING_REVIEW_TEXT.to_string());

        ScrapedReview {
            author,
            rating,
            text,
        }
    }
}

impl ListingParser for ZoonParser {
    fn parse_listing(&self, html: &str, page_url: &str) -> Result<ListingPage, AppError> {
        let base = Url::parse(page_url)
            .map_err(|e| AppError::ParseError(format!("Invalid page URL '{page_url}': {e}")))?;
        let doc = Html::parse_document(html);

        let city = doc
            .select(&self.breadcrumb_link)
            .next()
            .map(clean_text)
            .and_then(non_empty);

        let items = doc
            .select(&self.item)
            .filter_map(|el| self.parse_item(el, &base))
            .collect();

        let next_page = doc
            .select(&self.next_page)
            .next()
            .filter(|a| !a.value().classes().any(|c| c == "disabled"))
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| base.join(href).ok())
            .map(String::from);

        Ok(ListingPage {
            city,
            items,
            next_page,
        })
    }

    fn parse_detail(&self, html: &str) -> Result<CenterDetail, AppError> {
        let doc = Html::parse_document(html);
        let mut links = Vec::new();

        if let Some(site) = doc
            .select(&self.website)
            .next()
            .map(clean_text)
            .and_then(non_empty)
        {
            links.push(site);
        }

        links.extend(
            doc.select(&self.social)
                .filter_map(|a| a.value().attr("href"))
                .filter(|href| href.contains(REDIRECT_MARKER))
                .filter_map(redirect_target),
        );

        let reviews = doc
            .select(&self.review)
            .filter(|el| !is_nested_reply(*el))
            .map(|el| self.parse_review(el))
            .collect();

        Ok(CenterDetail { links, reviews })
    }
}

/// Decoded `to` query parameter of a zoon redirect link.
fn redirect_target(href: &str) -> Option<String> {
    let url = Url::parse(href).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "to")
        .map(|(_, value)| value.into_owned())
        .filter(|v| !v.is_empty())
}

/// True for replies, which sit inside a `ul.comment-item__children` list.
fn is_nested_reply(el: ElementRef<'_>) -> bool {
    el.ancestors().any(|node| {
        node.value().as_element().is_some_and(|e| {
            e.name() == "ul" && e.classes().any(|c| c == "comment-item__children")
        })
    })
}

/// Reads the star count from a `style` attribute such as `width: 4`.
///
/// The value after `": "` must be a plain integer in 1..=5; anything else,
/// including zero, means the rating is unknown.
fn parse_star_style(style: &str) -> Option<u8> {
    let value = style.split(": ").nth(1)?.trim();
    match value.parse::<u8>() {
        Ok(rating @ 1..=5) => Some(rating),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
          <div class="breadcrumbs">
            <a href="/spb/">  Санкт-Петербург </a>
            <a href="/spb/electronics/">Ремонт электроники</a>
          </div>
          <ul>
            <li class="minicard-item js-results-item">
              <a class="title-link js-item-url" href="/spb/electronics/fixit/">FixIt
                 Сервис</a>
              <span class="address">Невский проспект, 28</span>
              <span class="js-phone" data-number="+7&nbsp;812&nbsp;123-45-67"></span>
            </li>
            <li class="minicard-item js-results-item">
              <a class="title-link" href="/spb/electronics/mobi/">Mobi</a>
            </li>
            <li class="minicard-item js-results-item">
              <span class="address">Без названия</span>
            </li>
          </ul>
          <div class="paging js-paging-block-pages">
            <a class="paging__control _prev" href="?page=1">Назад</a>
            <a class="paging__control _next" href="?page=3">Вперёд</a>
          </div>
        </body></html>
    "#;

    const DETAIL: &str = r#"
        <html><body>
          <div class="service-website-value"><a href="/redirect/?to=x"> fixit.ru </a></div>
          <a class="js-service-social" href="https://zoon.ru/redirect/?to=https%3A%2F%2Fvk.com%2Ffixit&hash=1">VK</a>
          <a class="js-service-social" href="https://zoon.ru/redirect/?to=https%3A%2F%2Ft.me%2Ffixit">TG</a>
          <a class="js-service-social" href="/redirect/?to=https%3A%2F%2Fok.ru%2Ffixit">OK</a>
          <a class="js-service-social" href="https://instagram.com/direct">IG</a>
          <ul class="comments">
            <li class="comment-item js-comment" data-author="Мария">
              <div class="z-stars z-stars--16" style="width: 5"></div>
              <span class="js-comment-content">  Отличный сервис,
                 всё быстро  </span>
              <ul class="comment-item__children">
                <li class="comment-item js-comment" data-author="FixIt">
                  <span class="js-comment-content">Спасибо!</span>
                </li>
              </ul>
            </li>
            <li class="comment-item js-comment">
              <div class="z-stars z-stars--16" style="width: 0"></div>
            </li>
            <li class="comment-item js-comment" data-author="Олег">
              <div class="z-stars z-stars--16" style="width:80%"></div>
              <span class="js-comment-content">Нормально</span>
            </li>
          </ul>
        </body></html>
    "#;

    fn parser() -> ZoonParser {
        ZoonParser::new().unwrap()
    }

    #[test]
    fn parses_listing_items() {
        let page = parser()
            .parse_listing(LISTING, "https://zoon.ru/spb/electronics/?page=2")
            .unwrap();

        assert_eq!(page.city.as_deref(), Some("Санкт-Петербург"));
        assert_eq!(page.items.len(), 2);

        let first = &page.items[0];
        assert_eq!(first.name, "FixIt Сервис");
        assert_eq!(first.address.as_deref(), Some("Невский проспект, 28"));
        assert_eq!(first.phone.as_deref(), Some("+7 812 123-45-67"));
        assert_eq!(
            first.detail_url.as_deref(),
            Some("https://zoon.ru/spb/electronics/fixit/")
        );

        let second = &page.items[1];
        assert_eq!(second.name, "Mobi");
        assert!(second.address.is_none());
        assert!(second.phone.is_none());
        assert!(second.detail_url.is_none());
    }

    #[test]
    fn resolves_next_page_against_current_url() {
        let page = parser()
            .parse_listing(LISTING, "https://zoon.ru/spb/electronics/?page=2")
            .unwrap();
        assert_eq!(
            page.next_page.as_deref(),
            Some("https://zoon.ru/spb/electronics/?page=3")
        );
    }

    #[test]
    fn disabled_next_control_ends_pagination() {
        let html = r#"<div class="paging js-paging-block-pages">
            <a class="paging__control _next disabled" href="?page=9">Вперёд</a>
        </div>"#;
        let page = parser().parse_listing(html, "https://zoon.ru/spb/").unwrap();
        assert!(page.next_page.is_none());
        assert!(page.city.is_none());
        assert!(page.items.is_empty());
    }

    #[test]
    fn invalid_page_url_is_parse_error() {
        let err = parser().parse_listing(LISTING, "not a url").unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }

    /// Only absolute zoon.ru redirects are followed; relative ones are dropped.
    #[test]
    fn parses_detail_links() {
        let detail = parser().parse_detail(DETAIL).unwrap();
        assert_eq!(
            detail.links,
            vec![
                "fixit.ru".to_string(),
                "https://vk.com/fixit".to_string(),
                "https://t.me/fixit".to_string(),
            ]
        );
    }

    #[test]
    fn parses_only_top_level_reviews() {
        let detail = parser().parse_detail(DETAIL).unwrap();
        assert_eq!(detail.reviews.len(), 3);

        assert_eq!(detail.reviews[0].author, "Мария");
        assert_eq!(detail.reviews[0].rating, Some(5));
        assert_eq!(detail.reviews[0].text, "Отличный сервис, всё быстро");

        assert_eq!(detail.reviews[1].author, ANONYMOUS_AUTHOR);
        assert_eq!(detail.reviews[1].rating, None);
        assert_eq!(detail.reviews[1].text, MISSING_REVIEW_TEXT);

        assert_eq!(detail.reviews[2].author, "Олег");
        assert_eq!(detail.reviews[2].rating, None);
        assert!(detail.reviews.iter().all(|r| r.author != "FixIt"));
    }

    #[test]
    fn star_style_parsing() {
        assert_eq!(parse_star_style("width: 4"), Some(4));
        assert_eq!(parse_star_style("width: 3 "), Some(3));
        assert_eq!(parse_star_style("width: 0"), None);
        assert_eq!(parse_star_style("width: 7"), None);
        assert_eq!(parse_star_style("width:4"), None);
        assert_eq!(parse_star_style("width: 80%"), None);
        assert_eq!(parse_star_style(""), None);
    }
}
