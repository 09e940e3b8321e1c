//! Inline-button payloads.
//!
//! Telegram limits `callback_data` to 64 bytes, so search queries are cut
//! to fit when a page button is encoded.

pub const MAX_CALLBACK_BYTES: usize = 64;

pub const BACK_REGION_LIST: &str = "back_region_list";
pub const BACK_TO_LIST: &str = "back_to_list_";
pub const CANCEL_CLAIM: &str = "cancel_claim_service";

const SEARCH_PAGE_PREFIX: &str = "search_page_";
const SERVICE_ADMIN_PAGE_PREFIX: &str = "service_admin_page_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    Region(i64),
    City(i64),
    Center(i64),
    Reviews(i64),
    ClaimService(i64),
    CancelClaim,
    SearchPage {
        page: i64,
        query: String,
        city_id: Option<i64>,
    },
    ServiceAdminPage(i64),
    BackToList,
    BackRegionList,
}

impl Callback {
    pub fn parse(data: &str) -> Option<Self> {
        if data == CANCEL_CLAIM {
            return Some(Self::CancelClaim);
        }
        if data == BACK_REGION_LIST {
            return Some(Self::BackRegionList);
        }
        if data.starts_with(BACK_TO_LIST) {
            return Some(Self::BackToList);
        }
        if let Some(rest) = data.strip_prefix(SEARCH_PAGE_PREFIX) {
            return parse_search_page(rest);
        }
        if let Some(page) = data.strip_prefix(SERVICE_ADMIN_PAGE_PREFIX) {
            return page.parse().ok().map(Self::ServiceAdminPage);
        }
        if let Some(id) = data.strip_prefix("claim_service_") {
            return id.parse().ok().map(Self::ClaimService);
        }
        if let Some(id) = data.strip_prefix("region_") {
            return id.parse().ok().map(Self::Region);
        }
        if let Some(id) = data.strip_prefix("city_") {
            return id.parse().ok().map(Self::City);
        }
        if let Some(id) = data.strip_prefix("center_") {
            return id.parse().ok().map(Self::Center);
        }
        if let Some(id) = data.strip_prefix("reviews_") {
            return id.parse().ok().map(Self::Reviews);
        }
        None
    }

    pub fn encode(&self) -> String {
        match self {
            Self::Region(id) => format!("region_{id}"),
            Self::City(id) => format!("city_{id}"),
            Self::Center(id) => format!("center_{id}"),
            Self::Reviews(id) => format!("reviews_{id}"),
            Self::ClaimService(id) => format!("claim_service_{id}"),
            Self::CancelClaim => CANCEL_CLAIM.to_string(),
            Self::SearchPage {
                page,
                query,
                city_id,
            } => {
                let city = city_id.map(|id| id.to_string()).unwrap_or_default();
                let fixed = SEARCH_PAGE_PREFIX.len() + page.to_string().len() + city.len() + 2;
                let query = truncate_bytes(query, MAX_CALLBACK_BYTES.saturating_sub(fixed));
                format!("{SEARCH_PAGE_PREFIX}{page}_{query}_{city}")
            }
            Self::ServiceAdminPage(page) => format!("{SERVICE_ADMIN_PAGE_PREFIX}{page}"),
            Self::BackToList => BACK_TO_LIST.to_string(),
            Self::BackRegionList => BACK_REGION_LIST.to_string(),
        }
    }
}

/// `{page}_{query}_{city_id}`; the query itself may contain underscores.
fn parse_search_page(rest: &str) -> Option<Callback> {
    let (page, rest) = rest.split_once('_')?;
    let (query, city) = rest.rsplit_once('_')?;
    let city_id = if city.is_empty() {
        None
    } else {
        Some(city.parse().ok()?)
    };
    Some(Callback::SearchPage {
        page: page.parse().ok()?,
        query: query.to_string(),
        city_id,
    })
}

fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_id_callbacks() {
        assert_eq!(Callback::parse("region_3"), Some(Callback::Region(3)));
        assert_eq!(Callback::parse("city_44"), Some(Callback::City(44)));
        assert_eq!(Callback::parse("center_9"), Some(Callback::Center(9)));
        assert_eq!(Callback::parse("reviews_9"), Some(Callback::Reviews(9)));
        assert_eq!(
            Callback::parse("claim_service_9"),
            Some(Callback::ClaimService(9))
        );
        assert_eq!(Callback::parse("center_x"), None);
        assert_eq!(Callback::parse("whatever"), None);
    }

    #[test]
    fn parses_navigation_callbacks() {
        assert_eq!(Callback::parse("back_to_list_"), Some(Callback::BackToList));
        assert_eq!(
            Callback::parse("back_region_list"),
            Some(Callback::BackRegionList)
        );
        assert_eq!(
            Callback::parse("cancel_claim_service"),
            Some(Callback::CancelClaim)
        );
        assert_eq!(
            Callback::parse("service_admin_page_2"),
            Some(Callback::ServiceAdminPage(2))
        );
    }

    #[test]
    fn search_page_keeps_underscores_and_empty_city() {
        assert_eq!(
            Callback::parse("search_page_1_my_query_12"),
            Some(Callback::SearchPage {
                page: 1,
                query: "my_query".into(),
                city_id: Some(12),
            })
        );
        assert_eq!(
            Callback::parse("search_page_0__"),
            Some(Callback::SearchPage {
                page: 0,
                query: String::new(),
                city_id: None,
            })
        );
    }

    #[test]
    fn long_queries_fit_the_telegram_limit() {
        let cb = Callback::SearchPage {
            page: 12,
            query: "ремонт".repeat(10),
            city_id: Some(123456),
        };
        let data = cb.encode();
        assert!(data.len() <= MAX_CALLBACK_BYTES);
        let Some(Callback::SearchPage { page, query, city_id }) = Callback::parse(&data) else {
            panic!("expected a search page");
        };
        assert_eq!(page, 12);
        assert!(query.starts_with("ремонт"));
        assert_eq!(city_id, Some(123456));
    }
}
