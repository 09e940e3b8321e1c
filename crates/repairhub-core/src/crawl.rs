use std::collections::HashSet;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;
use crate::models::LinkType;
use crate::scraped::{ListingItem, ScrapedCenter};
use crate::traits::{CatalogSink, Fetcher, ListingParser, PriceParser};

/// Events emitted while crawling, for monitoring/logging.
#[derive(Debug, Clone)]
pub enum CrawlEvent<'a> {
    PageStarted {
        page: usize,
        url: &'a str,
    },
    PageParsed {
        page: usize,
        city: Option<&'a str>,
        items: usize,
    },
    ItemSkipped {
        name: &'a str,
        reason: &'a str,
    },
    CenterSaved {
        id: i64,
        name: &'a str,
        links: usize,
        reviews: usize,
    },
    ReplayFailed {
        name: &'a str,
        error: &'a AppError,
    },
    Cancelled {
        pages: usize,
    },
    Finished {
        summary: &'a CrawlSummary,
    },
}

/// Trait for receiving crawl events (decoupled logging).
pub trait CrawlReporter: Send + Sync {
    fn report(&self, event: CrawlEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingCrawlReporter;

impl CrawlReporter for TracingCrawlReporter {
    fn report(&self, event: CrawlEvent<'_>) {
        match event {
            CrawlEvent::PageStarted { page, url } => {
                tracing::info!(page, %url, "Fetching listing page");
            }
            CrawlEvent::PageParsed { page, city, items } => {
                tracing::info!(page, city = city.unwrap_or("-"), items, "Parsed listing page");
            }
            CrawlEvent::ItemSkipped { name, reason } => {
                tracing::warn!(%name, %reason, "Skipping service center");
            }
            CrawlEvent::CenterSaved {
                id,
                name,
                links,
                reviews,
            } => {
                tracing::info!(id, %name, links, reviews, "Saved service center");
            }
            CrawlEvent::ReplayFailed { name, error } => {
                tracing::error!(%name, %error, "Failed to save service center");
            }
            CrawlEvent::Cancelled { pages } => {
                tracing::warn!(pages, "Crawl cancelled");
            }
            CrawlEvent::Finished { summary } => {
                tracing::info!(
                    pages = summary.pages,
                    found = summary.centers_found,
                    saved = summary.centers_saved,
                    failures = summary.failures,
                    "Crawl finished"
                );
            }
        }
    }
}

/// Result of crawling one start URL.
#[derive(Debug, Clone, Serialize)]
pub struct StartUrlCrawl {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<CrawlSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Counters for one crawl run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub pages: usize,
    pub centers_found: usize,
    pub centers_saved: usize,
    pub links_saved: usize,
    pub reviews_saved: usize,
    pub failures: usize,
}

/// Walks a paginated service-center listing, follows every detail page and
/// replays the results into a [`CatalogSink`].
///
/// Generic over the fetcher, the site parser and the sink so the whole
/// pipeline runs in tests without HTTP.
pub struct CrawlService<F, P, S>
where
    F: Fetcher,
    P: ListingParser,
    S: CatalogSink,
{
    fetcher: F,
    parser: P,
    sink: S,
}

impl<F, P, S> CrawlService<F, P, S>
where
    F: Fetcher,
    P: ListingParser,
    S: CatalogSink,
{
    pub fn new(fetcher: F, parser: P, sink: S) -> Self {
        Self {
            fetcher,
            parser,
            sink,
        }
    }

    /// Crawl every listing page reachable from `start_url`.
    ///
    /// 1. Fetch and parse the listing page
    /// 2. For each item, fetch and parse its detail page
    /// 3. Replay center, links and reviews into the sink
    /// 4. Follow the next-page link until there is none
    ///
    /// A failed listing fetch aborts the crawl. Failures on individual
    /// centers are reported and counted, then the crawl moves on.
    pub async fn crawl<R: CrawlReporter>(
        &self,
        start_url: &str,
        cancel: &CancellationToken,
        reporter: &R,
    ) -> Result<CrawlSummary, AppError> {
        let mut summary = CrawlSummary::default();
        let mut visited = HashSet::new();
        let mut next = Some(start_url.to_string());

        while let Some(url) = next.take() {
            if cancel.is_cancelled() {
                reporter.report(CrawlEvent::Cancelled {
                    pages: summary.pages,
                });
                break;
            }
            if !visited.insert(url.clone()) {
                tracing::warn!(%url, "Pagination loops back to a visited page, stopping");
                break;
            }

            summary.pages += 1;
            reporter.report(CrawlEvent::PageStarted {
                page: summary.pages,
                url: &url,
            });

            // 1. Listing
            let html = self.fetcher.fetch(&url).await?;
            let listing = self.parser.parse_listing(&html, &url)?;
            reporter.report(CrawlEvent::PageParsed {
                page: summary.pages,
                city: listing.city.as_deref(),
                items: listing.items.len(),
            });
            summary.centers_found += listing.items.len();

            // 2 & 3. Details + replay
            for item in &listing.items {
                if cancel.is_cancelled() {
                    break;
                }
                self.process_item(listing.city.as_deref(), item, &mut summary, reporter)
                    .await;
            }

            // 4. Pagination
            next = listing.next_page;
        }

        reporter.report(CrawlEvent::Finished { summary: &summary });
        Ok(summary)
    }

    /// Crawls each start URL (typically one per city) in turn. A failing
    /// URL is logged and recorded, and the next one is still crawled.
    pub async fn crawl_all<R: CrawlReporter>(
        &self,
        start_urls: &[String],
        cancel: &CancellationToken,
        reporter: &R,
    ) -> Vec<StartUrlCrawl> {
        let mut results = Vec::with_capacity(start_urls.len());
        for url in start_urls {
            if cancel.is_cancelled() {
                break;
            }
            let outcome = match self.crawl(url, cancel, reporter).await {
                Ok(summary) => StartUrlCrawl {
                    url: url.clone(),
                    summary: Some(summary),
                    error: None,
                },
                Err(e) => {
                    tracing::error!(%url, error = %e, "Crawl failed, moving to the next start URL");
                    StartUrlCrawl {
                        url: url.clone(),
                        summary: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            results.push(outcome);
        }
        results
    }

    async fn process_item<R: CrawlReporter>(
        &self,
        city: Option<&str>,
        item: &ListingItem,
        summary: &mut CrawlSummary,
        reporter: &R,
    ) {
        let Some(detail_url) = item.detail_url.as_deref() else {
            reporter.report(CrawlEvent::ItemSkipped {
                name: &item.name,
                reason: "no detail page link",
            });
            return;
        };

        let detail = match self.fetcher.fetch(detail_url).await {
            Ok(html) => self.parser.parse_detail(&html),
            Err(e) => Err(e),
        };
        let detail = match detail {
            Ok(detail) => detail,
            Err(e) => {
                summary.failures += 1;
                reporter.report(CrawlEvent::ReplayFailed {
                    name: &item.name,
                    error: &e,
                });
                return;
            }
        };

        let center = ScrapedCenter::from_item(city, item);
        let id = match self.sink.create_service_center(&center).await {
            Ok(id) => id,
            Err(e) => {
                summary.failures += 1;
                reporter.report(CrawlEvent::ReplayFailed {
                    name: &item.name,
                    error: &e,
                });
                return;
            }
        };
        summary.centers_saved += 1;

        let mut links = 0;
        for link in &detail.links {
            match self.sink.add_link(id, LinkType::classify(link), link).await {
                Ok(()) => links += 1,
                Err(e) => {
                    summary.failures += 1;
                    tracing::error!(service_center_id = id, %link, error = %e, "Failed to save link");
                }
            }
        }

        let mut reviews = 0;
        for review in &detail.reviews {
            match self.sink.add_review(id, review).await {
                Ok(()) => reviews += 1,
                Err(e) => {
                    summary.failures += 1;
                    tracing::error!(
                        service_center_id = id,
                        author = %review.author,
                        error = %e,
                        "Failed to save review"
                    );
                }
            }
        }

        summary.links_saved += links;
        summary.reviews_saved += reviews;
        reporter.report(CrawlEvent::CenterSaved {
            id,
            name: &item.name,
            links,
            reviews,
        });
    }
}

/// Counters for one price-page crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PriceCrawlSummary {
    pub model_name: Option<String>,
    pub prices_found: usize,
    pub prices_saved: usize,
    pub failures: usize,
}

/// Scrapes a device's repair price list and replays it into a [`CatalogSink`].
pub struct PriceCrawlService<F, P, S>
where
    F: Fetcher,
    P: PriceParser,
    S: CatalogSink,
{
    fetcher: F,
    parser: P,
    sink: S,
}

impl<F, P, S> PriceCrawlService<F, P, S>
where
    F: Fetcher,
    P: PriceParser,
    S: CatalogSink,
{
    pub fn new(fetcher: F, parser: P, sink: S) -> Self {
        Self {
            fetcher,
            parser,
            sink,
        }
    }

    pub async fn crawl_prices(&self, url: &str) -> Result<PriceCrawlSummary, AppError> {
        tracing::info!(%url, "Fetching price page");
        let html = self.fetcher.fetch(url).await?;

        let Some(sheet) = self.parser.parse_prices(&html)? else {
            tracing::warn!(%url, "No device model on price page");
            return Ok(PriceCrawlSummary::default());
        };
        tracing::info!(model = %sheet.model_name, rows = sheet.rows.len(), "Parsed price page");

        let mut summary = PriceCrawlSummary {
            model_name: Some(sheet.model_name.clone()),
            prices_found: sheet.rows.len(),
            ..Default::default()
        };
        for row in &sheet.rows {
            match self.sink.add_repair_price(&sheet.model_name, row).await {
                Ok(()) => summary.prices_saved += 1,
                Err(e) => {
                    summary.failures += 1;
                    tracing::error!(
                        model = %sheet.model_name,
                        repair = %row.repair_name,
                        error = %e,
                        "Failed to save repair price"
                    );
                }
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraped::{CenterDetail, ListingPage, PriceRow, PriceSheet, ScrapedReview};
    use crate::testutil::*;

    fn item(name: &str, detail: Option<&str>) -> ListingItem {
        ListingItem {
            name: name.into(),
            address: Some("Невский пр., 1".into()),
            phone: Some("+7 812 000-00-00".into()),
            detail_url: detail.map(str::to_string),
        }
    }

    fn detail() -> CenterDetail {
        CenterDetail {
            links: vec!["https://fix.ru".into(), "https://vk.com/fix".into()],
            reviews: vec![ScrapedReview {
                author: "Иван".into(),
                rating: Some(5),
                text: "Быстро починили".into(),
            }],
        }
    }

    #[tokio::test]
    async fn crawls_all_pages_and_replays_everything() {
        let parser = MockParser::new(
            vec![
                ListingPage {
                    city: Some("Санкт-Петербург".into()),
                    items: vec![item("Fix", Some("https://zoon.ru/fix/"))],
                    next_page: Some("https://zoon.ru/spb/?page=2".into()),
                },
                ListingPage {
                    city: Some("Санкт-Петербург".into()),
                    items: vec![item("Mobi", Some("https://zoon.ru/mobi/"))],
                    next_page: None,
                },
            ],
            vec![detail(), CenterDetail::default()],
        );
        let sink = MockSink::new();
        let svc = CrawlService::new(MockFetcher::new("<html></html>"), parser, sink.clone());

        let summary = svc
            .crawl(
                "https://zoon.ru/spb/",
                &CancellationToken::new(),
                &TracingCrawlReporter,
            )
            .await
            .unwrap();

        assert_eq!(summary.pages, 2);
        assert_eq!(summary.centers_found, 2);
        assert_eq!(summary.centers_saved, 2);
        assert_eq!(summary.links_saved, 2);
        assert_eq!(summary.reviews_saved, 1);
        assert_eq!(summary.failures, 0);

        let centers = sink.centers.lock().unwrap();
        assert_eq!(centers[0].name, "Fix");
        assert_eq!(centers[0].city.as_deref(), Some("Санкт-Петербург"));
        let links = sink.links.lock().unwrap();
        assert_eq!(links[0], (1, LinkType::Website, "https://fix.ru".to_string()));
        assert_eq!(links[1].1, LinkType::Vk);
    }

    #[tokio::test]
    async fn items_without_detail_link_are_skipped() {
        let parser = MockParser::new(
            vec![ListingPage {
                city: None,
                items: vec![item("NoLink", None), item("Fix", Some("https://zoon.ru/fix/"))],
                next_page: None,
            }],
            vec![detail()],
        );
        let sink = MockSink::new();
        let svc = CrawlService::new(MockFetcher::new("<html></html>"), parser, sink.clone());

        let summary = svc
            .crawl("https://zoon.ru/", &CancellationToken::new(), &TracingCrawlReporter)
            .await
            .unwrap();

        assert_eq!(summary.centers_found, 2);
        assert_eq!(summary.centers_saved, 1);
        assert_eq!(sink.centers.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failing_start_url_does_not_stop_the_others() {
        let parser = MockParser::new(
            vec![ListingPage {
                city: Some("Тула".into()),
                items: vec![item("Fix", Some("https://zoon.ru/fix/"))],
                next_page: None,
            }],
            vec![detail()],
        );
        let fetcher = MockFetcher::with_responses(vec![
            Err(AppError::HttpError("HTTP 503 for https://zoon.ru/msk/".into())),
            Ok("<html></html>".into()),
        ]);
        let sink = MockSink::new();
        let svc = CrawlService::new(fetcher, parser, sink.clone());

        let urls = vec![
            "https://zoon.ru/msk/".to_string(),
            "https://zoon.ru/tula/".to_string(),
        ];
        let results = svc
            .crawl_all(&urls, &CancellationToken::new(), &TracingCrawlReporter)
            .await;

        assert_eq!(results.len(), 2);
        assert!(results[0].summary.is_none());
        assert!(results[0].error.as_deref().unwrap().contains("503"));
        assert_eq!(results[1].summary.as_ref().unwrap().centers_saved, 1);
        assert_eq!(sink.centers.lock().unwrap()[0].city.as_deref(), Some("Тула"));
    }

    #[tokio::test]
    async fn replay_failure_is_counted_and_crawl_continues() {
        let parser = MockParser::new(
            vec![ListingPage {
                city: None,
                items: vec![
                    item("Broken", Some("https://zoon.ru/a/")),
                    item("Fix", Some("https://zoon.ru/b/")),
                ],
                next_page: None,
            }],
            vec![detail(), detail()],
        );
        let sink = MockSink::failing_centers(vec![AppError::HttpError(
            "HTTP 400 Bad Request for /service-centers/".into(),
        )]);
        let svc = CrawlService::new(MockFetcher::new("<html></html>"), parser, sink.clone());

        let summary = svc
            .crawl("https://zoon.ru/", &CancellationToken::new(), &TracingCrawlReporter)
            .await
            .unwrap();

        assert_eq!(summary.failures, 1);
        assert_eq!(summary.centers_saved, 1);
        assert_eq!(sink.centers.lock().unwrap()[0].name, "Fix");
    }

    #[tokio::test]
    async fn detail_fetch_failure_skips_item() {
        let parser = MockParser::new(
            vec![ListingPage {
                city: None,
                items: vec![item("Fix", Some("https://zoon.ru/a/"))],
                next_page: None,
            }],
            vec![],
        );
        let fetcher = MockFetcher::with_responses(vec![
            Ok("<html>listing</html>".into()),
            Err(AppError::Timeout(30)),
        ]);
        let sink = MockSink::new();
        let svc = CrawlService::new(fetcher, parser, sink.clone());

        let summary = svc
            .crawl("https://zoon.ru/", &CancellationToken::new(), &TracingCrawlReporter)
            .await
            .unwrap();

        assert_eq!(summary.failures, 1);
        assert_eq!(summary.centers_saved, 0);
        assert!(sink.centers.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn listing_fetch_failure_aborts() {
        let svc = CrawlService::new(
            MockFetcher::with_error(AppError::NetworkError("refused".into())),
            MockParser::new(vec![], vec![]),
            MockSink::new(),
        );
        let err = svc
            .crawl("https://zoon.ru/", &CancellationToken::new(), &TracingCrawlReporter)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NetworkError(_)));
    }

    #[tokio::test]
    async fn pagination_cycle_terminates() {
        let page = ListingPage {
            city: None,
            items: vec![],
            next_page: Some("https://zoon.ru/".into()),
        };
        let svc = CrawlService::new(
            MockFetcher::new("<html></html>"),
            MockParser::new(vec![page.clone(), page], vec![]),
            MockSink::new(),
        );
        let summary = svc
            .crawl("https://zoon.ru/", &CancellationToken::new(), &TracingCrawlReporter)
            .await
            .unwrap();
        assert_eq!(summary.pages, 1);
    }

    #[tokio::test]
    async fn cancelled_crawl_stops_before_fetching() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let svc = CrawlService::new(
            MockFetcher::with_error(AppError::NetworkError("should not be called".into())),
            MockParser::new(vec![], vec![]),
            MockSink::new(),
        );
        let summary = svc
            .crawl("https://zoon.ru/", &cancel, &TracingCrawlReporter)
            .await
            .unwrap();
        assert_eq!(summary.pages, 0);
    }

    #[tokio::test]
    async fn price_crawl_replays_rows() {
        let sheet = PriceSheet {
            model_name: "iPhone 12".into(),
            rows: vec![
                PriceRow {
                    repair_name: "Замена дисплея".into(),
                    price: 5490.0,
                },
                PriceRow {
                    repair_name: "Замена батареи".into(),
                    price: 1990.0,
                },
            ],
        };
        let sink = MockSink::new();
        let svc = PriceCrawlService::new(
            MockFetcher::new("<html></html>"),
            MockPriceParser::new(Some(sheet)),
            sink.clone(),
        );

        let summary = svc.crawl_prices("https://pedant.ru/x").await.unwrap();
        assert_eq!(summary.model_name.as_deref(), Some("iPhone 12"));
        assert_eq!(summary.prices_saved, 2);
        assert_eq!(sink.prices.lock().unwrap()[1].1.price, 1990.0);
    }

    #[tokio::test]
    async fn price_crawl_without_model_is_empty() {
        let sink = MockSink::new();
        let svc = PriceCrawlService::new(
            MockFetcher::new("<html></html>"),
            MockPriceParser::new(None),
            sink.clone(),
        );
        let summary = svc.crawl_prices("https://pedant.ru/x").await.unwrap();
        assert_eq!(summary, PriceCrawlSummary::default());
        assert!(sink.prices.lock().unwrap().is_empty());
    }
}
