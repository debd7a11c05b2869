//! Per-category scraping: acquire pages, extract cards, advance.

use crate::error::ScrapeError;
use crate::extract::{CardExtractor, CompiledSelectors, ExtractionContext, MaterialRecord};
use crate::fetch::{Clock, PageFetcher, PageRenderer, RenderSession};
use crate::pagination::{next_link, PageCursor, PolitenessDelay, ScrollPlan};
use crate::site::{CategoryConfig, ScrapeMode, SiteConfig};
use scraper::Html;
use tracing::{debug, info, warn};

/// How listing pages are obtained for one category.
pub enum ScrapeStrategy<'a> {
    /// Fetch HTML and follow the "next" link, pausing between pages.
    Static { fetcher: &'a dyn PageFetcher, delay: PolitenessDelay },
    /// Render one page in a browser and scroll it.
    Dynamic { renderer: &'a dyn PageRenderer },
}

impl ScrapeStrategy<'_> {
    pub fn mode(&self) -> ScrapeMode {
        match self {
            ScrapeStrategy::Static { .. } => ScrapeMode::Static,
            ScrapeStrategy::Dynamic { .. } => ScrapeMode::Dynamic,
        }
    }
}

/// Scrapes categories of one site.
pub struct CategoryScraper<'a> {
    site: &'a SiteConfig,
    selectors: CompiledSelectors,
    clock: &'a dyn Clock,
}

impl<'a> CategoryScraper<'a> {
    /// Compiles the site's selectors; fails before any page is requested.
    pub fn new(site: &'a SiteConfig, clock: &'a dyn Clock) -> Result<Self, ScrapeError> {
        Ok(Self { site, selectors: site.compile_selectors()?, clock })
    }

    /// Produces every record of a category, in page, then card, then variant order.
    ///
    /// A non-success status ends pagination and keeps what was gathered.
    /// Transport, rendering and capability failures are returned.
    pub async fn scrape(
        &self,
        strategy: &ScrapeStrategy<'_>,
        category_key: &str,
        category: &CategoryConfig,
    ) -> Result<Vec<MaterialRecord>, ScrapeError> {
        let start_url = self.site.category_url(category);
        info!("Scraping {} / {} ({})", self.site.name, category_key, strategy.mode());

        let records = match strategy {
            ScrapeStrategy::Static { fetcher, delay } => {
                self.scrape_static(*fetcher, *delay, category_key, category, start_url).await?
            }
            ScrapeStrategy::Dynamic { renderer } => {
                self.scrape_dynamic(*renderer, category_key, start_url).await?
            }
        };

        info!("Collected {} records for {} / {}", records.len(), self.site.name, category_key);
        Ok(records)
    }

    async fn scrape_static(
        &self,
        fetcher: &dyn PageFetcher,
        delay: PolitenessDelay,
        category_key: &str,
        category: &CategoryConfig,
        start_url: String,
    ) -> Result<Vec<MaterialRecord>, ScrapeError> {
        let extractor = CardExtractor::new(&self.selectors);
        let mut cursor = PageCursor::new(start_url, category.max_pages);
        let mut records = Vec::new();

        while let Some(url) = cursor.current().map(str::to_string) {
            debug!("Fetching page {} of {}: {}", cursor.page(), category_key, url);

            let page = fetcher.fetch(&url, self.site.user_agent.as_deref()).await?;
            if !page.is_success() {
                warn!("Stopping {} at page {}: HTTP {}", category_key, cursor.page(), page.status);
                cursor.stop();
                break;
            }

            let ctx = self.context(category_key, &url);
            let next = {
                let document = Html::parse_document(&page.body);
                records.extend(extractor.extract_document(&document, &ctx));
                next_link(&document, self.selectors.next_page.as_ref(), self.site.base())
            };

            cursor.advance(next);
            if cursor.current().is_some() {
                self.clock.sleep(delay.next_delay()).await;
            }
        }

        Ok(records)
    }

    async fn scrape_dynamic(
        &self,
        renderer: &dyn PageRenderer,
        category_key: &str,
        url: String,
    ) -> Result<Vec<MaterialRecord>, ScrapeError> {
        let mut session = renderer.open(&url, self.site.user_agent.as_deref()).await?;

        let outcome = self.read_rendered(session.as_mut(), category_key, &url).await;

        if let Err(e) = session.close().await {
            warn!("Failed to close browser session for {}: {}", url, e);
        }
        outcome
    }

    async fn read_rendered(
        &self,
        session: &mut dyn RenderSession,
        category_key: &str,
        url: &str,
    ) -> Result<Vec<MaterialRecord>, ScrapeError> {
        ScrollPlan::from_config(&self.site.pagination).run(session, self.clock).await?;
        let html = session.content().await?;

        let ctx = self.context(category_key, url);
        Ok(CardExtractor::new(&self.selectors).extract_page(&html, &ctx))
    }

    fn context(&self, category_key: &str, source_url: &str) -> ExtractionContext {
        ExtractionContext {
            category: category_key.to_string(),
            supplier: self.site.name.clone(),
            supplier_site: self.site.base_url.clone(),
            base_url: self.site.base().to_string(),
            default_currency: self.site.currency.clone(),
            source_url: source_url.to_string(),
            extracted_at: self.clock.now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchedPage;
    use crate::site::{PaginationConfig, SelectorConfig};
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Serves canned pages by URL; unknown URLs are 404.
    struct MockFetcher {
        pages: HashMap<String, FetchedPage>,
        requested: Mutex<Vec<String>>,
        fail_on: Option<String>,
    }

    impl MockFetcher {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages.iter().map(|(u, b)| (u.to_string(), FetchedPage::ok(*b))).collect(),
                requested: Mutex::new(Vec::new()),
                fail_on: None,
            }
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for MockFetcher {
        async fn fetch(&self, url: &str, _user_agent: Option<&str>) -> Result<FetchedPage, ScrapeError> {
            self.requested.lock().unwrap().push(url.to_string());
            if self.fail_on.as_deref() == Some(url) {
                return Err(ScrapeError::Transport {
                    url: url.to_string(),
                    reason: "connection reset".to_string(),
                });
            }
            Ok(self
                .pages
                .get(url)
                .cloned()
                .unwrap_or(FetchedPage { status: 404, body: String::new() }))
        }
    }

    /// Fixed time; counts sleeps instead of sleeping.
    #[derive(Default)]
    struct FakeClock {
        sleeps: AtomicU32,
    }

    #[async_trait]
    impl Clock for FakeClock {
        fn now(&self) -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2026, 2, 3, 4, 5, 6).unwrap()
        }
        async fn sleep(&self, _duration: Duration) {
            self.sleeps.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct MockSession {
        html: String,
        scrolls: Arc<AtomicU32>,
        closed: Arc<AtomicU32>,
        fail_content: bool,
    }

    #[async_trait]
    impl RenderSession for MockSession {
        async fn scroll_to_bottom(&mut self) -> Result<(), ScrapeError> {
            self.scrolls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn content(&mut self) -> Result<String, ScrapeError> {
            if self.fail_content {
                return Err(ScrapeError::Render {
                    url: "mock".to_string(),
                    reason: "target crashed".to_string(),
                });
            }
            Ok(self.html.clone())
        }
        async fn close(&mut self) -> Result<(), ScrapeError> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct MockRenderer {
        html: String,
        scrolls: Arc<AtomicU32>,
        closed: Arc<AtomicU32>,
        opened: Mutex<Vec<(String, Option<String>)>>,
        fail_content: bool,
    }

    impl MockRenderer {
        fn new(html: &str) -> Self {
            Self {
                html: html.to_string(),
                scrolls: Arc::new(AtomicU32::new(0)),
                closed: Arc::new(AtomicU32::new(0)),
                opened: Mutex::new(Vec::new()),
                fail_content: false,
            }
        }
    }

    #[async_trait]
    impl PageRenderer for MockRenderer {
        async fn open(
            &self,
            url: &str,
            user_agent: Option<&str>,
        ) -> Result<Box<dyn RenderSession>, ScrapeError> {
            self.opened.lock().unwrap().push((url.to_string(), user_agent.map(String::from)));
            Ok(Box::new(MockSession {
                html: self.html.clone(),
                scrolls: Arc::clone(&self.scrolls),
                closed: Arc::clone(&self.closed),
                fail_content: self.fail_content,
            }))
        }
    }

    fn make_site(mode: ScrapeMode) -> SiteConfig {
        SiteConfig {
            name: "Brico".to_string(),
            base_url: "https://brico.example/".to_string(),
            currency: "EUR".to_string(),
            user_agent: Some("TestAgent/1.0".to_string()),
            mode,
            selectors: SelectorConfig {
                product_card: "div.product".to_string(),
                name: Some(".name".to_string()),
                price: Some(".price".to_string()),
                variation_badges: Some(".badge".to_string()),
                ..SelectorConfig::default()
            },
            pagination: PaginationConfig {
                next_selector: Some("a.next".to_string()),
                scrolls: 4,
                wait: 1.5,
            },
            categories: Default::default(),
        }
    }

    fn category(max_pages: u32) -> CategoryConfig {
        CategoryConfig { path: "/peinture".to_string(), max_pages }
    }

    fn listing(names: &[&str], next: Option<&str>) -> String {
        let mut html = String::from("<html><body>");
        for name in names {
            html.push_str(&format!(
                r#"<div class="product"><span class="name">{}</span><span class="price">10,00 €</span></div>"#,
                name
            ));
        }
        if let Some(href) = next {
            html.push_str(&format!(r#"<a class="next" href="{}">Suivant</a>"#, href));
        }
        html.push_str("</body></html>");
        html
    }

    const P1: &str = "https://brico.example/peinture";
    const P2: &str = "https://brico.example/peinture?page=2";
    const P3: &str = "https://brico.example/peinture?page=3";

    #[tokio::test]
    async fn test_static_follows_next_links_in_order() {
        let p1 = listing(&["A", "B"], Some("/peinture?page=2"));
        let p2 = listing(&["C"], Some("https://brico.example/peinture?page=3"));
        let p3 = listing(&["D"], None);
        let fetcher = MockFetcher::new(&[(P1, p1.as_str()), (P2, p2.as_str()), (P3, p3.as_str())]);
        let clock = FakeClock::default();
        let site = make_site(ScrapeMode::Static);
        let scraper = CategoryScraper::new(&site, &clock).unwrap();
        let strategy = ScrapeStrategy::Static { fetcher: &fetcher, delay: PolitenessDelay::none() };

        let records = scraper.scrape(&strategy, "peinture", &category(5)).await.unwrap();

        let names: Vec<_> = records.iter().map(|r| r.product_name.clone().unwrap()).collect();
        assert_eq!(names, vec!["A", "B", "C", "D"]);
        assert_eq!(records[2].source, P2);
        assert_eq!(fetcher.requested(), vec![P1, P2, P3]);
        assert_eq!(clock.sleeps.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_static_stops_at_max_pages() {
        let p1 = listing(&["A"], Some("/peinture?page=2"));
        let p2 = listing(&["B"], Some("/peinture?page=3"));
        let fetcher = MockFetcher::new(&[(P1, p1.as_str()), (P2, p2.as_str())]);
        let clock = FakeClock::default();
        let site = make_site(ScrapeMode::Static);
        let scraper = CategoryScraper::new(&site, &clock).unwrap();
        let strategy = ScrapeStrategy::Static { fetcher: &fetcher, delay: PolitenessDelay::none() };

        let records = scraper.scrape(&strategy, "peinture", &category(2)).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(fetcher.requested(), vec![P1, P2]);
        assert_eq!(clock.sleeps.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_static_without_next_selector_fetches_one_page() {
        let p1 = listing(&["A"], Some("/peinture?page=2"));
        let fetcher = MockFetcher::new(&[(P1, p1.as_str())]);
        let clock = FakeClock::default();
        let mut site = make_site(ScrapeMode::Static);
        site.pagination.next_selector = None;
        let scraper = CategoryScraper::new(&site, &clock).unwrap();
        let strategy = ScrapeStrategy::Static { fetcher: &fetcher, delay: PolitenessDelay::none() };

        let records = scraper.scrape(&strategy, "peinture", &category(5)).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(fetcher.requested(), vec![P1]);
        assert_eq!(clock.sleeps.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_static_empty_next_href_ends_pagination() {
        let p1 = listing(&["A"], Some(""));
        let home = listing(&["Home"], None);
        let fetcher =
            MockFetcher::new(&[(P1, p1.as_str()), ("https://brico.example", home.as_str())]);
        let clock = FakeClock::default();
        let site = make_site(ScrapeMode::Static);
        let scraper = CategoryScraper::new(&site, &clock).unwrap();
        let strategy = ScrapeStrategy::Static { fetcher: &fetcher, delay: PolitenessDelay::none() };

        let records = scraper.scrape(&strategy, "peinture", &category(5)).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(fetcher.requested(), vec![P1]);
        assert_eq!(clock.sleeps.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_static_error_status_keeps_earlier_pages() {
        let p1 = listing(&["A", "B"], Some("/peinture?page=2"));
        let fetcher = MockFetcher::new(&[(P1, p1.as_str())]);
        let clock = FakeClock::default();
        let site = make_site(ScrapeMode::Static);
        let scraper = CategoryScraper::new(&site, &clock).unwrap();
        let strategy = ScrapeStrategy::Static { fetcher: &fetcher, delay: PolitenessDelay::none() };

        let records = scraper.scrape(&strategy, "peinture", &category(5)).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(fetcher.requested(), vec![P1, P2]);
    }

    #[tokio::test]
    async fn test_static_first_page_error_status_is_empty() {
        let fetcher = MockFetcher::new(&[]);
        let clock = FakeClock::default();
        let site = make_site(ScrapeMode::Static);
        let scraper = CategoryScraper::new(&site, &clock).unwrap();
        let strategy = ScrapeStrategy::Static { fetcher: &fetcher, delay: PolitenessDelay::none() };

        let records = scraper.scrape(&strategy, "peinture", &category(5)).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_static_transport_error_is_surfaced() {
        let p1 = listing(&["A"], Some("/peinture?page=2"));
        let mut fetcher = MockFetcher::new(&[(P1, p1.as_str())]);
        fetcher.fail_on = Some(P2.to_string());
        let clock = FakeClock::default();
        let site = make_site(ScrapeMode::Static);
        let scraper = CategoryScraper::new(&site, &clock).unwrap();
        let strategy = ScrapeStrategy::Static { fetcher: &fetcher, delay: PolitenessDelay::none() };

        let err = scraper.scrape(&strategy, "peinture", &category(5)).await.unwrap_err();
        assert!(matches!(err, ScrapeError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_same_product_on_two_pages_is_not_deduplicated() {
        let p1 = listing(&["A"], Some("/peinture?page=2"));
        let p2 = listing(&["A"], None);
        let fetcher = MockFetcher::new(&[(P1, p1.as_str()), (P2, p2.as_str())]);
        let clock = FakeClock::default();
        let site = make_site(ScrapeMode::Static);
        let scraper = CategoryScraper::new(&site, &clock).unwrap();
        let strategy = ScrapeStrategy::Static { fetcher: &fetcher, delay: PolitenessDelay::none() };

        let records = scraper.scrape(&strategy, "peinture", &category(5)).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, records[1].id);
    }

    #[tokio::test]
    async fn test_single_page_with_variant_yields_three_records() {
        let p1 = r#"<html><body>
            <div class="product"><span class="name">Peinture blanche</span><span class="price">19,90 €</span><span class="badge">Rouge</span></div>
            <div class="product"><span class="name">Enduit</span><span class="price">8 €</span></div>
            <a class="next" href="/peinture?page=2">Suivant</a>
        </body></html>"#;
        let fetcher = MockFetcher::new(&[(P1, p1)]);
        let clock = FakeClock::default();
        let site = make_site(ScrapeMode::Static);
        let scraper = CategoryScraper::new(&site, &clock).unwrap();
        let strategy = ScrapeStrategy::Static { fetcher: &fetcher, delay: PolitenessDelay::none() };

        let records = scraper.scrape(&strategy, "peinture", &category(1)).await.unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].product_name.as_deref(), Some("Peinture blanche"));
        assert_eq!(records[1].product_name.as_deref(), Some("Peinture blanche - Rouge"));
        assert_eq!(records[2].product_name.as_deref(), Some("Enduit"));
        for r in &records {
            assert_eq!(r.category, "peinture");
            assert_eq!(r.supplier, "Brico");
            assert_eq!(r.supplier_site, "https://brico.example/");
            assert_eq!(r.source, P1);
            assert_eq!(r.updated_at, "2026-02-03T04:05:06.000000Z");
        }
        assert_eq!(fetcher.requested(), vec![P1]);
    }

    #[tokio::test]
    async fn test_dynamic_scrolls_then_extracts_and_closes() {
        let html = listing(&["A", "B", "C"], None);
        let renderer = MockRenderer::new(&html);
        let clock = FakeClock::default();
        let site = make_site(ScrapeMode::Dynamic);
        let scraper = CategoryScraper::new(&site, &clock).unwrap();
        let strategy = ScrapeStrategy::Dynamic { renderer: &renderer };

        let records = scraper.scrape(&strategy, "peinture", &category(5)).await.unwrap();

        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.source == P1));
        assert_eq!(renderer.scrolls.load(Ordering::SeqCst), 4);
        assert_eq!(clock.sleeps.load(Ordering::SeqCst), 4);
        assert_eq!(renderer.closed.load(Ordering::SeqCst), 1);
        assert_eq!(
            renderer.opened.lock().unwrap().clone(),
            vec![(P1.to_string(), Some("TestAgent/1.0".to_string()))]
        );
    }

    #[tokio::test]
    async fn test_dynamic_closes_session_on_failure() {
        let mut renderer = MockRenderer::new("");
        renderer.fail_content = true;
        let clock = FakeClock::default();
        let site = make_site(ScrapeMode::Dynamic);
        let scraper = CategoryScraper::new(&site, &clock).unwrap();
        let strategy = ScrapeStrategy::Dynamic { renderer: &renderer };

        let err = scraper.scrape(&strategy, "peinture", &category(5)).await.unwrap_err();

        assert!(matches!(err, ScrapeError::Render { .. }));
        assert_eq!(renderer.closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalid_selector_rejected_before_fetch() {
        let clock = FakeClock::default();
        let mut site = make_site(ScrapeMode::Static);
        site.selectors.brand = Some("span[[".to_string());
        assert!(CategoryScraper::new(&site, &clock).is_err());
    }

    #[test]
    fn test_strategy_mode() {
        let fetcher = MockFetcher::new(&[]);
        let renderer = MockRenderer::new("");
        let s = ScrapeStrategy::Static { fetcher: &fetcher, delay: PolitenessDelay::none() };
        let d = ScrapeStrategy::Dynamic { renderer: &renderer };
        assert_eq!(s.mode(), ScrapeMode::Static);
        assert_eq!(d.mode(), ScrapeMode::Dynamic);
    }
}
