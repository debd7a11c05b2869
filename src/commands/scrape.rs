//! Scrape command: every selected site and category, then export.

use crate::category::{CategoryScraper, ScrapeStrategy};
use crate::config::Config;
use crate::error::ScrapeError;
use crate::extract::MaterialRecord;
use crate::fetch::{
    BrowserRenderer, Clock, HttpFetcher, PageFetcher, PageRenderer, SystemClock,
    UnavailableFetcher,
};
use crate::site::{ScrapeMode, SiteCatalog};
use tracing::{info, warn};

/// A category that produced an error instead of records.
#[derive(Debug)]
pub struct CategoryFailure {
    pub site: String,
    pub category: String,
    pub error: ScrapeError,
}

/// Outcome of a run: everything collected plus the categories that failed.
#[derive(Debug, Default)]
pub struct RunReport {
    pub records: Vec<MaterialRecord>,
    pub failures: Vec<CategoryFailure>,
}

/// Runs the configured sites.
pub struct ScrapeCommand {
    config: Config,
    catalog: SiteCatalog,
}

impl ScrapeCommand {
    pub fn new(config: Config, catalog: SiteCatalog) -> Self {
        Self { config, catalog }
    }

    /// Scrapes with the real HTTP client, browser and clock.
    ///
    /// An HTTP client that cannot be built fails each static category
    /// rather than the whole run.
    pub async fn execute(&self, only_site: Option<&str>, force_dynamic: bool) -> RunReport {
        let fetcher: Box<dyn PageFetcher> = match HttpFetcher::new(&self.config) {
            Ok(fetcher) => Box::new(fetcher),
            Err(e) => {
                warn!(error = %e, "HTTP client unavailable");
                Box::new(UnavailableFetcher::new(e.to_string()))
            }
        };
        let renderer = BrowserRenderer::new();

        self.execute_with(fetcher.as_ref(), &renderer, &SystemClock, only_site, force_dynamic)
            .await
    }

    /// Scrapes with the given capabilities (for testing).
    pub async fn execute_with(
        &self,
        fetcher: &dyn PageFetcher,
        renderer: &dyn PageRenderer,
        clock: &dyn Clock,
        only_site: Option<&str>,
        force_dynamic: bool,
    ) -> RunReport {
        let mut report = RunReport::default();
        let delay = self.config.politeness_delay();

        if let Some(key) = only_site {
            if !self.catalog.sites.contains_key(key) {
                warn!("No site named '{}' in the catalogue", key);
            }
        }

        for (site_key, site) in self.catalog.selected(only_site) {
            let mode = if force_dynamic { ScrapeMode::Dynamic } else { site.mode };
            let strategy = match mode {
                ScrapeMode::Static => ScrapeStrategy::Static { fetcher, delay },
                ScrapeMode::Dynamic => ScrapeStrategy::Dynamic { renderer },
            };

            let scraper = match CategoryScraper::new(site, clock) {
                Ok(scraper) => Some(scraper),
                Err(e) => {
                    warn!(error = %e, "Skipping site {}", site_key);
                    None
                }
            };

            for (category_key, category) in &site.categories {
                println!("[{}] {} -> {} (mode={})", site_key, category_key, category.path, site.mode);

                let result = match &scraper {
                    Some(scraper) => scraper.scrape(&strategy, category_key, category).await,
                    // Same selector error, reported under each category
                    None => site.compile_selectors().map(|_| Vec::new()),
                };

                match result {
                    Ok(records) => report.records.extend(records),
                    Err(e) => {
                        warn!(error = %e, "Category {}/{} failed", site_key, category_key);
                        eprintln!("Error scraping {}/{}: {}", site_key, category_key, e);
                        report.failures.push(CategoryFailure {
                            site: site_key.clone(),
                            category: category_key.clone(),
                            error: e,
                        });
                    }
                }
            }
        }

        info!(
            "Run finished: {} records, {} failed categories",
            report.records.len(),
            report.failures.len()
        );
        report
    }
}
