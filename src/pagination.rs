//! Page traversal: "next" link following for static sites, scroll cycles for
//! dynamic ones, and the politeness delay between static fetches.

use crate::error::ScrapeError;
use crate::fetch::{Clock, RenderSession};
use crate::site::PaginationConfig;
use rand::Rng;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;

/// Shortest politeness delay once jitter is applied.
const MIN_DELAY: Duration = Duration::from_millis(100);

/// Static traversal state: the next target and how many pages were visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    next: Option<String>,
    page: u32,
    max_pages: u32,
}

impl PageCursor {
    pub fn new(start_url: impl Into<String>, max_pages: u32) -> Self {
        Self { next: Some(start_url.into()), page: 1, max_pages }
    }

    /// URL to fetch now, or `None` once traversal is over.
    pub fn current(&self) -> Option<&str> {
        if self.page > self.max_pages {
            return None;
        }
        self.next.as_deref()
    }

    /// 1-based index of the page [`current`](Self::current) points at.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Moves past the current page.
    pub fn advance(&mut self, next: Option<String>) {
        self.page += 1;
        self.next = next;
    }

    /// Ends traversal regardless of remaining links.
    pub fn stop(&mut self) {
        self.next = None;
    }
}

/// Resolves the "next page" link of a listing page.
///
/// No selector, no match, or a match with a missing or empty `href` all end
/// traversal.
pub fn next_link(document: &Html, selector: Option<&Selector>, base_url: &str) -> Option<String> {
    let href = document.select(selector?).next()?.value().attr("href").filter(|h| !h.is_empty())?;

    if href.starts_with("http") {
        Some(href.to_string())
    } else {
        Some(format!("{}{}", base_url, href))
    }
}

/// Jittered pause between static page fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolitenessDelay {
    base: Duration,
    spread: Duration,
}

impl PolitenessDelay {
    pub fn new(base: Duration, spread: Duration) -> Self {
        Self { base, spread }
    }

    pub fn from_millis(base_ms: u64, spread_ms: u64) -> Self {
        Self::new(Duration::from_millis(base_ms), Duration::from_millis(spread_ms))
    }

    /// No pause at all.
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Draws `base ± spread`, floored at 100ms; a zero base disables the pause.
    pub fn next_delay(&self) -> Duration {
        if self.base.is_zero() {
            return Duration::ZERO;
        }

        if self.spread.is_zero() {
            return self.base.max(MIN_DELAY);
        }

        let spread = self.spread.as_secs_f64();
        let offset = rand::rng().random_range(-spread..=spread);

        Duration::from_secs_f64((self.base.as_secs_f64() + offset).max(MIN_DELAY.as_secs_f64()))
    }
}

impl Default for PolitenessDelay {
    fn default() -> Self {
        Self::from_millis(1200, 600)
    }
}

/// Scroll cycles performed on a dynamic page before it is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollPlan {
    pub scrolls: u32,
    pub wait: Duration,
}

impl ScrollPlan {
    pub fn from_config(pagination: &PaginationConfig) -> Self {
        Self { scrolls: pagination.scrolls, wait: pagination.wait_duration() }
    }

    /// Scrolls to the bottom `scrolls` times, waiting after each.
    pub async fn run(
        &self,
        session: &mut dyn RenderSession,
        clock: &dyn Clock,
    ) -> Result<(), ScrapeError> {
        for cycle in 1..=self.scrolls {
            session.scroll_to_bottom().await?;
            debug!("Scroll {}/{}", cycle, self.scrolls);
            clock.sleep(self.wait).await;
        }
        Ok(())
    }
}
