//! Page acquisition capabilities injected into the category scraper.
//!
//! The scraper never talks to the network or a browser directly; it goes
//! through these traits so tests can substitute canned pages and a clock
//! that does not actually sleep.

pub mod browser;
pub mod http;

use crate::error::ScrapeError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

pub use browser::BrowserRenderer;
pub use http::HttpFetcher;

/// Raw response of a static page fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    pub fn ok(body: impl Into<String>) -> Self {
        Self { status: 200, body: body.into() }
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fetches static HTML - enables mocking for tests.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// GETs `url`. Non-2xx statuses are returned, not raised; only transport
    /// failures are errors.
    async fn fetch(&self, url: &str, user_agent: Option<&str>) -> Result<FetchedPage, ScrapeError>;
}

/// A live headless-browser page.
#[async_trait]
pub trait RenderSession: Send {
    /// Scrolls the page to the bottom of the document.
    async fn scroll_to_bottom(&mut self) -> Result<(), ScrapeError>;

    /// Serializes the current DOM.
    async fn content(&mut self) -> Result<String, ScrapeError>;

    /// Releases the page and the browser behind it.
    async fn close(&mut self) -> Result<(), ScrapeError>;
}

/// Opens browser sessions for dynamic sites.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn open(
        &self,
        url: &str,
        user_agent: Option<&str>,
    ) -> Result<Box<dyn RenderSession>, ScrapeError>;
}

/// Time source and sleeper.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by tokio timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Fetcher standing in for an HTTP client that could not be built.
///
/// Every fetch fails with [`ScrapeError::MissingCapability`], so only the
/// static categories are affected.
#[derive(Debug, Clone)]
pub struct UnavailableFetcher {
    reason: String,
}

impl UnavailableFetcher {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

#[async_trait]
impl PageFetcher for UnavailableFetcher {
    async fn fetch(&self, _url: &str, _user_agent: Option<&str>) -> Result<FetchedPage, ScrapeError> {
        Err(ScrapeError::MissingCapability(self.reason.clone()))
    }
}
