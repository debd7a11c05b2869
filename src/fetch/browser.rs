//! Headless browser rendering for dynamic sites.
//!
//! Chromium support is behind the `browser` feature. Without it the renderer
//! still exists but every `open` fails with
//! [`ScrapeError::MissingCapability`], which the run driver reports per
//! category.

use crate::error::ScrapeError;
use crate::fetch::{PageRenderer, RenderSession};
use async_trait::async_trait;

/// Renderer backed by a local headless Chromium.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserRenderer;

impl BrowserRenderer {
    pub fn new() -> Self {
        Self
    }

    /// True when this build can drive a browser.
    pub fn is_available(&self) -> bool {
        cfg!(feature = "browser")
    }
}

#[cfg(not(feature = "browser"))]
#[async_trait]
impl PageRenderer for BrowserRenderer {
    async fn open(
        &self,
        _url: &str,
        _user_agent: Option<&str>,
    ) -> Result<Box<dyn RenderSession>, ScrapeError> {
        Err(ScrapeError::MissingCapability(
            "headless browser support is not compiled in; rebuild with `--features browser`"
                .to_string(),
        ))
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl PageRenderer for BrowserRenderer {
    async fn open(
        &self,
        url: &str,
        user_agent: Option<&str>,
    ) -> Result<Box<dyn RenderSession>, ScrapeError> {
        chrome::ChromeSession::launch(url, user_agent).await.map(|s| Box::new(s) as Box<dyn RenderSession>)
    }
}

#[cfg(feature = "browser")]
mod chrome {
    use super::*;
    use chromiumoxide::browser::{Browser, BrowserConfig};
    use chromiumoxide::Page;
    use futures::StreamExt;
    use tokio::task::JoinHandle;
    use tracing::{debug, warn};

    const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight)";

    pub(super) struct ChromeSession {
        url: String,
        browser: Browser,
        page: Page,
        handler: JoinHandle<()>,
    }

    impl ChromeSession {
        pub(super) async fn launch(url: &str, user_agent: Option<&str>) -> Result<Self, ScrapeError> {
            let mut builder = BrowserConfig::builder();
            if let Some(agent) = user_agent {
                builder = builder.arg(format!("--user-agent={}", agent));
            }
            let config = builder.build().map_err(|e| {
                ScrapeError::MissingCapability(format!("headless browser unavailable: {}", e))
            })?;

            let (browser, mut events) = Browser::launch(config).await.map_err(|e| {
                ScrapeError::MissingCapability(format!("failed to launch headless browser: {}", e))
            })?;

            let handler = tokio::spawn(async move {
                while let Some(event) = events.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            debug!("Opening {} in headless browser", url);
            let page = match browser.new_page(url).await {
                Ok(page) => page,
                Err(e) => {
                    handler.abort();
                    return Err(render_error(url, e));
                }
            };

            if let Err(e) = page.wait_for_navigation().await {
                warn!("Navigation wait failed for {}: {}", url, e);
            }

            Ok(Self { url: url.to_string(), browser, page, handler })
        }
    }

    fn render_error(url: &str, e: impl std::fmt::Display) -> ScrapeError {
        ScrapeError::Render { url: url.to_string(), reason: e.to_string() }
    }

    #[async_trait]
    impl RenderSession for ChromeSession {
        async fn scroll_to_bottom(&mut self) -> Result<(), ScrapeError> {
            self.page.evaluate(SCROLL_TO_BOTTOM).await.map_err(|e| render_error(&self.url, e))?;
            Ok(())
        }

        async fn content(&mut self) -> Result<String, ScrapeError> {
            self.page.content().await.map_err(|e| render_error(&self.url, e))
        }

        async fn close(&mut self) -> Result<(), ScrapeError> {
            let result = self.browser.close().await.map_err(|e| render_error(&self.url, e));
            let _ = self.browser.wait().await;
            self.handler.abort();
            result.map(|_| ())
        }
    }
}
