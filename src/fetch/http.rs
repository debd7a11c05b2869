//! HTTP fetcher for static sites using wreq for TLS fingerprint emulation.

use crate::config::Config;
use crate::error::ScrapeError;
use crate::fetch::{FetchedPage, PageFetcher};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};
use wreq::Client;
use wreq_util::Profile;

/// User agent sent when neither the site nor the run configures one.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124 Safari/537.36";

const ACCEPT_LANGUAGE: &str = "fr-FR,fr;q=0.9,en-US;q=0.8,en;q=0.7";

/// Static page fetcher with browser-like headers.
pub struct HttpFetcher {
    client: Client,
    user_agent: String,
}

impl HttpFetcher {
    /// Creates a fetcher from run settings.
    pub fn new(config: &Config) -> Result<Self, ScrapeError> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url)
                .map_err(|e| ScrapeError::Config(format!("invalid proxy {}: {}", proxy_url, e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| ScrapeError::MissingCapability(format!("HTTP client unavailable: {}", e)))?;

        Ok(Self {
            client,
            user_agent: config.user_agent.clone().unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        })
    }

    /// Site override first, then the run-level agent.
    fn pick_user_agent<'a>(&'a self, site_agent: Option<&'a str>) -> &'a str {
        site_agent.unwrap_or(&self.user_agent)
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, user_agent: Option<&str>) -> Result<FetchedPage, ScrapeError> {
        debug!("GET {}", url);

        let transport = |e: wreq::Error| ScrapeError::Transport { url: url.to_string(), reason: e.to_string() };

        let response = self
            .client
            .get(url)
            .emulation(Profile::Chrome131)
            .header("User-Agent", self.pick_user_agent(user_agent))
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", ACCEPT_LANGUAGE)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status().as_u16();
        debug!("Response status: {}", status);

        if !(200..300).contains(&status) {
            warn!("Non-success status {} for {}", status, url);
        }

        let body = response.text().await.map_err(transport)?;
        Ok(FetchedPage { status, body })
    }
}
