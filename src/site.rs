//! Site catalogue: which suppliers to scrape, how, and with which selectors.

use crate::error::ScrapeError;
use crate::extract::selectors::CompiledSelectors;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// How a site's listing pages are obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeMode {
    /// Plain HTTP fetch, following a "next" link
    #[default]
    Static,
    /// Headless browser, scrolling a single page
    Dynamic,
}

impl std::fmt::Display for ScrapeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScrapeMode::Static => write!(f, "static"),
            ScrapeMode::Dynamic => write!(f, "dynamic"),
        }
    }
}

/// Per-field CSS selectors, all relative to one product card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectorConfig {
    /// Card boundary, matched against the whole page
    pub product_card: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    /// Defaults to `a`
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub pack: Option<String>,
    /// Defaults to `img`
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub availability: Option<String>,
    #[serde(default)]
    pub variation_badges: Option<String>,
}

/// Page traversal settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaginationConfig {
    /// Static mode: selector of the "next page" link
    #[serde(default)]
    pub next_selector: Option<String>,
    /// Dynamic mode: number of scroll cycles
    #[serde(default = "default_scrolls")]
    pub scrolls: u32,
    /// Dynamic mode: seconds to wait after each scroll
    #[serde(default = "default_wait")]
    pub wait: f64,
}

fn default_scrolls() -> u32 {
    8
}

fn default_wait() -> f64 {
    1.5
}

fn default_max_pages() -> u32 {
    5
}

fn default_currency() -> String {
    "EUR".to_string()
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { next_selector: None, scrolls: default_scrolls(), wait: default_wait() }
    }
}

impl PaginationConfig {
    /// Scroll wait as a duration; negative or non-finite values count as zero.
    pub fn wait_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.wait).unwrap_or(Duration::ZERO)
    }
}

/// One category listing of a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryConfig {
    /// Path appended to the site's base URL
    pub path: String,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

/// One supplier website.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Supplier display name, copied into every record
    pub name: String,
    pub base_url: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub mode: ScrapeMode,
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub categories: BTreeMap<String, CategoryConfig>,
}

impl SiteConfig {
    /// Base URL without trailing slashes.
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Absolute URL of a category's first listing page.
    pub fn category_url(&self, category: &CategoryConfig) -> String {
        format!("{}{}", self.base(), category.path)
    }

    /// Compiles and checks this site's selectors.
    pub fn compile_selectors(&self) -> Result<CompiledSelectors, ScrapeError> {
        if self.selectors.product_card.trim().is_empty() {
            return Err(ScrapeError::Config(format!(
                "site '{}' has an empty product_card selector",
                self.name
            )));
        }
        CompiledSelectors::compile(&self.selectors, &self.pagination)
    }
}

/// All configured sites, keyed by site key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteCatalog {
    #[serde(default)]
    pub sites: BTreeMap<String, SiteConfig>,
}

impl SiteCatalog {
    /// Loads a catalogue from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading site catalogue from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read site catalogue: {}", path.display()))?;

        let catalog: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse site catalogue: {}", path.display()))?;

        catalog.validate()?;
        Ok(catalog)
    }

    /// Compiles every site's selectors, failing on the first invalid one.
    pub fn validate(&self) -> Result<(), ScrapeError> {
        for site in self.sites.values() {
            site.compile_selectors()?;
        }
        Ok(())
    }

    /// Sites to run, optionally restricted to one key.
    pub fn selected<'a>(
        &'a self,
        only: Option<&'a str>,
    ) -> impl Iterator<Item = (&'a String, &'a SiteConfig)> + 'a {
        self.sites.iter().filter(move |(key, _)| only.is_none_or(|o| o == key.as_str()))
    }
}
