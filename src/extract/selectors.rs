//! Compiled CSS selectors for one site.
//!
//! Selector strings come from the site catalogue, so they are parsed once per
//! site up front. A typo fails validation before any request is made instead
//! of silently nulling a field on every card.

use crate::error::ScrapeError;
use crate::site::{PaginationConfig, SelectorConfig};
use scraper::Selector;

/// Link selector used when `url` is not configured.
pub const DEFAULT_URL_SELECTOR: &str = "a";

/// Image selector used when `image` is not configured.
pub const DEFAULT_IMAGE_SELECTOR: &str = "img";

/// Parsed selectors, one per configured field.
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub product_card: Selector,
    pub name: Option<Selector>,
    pub price: Option<Selector>,
    pub url: Selector,
    pub brand: Option<Selector>,
    pub pack: Option<Selector>,
    pub image: Selector,
    pub availability: Option<Selector>,
    pub variation_badges: Option<Selector>,
    /// Static pagination "next" link, matched against the whole page
    pub next_page: Option<Selector>,
}

impl CompiledSelectors {
    /// Parses every configured selector.
    pub fn compile(
        selectors: &SelectorConfig,
        pagination: &PaginationConfig,
    ) -> Result<Self, ScrapeError> {
        Ok(Self {
            product_card: parse("product_card", &selectors.product_card)?,
            name: parse_opt("name", selectors.name.as_deref())?,
            price: parse_opt("price", selectors.price.as_deref())?,
            url: parse("url", selectors.url.as_deref().unwrap_or(DEFAULT_URL_SELECTOR))?,
            brand: parse_opt("brand", selectors.brand.as_deref())?,
            pack: parse_opt("pack", selectors.pack.as_deref())?,
            image: parse("image", selectors.image.as_deref().unwrap_or(DEFAULT_IMAGE_SELECTOR))?,
            availability: parse_opt("availability", selectors.availability.as_deref())?,
            variation_badges: parse_opt("variation_badges", selectors.variation_badges.as_deref())?,
            next_page: parse_opt("next_selector", pagination.next_selector.as_deref())?,
        })
    }
}

fn parse(field: &'static str, selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|e| ScrapeError::InvalidSelector {
        field,
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Empty strings count as "not configured".
fn parse_opt(field: &'static str, selector: Option<&str>) -> Result<Option<Selector>, ScrapeError> {
    match selector.map(str::trim) {
        Some(s) if !s.is_empty() => parse(field, s).map(Some),
        _ => Ok(None),
    }
}
