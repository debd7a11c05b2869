//! Product card extraction.

use crate::extract::models::{ExtractionContext, MaterialRecord};
use crate::extract::normalize::{clean_text, classify_availability, scan_price};
use crate::extract::selectors::CompiledSelectors;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace};

/// Turns product cards into [`MaterialRecord`]s using a site's selectors.
pub struct CardExtractor<'a> {
    selectors: &'a CompiledSelectors,
}

impl<'a> CardExtractor<'a> {
    /// Creates an extractor for one site's selectors.
    pub fn new(selectors: &'a CompiledSelectors) -> Self {
        Self { selectors }
    }

    /// Parses a page and extracts every card on it.
    pub fn extract_page(&self, html: &str, ctx: &ExtractionContext) -> Vec<MaterialRecord> {
        let document = Html::parse_document(html);
        self.extract_document(&document, ctx)
    }

    /// Extracts every card of an already-parsed page, in document order.
    pub fn extract_document(&self, document: &Html, ctx: &ExtractionContext) -> Vec<MaterialRecord> {
        let mut records = Vec::new();
        let mut cards = 0usize;

        for card in document.select(&self.selectors.product_card) {
            cards += 1;
            records.extend(self.extract_card(card, ctx));
        }

        debug!("Extracted {} records from {} cards on {}", records.len(), cards, ctx.source_url);
        records
    }

    /// Extracts one card: the base record first, then its variants.
    ///
    /// Missing elements only null the matching field.
    pub fn extract_card(&self, card: ElementRef, ctx: &ExtractionContext) -> Vec<MaterialRecord> {
        let sel = self.selectors;

        let product_name = first_text(card, sel.name.as_ref());
        let price_text = first_text(card, sel.price.as_ref());
        let (price, currency) = scan_price(price_text.as_deref());

        let product_url = card
            .select(&sel.url)
            .next()
            .and_then(|a| non_empty_attr(a, "href"))
            .map(|href| absolutize_href(href, &ctx.base_url));

        let image_url = card
            .select(&sel.image)
            .next()
            .and_then(|img| non_empty_attr(img, "src").or_else(|| non_empty_attr(img, "data-src")))
            .map(absolutize_image);

        let availability = sel
            .availability
            .as_ref()
            .and_then(|s| classify_availability(first_text(card, Some(s)).as_deref()));

        let base = MaterialRecord {
            id: MaterialRecord::synthetic_id(&ctx.supplier, &ctx.category, product_name.as_deref()),
            product_name,
            category: ctx.category.clone(),
            price,
            currency: Some(currency.unwrap_or_else(|| ctx.default_currency.clone())),
            product_url,
            brand: first_text(card, sel.brand.as_ref()),
            pack_size: first_text(card, sel.pack.as_ref()),
            updated_at: ctx.timestamp(),
            source: ctx.source_url.clone(),
            image_url,
            availability,
            supplier: ctx.supplier.clone(),
            supplier_site: ctx.supplier_site.clone(),
        };

        trace!("Parsed card: {}", base.id);

        let variants = self.variant_names(card, base.product_name.as_deref());
        let mut records = Vec::with_capacity(1 + variants.len());
        let derived: Vec<_> = variants.iter().map(|v| base.variant(v)).collect();
        records.push(base);
        records.extend(derived);
        records
    }

    /// Badge texts that are non-empty and not already part of the product name.
    fn variant_names(&self, card: ElementRef, product_name: Option<&str>) -> Vec<String> {
        let Some(badges) = self.selectors.variation_badges.as_ref() else {
            return Vec::new();
        };
        let name = product_name.unwrap_or_default().to_lowercase();

        card.select(badges)
            .filter_map(|badge| clean_text(Some(&badge.text().collect::<String>())))
            .filter(|v| !v.is_empty() && !name.contains(&v.to_lowercase()))
            .collect()
    }
}

/// Cleaned text of the first element matching `selector` under `card`.
fn first_text(card: ElementRef, selector: Option<&Selector>) -> Option<String> {
    let element = card.select(selector?).next()?;
    clean_text(Some(&element.text().collect::<String>()))
}

/// Attribute value, treating `attr=""` as absent.
fn non_empty_attr<'a>(element: ElementRef<'a>, name: &str) -> Option<&'a str> {
    element.value().attr(name).filter(|v| !v.is_empty())
}

/// Prefixes root-relative hrefs with the site base; anything else passes through.
pub fn absolutize_href(href: &str, base_url: &str) -> String {
    if href.starts_with('/') {
        format!("{}{}", base_url, href)
    } else {
        href.to_string()
    }
}

/// Gives protocol-relative image URLs an explicit `https:` scheme.
pub fn absolutize_image(src: &str) -> String {
    if src.starts_with("//") {
        format!("https:{}", src)
    } else {
        src.to_string()
    }
}
