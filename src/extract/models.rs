//! Canonical material record and the run context it is built from.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Column order of the flattened CSV export; mirrors [`MaterialRecord`] field order.
pub const CSV_COLUMNS: [&str; 14] = [
    "id",
    "product_name",
    "category",
    "price",
    "currency",
    "product_url",
    "brand",
    "pack_size",
    "updated_at",
    "source",
    "image_url",
    "availability",
    "supplier",
    "supplier_site",
];

/// Name characters kept in the synthetic id.
pub const ID_NAME_PREFIX: usize = 64;

/// Stock status derived from availability text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    InStock,
    OutOfStock,
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Availability::InStock => write!(f, "in_stock"),
            Availability::OutOfStock => write!(f, "out_of_stock"),
        }
    }
}

/// One extracted product listing.
///
/// Records are built whole and never patched afterwards; variants are new
/// records derived from a base via [`MaterialRecord::variant`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRecord {
    /// `supplier::category::name-prefix`, plus `::variant` for variants
    pub id: String,
    pub product_name: Option<String>,
    /// Category key the scrape ran under
    pub category: String,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub product_url: Option<String>,
    pub brand: Option<String>,
    pub pack_size: Option<String>,
    /// Extraction time, RFC 3339 UTC
    pub updated_at: String,
    /// Page URL the card was read from
    pub source: String,
    pub image_url: Option<String>,
    pub availability: Option<Availability>,
    pub supplier: String,
    pub supplier_site: String,
}

impl MaterialRecord {
    /// Builds the synthetic identity for a product.
    ///
    /// Two products whose names share the first 64 characters collide.
    pub fn synthetic_id(supplier: &str, category: &str, product_name: Option<&str>) -> String {
        let prefix: String = product_name.unwrap_or_default().chars().take(ID_NAME_PREFIX).collect();
        format!("{}::{}::{}", supplier, category, prefix)
    }

    /// Derives a variant record; `self` is left untouched.
    pub fn variant(&self, variant_name: &str) -> Self {
        Self {
            id: format!("{}::{}", self.id, variant_name),
            product_name: Some(format!(
                "{} - {}",
                self.product_name.as_deref().unwrap_or_default(),
                variant_name
            )),
            ..self.clone()
        }
    }

    /// Returns the record as CSV cells in [`CSV_COLUMNS`] order; `None` becomes empty.
    pub fn csv_cells(&self) -> [String; 14] {
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();
        [
            self.id.clone(),
            opt(&self.product_name),
            self.category.clone(),
            self.price.map(|p| p.to_string()).unwrap_or_default(),
            opt(&self.currency),
            opt(&self.product_url),
            opt(&self.brand),
            opt(&self.pack_size),
            self.updated_at.clone(),
            self.source.clone(),
            opt(&self.image_url),
            self.availability.map(|a| a.to_string()).unwrap_or_default(),
            self.supplier.clone(),
            self.supplier_site.clone(),
        ]
    }
}

/// Per-page facts shared by every record extracted from that page.
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    pub category: String,
    pub supplier: String,
    /// Configured base URL, as written in the site config
    pub supplier_site: String,
    /// Base URL with any trailing `/` removed; prefixed to relative hrefs
    pub base_url: String,
    pub default_currency: String,
    pub source_url: String,
    pub extracted_at: DateTime<Utc>,
}

impl ExtractionContext {
    /// Formats the extraction time the way records carry it.
    pub fn timestamp(&self) -> String {
        self.extracted_at.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}
