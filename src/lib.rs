//! materials-scraper - Config-driven product catalogue scraper for
//! building-material supplier sites.
//!
//! Static listings are fetched over HTTP with TLS fingerprint emulation,
//! dynamic ones rendered in a headless browser. Records are exported to
//! JSON and CSV and served back through a small read API.

pub mod api;
pub mod category;
pub mod commands;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod output;
pub mod pagination;
pub mod site;

pub use config::Config;
pub use error::ScrapeError;
pub use extract::{Availability, MaterialRecord};
pub use site::{ScrapeMode, SiteCatalog, SiteConfig};
