//! Error types surfaced by the scraping pipeline.
//!
//! Selector misses and unparseable prices are not errors: they degrade to
//! `None` fields on the record. Only environment and transport failures end
//! up here, and the run driver decides what to do with them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("failed to fetch {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("missing capability: {0}")]
    MissingCapability(String),

    #[error("invalid `{field}` selector \"{selector}\": {reason}")]
    InvalidSelector {
        field: &'static str,
        selector: String,
        reason: String,
    },

    #[error("browser rendering failed for {url}: {reason}")]
    Render { url: String, reason: String },

    #[error("invalid site configuration: {0}")]
    Config(String),
}
