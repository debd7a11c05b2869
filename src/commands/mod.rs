//! CLI command implementations.

pub mod scrape;
pub mod sites;

pub use scrape::{CategoryFailure, RunReport, ScrapeCommand};
pub use sites::SitesCommand;
