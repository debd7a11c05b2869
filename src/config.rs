//! Run configuration with TOML, environment variables, and CLI overrides.

use crate::pagination::PolitenessDelay;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Site catalogue to scrape
    #[serde(default = "default_sites_file")]
    pub sites_file: PathBuf,

    /// Directory receiving the JSON/CSV exports
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// File stem of the exports (`{basename}.json`, `{basename}.csv`)
    #[serde(default = "default_basename")]
    pub basename: String,

    /// Base delay between static page fetches in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Random jitter applied to the delay (plus or minus this value)
    #[serde(default = "default_delay_jitter_ms")]
    pub delay_jitter_ms: u64,

    /// User agent for static fetches when the site sets none
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Proxy URL for static fetches (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Listen address of the read API
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_sites_file() -> PathBuf {
    PathBuf::from("config/sites.toml")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_basename() -> String {
    "materials".to_string()
}

fn default_delay_ms() -> u64 {
    1200
}

fn default_delay_jitter_ms() -> u64 {
    600
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_bind_addr() -> String {
    "127.0.0.1:8000".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sites_file: default_sites_file(),
            output_dir: default_output_dir(),
            basename: default_basename(),
            delay_ms: default_delay_ms(),
            delay_jitter_ms: default_delay_jitter_ms(),
            user_agent: None,
            proxy: None,
            timeout_secs: default_timeout_secs(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        let local_config = Path::new("materials-scraper.toml");
        if local_config.exists() {
            debug!("Found materials-scraper.toml in current directory");
            return Self::from_file(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("materials-scraper").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides; unparseable values are ignored.
    pub fn with_env(mut self) -> Self {
        if let Ok(sites) = std::env::var("MATERIALS_SITES") {
            self.sites_file = PathBuf::from(sites);
        }

        if let Ok(out) = std::env::var("MATERIALS_OUT") {
            self.output_dir = PathBuf::from(out);
        }

        if let Ok(proxy) = std::env::var("MATERIALS_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Ok(delay) = std::env::var("MATERIALS_DELAY") {
            if let Ok(d) = delay.parse() {
                self.delay_ms = d;
            }
        }

        self
    }

    /// Pause between static page fetches.
    pub fn politeness_delay(&self) -> PolitenessDelay {
        PolitenessDelay::from_millis(self.delay_ms, self.delay_jitter_ms)
    }

    /// Path of the current JSON snapshot.
    pub fn snapshot_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.json", self.basename))
    }
}
