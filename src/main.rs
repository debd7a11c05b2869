//! materials-scraper - Config-driven building-material catalogue scraper
//!
//! Scrapes supplier sites into JSON/CSV and serves the latest snapshot.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use materials_scraper::api::{build_app, AppState};
use materials_scraper::commands::{ScrapeCommand, SitesCommand};
use materials_scraper::config::Config;
use materials_scraper::output::OutputWriter;
use materials_scraper::site::SiteCatalog;
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "materials-scraper",
    version,
    about = "Config-driven building-material catalogue scraper",
    long_about = "Scrapes supplier product listings described in a TOML site catalogue, exports them to JSON and CSV, and serves the latest snapshot over HTTP."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Site catalogue (TOML)
    #[arg(long, global = true, env = "MATERIALS_SITES")]
    sites: Option<PathBuf>,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "MATERIALS_PROXY")]
    proxy: Option<String>,

    /// Delay between static page fetches in milliseconds
    #[arg(long, global = true)]
    delay: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the configured sites and export the results
    #[command(alias = "s")]
    Scrape {
        /// Only scrape this site key
        #[arg(long)]
        site: Option<String>,

        /// Render every site in the headless browser
        #[arg(long)]
        dynamic: bool,

        /// Output directory
        #[arg(short, long, env = "MATERIALS_OUT")]
        out: Option<PathBuf>,
    },

    /// Serve the latest snapshot over HTTP
    Serve {
        /// Listen address
        #[arg(short, long)]
        bind: Option<String>,

        /// Output directory holding the snapshot
        #[arg(short, long, env = "MATERIALS_OUT")]
        out: Option<PathBuf>,
    },

    /// List configured sites and categories
    Sites,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(sites) = cli.sites {
        config.sites_file = sites;
    }
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }
    if let Some(delay) = cli.delay {
        config.delay_ms = delay;
    }

    match cli.command {
        Commands::Scrape { site, dynamic, out } => {
            if let Some(out) = out {
                config.output_dir = out;
            }

            let catalog = SiteCatalog::from_file(&config.sites_file)?;
            let writer = OutputWriter::new(&config.output_dir, &config.basename);

            let cmd = ScrapeCommand::new(config, catalog);
            let report = cmd.execute(site.as_deref(), dynamic).await;

            if !report.failures.is_empty() {
                warn!("{} categories failed", report.failures.len());
            }

            let paths = writer.write(&report.records, chrono::Utc::now())?;
            println!("Wrote:");
            println!("  json: {}", paths.json.display());
            println!("  json_versioned: {}", paths.json_versioned.display());
            if let Some(csv) = &paths.csv {
                println!("  csv: {}", csv.display());
            }
        }

        Commands::Serve { bind, out } => {
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            if let Some(out) = out {
                config.output_dir = out;
            }

            let app = build_app(AppState::new(config.snapshot_path()));
            let listener = tokio::net::TcpListener::bind(&config.bind_addr)
                .await
                .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

            info!("Serving {} on {}", config.snapshot_path().display(), config.bind_addr);
            axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
        }

        Commands::Sites => {
            let catalog = SiteCatalog::from_file(&config.sites_file)?;
            println!("{}", SitesCommand::new(&catalog).execute());
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("received shutdown signal, starting graceful shutdown");
}
