//! jobcrawl CLI
//!
//! Local execution entry point: crawl one site or all configured sites
//! and print the reports as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use futures::stream::{self, StreamExt};
use jobcrawl::{
    engine::CrawlEngine,
    error::{AppError, Result},
    extract::{DelegatedExtractor, ExtractionPipeline, HttpStructuringClient, SelectorExtractor},
    fetch::HttpFetcher,
    models::{BackendKind, Config, CrawlReport, CrawlRequest, SiteProfile},
};

/// jobcrawl - Job Listing Crawler
#[derive(Parser, Debug)]
#[command(name = "jobcrawl", version, about = "Job listing crawl engine")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl one configured site, or all of them
    Crawl {
        /// Site profile key (omit with --all)
        #[arg(long, conflicts_with = "all")]
        site: Option<String>,

        /// Crawl every configured site
        #[arg(long)]
        all: bool,

        /// Search term
        #[arg(long)]
        query: String,

        /// Result quota per site
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Optional location filter
        #[arg(long)]
        location: Option<String>,

        /// Concurrent crawls when using --all
        #[arg(long, default_value_t = 3)]
        concurrency: usize,

        /// Delegate extraction to a structuring endpoint instead of
        /// using the profile's selectors
        #[arg(long)]
        delegated_endpoint: Option<String>,
    },

    /// List configured site profiles
    Profiles,

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Build the extraction strategy for one profile.
fn build_extractor(
    profile: &SiteProfile,
    delegated_endpoint: Option<&str>,
) -> Result<Arc<dyn ExtractionPipeline>> {
    if let Some(endpoint) = delegated_endpoint {
        let mut client = HttpStructuringClient::new(endpoint);
        if let Ok(key) = std::env::var("JOBCRAWL_STRUCTURING_KEY") {
            client = client.with_api_key(key);
        }
        Ok(Arc::new(DelegatedExtractor::new(Arc::new(client))))
    } else {
        Ok(Arc::new(SelectorExtractor::for_profile(profile)?))
    }
}

/// Crawl a single profile and return its report.
async fn crawl_profile(
    config: &Config,
    profile: SiteProfile,
    request: &CrawlRequest,
    delegated_endpoint: Option<&str>,
) -> Result<CrawlReport> {
    if matches!(profile.backend, Some(BackendKind::Rendering)) {
        log::warn!(
            "[{}] profile prefers a rendering backend; falling back to HTTP",
            profile.key
        );
    }

    let fetcher = Arc::new(HttpFetcher::new(&config.fetcher)?);
    let extractor = build_extractor(&profile, delegated_endpoint)?;
    let engine = CrawlEngine::new(profile, fetcher, extractor, config)?;

    Ok(engine.run(request).await)
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);

    match cli.command {
        Command::Crawl {
            site,
            all,
            query,
            limit,
            location,
            concurrency,
            delegated_endpoint,
        } => {
            config.validate()?;

            let mut request = CrawlRequest::new(query).with_results_wanted(limit);
            if let Some(location) = location {
                request = request.with_location(location);
            }

            let profiles: Vec<SiteProfile> = if all {
                config.profiles.clone()
            } else {
                let key = site
                    .ok_or_else(|| AppError::config("pass --site <key> or --all"))?;
                let profile = config
                    .profile(&key)
                    .ok_or_else(|| AppError::config(format!("unknown site profile '{key}'")))?;
                vec![profile.clone()]
            };

            if profiles.is_empty() {
                return Err(AppError::config("no site profiles configured"));
            }

            // Crawls are independent; run them concurrently, each one
            // still strictly sequential internally.
            let reports: Vec<CrawlReport> = stream::iter(profiles)
                .map(|profile| {
                    let config = &config;
                    let request = &request;
                    let endpoint = delegated_endpoint.as_deref();
                    async move {
                        let key = profile.key.clone();
                        match crawl_profile(config, profile, request, endpoint).await {
                            Ok(report) => Some(report),
                            Err(error) => {
                                log::error!("[{}] crawl failed to start: {}", key, error);
                                None
                            }
                        }
                    }
                })
                .buffer_unordered(concurrency.max(1))
                .filter_map(|report| async move { report })
                .collect()
                .await;

            println!("{}", serde_json::to_string_pretty(&reports)?);

            let total: usize = reports.iter().map(CrawlReport::len).sum();
            log::info!("Collected {} postings across {} site(s)", total, reports.len());
        }

        Command::Profiles => {
            if config.profiles.is_empty() {
                log::warn!("No site profiles configured in {}", cli.config.display());
            }
            for profile in &config.profiles {
                println!(
                    "{:<16} {} ({})",
                    profile.key,
                    profile.base_url,
                    if profile.is_paginated() {
                        "paginated"
                    } else {
                        "single page"
                    }
                );
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!(
                "Config OK ({} profile(s), pacing base {}ms)",
                config.profiles.len(),
                config.pacing.base_delay_ms
            );
        }
    }

    Ok(())
}
