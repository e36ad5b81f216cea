// src/models/config.rs

//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::SiteProfile;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP fetcher settings
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Inter-request pacing settings
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Failure recovery settings
    #[serde(default)]
    pub recovery: RecoveryConfig,

    /// Site profile definitions
    #[serde(default)]
    pub profiles: Vec<SiteProfile>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Look up a site profile by key.
    pub fn profile(&self, key: &str) -> Option<&SiteProfile> {
        self.profiles.iter().find(|p| p.key == key)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetcher.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetcher.user_agent is empty"));
        }
        if self.fetcher.timeout_secs == 0 {
            return Err(AppError::validation("fetcher.timeout_secs must be > 0"));
        }
        if self.recovery.block_threshold == 0 {
            return Err(AppError::validation("recovery.block_threshold must be > 0"));
        }
        if self.recovery.empty_page_limit == 0 {
            return Err(AppError::validation(
                "recovery.empty_page_limit must be > 0",
            ));
        }
        for profile in &self.profiles {
            profile.validate()?;
        }
        let mut keys: Vec<&str> = self.profiles.iter().map(|p| p.key.as_str()).collect();
        keys.sort_unstable();
        keys.dedup();
        if keys.len() != self.profiles.len() {
            return Err(AppError::validation("duplicate profile keys"));
        }
        Ok(())
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Accept-Language header for HTTP requests
    #[serde(default = "defaults::accept_language")]
    pub accept_language: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            accept_language: defaults::accept_language(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Inter-request pacing settings.
///
/// Each wait draws uniformly from `[base_delay, base_delay + jitter_band]`
/// and adds a capped exponential backoff term while failures accumulate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Minimum delay between requests in milliseconds
    #[serde(default = "defaults::base_delay")]
    pub base_delay_ms: u64,

    /// Width of the random jitter band in milliseconds
    #[serde(default = "defaults::jitter_band")]
    pub jitter_band_ms: u64,

    /// First backoff step in milliseconds
    #[serde(default = "defaults::backoff_base")]
    pub backoff_base_ms: u64,

    /// Upper bound for the backoff term in milliseconds
    #[serde(default = "defaults::backoff_cap")]
    pub backoff_cap_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: defaults::base_delay(),
            jitter_band_ms: defaults::jitter_band(),
            backoff_base_ms: defaults::backoff_base(),
            backoff_cap_ms: defaults::backoff_cap(),
        }
    }
}

impl PacingConfig {
    /// A configuration with no waiting at all, for tests.
    pub fn immediate() -> Self {
        Self {
            base_delay_ms: 0,
            jitter_band_ms: 0,
            backoff_base_ms: 0,
            backoff_cap_ms: 0,
        }
    }
}

/// Failure recovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Consecutive block signals tolerated before aborting the crawl
    #[serde(default = "defaults::block_threshold")]
    pub block_threshold: u32,

    /// Retries for a page whose fetch failed transiently
    #[serde(default = "defaults::page_retry_limit")]
    pub page_retry_limit: u32,

    /// Retries for a detail-page navigation
    #[serde(default = "defaults::nav_retry_limit")]
    pub nav_retry_limit: u32,

    /// Consecutive structurally-empty pages tolerated before stopping
    #[serde(default = "defaults::empty_page_limit")]
    pub empty_page_limit: u32,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            block_threshold: defaults::block_threshold(),
            page_retry_limit: defaults::page_retry_limit(),
            nav_retry_limit: defaults::nav_retry_limit(),
            empty_page_limit: defaults::empty_page_limit(),
        }
    }
}

mod defaults {
    // Fetcher defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
            .into()
    }
    pub fn accept_language() -> String {
        "en-US,en;q=0.9".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Pacing defaults
    pub fn base_delay() -> u64 {
        2_000
    }
    pub fn jitter_band() -> u64 {
        3_000
    }
    pub fn backoff_base() -> u64 {
        1_000
    }
    pub fn backoff_cap() -> u64 {
        60_000
    }

    // Recovery defaults
    pub fn block_threshold() -> u32 {
        3
    }
    pub fn page_retry_limit() -> u32 {
        1
    }
    pub fn nav_retry_limit() -> u32 {
        2
    }
    pub fn empty_page_limit() -> u32 {
        1
    }
}
