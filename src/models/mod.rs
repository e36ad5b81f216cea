// src/models/mod.rs

//! Domain models for the crawl engine.
//!
//! This module contains all data structures used throughout the engine,
//! organized by their primary purpose.

mod config;
mod job;
mod profile;
mod raw;
mod request;
mod selectors;
mod summary;

// Re-export all public types
pub use config::{Config, FetcherConfig, PacingConfig, RecoveryConfig};
pub use job::{Compensation, Country, JobPost, Location, PayInterval};
pub use profile::{QueryEncoding, SiteProfile};
pub use raw::RawRecord;
pub use request::{BackendKind, CrawlRequest, DEFAULT_RESULTS_WANTED};
pub use selectors::JobSelectors;
pub use summary::{CrawlReport, CrawlSummary, SkipNote, TerminalReason};
