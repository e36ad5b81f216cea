// src/lib.rs

//! jobcrawl — a paginated, rate-limited crawl engine for job-listing
//! sites.
//!
//! The engine drives a fetch/extract/aggregate loop against one site
//! described by a data-driven profile, tolerating per-page and
//! per-record failures, pacing its requests, and stopping once the
//! requested quota is met or the site is exhausted.

pub mod engine;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod models;
pub mod testing;
pub mod utils;

pub use engine::{CrawlEngine, LogObserver, NullObserver, ProgressObserver};
pub use error::{AppError, ExtractError, FetchError, Result};
pub use extract::{DelegatedExtractor, ExtractionPipeline, SelectorExtractor};
pub use fetch::{HttpFetcher, PageContent, PageFetcher, PageRequest};
pub use models::{
    BackendKind, Config, CrawlReport, CrawlRequest, CrawlSummary, JobPost, JobSelectors,
    RawRecord, SiteProfile, TerminalReason,
};
