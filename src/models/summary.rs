// src/models/summary.rs

//! Crawl outcome reporting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::JobPost;

/// Why a crawl stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalReason {
    /// The requested quota was filled
    Success,
    /// The site ran out of pages or records
    Exhausted,
    /// A terminal failure ended the crawl early
    Aborted,
}

/// One skipped page or record, with the context that was skipped and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipNote {
    /// Page number the skip happened on
    pub page: u32,

    /// What was skipped (a URL, or a record position on the page)
    pub context: String,

    /// Classified reason
    pub reason: String,
}

impl SkipNote {
    pub fn new(page: u32, context: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self {
            page,
            context: context.into(),
            reason: reason.to_string(),
        }
    }
}

/// Summary of one crawl run.
///
/// Per-record and per-page failures surface here rather than as raised
/// errors: the caller always gets a result set plus a reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSummary {
    /// Site key the crawl ran against
    pub site: String,

    /// Pages the controller advanced through (including skipped ones)
    pub pages_visited: u32,

    /// Candidate records seen before dedup/quota
    pub records_seen: usize,

    /// Offers rejected because the identifier was already accepted
    pub duplicates_rejected: usize,

    /// Detail-page navigations that were retried
    pub nav_retries: u32,

    /// Everything that was skipped, and why
    pub skipped: Vec<SkipNote>,

    /// Why the crawl stopped
    pub terminal: TerminalReason,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Final output of a crawl: postings in discovery order plus the summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlReport {
    pub jobs: Vec<JobPost>,
    pub summary: CrawlSummary,
}

impl CrawlReport {
    /// Number of postings returned.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether the crawl returned nothing.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
