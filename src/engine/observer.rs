// src/engine/observer.rs

//! Progress observation.
//!
//! Observers are fire-and-forget: the controller never blocks on them
//! and they cannot influence the crawl.

use crate::models::{CrawlSummary, SkipNote};

/// Receives progress observations from a running crawl.
pub trait ProgressObserver: Send + Sync {
    /// A page finished processing.
    fn on_page(&self, site: &str, page: u32, collected: usize) {
        let _ = (site, page, collected);
    }

    /// Something was skipped.
    fn on_skip(&self, site: &str, note: &SkipNote) {
        let _ = (site, note);
    }

    /// The crawl finished.
    fn on_finish(&self, summary: &CrawlSummary) {
        let _ = summary;
    }
}

/// Observer that writes progress to the log.
pub struct LogObserver;

impl ProgressObserver for LogObserver {
    fn on_page(&self, site: &str, page: u32, collected: usize) {
        log::info!("[{}] page {}: {} collected", site, page, collected);
    }

    fn on_skip(&self, site: &str, note: &SkipNote) {
        log::warn!(
            "[{}] skipped on page {}: {} ({})",
            site,
            note.page,
            note.context,
            note.reason
        );
    }

    fn on_finish(&self, summary: &CrawlSummary) {
        log::info!(
            "[{}] done: {} pages, {} records seen, {} duplicates, terminal {:?}",
            summary.site,
            summary.pages_visited,
            summary.records_seen,
            summary.duplicates_rejected,
            summary.terminal
        );
    }
}

/// Observer that discards everything.
pub struct NullObserver;

impl ProgressObserver for NullObserver {}
