// src/testing/mod.rs

//! Scripted fakes for exercising the engine without a network.
//!
//! These are useful for testing applications built on the engine as
//! well as the engine's own behavior: outcomes are queued per URL so a
//! fetch can fail first and succeed on retry, and every call is
//! recorded for assertions.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{AppError, FetchError, Result};
use crate::extract::{StructuredListing, StructuringService};
use crate::fetch::{PageContent, PageFetcher, PageRequest};
use crate::models::{CrawlSummary, SkipNote};

/// Build a [`PageContent`] for a test page.
///
/// # Panics
/// Panics on an unparseable URL; test URLs are literals.
pub fn page(url: &str, body: &str) -> PageContent {
    PageContent::from_parts(url, body).expect("test URL must parse")
}

type FetchOutcome = std::result::Result<PageContent, FetchError>;

/// A fetcher that plays back scripted outcomes.
///
/// Each URL holds a queue of outcomes consumed in order; the last
/// outcome repeats once the queue is down to one entry, so re-fetching
/// a listing view behaves like a real site. Unknown URLs yield
/// not-found. Clones share state.
#[derive(Clone, Default)]
pub struct ScriptedFetcher {
    outcomes: Arc<Mutex<HashMap<String, VecDeque<FetchOutcome>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedFetcher {
    /// Create an empty fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful page for a URL.
    pub fn with_page(self, url: &str, body: &str) -> Self {
        self.with_outcome(url, Ok(page(url, body)))
    }

    /// Queue an arbitrary outcome for a URL.
    pub fn with_outcome(self, url: &str, outcome: FetchOutcome) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(outcome);
        self
    }

    /// URLs fetched so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, request: &PageRequest) -> FetchOutcome {
        self.calls.lock().unwrap().push(request.url.clone());

        let mut outcomes = self.outcomes.lock().unwrap();
        match outcomes.get_mut(&request.url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if queue.len() == 1 => queue.front().unwrap().clone(),
            _ => Err(FetchError::NotFound {
                url: request.url.clone(),
            }),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// A structuring service that returns a fixed response.
#[derive(Clone, Default)]
pub struct StaticStructuring {
    listings: Vec<StructuredListing>,
    fail: bool,
    calls: Arc<Mutex<usize>>,
}

impl StaticStructuring {
    /// A service that always returns these listings.
    pub fn with_listings(listings: Vec<StructuredListing>) -> Self {
        Self {
            listings,
            fail: false,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// A service that always fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Number of structure calls made.
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl StructuringService for StaticStructuring {
    async fn structure(&self, _page_text: &str) -> Result<Vec<StructuredListing>> {
        *self.calls.lock().unwrap() += 1;
        if self.fail {
            Err(AppError::service("scripted failure"))
        } else {
            Ok(self.listings.clone())
        }
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// An observer that records everything it sees.
#[derive(Clone, Default)]
pub struct CollectingObserver {
    pages: Arc<Mutex<Vec<(u32, usize)>>>,
    skips: Arc<Mutex<Vec<SkipNote>>>,
    summaries: Arc<Mutex<Vec<CrawlSummary>>>,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// (page, collected) pairs observed so far.
    pub fn pages(&self) -> Vec<(u32, usize)> {
        self.pages.lock().unwrap().clone()
    }

    /// Skip notes observed so far.
    pub fn skips(&self) -> Vec<SkipNote> {
        self.skips.lock().unwrap().clone()
    }

    /// Final summaries observed so far.
    pub fn summaries(&self) -> Vec<CrawlSummary> {
        self.summaries.lock().unwrap().clone()
    }
}

impl crate::engine::ProgressObserver for CollectingObserver {
    fn on_page(&self, _site: &str, page: u32, collected: usize) {
        self.pages.lock().unwrap().push((page, collected));
    }

    fn on_skip(&self, _site: &str, note: &SkipNote) {
        self.skips.lock().unwrap().push(note.clone());
    }

    fn on_finish(&self, summary: &CrawlSummary) {
        self.summaries.lock().unwrap().push(summary.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_fetcher_sequences_outcomes() {
        let fetcher = ScriptedFetcher::new()
            .with_outcome(
                "https://example.com/a",
                Err(FetchError::Timeout {
                    url: "https://example.com/a".into(),
                }),
            )
            .with_page("https://example.com/a", "<html>ok</html>");

        let request = PageRequest::new("https://example.com/a");
        assert!(fetcher.fetch(&request).await.is_err());
        assert!(fetcher.fetch(&request).await.is_ok());
        // The last outcome repeats
        assert!(fetcher.fetch(&request).await.is_ok());
        assert_eq!(fetcher.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_scripted_fetcher_unknown_url_is_not_found() {
        let fetcher = ScriptedFetcher::new();
        let outcome = fetcher
            .fetch(&PageRequest::new("https://example.com/missing"))
            .await;
        assert!(matches!(outcome, Err(FetchError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_static_structuring_counts_calls() {
        let service = StaticStructuring::with_listings(vec![StructuredListing::default()]);
        service.structure("text").await.unwrap();
        service.structure("text").await.unwrap();
        assert_eq!(service.call_count(), 2);

        assert!(StaticStructuring::failing().structure("x").await.is_err());
    }
}
