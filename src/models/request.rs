// src/models/request.rs

//! Crawl request parameters.

use serde::{Deserialize, Serialize};

/// Result quota used when the caller does not specify one.
pub const DEFAULT_RESULTS_WANTED: usize = 10;

/// Which fetch backend a crawl should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Plain HTTP requests with browser-like headers
    Http,
    /// A scriptable browser session (external backend)
    Rendering,
}

/// Parameters for one crawl. Immutable for the crawl's duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlRequest {
    /// Free-text search term
    pub search_term: String,

    /// Target number of results
    #[serde(default = "default_results_wanted")]
    pub results_wanted: usize,

    /// Optional location hint, substituted into the site's URL template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Optional fetch backend preference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendKind>,
}

fn default_results_wanted() -> usize {
    DEFAULT_RESULTS_WANTED
}

impl CrawlRequest {
    /// Create a request for a search term with the default quota.
    pub fn new(search_term: impl Into<String>) -> Self {
        Self {
            search_term: search_term.into(),
            results_wanted: DEFAULT_RESULTS_WANTED,
            location: None,
            backend: None,
        }
    }

    /// Set the result quota. Clamped to at least one.
    pub fn with_results_wanted(mut self, wanted: usize) -> Self {
        self.results_wanted = wanted.max(1);
        self
    }

    /// Set the location hint.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the backend preference.
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = Some(backend);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_quota() {
        let request = CrawlRequest::new("rust engineer");
        assert_eq!(request.results_wanted, 10);
        assert!(request.location.is_none());
    }

    #[test]
    fn test_quota_clamped_to_positive() {
        let request = CrawlRequest::new("rust engineer").with_results_wanted(0);
        assert_eq!(request.results_wanted, 1);
    }

    #[test]
    fn test_deserialize_without_quota() {
        let request: CrawlRequest =
            serde_json::from_str(r#"{"search_term": "backend developer"}"#).unwrap();
        assert_eq!(request.results_wanted, 10);
    }
}
