// src/fetch/mod.rs

//! Page fetching abstraction.
//!
//! A [`PageFetcher`] retrieves the content of one URL and reports
//! success or a classified failure. Two backends satisfy the contract:
//! a plain HTTP backend ([`HttpFetcher`], this crate) and a rendering
//! backend that drives a scriptable browser (external; it honors the
//! request's wait-for selector and interaction steps).

use async_trait::async_trait;
use scraper::Html;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::FetchError;
use crate::models::SiteProfile;

pub mod http;

pub use http::HttpFetcher;

/// A declarative interaction step for rendering backends.
///
/// Site profiles use these to dismiss consent dialogs and similar
/// overlays before extraction. HTTP backends ignore them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Interaction {
    /// Click the first element matching the selector
    Click { selector: String },
    /// Fill the first element matching the selector with a value
    Fill { selector: String, value: String },
}

/// Everything a fetch backend needs to load one page.
#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    /// URL to load
    pub url: String,

    /// Selector the listing container must satisfy before the page
    /// counts as delivered
    pub wait_for: Option<String>,

    /// Interaction steps to run after load (rendering backends only)
    pub interactions: Vec<Interaction>,
}

impl PageRequest {
    /// Create a bare request for a URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            wait_for: None,
            interactions: Vec::new(),
        }
    }

    /// Create a request carrying a profile's readiness and interaction
    /// settings.
    pub fn for_profile(profile: &SiteProfile, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            wait_for: profile.wait_for.clone(),
            interactions: profile.interactions.clone(),
        }
    }
}

/// The content of a successfully fetched page.
///
/// Owned by the fetch step that produced it and discarded after
/// extraction. Parsing is deliberately synchronous and on demand so the
/// parsed document is never held across a suspension point.
#[derive(Debug, Clone)]
pub struct PageContent {
    url: Url,
    body: String,
}

impl PageContent {
    /// Wrap a fetched body with the URL that was actually loaded.
    pub fn new(url: Url, body: impl Into<String>) -> Self {
        Self {
            url,
            body: body.into(),
        }
    }

    /// Build from a URL string; fails on an unparseable URL.
    pub fn from_parts(url: &str, body: impl Into<String>) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(url)?, body))
    }

    /// The URL that was actually loaded (after redirects).
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The raw markup.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Parse the body as an HTML document for selector queries.
    pub fn html(&self) -> Html {
        Html::parse_document(&self.body)
    }

    /// The page's visible text, for delegated extraction.
    pub fn visible_text(&self) -> String {
        let document = self.html();
        let text: Vec<&str> = document
            .root_element()
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();
        text.join("\n")
    }
}

/// Opaque capability that retrieves the content of a URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Load one page, or report a classified failure.
    async fn fetch(&self, request: &PageRequest) -> Result<PageContent, FetchError>;

    /// Backend name for logging.
    fn name(&self) -> &str {
        "fetcher"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_content_visible_text() {
        let page = PageContent::from_parts(
            "https://example.com",
            "<html><body><h1>Jobs</h1><script>var x = 1;</script><p>Rust   dev</p></body></html>",
        )
        .unwrap();

        let text = page.visible_text();
        assert!(text.contains("Jobs"));
        assert!(text.contains("Rust   dev"));
    }

    #[test]
    fn test_page_request_for_profile() {
        let mut profile = SiteProfile::new(
            "testsite",
            "https://example.com",
            "https://example.com/{query}/{page}",
        );
        profile.wait_for = Some(".job-card".to_string());
        profile.interactions = vec![Interaction::Click {
            selector: ".cookie-accept".to_string(),
        }];

        let request = PageRequest::for_profile(&profile, "https://example.com/rust/1");
        assert_eq!(request.wait_for.as_deref(), Some(".job-card"));
        assert_eq!(request.interactions.len(), 1);
    }

    #[test]
    fn test_interaction_serde() {
        let toml_src = r#"
            action = "fill"
            selector = "input.search"
            value = "rust"
        "#;
        let interaction: Interaction = toml::from_str(toml_src).unwrap();
        assert_eq!(
            interaction,
            Interaction::Fill {
                selector: "input.search".to_string(),
                value: "rust".to_string()
            }
        );
    }
}
