// src/error.rs

//! Unified error handling for the crawl engine.

use std::fmt;

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Structuring service error
    #[error("Structuring service error: {0}")]
    Service(String),

    /// Page fetch failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Record extraction failed
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a structuring service error.
    pub fn service(message: impl fmt::Display) -> Self {
        Self::Service(message.to_string())
    }
}

/// A classified failure while fetching a page.
///
/// Carries the URL that failed so the failure can be reported in the
/// crawl summary with its originating context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request timed out
    #[error("timeout fetching {url}")]
    Timeout { url: String },

    /// The site refused the request (denial status or anti-bot challenge)
    #[error("blocked at {url}: {detail}")]
    Blocked { url: String, detail: String },

    /// The page does not exist
    #[error("not found: {url}")]
    NotFound { url: String },

    /// The listing container never appeared in the delivered page
    #[error("render timeout at {url} waiting for '{selector}'")]
    RenderTimeout { url: String, selector: String },

    /// Detail-page navigation failed mid-pagination
    #[error("navigation lost at {url}: {message}")]
    NavigationLost { url: String, message: String },

    /// Any other transport-level failure
    #[error("network error at {url}: {message}")]
    Network { url: String, message: String },
}

impl FetchError {
    /// The URL whose fetch failed.
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url }
            | Self::Blocked { url, .. }
            | Self::NotFound { url }
            | Self::RenderTimeout { url, .. }
            | Self::NavigationLost { url, .. }
            | Self::Network { url, .. } => url,
        }
    }

    /// Whether this failure is a block signal (continuing worsens it).
    pub fn is_block(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }
}

/// A classified failure while extracting a record from a page.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The structuring service returned an unparseable response
    #[error("malformed extraction response: {message}")]
    Malformed { message: String },

    /// The page produced no candidate records
    #[error("empty extraction result")]
    Empty,

    /// A candidate record lacks a field required for acceptance
    #[error("record {index} missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_url() {
        let err = FetchError::Timeout {
            url: "https://example.com/jobs".into(),
        };
        assert_eq!(err.url(), "https://example.com/jobs");

        let err = FetchError::Blocked {
            url: "https://example.com".into(),
            detail: "HTTP 403".into(),
        };
        assert!(err.is_block());
        assert_eq!(err.url(), "https://example.com");
    }

    #[test]
    fn test_error_display() {
        let err = ExtractError::MissingField {
            index: 3,
            field: "title",
        };
        assert_eq!(err.to_string(), "record 3 missing required field 'title'");
    }
}
