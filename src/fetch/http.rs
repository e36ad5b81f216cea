// src/fetch/http.rs

//! Plain HTTP fetch backend.
//!
//! Issues requests with browser-like headers and classifies failures
//! into the fetch taxonomy. Suitable for sites that deliver their
//! listings in the initial response; JavaScript-heavy sites need a
//! rendering backend instead.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use scraper::{Html, Selector};

use crate::error::{FetchError, Result};
use crate::fetch::{PageContent, PageFetcher, PageRequest};
use crate::models::FetcherConfig;

/// Body fragments that indicate an anti-bot challenge rather than a
/// listing page.
const CHALLENGE_MARKERS: &[&str] = &[
    "captcha",
    "are you a robot",
    "access denied",
    "unusual traffic",
    "cf-chl",
    "challenge-platform",
];

/// HTTP backend over a shared reqwest client.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher from configuration.
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        if let Ok(value) = HeaderValue::from_str(&config.accept_language) {
            headers.insert(ACCEPT_LANGUAGE, value);
        }

        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }

    fn classify_status(url: &str, status: StatusCode) -> Option<FetchError> {
        match status {
            StatusCode::NOT_FOUND | StatusCode::GONE => Some(FetchError::NotFound {
                url: url.to_string(),
            }),
            StatusCode::FORBIDDEN
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::SERVICE_UNAVAILABLE => Some(FetchError::Blocked {
                url: url.to_string(),
                detail: format!("HTTP {}", status.as_u16()),
            }),
            s if !s.is_success() => Some(FetchError::Network {
                url: url.to_string(),
                message: format!("HTTP {}", s.as_u16()),
            }),
            _ => None,
        }
    }

    fn classify_transport(url: &str, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Network {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }

    fn looks_blocked(body: &str) -> bool {
        let lower = body.to_lowercase();
        CHALLENGE_MARKERS.iter().any(|marker| lower.contains(marker))
    }

    /// Check that the listing container the caller waits for is present.
    ///
    /// Without a browser there is nothing to actually wait on, but an
    /// absent container means the page did not deliver its listing and
    /// should be retried like a render timeout.
    fn check_wait_for(url: &str, body: &str, wait_for: &str) -> std::result::Result<(), FetchError> {
        let Ok(selector) = Selector::parse(wait_for) else {
            log::debug!("Ignoring unparseable wait_for selector '{}'", wait_for);
            return Ok(());
        };
        let document = Html::parse_document(body);
        if document.select(&selector).next().is_none() {
            return Err(FetchError::RenderTimeout {
                url: url.to_string(),
                selector: wait_for.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, request: &PageRequest) -> std::result::Result<PageContent, FetchError> {
        if !request.interactions.is_empty() {
            log::debug!(
                "HTTP backend ignoring {} interaction step(s) for {}",
                request.interactions.len(),
                request.url
            );
        }

        let response = self
            .client
            .get(&request.url)
            .send()
            .await
            .map_err(|e| Self::classify_transport(&request.url, e))?;

        if let Some(error) = Self::classify_status(&request.url, response.status()) {
            return Err(error);
        }

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| Self::classify_transport(&request.url, e))?;

        if Self::looks_blocked(&body) {
            return Err(FetchError::Blocked {
                url: request.url.clone(),
                detail: "anti-bot challenge text".to_string(),
            });
        }

        if let Some(wait_for) = &request.wait_for {
            Self::check_wait_for(&request.url, &body, wait_for)?;
        }

        log::debug!("Fetched {} ({} bytes)", final_url, body.len());
        Ok(PageContent::new(final_url, body))
    }

    fn name(&self) -> &str {
        "http"
    }
}
