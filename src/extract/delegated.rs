// src/extract/delegated.rs

//! Delegated extraction strategy.
//!
//! Hands whole-page text to an external structuring service and parses
//! its structured response. The service contract: given raw page text,
//! return a list of listings with fixed field names (title, link,
//! description, company, city, country, employment type, pay interval,
//! pay min/max, currency); unknown fields are null, never omitted or
//! fabricated. The service is invoked once per page, not per record.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ExtractError, Result};
use crate::extract::{ExtractionPipeline, PageExtraction, RecordFailure};
use crate::fetch::PageContent;
use crate::models::RawRecord;
use crate::utils::text::clean_opt;
use crate::utils::url::resolve;

/// One structured listing as returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredListing {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub pay_interval: Option<String>,
    #[serde(default)]
    pub pay_min: Option<f64>,
    #[serde(default)]
    pub pay_max: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Black-box structuring backend.
#[async_trait]
pub trait StructuringService: Send + Sync {
    /// Structure a page's text into listings.
    async fn structure(&self, page_text: &str) -> Result<Vec<StructuredListing>>;

    /// Service name for logging.
    fn name(&self) -> &str {
        "structuring"
    }
}

/// Response envelope from an HTTP structuring endpoint.
#[derive(Debug, Deserialize)]
struct StructureResponse {
    #[serde(default)]
    listings: Vec<StructuredListing>,
}

/// HTTP client for a structuring endpoint.
///
/// Posts `{"input": <page text>}` and expects `{"listings": [...]}` back,
/// with bearer authentication when a key is configured.
pub struct HttpStructuringClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpStructuringClient {
    /// Create a client for an endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: None,
        }
    }

    /// Set the bearer API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Use a pre-built HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl StructuringService for HttpStructuringClient {
    async fn structure(&self, page_text: &str) -> Result<Vec<StructuredListing>> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "input": page_text }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::service(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::service(format!("HTTP {}", status.as_u16())));
        }

        let parsed: StructureResponse = response
            .json()
            .await
            .map_err(|e| AppError::service(format!("bad response body: {e}")))?;

        Ok(parsed.listings)
    }

    fn name(&self) -> &str {
        "http-structuring"
    }
}

/// Extraction strategy that delegates to a structuring service.
pub struct DelegatedExtractor {
    service: Arc<dyn StructuringService>,
}

impl DelegatedExtractor {
    /// Create an extractor over a structuring service.
    pub fn new(service: Arc<dyn StructuringService>) -> Self {
        Self { service }
    }

    fn to_record(listing: StructuredListing, page: &PageContent) -> RawRecord {
        let url = clean_opt(listing.link).map(|link| resolve(page.url(), &link));
        RawRecord {
            title: clean_opt(listing.title),
            company: clean_opt(listing.company),
            location: clean_opt(listing.city),
            country: clean_opt(listing.country),
            url,
            description: clean_opt(listing.description),
            employment_type: clean_opt(listing.employment_type),
            pay_interval: clean_opt(listing.pay_interval),
            pay_min: listing.pay_min,
            pay_max: listing.pay_max,
            currency: clean_opt(listing.currency),
        }
    }
}

#[async_trait]
impl ExtractionPipeline for DelegatedExtractor {
    async fn extract(&self, page: &PageContent) -> PageExtraction {
        let text = page.visible_text();
        match self.service.structure(&text).await {
            Ok(listings) if listings.is_empty() => {
                log::debug!(
                    "Structuring service '{}' found nothing on {}",
                    self.service.name(),
                    page.url()
                );
                PageExtraction {
                    records: Vec::new(),
                    failures: vec![RecordFailure {
                        index: 0,
                        error: ExtractError::Empty,
                    }],
                }
            }
            Ok(listings) => {
                let records = listings
                    .into_iter()
                    .map(|listing| Self::to_record(listing, page))
                    .collect();
                PageExtraction {
                    records,
                    failures: Vec::new(),
                }
            }
            Err(error) => {
                // A malformed or failed response means zero records for
                // this page; the controller's empty-page policy decides
                // what happens next.
                log::warn!(
                    "Structuring service '{}' failed for {}: {}",
                    self.service.name(),
                    page.url(),
                    error
                );
                PageExtraction {
                    records: Vec::new(),
                    failures: vec![RecordFailure {
                        index: 0,
                        error: ExtractError::Malformed {
                            message: error.to_string(),
                        },
                    }],
                }
            }
        }
    }

    fn name(&self) -> &str {
        "delegated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticStructuring;

    fn listing(title: &str, link: &str) -> StructuredListing {
        StructuredListing {
            title: Some(title.to_string()),
            link: Some(link.to_string()),
            ..StructuredListing::default()
        }
    }

    fn page() -> PageContent {
        PageContent::from_parts(
            "https://example.com/search?q=rust",
            "<html><body>listing text</body></html>",
        )
        .unwrap()
    }

    #[test]
    fn test_listing_tolerates_omitted_fields() {
        // The contract says null-never-omitted, but the parser is
        // tolerant of sloppy services anyway.
        let parsed: StructuredListing =
            serde_json::from_str(r#"{"title": "Engineer", "link": "/job/1"}"#).unwrap();
        assert_eq!(parsed.title.as_deref(), Some("Engineer"));
        assert!(parsed.pay_min.is_none());

        let with_nulls: StructuredListing = serde_json::from_str(
            r#"{"title": "Engineer", "link": null, "company": null, "pay_min": null,
                "city": null, "country": null, "description": null,
                "employment_type": null, "pay_interval": null, "pay_max": null,
                "currency": null}"#,
        )
        .unwrap();
        assert!(with_nulls.link.is_none());
    }

    #[tokio::test]
    async fn test_one_service_call_per_page() {
        let service = Arc::new(StaticStructuring::with_listings(vec![
            listing("First", "https://example.com/job/1"),
            listing("Second", "/job/2"),
        ]));
        let extractor = DelegatedExtractor::new(service.clone());

        let extraction = extractor.extract(&page()).await;
        assert_eq!(service.call_count(), 1);
        assert_eq!(extraction.records.len(), 2);
        // Relative links are resolved against the page URL
        assert_eq!(
            extraction.records[1].url.as_deref(),
            Some("https://example.com/job/2")
        );
    }

    #[tokio::test]
    async fn test_empty_service_response_reported_not_fatal() {
        let extractor =
            DelegatedExtractor::new(Arc::new(StaticStructuring::with_listings(vec![])));

        let extraction = extractor.extract(&page()).await;
        assert!(extraction.is_empty());
        assert_eq!(extraction.failures.len(), 1);
        assert_eq!(extraction.failures[0].error, ExtractError::Empty);
    }

    #[tokio::test]
    async fn test_failed_service_yields_zero_records() {
        let extractor = DelegatedExtractor::new(Arc::new(StaticStructuring::failing()));

        let extraction = extractor.extract(&page()).await;
        assert!(extraction.is_empty());
        assert_eq!(extraction.failures.len(), 1);
        assert!(matches!(
            extraction.failures[0].error,
            ExtractError::Malformed { .. }
        ));
    }

    #[tokio::test]
    async fn test_structured_fields_carried_through() {
        let full = StructuredListing {
            title: Some("Rust Engineer".into()),
            link: Some("https://example.com/job/9".into()),
            description: Some("Write Rust".into()),
            company: Some("Acme".into()),
            city: Some("Zagreb".into()),
            country: Some("Croatia".into()),
            employment_type: Some("full-time".into()),
            pay_interval: Some("hourly".into()),
            pay_min: Some(40.0),
            pay_max: Some(70.0),
            currency: Some("EUR".into()),
        };
        let extractor =
            DelegatedExtractor::new(Arc::new(StaticStructuring::with_listings(vec![full])));

        let extraction = extractor.extract(&page()).await;
        let record = &extraction.records[0];
        assert_eq!(record.country.as_deref(), Some("Croatia"));
        assert_eq!(record.pay_max, Some(70.0));
        assert_eq!(record.currency.as_deref(), Some("EUR"));
    }
}
