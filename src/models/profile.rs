// src/models/profile.rs

//! Site profile: everything the engine needs to know about one target.
//!
//! A profile is data, not code — URL template, selector map, pagination
//! behavior. The engine is parameterized by a profile instead of carrying
//! one module per site.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::fetch::Interaction;
use crate::models::{BackendKind, JobSelectors};

/// How spaces in the search term are encoded into the URL template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryEncoding {
    /// spaces become "-"
    Dash,
    /// spaces become "+"
    #[default]
    Plus,
    /// spaces become "%20"
    Percent,
}

impl QueryEncoding {
    /// Encode a free-text search term for URL substitution.
    pub fn encode(&self, term: &str) -> String {
        let joiner = match self {
            Self::Dash => "-",
            Self::Plus => "+",
            Self::Percent => "%20",
        };
        term.split_whitespace().collect::<Vec<_>>().join(joiner)
    }
}

/// Declarative description of one job-listing site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteProfile {
    /// Unique site key, used as the identifier prefix (e.g. "professionhu")
    pub key: String,

    /// Base URL of the site
    pub base_url: String,

    /// Listing URL template. Placeholders: `{query}`, `{page}`, `{location}`.
    /// A template without `{page}` describes a single-page site.
    pub search_url: String,

    /// Search term encoding for the template
    #[serde(default)]
    pub query_encoding: QueryEncoding,

    /// Default country (name or alpha-2 code) for postings on this site
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    /// Selector map for the listing page
    #[serde(default)]
    pub selectors: JobSelectors,

    /// Selector the listing container must satisfy before extraction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_for: Option<String>,

    /// Interaction steps for rendering backends (consent dialogs etc.)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interactions: Vec<Interaction>,

    /// Selector whose text holds the maximum page number, read off page 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_page_selector: Option<String>,

    /// Hard cap on page numbers, when the site is known to clamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,

    /// Selector for the description on the detail page; setting this makes
    /// the engine follow each posting's link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_selector: Option<String>,

    /// Drop the query string when canonicalizing detail URLs (for sites
    /// that append volatile search identifiers)
    #[serde(default)]
    pub strip_query: bool,

    /// Preferred fetch backend for this site
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendKind>,
}

impl SiteProfile {
    /// Create a minimal profile. Selectors default to a generic card layout.
    pub fn new(
        key: impl Into<String>,
        base_url: impl Into<String>,
        search_url: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            base_url: base_url.into(),
            search_url: search_url.into(),
            query_encoding: QueryEncoding::default(),
            country: None,
            selectors: JobSelectors::default(),
            wait_for: None,
            interactions: Vec::new(),
            max_page_selector: None,
            max_pages: None,
            description_selector: None,
            strip_query: false,
            backend: None,
        }
    }

    /// Set the selector map.
    pub fn with_selectors(mut self, selectors: JobSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    /// Set the default country.
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Set the detail-page description selector.
    pub fn with_description_selector(mut self, selector: impl Into<String>) -> Self {
        self.description_selector = Some(selector.into());
        self
    }

    /// Set the maximum page number selector.
    pub fn with_max_page_selector(mut self, selector: impl Into<String>) -> Self {
        self.max_page_selector = Some(selector.into());
        self
    }

    /// Build the listing URL for a page number.
    pub fn page_url(&self, term: &str, location: Option<&str>, page: u32) -> String {
        let query = self.query_encoding.encode(term);
        let location = location
            .map(|l| self.query_encoding.encode(l))
            .unwrap_or_default();
        self.search_url
            .replace("{query}", &query)
            .replace("{location}", &location)
            .replace("{page}", &page.to_string())
    }

    /// Whether the search URL template paginates at all.
    pub fn is_paginated(&self) -> bool {
        self.search_url.contains("{page}")
    }

    /// Validate the profile for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.key.trim().is_empty() {
            return Err(AppError::validation("profile key is empty"));
        }
        url::Url::parse(&self.base_url)
            .map_err(|e| AppError::validation(format!("profile '{}': bad base_url: {e}", self.key)))?;
        if !self.search_url.contains("{query}") {
            return Err(AppError::validation(format!(
                "profile '{}': search_url has no {{query}} placeholder",
                self.key
            )));
        }
        if let Some(max) = self.max_pages {
            if max == 0 {
                return Err(AppError::validation(format!(
                    "profile '{}': max_pages must be > 0",
                    self.key
                )));
            }
        }
        Ok(())
    }
}
