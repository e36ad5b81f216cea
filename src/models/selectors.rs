// src/models/selectors.rs

//! CSS selectors for scraping a job listing page.

use serde::{Deserialize, Serialize};

/// CSS selectors for scraping a job listing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSelectors {
    /// Selector for each job card/row in the listing
    pub row: String,

    /// Selector for the title element within a row
    pub title: String,

    /// Optional selector for the link element (if different from title)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    /// HTML attribute name for extracting links (usually "href")
    #[serde(default = "default_link_attr")]
    pub link_attr: String,

    /// Selector for the company element within a row
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    /// Selector for the location element within a row
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

fn default_link_attr() -> String {
    "href".to_string()
}

impl Default for JobSelectors {
    fn default() -> Self {
        Self {
            row: "article.job-card".to_string(),
            title: "a".to_string(),
            link: None,
            link_attr: default_link_attr(),
            company: None,
            location: None,
        }
    }
}

impl JobSelectors {
    /// Create selectors for a common card-based listing layout.
    pub fn from_pattern(
        row: impl Into<String>,
        title: impl Into<String>,
        company: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            row: row.into(),
            title: title.into(),
            link: None,
            link_attr: default_link_attr(),
            company: Some(company.into()),
            location: Some(location.into()),
        }
    }
}
