// src/extract/selector.rs

//! Selector-based extraction strategy.
//!
//! Applies a site profile's selector map row by row. A row with a
//! missing title or link is reported and dropped; missing company or
//! location fields become placeholders at normalization instead of
//! aborting the record.

use async_trait::async_trait;
use scraper::{ElementRef, Selector};

use crate::error::{AppError, ExtractError, Result};
use crate::extract::{ExtractionPipeline, PageExtraction, RecordFailure};
use crate::fetch::PageContent;
use crate::models::{JobSelectors, RawRecord, SiteProfile};
use crate::utils::text::clean_field;
use crate::utils::url::resolve;

/// Deterministic extraction over a parsed selector map.
///
/// Selectors are parsed once at construction so a bad profile fails
/// fast; extraction itself never errors.
pub struct SelectorExtractor {
    row: Selector,
    title: Selector,
    link: Option<Selector>,
    link_attr: String,
    company: Option<Selector>,
    location: Option<Selector>,
}

impl SelectorExtractor {
    /// Build an extractor from a selector map.
    pub fn new(selectors: &JobSelectors) -> Result<Self> {
        Ok(Self {
            row: parse_selector(&selectors.row)?,
            title: parse_selector(&selectors.title)?,
            link: selectors
                .link
                .as_deref()
                .map(parse_selector)
                .transpose()?,
            link_attr: selectors.link_attr.clone(),
            company: selectors
                .company
                .as_deref()
                .map(parse_selector)
                .transpose()?,
            location: selectors
                .location
                .as_deref()
                .map(parse_selector)
                .transpose()?,
        })
    }

    /// Build an extractor for a site profile.
    pub fn for_profile(profile: &SiteProfile) -> Result<Self> {
        Self::new(&profile.selectors)
    }

    fn extract_rows(&self, page: &PageContent) -> PageExtraction {
        let document = page.html();
        let mut extraction = PageExtraction::empty();

        for (index, row) in document.select(&self.row).enumerate() {
            match self.extract_row(index, &row, page) {
                Ok(record) => extraction.records.push(record),
                Err(error) => extraction.failures.push(RecordFailure { index, error }),
            }
        }

        extraction
    }

    fn extract_row(
        &self,
        index: usize,
        row: &ElementRef<'_>,
        page: &PageContent,
    ) -> std::result::Result<RawRecord, ExtractError> {
        let title_elem = row.select(&self.title).next();
        let title = title_elem
            .map(element_text)
            .and_then(|t| clean_field(&t))
            .ok_or(ExtractError::MissingField {
                index,
                field: "title",
            })?;

        // The link element defaults to the title element
        let link_elem = self
            .link
            .as_ref()
            .and_then(|sel| row.select(sel).next())
            .or(title_elem);
        let href = link_elem
            .and_then(|e| e.value().attr(&self.link_attr))
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or(ExtractError::MissingField { index, field: "url" })?;
        let url = resolve(page.url(), href);

        let company = self.optional_text(row, self.company.as_ref());
        let location = self.optional_text(row, self.location.as_ref());

        Ok(RawRecord {
            title: Some(title),
            company,
            location,
            url: Some(url),
            ..RawRecord::default()
        })
    }

    fn optional_text(&self, row: &ElementRef<'_>, selector: Option<&Selector>) -> Option<String> {
        selector
            .and_then(|sel| row.select(sel).next())
            .map(element_text)
            .and_then(|t| clean_field(&t))
    }
}

#[async_trait]
impl ExtractionPipeline for SelectorExtractor {
    async fn extract(&self, page: &PageContent) -> PageExtraction {
        self.extract_rows(page)
    }

    fn name(&self) -> &str {
        "selector"
    }
}

/// Pull a description off a fetched detail page.
pub fn extract_description(page: &PageContent, selector: &Selector) -> Option<String> {
    let document = page.html();
    let elem = document.select(selector).next()?;
    clean_field(&element_text(elem))
}

/// Parse a CSS selector string into a usable selector.
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

fn element_text(elem: ElementRef<'_>) -> String {
    elem.text().collect::<String>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::PageContent;
    use crate::models::JobSelectors;

    fn selectors() -> JobSelectors {
        JobSelectors {
            row: "div.job".to_string(),
            title: "a.t".to_string(),
            link: None,
            link_attr: "href".to_string(),
            company: Some("span.c".to_string()),
            location: Some("span.l".to_string()),
        }
    }

    fn listing_page(rows: &str) -> PageContent {
        PageContent::from_parts(
            "https://example.com/jobs/rust/1/",
            format!("<html><body>{rows}</body></html>"),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_extracts_rows_in_document_order() {
        let extractor = SelectorExtractor::new(&selectors()).unwrap();
        let page = listing_page(
            r#"
            <div class="job"><a class="t" href="/job/1">First</a><span class="c">Acme</span><span class="l">Budapest</span></div>
            <div class="job"><a class="t" href="/job/2">Second</a><span class="c">Initech</span><span class="l">Wien</span></div>
            "#,
        );

        let extraction = extractor.extract(&page).await;
        assert_eq!(extraction.records.len(), 2);
        assert!(extraction.failures.is_empty());
        assert_eq!(extraction.records[0].title.as_deref(), Some("First"));
        assert_eq!(
            extraction.records[0].url.as_deref(),
            Some("https://example.com/job/1")
        );
        assert_eq!(extraction.records[1].company.as_deref(), Some("Initech"));
    }

    #[tokio::test]
    async fn test_missing_title_discards_record_only() {
        let extractor = SelectorExtractor::new(&selectors()).unwrap();
        let page = listing_page(
            r#"
            <div class="job"><a class="t" href="/job/1">Kept</a></div>
            <div class="job"><span class="c">No title here</span></div>
            <div class="job"><a class="t" href="/job/3">Also kept</a></div>
            "#,
        );

        let extraction = extractor.extract(&page).await;
        assert_eq!(extraction.records.len(), 2);
        assert_eq!(extraction.failures.len(), 1);
        assert_eq!(extraction.failures[0].index, 1);
        assert_eq!(
            extraction.failures[0].error,
            ExtractError::MissingField {
                index: 1,
                field: "title"
            }
        );
    }

    #[tokio::test]
    async fn test_missing_company_and_location_are_kept() {
        let extractor = SelectorExtractor::new(&selectors()).unwrap();
        let page =
            listing_page(r#"<div class="job"><a class="t" href="/job/1">Engineer</a></div>"#);

        let extraction = extractor.extract(&page).await;
        assert_eq!(extraction.records.len(), 1);
        assert!(extraction.records[0].company.is_none());
        assert!(extraction.records[0].location.is_none());
    }

    #[tokio::test]
    async fn test_relative_urls_resolved_absolute() {
        let extractor = SelectorExtractor::new(&selectors()).unwrap();
        let page = listing_page(
            r#"<div class="job"><a class="t" href="view?id=7">Engineer</a></div>"#,
        );

        let extraction = extractor.extract(&page).await;
        assert_eq!(
            extraction.records[0].url.as_deref(),
            Some("https://example.com/jobs/rust/1/view?id=7")
        );
    }

    #[tokio::test]
    async fn test_whitespace_squashed() {
        let extractor = SelectorExtractor::new(&selectors()).unwrap();
        let page = listing_page(
            "<div class=\"job\"><a class=\"t\" href=\"/job/1\">\n  Senior\n  Engineer\n</a><span class=\"c\">  Acme\tCorp </span></div>",
        );

        let extraction = extractor.extract(&page).await;
        assert_eq!(extraction.records[0].title.as_deref(), Some("Senior Engineer"));
        assert_eq!(extraction.records[0].company.as_deref(), Some("Acme Corp"));
    }

    #[tokio::test]
    async fn test_dedicated_link_selector() {
        let mut map = selectors();
        map.link = Some("a.apply".to_string());
        let extractor = SelectorExtractor::new(&map).unwrap();
        let page = listing_page(
            r#"<div class="job"><a class="t" href="/ignored">Engineer</a><a class="apply" href="/job/1">Apply</a></div>"#,
        );

        let extraction = extractor.extract(&page).await;
        assert_eq!(
            extraction.records[0].url.as_deref(),
            Some("https://example.com/job/1")
        );
    }

    #[test]
    fn test_invalid_selector_fails_at_construction() {
        let mut map = selectors();
        map.row = "[[invalid".to_string();
        assert!(SelectorExtractor::new(&map).is_err());
    }

    #[test]
    fn test_extract_description() {
        let page = PageContent::from_parts(
            "https://example.com/job/1",
            r#"<html><body><div class="desc"> Build  things </div></body></html>"#,
        )
        .unwrap();
        let selector = parse_selector(".desc").unwrap();
        assert_eq!(
            extract_description(&page, &selector),
            Some("Build things".to_string())
        );
        assert_eq!(extract_description(&page, &parse_selector(".nope").unwrap()), None);
    }
}
