// src/engine/mod.rs

//! The crawl engine: a pagination state machine over pluggable fetch
//! and extraction backends.
//!
//! One engine drives one site profile. `run` never raises on a single
//! page or record failure — only a terminal condition ends the loop:
//! quota met, the site exhausted, or a failure the recovery policy
//! classifies as terminal. Everything that was skipped along the way is
//! reported in the crawl summary.

use std::ops::ControlFlow;
use std::sync::Arc;

use chrono::Utc;
use scraper::Selector;

use crate::error::{FetchError, Result};
use crate::extract::selector::{extract_description, parse_selector};
use crate::extract::{ExtractionPipeline, PageExtraction};
use crate::fetch::{PageContent, PageFetcher, PageRequest};
use crate::models::{
    Config, CrawlReport, CrawlRequest, CrawlSummary, JobPost, SiteProfile, SkipNote,
    TerminalReason,
};

pub mod aggregate;
pub mod observer;
pub mod pacing;
pub mod recovery;

pub use aggregate::ResultAggregator;
pub use observer::{LogObserver, NullObserver, ProgressObserver};
pub use pacing::RateLimiter;
pub use recovery::{FailureAction, RecoveryPolicy};

/// Drives the fetch/extract/aggregate loop for one site.
pub struct CrawlEngine {
    profile: SiteProfile,
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<dyn ExtractionPipeline>,
    recovery: RecoveryPolicy,
    pacing: crate::models::PacingConfig,
    observer: Arc<dyn ProgressObserver>,
    detail_selector: Option<Selector>,
    max_page_selector: Option<Selector>,
}

impl CrawlEngine {
    /// Build an engine for a profile over the given backends.
    ///
    /// Profile selectors are validated here so a bad profile fails fast
    /// instead of mid-crawl.
    pub fn new(
        profile: SiteProfile,
        fetcher: Arc<dyn PageFetcher>,
        extractor: Arc<dyn ExtractionPipeline>,
        config: &Config,
    ) -> Result<Self> {
        profile.validate()?;
        let detail_selector = profile
            .description_selector
            .as_deref()
            .map(parse_selector)
            .transpose()?;
        let max_page_selector = profile
            .max_page_selector
            .as_deref()
            .map(parse_selector)
            .transpose()?;

        Ok(Self {
            profile,
            fetcher,
            extractor,
            recovery: RecoveryPolicy::new(config.recovery.clone()),
            pacing: config.pacing.clone(),
            observer: Arc::new(LogObserver),
            detail_selector,
            max_page_selector,
        })
    }

    /// Replace the progress observer.
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// The profile this engine crawls.
    pub fn profile(&self) -> &SiteProfile {
        &self.profile
    }

    /// Run one crawl to completion.
    ///
    /// Always returns a report — per-page and per-record failures are
    /// recovered locally and surfaced in the summary. A caller-imposed
    /// deadline is an external `tokio::time::timeout` around this call.
    pub async fn run(&self, request: &CrawlRequest) -> CrawlReport {
        let started_at = Utc::now();
        let quota = request.results_wanted.max(1);
        log::info!(
            "[{}] crawl starting: '{}' (quota {}, extractor {}, fetcher {})",
            self.profile.key,
            request.search_term,
            quota,
            self.extractor.name(),
            self.fetcher.name()
        );

        let mut aggregator = ResultAggregator::new(quota);
        let mut limiter = RateLimiter::new(&self.pacing);
        let mut skipped: Vec<SkipNote> = Vec::new();
        let mut records_seen = 0usize;
        let mut nav_retries = 0u32;
        let mut pages_visited = 0u32;

        let mut page: u32 = 1;
        let mut empty_pages = 0u32;
        let mut consecutive_failures = 0u32;
        // A template without {page} cannot advance, so it is single-page.
        let mut max_pages = self
            .profile
            .max_pages
            .or((!self.profile.is_paginated()).then_some(1));

        let terminal = 'crawl: loop {
            let listing_url =
                self.profile
                    .page_url(&request.search_term, request.location.as_deref(), page);
            let listing_request = PageRequest::for_profile(&self.profile, listing_url.clone());

            // Fetch the listing page, mediated by the recovery policy.
            let mut attempts = 0u32;
            let content = loop {
                match self.fetcher.fetch(&listing_request).await {
                    Ok(content) => {
                        consecutive_failures = 0;
                        limiter.record_success();
                        break Some(content);
                    }
                    Err(error) => {
                        attempts += 1;
                        consecutive_failures += 1;
                        limiter.record_failure();
                        let action =
                            self.recovery
                                .classify_page(&error, attempts, consecutive_failures);
                        log::warn!(
                            "[{}] page {} fetch failed: {} -> {:?}",
                            self.profile.key,
                            page,
                            error,
                            action
                        );
                        match action {
                            FailureAction::Retry => {
                                limiter.wait_between_requests().await;
                            }
                            FailureAction::Skip => break None,
                            FailureAction::Abort => {
                                let note = SkipNote::new(page, listing_url.clone(), &error);
                                self.observer.on_skip(&self.profile.key, &note);
                                skipped.push(note);
                                pages_visited += 1;
                                break 'crawl TerminalReason::Aborted;
                            }
                        }
                    }
                }
            };
            pages_visited += 1;

            let Some(content) = content else {
                // The page never arrived; it counts as structurally empty.
                let note = SkipNote::new(page, listing_url, "page skipped after retries");
                self.observer.on_skip(&self.profile.key, &note);
                skipped.push(note);
                empty_pages += 1;
                if empty_pages >= self.recovery.empty_page_limit() {
                    break TerminalReason::Exhausted;
                }
                page += 1;
                limiter.wait_between_requests().await;
                continue;
            };

            // The site may report its own page count on the first page.
            if page == 1 && max_pages.is_none() {
                if let Some(selector) = &self.max_page_selector {
                    max_pages = discover_max_pages(&content, selector);
                    if let Some(max) = max_pages {
                        log::info!("[{}] site reports {} pages", self.profile.key, max);
                    }
                }
            }

            let PageExtraction { records, failures } = self.extractor.extract(&content).await;
            for failure in failures {
                let note = SkipNote::new(
                    page,
                    format!("record {} on {}", failure.index, content.url()),
                    &failure.error,
                );
                self.observer.on_skip(&self.profile.key, &note);
                skipped.push(note);
            }
            records_seen += records.len();

            if records.is_empty() {
                log::info!(
                    "[{}] page {} yielded no candidate records",
                    self.profile.key,
                    page
                );
                empty_pages += 1;
                if empty_pages >= self.recovery.empty_page_limit() {
                    break TerminalReason::Exhausted;
                }
            } else {
                empty_pages = 0;
                for (index, raw) in records.into_iter().enumerate() {
                    match JobPost::from_raw(index, raw, &self.profile) {
                        Ok(mut post) => {
                            let is_duplicate = aggregator.contains(&post.id);
                            if !is_duplicate
                                && self.detail_selector.is_some()
                                && post.description.is_none()
                            {
                                let flow = self
                                    .enrich_description(
                                        &mut post,
                                        &listing_request,
                                        page,
                                        &mut limiter,
                                        &mut nav_retries,
                                        &mut skipped,
                                    )
                                    .await;
                                if let ControlFlow::Break(()) = flow {
                                    aggregator.offer(post);
                                    break 'crawl TerminalReason::Aborted;
                                }
                            }
                            aggregator.offer(post);
                            if aggregator.is_full() {
                                break;
                            }
                        }
                        Err(error) => {
                            let note =
                                SkipNote::new(page, format!("record on {}", content.url()), &error);
                            self.observer.on_skip(&self.profile.key, &note);
                            skipped.push(note);
                        }
                    }
                }
            }

            self.observer.on_page(&self.profile.key, page, aggregator.len());

            if aggregator.is_full() {
                break TerminalReason::Success;
            }
            if let Some(max) = max_pages {
                if page >= max {
                    log::info!("[{}] page {} is the last page", self.profile.key, page);
                    break TerminalReason::Exhausted;
                }
            }
            page += 1;
            limiter.wait_between_requests().await;
        };

        let summary = CrawlSummary {
            site: self.profile.key.clone(),
            pages_visited,
            records_seen,
            duplicates_rejected: aggregator.duplicates_rejected(),
            nav_retries,
            skipped,
            terminal,
            started_at,
            finished_at: Utc::now(),
        };
        self.observer.on_finish(&summary);

        CrawlReport {
            jobs: aggregator.into_posts(),
            summary,
        }
    }

    /// Follow a posting's link and pull the description off the detail
    /// page, restoring the listing view between attempts.
    ///
    /// `Break` means listing-view restoration itself failed and the
    /// crawl must abort. Exhausted retries keep the posting without a
    /// description and record the skip.
    async fn enrich_description(
        &self,
        post: &mut JobPost,
        listing_request: &PageRequest,
        page: u32,
        limiter: &mut RateLimiter,
        nav_retries: &mut u32,
        skipped: &mut Vec<SkipNote>,
    ) -> ControlFlow<()> {
        let Some(selector) = &self.detail_selector else {
            return ControlFlow::Continue(());
        };
        let detail_request = PageRequest::new(&post.url);
        let mut attempts = 0u32;

        loop {
            limiter.wait_between_requests().await;
            match self.fetcher.fetch(&detail_request).await {
                Ok(detail) => {
                    limiter.record_success();
                    post.description = extract_description(&detail, selector);
                    return ControlFlow::Continue(());
                }
                Err(error) => {
                    attempts += 1;
                    limiter.record_failure();
                    let lost = FetchError::NavigationLost {
                        url: post.url.clone(),
                        message: error.to_string(),
                    };
                    let action = self.recovery.classify_navigation(attempts);
                    log::warn!(
                        "[{}] detail navigation failed: {} -> {:?}",
                        self.profile.key,
                        lost,
                        action
                    );
                    match action {
                        FailureAction::Retry => {
                            *nav_retries += 1;
                            // Get back to the last known-good listing view
                            // before trying the detail link again.
                            if self.fetcher.fetch(listing_request).await.is_err() {
                                let note = SkipNote::new(
                                    page,
                                    post.url.clone(),
                                    "listing view restoration failed",
                                );
                                self.observer.on_skip(&self.profile.key, &note);
                                skipped.push(note);
                                return ControlFlow::Break(());
                            }
                        }
                        FailureAction::Skip | FailureAction::Abort => {
                            let note = SkipNote::new(page, post.url.clone(), &lost);
                            self.observer.on_skip(&self.profile.key, &note);
                            skipped.push(note);
                            return ControlFlow::Continue(());
                        }
                    }
                }
            }
        }
    }
}

/// Read the site-reported page count off a listing page.
fn discover_max_pages(content: &PageContent, selector: &Selector) -> Option<u32> {
    let document = content.html();
    let elem = document.select(selector).next()?;
    let text: String = elem.text().collect();
    crate::utils::url::first_number(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::extract::SelectorExtractor;
    use crate::models::{JobSelectors, PacingConfig};
    use crate::testing::{CollectingObserver, ScriptedFetcher};

    fn test_selectors() -> JobSelectors {
        JobSelectors {
            row: "div.job".to_string(),
            title: "a.t".to_string(),
            link: None,
            link_attr: "href".to_string(),
            company: Some("span.c".to_string()),
            location: Some("span.l".to_string()),
        }
    }

    fn test_profile() -> SiteProfile {
        SiteProfile::new(
            "testsite",
            "https://example.com",
            "https://example.com/jobs/{query}/{page}/",
        )
        .with_selectors(test_selectors())
        .with_country("Hungary")
    }

    fn page_url(n: u32) -> String {
        format!("https://example.com/jobs/rust+engineer/{n}/")
    }

    fn job_row(id: usize) -> String {
        format!(
            r#"<div class="job"><a class="t" href="/job/{id}">Job {id}</a><span class="c">Acme</span><span class="l">Budapest</span></div>"#
        )
    }

    fn listing_html(ids: std::ops::Range<usize>) -> String {
        let rows: String = ids.map(job_row).collect();
        format!("<html><body>{rows}</body></html>")
    }

    fn empty_html() -> String {
        "<html><body><p>No results.</p></body></html>".to_string()
    }

    fn engine(profile: SiteProfile, fetcher: ScriptedFetcher) -> CrawlEngine {
        let config = Config {
            pacing: PacingConfig::immediate(),
            ..Config::default()
        };
        let extractor = SelectorExtractor::for_profile(&profile).unwrap();
        CrawlEngine::new(profile, Arc::new(fetcher), Arc::new(extractor), &config)
            .unwrap()
            .with_observer(Arc::new(NullObserver))
    }

    fn request(quota: usize) -> CrawlRequest {
        CrawlRequest::new("rust engineer").with_results_wanted(quota)
    }

    #[tokio::test]
    async fn scenario_quota_met_after_two_pages() {
        // Quota 10, each page yields 6 unique records -> exactly 2 pages,
        // 10 records, success.
        let fetcher = ScriptedFetcher::new()
            .with_page(&page_url(1), &listing_html(1..7))
            .with_page(&page_url(2), &listing_html(7..13));
        let observer = CollectingObserver::new();
        let report = engine(test_profile(), fetcher)
            .with_observer(Arc::new(observer.clone()))
            .run(&request(10))
            .await;

        assert_eq!(report.summary.terminal, TerminalReason::Success);
        assert_eq!(report.summary.pages_visited, 2);
        assert_eq!(report.jobs.len(), 10);
        assert_eq!(report.summary.records_seen, 12);
        // The observer saw the running count grow page by page
        assert_eq!(observer.pages(), vec![(1, 6), (2, 10)]);
        assert_eq!(observer.summaries().len(), 1);
    }

    #[tokio::test]
    async fn scenario_site_exhausted_below_quota() {
        // Quota 50 but the site only has 23 records, then an empty page.
        let fetcher = ScriptedFetcher::new()
            .with_page(&page_url(1), &listing_html(1..7))
            .with_page(&page_url(2), &listing_html(7..13))
            .with_page(&page_url(3), &listing_html(13..19))
            .with_page(&page_url(4), &listing_html(19..24))
            .with_page(&page_url(5), &empty_html());
        let report = engine(test_profile(), fetcher).run(&request(50)).await;

        assert_eq!(report.summary.terminal, TerminalReason::Exhausted);
        assert_eq!(report.summary.pages_visited, 5);
        assert_eq!(report.jobs.len(), 23);
    }

    #[tokio::test]
    async fn scenario_consecutive_blocks_abort() {
        // Page 3 returns a block signal three times (threshold 3): the
        // crawl keeps pages 1-2 and aborts.
        let blocked = || {
            Err(FetchError::Blocked {
                url: page_url(3),
                detail: "HTTP 403".into(),
            })
        };
        let fetcher = ScriptedFetcher::new()
            .with_page(&page_url(1), &listing_html(1..7))
            .with_page(&page_url(2), &listing_html(7..13))
            .with_outcome(&page_url(3), blocked())
            .with_outcome(&page_url(3), blocked())
            .with_outcome(&page_url(3), blocked());
        let report = engine(test_profile(), fetcher).run(&request(50)).await;

        assert_eq!(report.summary.terminal, TerminalReason::Aborted);
        assert_eq!(report.jobs.len(), 12);
        assert!(
            report
                .summary
                .skipped
                .iter()
                .any(|note| note.page == 3 && note.reason.contains("blocked"))
        );
    }

    #[tokio::test]
    async fn scenario_detail_navigation_retry_succeeds() {
        // A detail fetch fails once, the listing view is restored, the
        // retry succeeds: the record is present with its description and
        // nothing was skipped.
        let profile = test_profile().with_description_selector("div.desc");
        let detail_url = "https://example.com/job/1";
        let fetcher = ScriptedFetcher::new()
            .with_page(&page_url(1), &listing_html(1..2))
            .with_outcome(
                detail_url,
                Err(FetchError::Timeout {
                    url: detail_url.into(),
                }),
            )
            .with_page(
                detail_url,
                "<html><body><div class=\"desc\">Build crawlers</div></body></html>",
            );
        let report = engine(profile, fetcher).run(&request(1)).await;

        assert_eq!(report.summary.terminal, TerminalReason::Success);
        assert_eq!(report.jobs.len(), 1);
        assert_eq!(report.jobs[0].description.as_deref(), Some("Build crawlers"));
        assert_eq!(report.summary.nav_retries, 1);
        assert!(report.summary.skipped.is_empty());
    }

    #[tokio::test]
    async fn scenario_cross_page_duplicate_kept_once() {
        // The same detail URL appears on pages 1 and 2.
        let fetcher = ScriptedFetcher::new()
            .with_page(&page_url(1), &listing_html(1..3))
            .with_page(&page_url(2), &listing_html(2..4))
            .with_page(&page_url(3), &empty_html());
        let report = engine(test_profile(), fetcher).run(&request(10)).await;

        assert_eq!(report.summary.terminal, TerminalReason::Exhausted);
        assert_eq!(report.jobs.len(), 3);
        assert_eq!(report.summary.duplicates_rejected, 1);
        let titles: Vec<&str> = report.jobs.iter().map(|j| j.title.as_str()).collect();
        assert_eq!(titles, vec!["Job 1", "Job 2", "Job 3"]);
    }

    #[tokio::test]
    async fn graceful_degradation_keeps_titled_records() {
        // Five rows, two without titles: exactly three accepted, the
        // failures are reported, and the crawl does not end early.
        let rows = format!(
            "{}{}{}{}{}",
            job_row(1),
            r#"<div class="job"><span class="c">No title</span></div>"#,
            job_row(2),
            r#"<div class="job"><span class="c">Also none</span></div>"#,
            job_row(3),
        );
        let fetcher = ScriptedFetcher::new()
            .with_page(&page_url(1), &format!("<html><body>{rows}</body></html>"));
        let report = engine(test_profile(), fetcher).run(&request(3)).await;

        assert_eq!(report.summary.terminal, TerminalReason::Success);
        assert_eq!(report.jobs.len(), 3);
        assert_eq!(report.summary.skipped.len(), 2);
        assert_eq!(report.summary.records_seen, 3);
    }

    #[tokio::test]
    async fn missing_next_page_aborts() {
        // Fetching past the end yields not-found, which is terminal.
        let fetcher = ScriptedFetcher::new().with_page(&page_url(1), &listing_html(1..3));
        let report = engine(test_profile(), fetcher).run(&request(50)).await;

        assert_eq!(report.summary.terminal, TerminalReason::Aborted);
        assert_eq!(report.jobs.len(), 2);
    }

    #[tokio::test]
    async fn site_reported_max_page_stops_pagination() {
        let profile = test_profile().with_max_page_selector("span.max-page");
        let body = format!(
            "<html><body>{}<span class=\"max-page\">2</span></body></html>",
            (1..4).map(job_row).collect::<String>()
        );
        let body2 = format!(
            "<html><body>{}<span class=\"max-page\">2</span></body></html>",
            (4..7).map(job_row).collect::<String>()
        );
        let fetcher = ScriptedFetcher::new()
            .with_page(&page_url(1), &body)
            .with_page(&page_url(2), &body2);
        let report = engine(profile, fetcher).run(&request(50)).await;

        assert_eq!(report.summary.terminal, TerminalReason::Exhausted);
        assert_eq!(report.summary.pages_visited, 2);
        assert_eq!(report.jobs.len(), 6);
    }

    #[tokio::test]
    async fn render_timeout_retries_then_treats_page_as_empty() {
        let timeout = || {
            Err(FetchError::RenderTimeout {
                url: page_url(1),
                selector: "div.job".into(),
            })
        };
        let fetcher = ScriptedFetcher::new()
            .with_outcome(&page_url(1), timeout())
            .with_outcome(&page_url(1), timeout());
        let report = engine(test_profile(), fetcher.clone()).run(&request(10)).await;

        assert_eq!(report.summary.terminal, TerminalReason::Exhausted);
        assert!(report.jobs.is_empty());
        // One initial attempt plus one retry
        assert_eq!(fetcher.calls().len(), 2);
        assert_eq!(report.summary.skipped.len(), 1);
    }

    #[tokio::test]
    async fn restoration_failure_escalates_to_abort() {
        // The detail fetch fails, and so does re-fetching the listing
        // view: the crawl aborts rather than continuing blind.
        let profile = test_profile().with_description_selector("div.desc");
        let detail_url = "https://example.com/job/1";
        let fetcher = ScriptedFetcher::new()
            .with_page(&page_url(1), &listing_html(1..2))
            .with_outcome(
                &page_url(1),
                Err(FetchError::Network {
                    url: page_url(1),
                    message: "connection reset".into(),
                }),
            )
            .with_outcome(
                detail_url,
                Err(FetchError::Timeout {
                    url: detail_url.into(),
                }),
            );
        let report = engine(profile, fetcher).run(&request(5)).await;

        assert_eq!(report.summary.terminal, TerminalReason::Aborted);
        // The posting itself is kept, just without a description
        assert_eq!(report.jobs.len(), 1);
        assert!(report.jobs[0].description.is_none());
        assert!(
            report
                .summary
                .skipped
                .iter()
                .any(|note| note.reason.contains("restoration"))
        );
    }

    #[tokio::test]
    async fn single_page_template_does_not_loop() {
        let profile = SiteProfile::new(
            "oneshot",
            "https://example.com",
            "https://example.com/search?q={query}",
        )
        .with_selectors(test_selectors());
        let fetcher = ScriptedFetcher::new().with_page(
            "https://example.com/search?q=rust+engineer",
            &listing_html(1..4),
        );
        let report = engine(profile, fetcher.clone()).run(&request(50)).await;

        assert_eq!(report.summary.terminal, TerminalReason::Exhausted);
        assert_eq!(report.jobs.len(), 3);
        assert_eq!(fetcher.calls().len(), 1);
    }
}
