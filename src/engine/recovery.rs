// src/engine/recovery.rs

//! Failure classification.
//!
//! Decides whether a classified fetch failure is worth retrying, should
//! be skipped past, or must abort the whole crawl. The controller logs
//! every classification with its originating context and records skips
//! in the crawl summary; nothing is silently swallowed.

use crate::error::FetchError;
use crate::models::RecoveryConfig;

/// What to do about a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    /// Try the same fetch again (after an inflated pacing delay)
    Retry,
    /// Give up on this page or record and continue with the rest
    Skip,
    /// End the crawl; continuing would make things worse
    Abort,
}

/// Classifies failures against configured tolerances.
#[derive(Debug, Clone)]
pub struct RecoveryPolicy {
    config: RecoveryConfig,
}

impl RecoveryPolicy {
    /// Create a policy from recovery configuration.
    pub fn new(config: RecoveryConfig) -> Self {
        Self { config }
    }

    /// Classify a listing-page fetch failure.
    ///
    /// `attempts` counts fetches already made for this page;
    /// `consecutive_failures` counts failures across the crawl without an
    /// intervening success.
    pub fn classify_page(
        &self,
        error: &FetchError,
        attempts: u32,
        consecutive_failures: u32,
    ) -> FailureAction {
        match error {
            // A missing page is terminal: the listing ends here and
            // anything past it is guesswork.
            FetchError::NotFound { .. } => FailureAction::Abort,

            // Blocks get worse with every retry; tolerate a configured
            // number of consecutive ones, then stop antagonizing the site.
            FetchError::Blocked { .. } => {
                if consecutive_failures >= self.config.block_threshold {
                    FailureAction::Abort
                } else {
                    FailureAction::Retry
                }
            }

            // The listing container never appeared: retry once, then
            // treat the page as empty.
            FetchError::RenderTimeout { .. }
            | FetchError::Timeout { .. }
            | FetchError::Network { .. } => {
                if attempts <= self.config.page_retry_limit {
                    FailureAction::Retry
                } else {
                    FailureAction::Skip
                }
            }

            // Navigation losses are classified by classify_navigation;
            // seeing one here means the listing view itself is gone.
            FetchError::NavigationLost { .. } => FailureAction::Skip,
        }
    }

    /// Classify a detail-page navigation failure.
    pub fn classify_navigation(&self, attempts: u32) -> FailureAction {
        if attempts <= self.config.nav_retry_limit {
            FailureAction::Retry
        } else {
            FailureAction::Skip
        }
    }

    /// Consecutive structurally-empty pages tolerated before stopping.
    pub fn empty_page_limit(&self) -> u32 {
        self.config.empty_page_limit
    }
}
