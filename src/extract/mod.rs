// src/extract/mod.rs

//! Extraction pipeline abstraction.
//!
//! An [`ExtractionPipeline`] turns fetched page content into candidate
//! records. Two strategies satisfy the contract: deterministic selector
//! extraction ([`SelectorExtractor`]) and delegated extraction through an
//! external structuring service ([`DelegatedExtractor`]). Both are
//! infallible at the page level — per-record failures are collected and
//! reported individually, never raised.

use async_trait::async_trait;

use crate::error::ExtractError;
use crate::fetch::PageContent;
use crate::models::RawRecord;

pub mod delegated;
pub mod selector;

pub use delegated::{DelegatedExtractor, HttpStructuringClient, StructuredListing, StructuringService};
pub use selector::SelectorExtractor;

/// One record that failed extraction, with its position on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    /// Record position in document order
    pub index: usize,

    /// What went wrong
    pub error: ExtractError,
}

/// The outcome of extracting one page.
#[derive(Debug, Clone, Default)]
pub struct PageExtraction {
    /// Successfully extracted candidate records, in document order
    pub records: Vec<RawRecord>,

    /// Per-record failures, reported rather than raised
    pub failures: Vec<RecordFailure>,
}

impl PageExtraction {
    /// An extraction that found nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the page yielded zero candidate records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Turns page content into zero or more candidate records.
#[async_trait]
pub trait ExtractionPipeline: Send + Sync {
    /// Extract candidate records from a page. Must not raise; failures
    /// are carried inside the result.
    async fn extract(&self, page: &PageContent) -> PageExtraction;

    /// Strategy name for logging.
    fn name(&self) -> &str {
        "extractor"
    }
}
