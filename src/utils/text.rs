// src/utils/text.rs

//! Text cleanup helpers shared by the extraction strategies.

/// Collapse all runs of whitespace into single spaces and trim the ends.
///
/// # Examples
/// ```
/// use jobcrawl::utils::squash_whitespace;
///
/// assert_eq!(squash_whitespace("  Senior\n  Rust\tEngineer "), "Senior Rust Engineer");
/// ```
pub fn squash_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Squash whitespace and drop the value entirely if nothing remains.
pub fn clean_field(s: &str) -> Option<String> {
    let cleaned = squash_whitespace(s);
    if cleaned.is_empty() { None } else { Some(cleaned) }
}

/// Clean an already-optional field.
pub fn clean_opt(s: Option<String>) -> Option<String> {
    s.as_deref().and_then(clean_field)
}
