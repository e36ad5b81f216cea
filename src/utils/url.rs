// src/utils/url.rs

//! URL manipulation and canonical identifier helpers.

use sha2::{Digest, Sha256};
use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Canonicalize a job URL for identity derivation.
///
/// The fragment is always dropped; the query is dropped only when the
/// site's listing URLs carry volatile search identifiers. Scheme and host
/// casing are normalized by the parser. Unparseable input is returned
/// trimmed so the caller still gets a deterministic (if opaque) key.
pub fn canonicalize(url: &str, strip_query: bool) -> String {
    match Url::parse(url.trim()) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            if strip_query {
                parsed.set_query(None);
            }
            parsed.to_string()
        }
        Err(_) => url.trim().to_string(),
    }
}

/// Derive a canonical job identifier from a site key and a canonical URL.
///
/// The identifier is a pure function of its inputs: the same listing maps
/// to the same identifier across pages and across runs.
pub fn job_id(site_key: &str, canonical_url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_url.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("{}-{}", site_key, &digest[..16])
}

/// Extract the first unsigned integer appearing in a text fragment.
///
/// Used to read page counts out of pagination widgets.
pub fn first_number(text: &str) -> Option<u32> {
    let pattern = regex::Regex::new(r"\d+").ok()?;
    pattern.find(text)?.as_str().parse().ok()
}
