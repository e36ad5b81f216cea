// src/models/raw.rs

//! Unvalidated extraction output before normalization.

use serde::{Deserialize, Serialize};

/// A loosely-typed bag of extracted fields. May be incomplete; the
/// normalization step decides what is acceptable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub title: Option<String>,
    pub company: Option<String>,
    /// Location text as shown on the page (usually a city)
    pub location: Option<String>,
    pub country: Option<String>,
    /// Detail URL, resolved to absolute form by the extraction strategy
    pub url: Option<String>,
    pub description: Option<String>,
    pub employment_type: Option<String>,
    pub pay_interval: Option<String>,
    pub pay_min: Option<f64>,
    pub pay_max: Option<f64>,
    pub currency: Option<String>,
}

impl RawRecord {
    /// Whether any compensation field was extracted.
    pub fn has_pay(&self) -> bool {
        self.pay_min.is_some() || self.pay_max.is_some() || self.pay_interval.is_some()
    }
}
