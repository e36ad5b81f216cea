// src/models/job.rs

//! Normalized job posting and its value types.

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;
use crate::models::{RawRecord, SiteProfile};
use crate::utils::text::clean_opt;
use crate::utils::url::{canonicalize, job_id};

/// Company name used when extraction produced none.
const UNKNOWN_COMPANY: &str = "Unknown";

/// An ISO 3166-1 alpha-2 country code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Country(String);

impl Country {
    /// Look up a country from a display name or an alpha-2 code.
    pub fn from_name(name: &str) -> Option<Self> {
        let trimmed = name.trim();
        let code = match trimmed.to_lowercase().as_str() {
            "hungary" => "HU",
            "croatia" => "HR",
            "spain" => "ES",
            "poland" => "PL",
            "sweden" => "SE",
            "austria" => "AT",
            "germany" => "DE",
            "france" => "FR",
            "netherlands" => "NL",
            "belgium" => "BE",
            "switzerland" => "CH",
            "italy" => "IT",
            "portugal" => "PT",
            "czech republic" | "czechia" => "CZ",
            "slovakia" => "SK",
            "romania" => "RO",
            "denmark" => "DK",
            "norway" => "NO",
            "finland" => "FI",
            "ireland" => "IE",
            "united kingdom" | "uk" | "great britain" => "GB",
            "united states" | "usa" | "us" => "US",
            "canada" => "CA",
            "australia" => "AU",
            "india" => "IN",
            _ => {
                // Accept a bare alpha-2 code as-is
                if trimmed.len() == 2 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
                    return Some(Self(trimmed.to_ascii_uppercase()));
                }
                return None;
            }
        };
        Some(Self(code.to_string()))
    }

    /// The alpha-2 code.
    pub fn code(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Country {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Structured job location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// City text as shown on the page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    /// Country code, from the record or the site profile default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<Country>,
}

/// How a pay figure is quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayInterval {
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Fixed,
}

impl PayInterval {
    /// Parse an interval from free text.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "hourly" | "hour" | "per hour" => Some(Self::Hourly),
            "daily" | "day" | "per day" => Some(Self::Daily),
            "weekly" | "week" | "per week" => Some(Self::Weekly),
            "monthly" | "month" | "per month" => Some(Self::Monthly),
            "yearly" | "annual" | "annually" | "year" | "per year" => Some(Self::Yearly),
            "fixed" | "fixed-price" | "fixed price" => Some(Self::Fixed),
            _ => None,
        }
    }
}

/// Compensation attached to a posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compensation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<PayInterval>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<f64>,
    pub currency: String,
}

/// A normalized job posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPost {
    /// Canonical identifier, a pure function of the canonical detail URL
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: Location,
    /// Absolute, canonicalized detail URL
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compensation: Option<Compensation>,
}

impl JobPost {
    /// Normalize a raw record into a posting.
    ///
    /// Policy: a record without a title or URL is rejected; a record
    /// without a company or location is kept with placeholders. The
    /// identifier is derived by hashing the canonical URL — never from
    /// anything run-local.
    pub fn from_raw(
        index: usize,
        raw: RawRecord,
        profile: &SiteProfile,
    ) -> Result<Self, ExtractError> {
        let has_pay = raw.has_pay();
        let RawRecord {
            title,
            company,
            location,
            country,
            url,
            description,
            employment_type,
            pay_interval,
            pay_min,
            pay_max,
            currency,
        } = raw;

        let title = clean_opt(title).ok_or(ExtractError::MissingField {
            index,
            field: "title",
        })?;
        let url = clean_opt(url).ok_or(ExtractError::MissingField { index, field: "url" })?;

        let canonical = canonicalize(&url, profile.strip_query);
        let id = job_id(&profile.key, &canonical);

        let company = clean_opt(company).unwrap_or_else(|| UNKNOWN_COMPANY.to_string());
        let country = country
            .as_deref()
            .and_then(Country::from_name)
            .or_else(|| profile.country.as_deref().and_then(Country::from_name));
        let location = Location {
            city: clean_opt(location),
            country,
        };

        let compensation = if has_pay {
            Some(Compensation {
                interval: pay_interval.as_deref().and_then(PayInterval::parse),
                min_amount: pay_min,
                max_amount: pay_max,
                currency: clean_opt(currency).unwrap_or_else(|| "USD".to_string()),
            })
        } else {
            None
        };

        Ok(Self {
            id,
            title,
            company,
            location,
            url: canonical,
            description: clean_opt(description),
            employment_type: clean_opt(employment_type),
            compensation,
        })
    }
}
