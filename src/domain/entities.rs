//! Domain entities
//!
//! Contains the core records that flow through the acquisition pipeline,
//! from resolved site profiles to fully normalized reviews.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Resolved extraction configuration for one target site.
///
/// Immutable once resolved; created once per seed URL and shared read-only
/// between concurrent crawls of the same domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteProfile {
    /// Normalized domain, lower-cased with any leading "www." stripped
    pub domain: String,
    /// Scheme + host root of the site, used to resolve relative links
    pub base_url: Url,
    /// Site-specific selector rules, or generic heuristic mode
    pub rules: ExtractionRules,
    /// Whether review content is hydrated client-side and needs a renderer
    pub requires_rendering: bool,
}

/// Extraction strategy selection for a site.
///
/// Absence of known rules is a first-class variant rather than an optional
/// field, so downstream code matches on the mode instead of null-checking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExtractionRules {
    /// Curated per-site CSS selectors
    Known(ReviewSelectors),
    /// No curated rules; use heuristic pattern extraction
    Generic,
}

impl ExtractionRules {
    /// Returns the curated selectors when present.
    pub fn known(&self) -> Option<&ReviewSelectors> {
        match self {
            ExtractionRules::Known(selectors) => Some(selectors),
            ExtractionRules::Generic => None,
        }
    }
}

/// CSS selector set for a known review site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSelectors {
    /// Selector for the element wrapping one review
    pub container: String,
    /// Selector for the review body text, relative to the container
    pub text: String,
    /// Selector for the rating element, relative to the container
    pub rating: String,
    /// Selector for the reviewer name, relative to the container
    pub reviewer: String,
    /// Selector for the review date, relative to the container
    pub date: String,
    /// Selector for pagination links, evaluated against the whole page
    pub pagination: String,
}

/// One fetched document. Transient: consumed by extraction and pagination
/// discovery immediately after the fetch, then discarded.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub url: Url,
    pub content: String,
    pub fetched_at: DateTime<Utc>,
}

/// Extraction output before validation and cleanup.
#[derive(Debug, Clone)]
pub struct CandidateReview {
    pub text: String,
    /// Numeric rating on whatever scale the site uses, when discoverable
    pub rating: Option<f64>,
    pub reviewer: Option<String>,
    /// Free-form date string as found on the page
    pub date: Option<String>,
    /// Which extraction path produced this candidate ("rules" / "generic")
    pub source_tag: String,
}

/// Crawl-level metadata stamped onto every candidate at hand-off.
#[derive(Debug, Clone)]
pub struct ReviewProvenance {
    pub source_url: String,
    pub source_domain: String,
    pub scraped_at: DateTime<Utc>,
}

/// Final normalized review record, immutable once emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub text: String,
    pub rating: Option<f64>,
    pub reviewer: Option<String>,
    pub date: Option<String>,
    pub source_url: String,
    pub source_domain: String,
    pub scraped_at: DateTime<Utc>,
}
