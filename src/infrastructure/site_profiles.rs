//! Site profile resolution
//!
//! Maps a seed URL to the extraction strategy for its site: curated CSS
//! selectors for known review platforms, a generic heuristic mode for
//! everything else, and a flag for sites that hydrate review content with
//! client-side script. Pure lookup, no network I/O, never fails.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;
use url::Url;

use crate::domain::entities::{ExtractionRules, ReviewSelectors, SiteProfile};

/// Domains known to hydrate review content via client-side script.
const RENDER_REQUIRED_DOMAINS: &[&str] = &[
    "glassdoor.com",
    "glassdoor.co.in",
    "indeed.com",
    "linkedin.com",
    "ambitionbox.com",
];

/// Resolves and caches one profile per domain for the lifetime of a batch.
///
/// The cache is read-mostly: concurrent crawls of the same domain share one
/// immutable profile.
pub struct SiteProfileResolver {
    rules: Vec<(String, ReviewSelectors)>,
    cache: RwLock<HashMap<String, Arc<SiteProfile>>>,
}

impl SiteProfileResolver {
    /// Create a resolver with the built-in selector table.
    pub fn new() -> Self {
        Self::with_extra_rules(&HashMap::new())
    }

    /// Create a resolver with the built-in table extended (or overridden)
    /// by configured rules. Configured entries take precedence.
    pub fn with_extra_rules(extra: &HashMap<String, ReviewSelectors>) -> Self {
        let mut rules: Vec<(String, ReviewSelectors)> = extra
            .iter()
            .map(|(domain, selectors)| (domain.clone(), selectors.clone()))
            .collect();
        rules.extend(builtin_rules());

        Self {
            rules,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve the profile for a URL. Unknown domains resolve to generic
    /// extraction rather than an error.
    pub fn resolve(&self, url: &Url) -> Arc<SiteProfile> {
        let domain = normalize_domain(url);

        if let Some(profile) = self.cache.read().ok().and_then(|c| c.get(&domain).cloned()) {
            return profile;
        }

        let rules = self
            .rules
            .iter()
            .find(|(key, _)| domain.contains(key.as_str()))
            .map(|(_, selectors)| ExtractionRules::Known(selectors.clone()))
            .unwrap_or(ExtractionRules::Generic);

        let requires_rendering = RENDER_REQUIRED_DOMAINS
            .iter()
            .any(|site| domain.contains(site));

        let base_url = base_of(url);
        debug!(
            domain = %domain,
            known_rules = matches!(rules, ExtractionRules::Known(_)),
            requires_rendering,
            "resolved site profile"
        );

        let profile = Arc::new(SiteProfile {
            domain: domain.clone(),
            base_url,
            rules,
            requires_rendering,
        });

        if let Ok(mut cache) = self.cache.write() {
            cache.insert(domain, profile.clone());
        }
        profile
    }
}

impl Default for SiteProfileResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Lower-cased host with any leading "www." stripped.
fn normalize_domain(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    host.strip_prefix("www.").unwrap_or(&host).to_string()
}

/// Scheme + authority of the URL, with path/query/fragment stripped.
fn base_of(url: &Url) -> Url {
    let mut base = url.clone();
    base.set_path("/");
    base.set_query(None);
    base.set_fragment(None);
    base
}

/// Curated selector rules for common review platforms.
fn builtin_rules() -> Vec<(String, ReviewSelectors)> {
    vec![
        (
            "ambitionbox.com".to_string(),
            ReviewSelectors {
                container: r#".review-card, .review-item, [class*="review"]"#.to_string(),
                text: r#".review-text, .review-content, [class*="review-text"]"#.to_string(),
                rating: r#".rating, [class*="rating"], [class*="star"]"#.to_string(),
                reviewer: r#".reviewer-name, .review-author, [class*="author"]"#.to_string(),
                date: r#".review-date, [class*="date"]"#.to_string(),
                pagination: r#".next-page, .pagination-next, [href*="page"]"#.to_string(),
            },
        ),
        (
            "trustpilot.com".to_string(),
            ReviewSelectors {
                container: "article[data-service-review-card-paper]".to_string(),
                text: r#"div[data-service-review-text-typography="true"]"#.to_string(),
                rating: "div[data-service-review-rating] img".to_string(),
                reviewer: r#"span[data-consumer-name-typography="true"]"#.to_string(),
                date: "time".to_string(),
                pagination: "a[data-pagination-button-next-label]".to_string(),
            },
        ),
        (
            "glassdoor.com".to_string(),
            ReviewSelectors {
                container: r#"li[data-test="employer-review"]"#.to_string(),
                text: r#"[data-test="reviewBodyText"]"#.to_string(),
                rating: r#"[data-test="rating"]"#.to_string(),
                reviewer: r#"[data-test="employee-review-reviewer"]"#.to_string(),
                date: r#"[data-test="review-date"]"#.to_string(),
                pagination: r#"[data-test="pagination-next"]"#.to_string(),
            },
        ),
        (
            "glassdoor.co.in".to_string(),
            ReviewSelectors {
                container: r#"[data-test="employer-review"], .review, .employerReview"#.to_string(),
                text: r#"[data-test="reviewBodyText"], .review-details, .reviewBodyText"#
                    .to_string(),
                rating: r#"[data-test="rating"], .ratingNumber, [class*="rating"]"#.to_string(),
                reviewer: r#"[data-test="employee-review-reviewer"], .reviewer, .authorName"#
                    .to_string(),
                date: r#"[data-test="review-date"], .review-date, [class*="date"]"#.to_string(),
                pagination: r#"[data-test="pagination-next"], .next, [aria-label="Next"]"#
                    .to_string(),
            },
        ),
        (
            "google.com".to_string(),
            ReviewSelectors {
                container: "div[data-review-id]".to_string(),
                text: "span[data-expandable-text]".to_string(),
                rating: r#"span[aria-label*="star"]"#.to_string(),
                reviewer: r#"div[data-value="Name"]"#.to_string(),
                date: r#"span[class*="date"]"#.to_string(),
                pagination: r#"button[aria-label="Next page"]"#.to_string(),
            },
        ),
        (
            "yelp.com".to_string(),
            ReviewSelectors {
                container: r#"div[data-testid*="review"]"#.to_string(),
                text: r#"p[data-testid="review-text"]"#.to_string(),
                rating: r#"div[aria-label*="star rating"]"#.to_string(),
                reviewer: r#"span[data-testid="review-author"]"#.to_string(),
                date: r#"span[data-testid="review-date"]"#.to_string(),
                pagination: r#"a[aria-label="Next"]"#.to_string(),
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    #[test]
    fn strips_www_and_lowercases_domain() {
        let resolver = SiteProfileResolver::new();
        let profile = resolver.resolve(&parse("https://WWW.Example.com/reviews"));
        assert_eq!(profile.domain, "example.com");
        assert_eq!(profile.base_url.as_str(), "https://www.example.com/");
    }

    #[test]
    fn known_domain_gets_curated_rules() {
        let resolver = SiteProfileResolver::new();
        let profile = resolver.resolve(&parse("https://www.trustpilot.com/review/acme.com"));
        let selectors = profile.rules.known().expect("trustpilot rules");
        assert!(selectors.container.contains("data-service-review-card-paper"));
        assert!(!profile.requires_rendering);
    }

    #[test]
    fn subdomain_matches_by_substring() {
        let resolver = SiteProfileResolver::new();
        let profile = resolver.resolve(&parse("https://uk.trustpilot.com/review/acme.com"));
        assert!(profile.rules.known().is_some());
    }

    #[test]
    fn unknown_domain_falls_back_to_generic() {
        let resolver = SiteProfileResolver::new();
        let profile = resolver.resolve(&parse("https://reviews.smallshop.example/all"));
        assert!(matches!(profile.rules, ExtractionRules::Generic));
        assert!(!profile.requires_rendering);
    }

    #[test]
    fn js_heavy_sites_require_rendering() {
        let resolver = SiteProfileResolver::new();
        let profile = resolver.resolve(&parse("https://www.glassdoor.com/Reviews/acme"));
        assert!(profile.requires_rendering);
    }

    #[test]
    fn profiles_are_cached_per_domain() {
        let resolver = SiteProfileResolver::new();
        let first = resolver.resolve(&parse("https://example.com/a"));
        let second = resolver.resolve(&parse("https://example.com/b"));
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn extra_rules_take_precedence() {
        let mut extra = HashMap::new();
        extra.insert(
            "trustpilot.com".to_string(),
            ReviewSelectors {
                container: ".custom-review".to_string(),
                text: ".custom-text".to_string(),
                rating: ".custom-rating".to_string(),
                reviewer: ".custom-author".to_string(),
                date: ".custom-date".to_string(),
                pagination: ".custom-next".to_string(),
            },
        );

        let resolver = SiteProfileResolver::with_extra_rules(&extra);
        let profile = resolver.resolve(&parse("https://trustpilot.com/review/acme"));
        assert_eq!(profile.rules.known().unwrap().container, ".custom-review");
    }
}
