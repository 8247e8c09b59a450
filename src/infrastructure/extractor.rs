//! Review extraction from page markup
//!
//! Two-tier strategy cascade: curated per-site selectors first, then
//! heuristic pattern matching over container-like elements. Strategies
//! share one signature and run in order until one produces candidates, so
//! adding or reordering a tier is a one-line change.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::domain::entities::{CandidateReview, ExtractionRules, RawPage, SiteProfile};
use crate::infrastructure::config::ValidationConfig;
use crate::infrastructure::normalizer::is_valid_review_text;

static STAR_CLASS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)[-_]?star|star[-_]?(\d+)").unwrap());
static ARIA_RATING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:out of|/|star)").unwrap());
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());
static RATING_HINT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)star|rating|score").unwrap());

// Common review date shapes, most specific first; the first match wins.
static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\d{1,2}[/-]\d{1,2}[/-]\d{2,4}",
        r"\d{4}[/-]\d{1,2}[/-]\d{1,2}",
        r"[A-Za-z]+\s+\d{1,2},?\s+\d{4}",
        r"\d{1,2}\s+[A-Za-z]+\s+\d{4}",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// Container-like tags with the class keywords that mark review content.
const GENERIC_PATTERNS: &[(&str, &[&str])] = &[
    ("div", &["review", "comment", "feedback"]),
    ("article", &["review", "post"]),
    ("li", &["review", "item"]),
];

/// Number of text fragments joined into one heuristic candidate.
const MAX_TEXT_FRAGMENTS: usize = 3;

type ExtractionStrategy = fn(&ReviewExtractor, &Html, &SiteProfile) -> Vec<CandidateReview>;

/// Ordered extraction tiers; the first non-empty result wins.
const STRATEGIES: &[(&str, ExtractionStrategy)] = &[
    ("rules", ReviewExtractor::extract_with_rules),
    ("generic", ReviewExtractor::extract_with_patterns),
];

/// Converts raw page markup into candidate review records.
pub struct ReviewExtractor {
    validation: ValidationConfig,
}

impl ReviewExtractor {
    pub fn new(validation: ValidationConfig) -> Self {
        Self { validation }
    }

    /// Extract candidate reviews from a fetched page.
    pub fn extract(&self, page: &RawPage, profile: &SiteProfile) -> Vec<CandidateReview> {
        let html = Html::parse_document(&page.content);
        self.extract_document(&html, profile)
    }

    /// Extract from an already-parsed document.
    pub fn extract_document(&self, html: &Html, profile: &SiteProfile) -> Vec<CandidateReview> {
        for (tag, strategy) in STRATEGIES {
            let candidates = strategy(self, html, profile);
            if !candidates.is_empty() {
                debug!("Extracted {} candidates via {} strategy", candidates.len(), tag);
                return candidates;
            }
        }
        Vec::new()
    }

    /// Tier 1: curated per-site selectors.
    fn extract_with_rules(&self, html: &Html, profile: &SiteProfile) -> Vec<CandidateReview> {
        let ExtractionRules::Known(selectors) = &profile.rules else {
            return Vec::new();
        };

        let Ok(container_selector) = Selector::parse(&selectors.container) else {
            warn!("Invalid container selector for {}", profile.domain);
            return Vec::new();
        };

        let mut candidates = Vec::new();
        for container in html.select(&container_selector) {
            // A container without usable text is not an error, just noise
            let Some(text) = select_text(&container, &selectors.text) else {
                continue;
            };
            if !is_valid_review_text(&text, &self.validation) {
                continue;
            }

            let rating =
                select_first(&container, &selectors.rating).and_then(|el| extract_rating(&el));
            let reviewer = select_text(&container, &selectors.reviewer);
            let date = select_text(&container, &selectors.date).map(|raw| parse_date(&raw));

            candidates.push(CandidateReview {
                text,
                rating,
                reviewer,
                date,
                source_tag: "rules".to_string(),
            });
        }
        candidates
    }

    /// Tier 2: heuristic scan for container-like elements.
    fn extract_with_patterns(&self, html: &Html, _profile: &SiteProfile) -> Vec<CandidateReview> {
        let mut candidates = Vec::new();

        for (tag, keywords) in GENERIC_PATTERNS {
            let Ok(tag_selector) = Selector::parse(tag) else {
                continue;
            };

            for element in html.select(&tag_selector) {
                let classes = element
                    .value()
                    .classes()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .to_lowercase();
                if !keywords.iter().any(|keyword| classes.contains(keyword)) {
                    continue;
                }

                if let Some(candidate) = self.parse_generic_container(&element) {
                    candidates.push(candidate);
                }
            }
        }
        candidates
    }

    /// Build a candidate from an unstructured container: join the first few
    /// meaningful text fragments and attempt best-effort rating discovery.
    fn parse_generic_container(&self, element: &ElementRef) -> Option<CandidateReview> {
        let text_selector = Selector::parse("p, div, span").ok()?;

        let mut fragments: Vec<String> = Vec::new();
        for child in element.select(&text_selector) {
            let text = element_text(&child);
            if text.chars().count() > self.validation.min_fragment_length {
                fragments.push(text);
            }
            if fragments.len() == MAX_TEXT_FRAGMENTS {
                break;
            }
        }

        let text = fragments.join(" ");
        if text.is_empty() || !is_valid_review_text(&text, &self.validation) {
            return None;
        }

        let rating = self.find_generic_rating(element);

        Some(CandidateReview {
            text,
            rating,
            reviewer: None,
            date: None,
            source_tag: "generic".to_string(),
        })
    }

    fn find_generic_rating(&self, element: &ElementRef) -> Option<f64> {
        let rating_selector = Selector::parse("span, div").ok()?;
        element
            .select(&rating_selector)
            .find(|el| {
                let classes = el.value().classes().collect::<Vec<_>>().join(" ");
                RATING_HINT_RE.is_match(&classes)
            })
            .and_then(|el| extract_rating(&el))
    }
}

/// Rating extraction cascade. Rules apply in order and the first matching
/// rule decides: star-count class names, accessibility labels, then bare
/// numbers constrained to a plausible 1-5 scale.
pub fn extract_rating(element: &ElementRef) -> Option<f64> {
    let classes = element.value().classes().collect::<Vec<_>>().join(" ");
    if let Some(caps) = STAR_CLASS_RE.captures(&classes) {
        return caps
            .get(1)
            .or_else(|| caps.get(2))
            .and_then(|m| m.as_str().parse().ok());
    }

    if let Some(label) = element.value().attr("aria-label") {
        if let Some(caps) = ARIA_RATING_RE.captures(label) {
            return caps[1].parse().ok();
        }
    }

    let text = element_text(element);
    if let Some(m) = NUMBER_RE.find(&text) {
        if let Ok(value) = m.as_str().parse::<f64>() {
            if (1.0..=5.0).contains(&value) {
                return Some(value);
            }
        }
    }

    None
}

/// Pull the first recognized date shape out of a free-form string; strings
/// with no recognized shape pass through unchanged.
pub fn parse_date(raw: &str) -> String {
    for pattern in DATE_PATTERNS.iter() {
        if let Some(m) = pattern.find(raw) {
            return m.as_str().to_string();
        }
    }
    raw.to_string()
}

fn select_first<'a>(element: &ElementRef<'a>, selector: &str) -> Option<ElementRef<'a>> {
    let parsed = Selector::parse(selector).ok()?;
    element.select(&parsed).next()
}

fn select_text(element: &ElementRef, selector: &str) -> Option<String> {
    select_first(element, selector)
        .map(|el| element_text(&el))
        .filter(|text| !text.is_empty())
}

fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ReviewSelectors;
    use url::Url;

    fn extractor() -> ReviewExtractor {
        ReviewExtractor::new(ValidationConfig::default())
    }

    fn known_profile() -> SiteProfile {
        SiteProfile {
            domain: "shop.example".to_string(),
            base_url: Url::parse("https://shop.example/").unwrap(),
            rules: ExtractionRules::Known(ReviewSelectors {
                container: ".review-card".to_string(),
                text: ".review-text".to_string(),
                rating: ".review-rating".to_string(),
                reviewer: ".review-author".to_string(),
                date: ".review-date".to_string(),
                pagination: "a.next".to_string(),
            }),
            requires_rendering: false,
        }
    }

    fn generic_profile() -> SiteProfile {
        SiteProfile {
            domain: "blog.example".to_string(),
            base_url: Url::parse("https://blog.example/").unwrap(),
            rules: ExtractionRules::Generic,
            requires_rendering: false,
        }
    }

    fn page(url: &str, content: &str) -> RawPage {
        RawPage {
            url: Url::parse(url).unwrap(),
            content: content.to_string(),
            fetched_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn rule_based_extraction_pulls_all_fields() {
        let html = r#"
            <div class="review-card">
                <p class="review-text">Fantastic blender, crushes ice without complaint.</p>
                <span class="review-rating" aria-label="4.5 out of 5 stars"></span>
                <span class="review-author">Maya K.</span>
                <span class="review-date">Reviewed on March 3, 2024 in Austin</span>
            </div>
            <div class="review-card">
                <p class="review-text">Stopped working after two weeks, very disappointed.</p>
                <span class="review-author">J. Ortiz</span>
            </div>
        "#;

        let candidates = extractor().extract(&page("https://shop.example/p/1", html), &known_profile());
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].rating, Some(4.5));
        assert_eq!(candidates[0].reviewer.as_deref(), Some("Maya K."));
        assert_eq!(candidates[0].date.as_deref(), Some("March 3, 2024"));
        assert_eq!(candidates[0].source_tag, "rules");
        assert_eq!(candidates[1].rating, None);
    }

    #[test]
    fn container_without_text_is_dropped_silently() {
        let html = r#"
            <div class="review-card"><span class="review-author">Ghost</span></div>
            <div class="review-card">
                <p class="review-text">Actually has content worth keeping here.</p>
            </div>
        "#;

        let candidates = extractor().extract(&page("https://shop.example/p/1", html), &known_profile());
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn generic_fallback_used_when_rules_match_nothing() {
        let html = r#"
            <article class="customer-review">
                <p>This cafe has the best espresso I have found in the whole city.</p>
            </article>
        "#;

        let candidates = extractor().extract(&page("https://shop.example/p/1", html), &known_profile());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].source_tag, "generic");
    }

    #[test]
    fn generic_extraction_joins_first_fragments() {
        let html = r#"
            <div class="review">
                <p>The first paragraph talks about the product experience.</p>
                <p>The second paragraph covers the delivery timeline in detail.</p>
                <p>The third paragraph mentions the customer support follow-up.</p>
                <p>A fourth paragraph that should not be included at all.</p>
            </div>
        "#;

        let candidates = extractor().extract(&page("https://blog.example/r", html), &generic_profile());
        assert!(!candidates.is_empty());
        assert!(candidates[0].text.contains("first paragraph"));
        assert!(candidates[0].text.contains("third paragraph"));
        assert!(!candidates[0].text.contains("fourth paragraph"));
    }

    #[test]
    fn generic_rating_found_from_star_class() {
        let html = r#"
            <div class="review">
                <p>Long enough review text describing the purchase experience.</p>
                <span class="stars star-4"></span>
            </div>
        "#;

        let candidates = extractor().extract(&page("https://blog.example/r", html), &generic_profile());
        assert_eq!(candidates[0].rating, Some(4.0));
    }

    #[test]
    fn rating_cascade_prefers_class_over_label_and_text() {
        let html = r#"<div><span id="r" class="rating 5-star" aria-label="2 out of 5">3</span></div>"#;
        let doc = Html::parse_document(html);
        let selector = Selector::parse("#r").unwrap();
        let element = doc.select(&selector).next().unwrap();
        assert_eq!(extract_rating(&element), Some(5.0));
    }

    #[test]
    fn rating_from_aria_label() {
        let html = r#"<div><span id="r" aria-label="Rated 3.5 out of 5 stars"></span></div>"#;
        let doc = Html::parse_document(html);
        let selector = Selector::parse("#r").unwrap();
        let element = doc.select(&selector).next().unwrap();
        assert_eq!(extract_rating(&element), Some(3.5));
    }

    #[test]
    fn bare_number_rating_only_accepted_within_scale() {
        let doc = Html::parse_document(r#"<div><span id="a">4.0</span><span id="b">9.3</span></div>"#);
        let sel_a = Selector::parse("#a").unwrap();
        let sel_b = Selector::parse("#b").unwrap();
        let a = doc.select(&sel_a).next().unwrap();
        let b = doc.select(&sel_b).next().unwrap();
        assert_eq!(extract_rating(&a), Some(4.0));
        assert_eq!(extract_rating(&b), None);
    }

    #[test]
    fn date_shapes_are_recognized_in_order() {
        assert_eq!(parse_date("posted 12/31/2023 by admin"), "12/31/2023");
        assert_eq!(parse_date("2024-01-05"), "2024-01-05");
        assert_eq!(parse_date("Reviewed June 9, 2024"), "June 9, 2024");
        assert_eq!(parse_date("on 9 June 2024"), "9 June 2024");
        assert_eq!(parse_date("yesterday"), "yesterday");
    }

    #[test]
    fn spammy_containers_are_dropped_at_extraction() {
        let html = r#"
            <div class="review-card">
                <p class="review-text">Click here for a discount code, buy now before the limited time offer ends!</p>
            </div>
        "#;

        let candidates = extractor().extract(&page("https://shop.example/p/1", html), &known_profile());
        assert!(candidates.is_empty());
    }
}
