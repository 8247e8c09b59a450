//! Pagination discovery
//!
//! Finds the next listing page without a documented API. Tiers run in
//! order, first success wins: URL pattern inference (query parameter or
//! path segment), curated pagination-link selectors, generic "next" link
//! heuristics, and finally an unconfirmed page-2 guess for URLs with no
//! detectable pattern. Only the guess tier produces URLs expected to fail.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::domain::entities::SiteProfile;

/// Page-number query parameters in preference order.
const PAGE_PARAM_NAMES: &[&str] = &["page", "p", "pg", "paged", "pn"];

/// Default parameter used when guessing a second page.
const DEFAULT_PAGE_PARAM: &str = "page";

static NEXT_TEXT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bnext\b|›|»").unwrap());

/// Inferred addressing scheme for a site's listing pages. Derived fresh per
/// page, never persisted across crawls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationPattern {
    /// Page number carried in a query parameter
    QueryParameter { name: String, current_page: u32 },
    /// Page number carried in a `/page/<n>` style path segment
    PathSegment {
        segment_index: usize,
        current_page: u32,
    },
    /// No detectable pattern; the URL is assumed to be page 1
    None,
}

/// A discovered follow-up URL. `guessed` marks the unconfirmed page-2
/// synthesis so the frontier can stop guessing once a guess comes up empty.
#[derive(Debug, Clone)]
pub struct NextUrl {
    pub url: Url,
    pub guessed: bool,
}

impl NextUrl {
    fn confirmed(url: Url) -> Self {
        Self { url, guessed: false }
    }
}

struct PaginationInput<'a> {
    html: &'a Html,
    profile: &'a SiteProfile,
    current_url: &'a Url,
    allow_guess: bool,
}

type PaginationTier = fn(&PaginationInput<'_>) -> Option<Vec<NextUrl>>;

/// Ordered discovery tiers; the first to return URLs wins.
const TIERS: &[(&str, PaginationTier)] = &[
    ("pattern", tier_inferred_pattern),
    ("rule-links", tier_rule_links),
    ("generic-next", tier_generic_next),
    ("guess", tier_page_guess),
];

/// Discover follow-up page URLs for the current page. Usually zero or one
/// entries, but curated selectors may yield several.
pub fn next_urls(
    html: &Html,
    profile: &SiteProfile,
    current_url: &Url,
    allow_guess: bool,
) -> Vec<NextUrl> {
    let input = PaginationInput {
        html,
        profile,
        current_url,
        allow_guess,
    };

    for (name, tier) in TIERS {
        if let Some(urls) = tier(&input) {
            debug!("Pagination tier '{}' produced {} url(s)", name, urls.len());
            return urls;
        }
    }
    Vec::new()
}

/// Detect the page-addressing pattern of a URL.
pub fn infer_pattern(url: &Url) -> PaginationPattern {
    for name in PAGE_PARAM_NAMES {
        let found = url
            .query_pairs()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .and_then(|(_, value)| value.parse::<u32>().ok());
        if let Some(current_page) = found {
            return PaginationPattern::QueryParameter {
                name: (*name).to_string(),
                current_page,
            };
        }
    }

    if let Some(segments) = url.path_segments() {
        let segments: Vec<&str> = segments.collect();
        for (index, pair) in segments.windows(2).enumerate() {
            let marker = pair[0];
            if marker.eq_ignore_ascii_case("page") || marker.eq_ignore_ascii_case("pages") {
                if let Ok(current_page) = pair[1].parse::<u32>() {
                    return PaginationPattern::PathSegment {
                        segment_index: index + 1,
                        current_page,
                    };
                }
            }
        }
    }

    PaginationPattern::None
}

/// Reconstruct the URL addressing the page after the detected one. Every
/// other query parameter and path segment is preserved.
pub fn next_from_pattern(url: &Url, pattern: &PaginationPattern) -> Option<Url> {
    match pattern {
        PaginationPattern::QueryParameter { name, current_page } => {
            let next_value = (current_page + 1).to_string();
            let pairs: Vec<(String, String)> = url
                .query_pairs()
                .map(|(key, value)| {
                    if key.eq_ignore_ascii_case(name) {
                        (key.into_owned(), next_value.clone())
                    } else {
                        (key.into_owned(), value.into_owned())
                    }
                })
                .collect();

            let mut next = url.clone();
            next.query_pairs_mut().clear().extend_pairs(pairs);
            Some(next)
        }
        PaginationPattern::PathSegment {
            segment_index,
            current_page,
        } => {
            let mut segments: Vec<String> = url
                .path_segments()?
                .map(|segment| segment.to_string())
                .collect();
            let slot = segments.get_mut(*segment_index)?;
            *slot = (current_page + 1).to_string();

            let mut next = url.clone();
            next.set_path(&segments.join("/"));
            Some(next)
        }
        PaginationPattern::None => None,
    }
}

/// Synthesize a page-2 URL for a URL with no detectable pattern.
pub fn guess_second_page(url: &Url) -> Url {
    let mut guessed = url.clone();
    guessed
        .query_pairs_mut()
        .append_pair(DEFAULT_PAGE_PARAM, "2");
    guessed
}

fn tier_inferred_pattern(input: &PaginationInput<'_>) -> Option<Vec<NextUrl>> {
    let pattern = infer_pattern(input.current_url);
    next_from_pattern(input.current_url, &pattern).map(|url| vec![NextUrl::confirmed(url)])
}

fn tier_rule_links(input: &PaginationInput<'_>) -> Option<Vec<NextUrl>> {
    let selectors = input.profile.rules.known()?;
    let parsed = Selector::parse(&selectors.pagination).ok()?;

    let urls: Vec<NextUrl> = input
        .html
        .select(&parsed)
        .filter_map(|element| resolve_href(&element, input.current_url))
        .map(NextUrl::confirmed)
        .collect();

    if urls.is_empty() { None } else { Some(urls) }
}

fn tier_generic_next(input: &PaginationInput<'_>) -> Option<Vec<NextUrl>> {
    let parsed = Selector::parse("a, button").ok()?;

    input
        .html
        .select(&parsed)
        .find(|element| looks_like_next_link(element))
        .and_then(|element| resolve_href(&element, input.current_url))
        .map(|url| vec![NextUrl::confirmed(url)])
}

fn tier_page_guess(input: &PaginationInput<'_>) -> Option<Vec<NextUrl>> {
    if !input.allow_guess {
        return None;
    }
    Some(vec![NextUrl {
        url: guess_second_page(input.current_url),
        guessed: true,
    }])
}

fn looks_like_next_link(element: &ElementRef) -> bool {
    if let Some(rel) = element.value().attr("rel") {
        if rel.eq_ignore_ascii_case("next") {
            return true;
        }
    }
    if let Some(label) = element.value().attr("aria-label") {
        if NEXT_TEXT_RE.is_match(label) {
            return true;
        }
    }
    let text = element.text().collect::<String>();
    NEXT_TEXT_RE.is_match(&text)
}

fn resolve_href(element: &ElementRef, current_url: &Url) -> Option<Url> {
    let href = element.value().attr("href")?;
    current_url.join(href).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{ExtractionRules, ReviewSelectors};

    fn parse(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    fn generic_profile() -> SiteProfile {
        SiteProfile {
            domain: "example.com".to_string(),
            base_url: parse("https://example.com/"),
            rules: ExtractionRules::Generic,
            requires_rendering: false,
        }
    }

    fn profile_with_pagination(selector: &str) -> SiteProfile {
        SiteProfile {
            domain: "example.com".to_string(),
            base_url: parse("https://example.com/"),
            rules: ExtractionRules::Known(ReviewSelectors {
                container: ".review".to_string(),
                text: ".text".to_string(),
                rating: ".rating".to_string(),
                reviewer: ".author".to_string(),
                date: ".date".to_string(),
                pagination: selector.to_string(),
            }),
            requires_rendering: false,
        }
    }

    #[test]
    fn query_parameter_pattern_round_trips() {
        let url = parse("https://example.com/reviews?sort=recent&page=3&lang=en");
        let pattern = infer_pattern(&url);
        assert_eq!(
            pattern,
            PaginationPattern::QueryParameter {
                name: "page".to_string(),
                current_page: 3
            }
        );

        let next = next_from_pattern(&url, &pattern).unwrap();
        assert!(next.as_str().contains("page=4"));
        assert!(next.as_str().contains("sort=recent"));
        assert!(next.as_str().contains("lang=en"));
    }

    #[test]
    fn short_parameter_names_are_recognized() {
        let url = parse("https://example.com/list?p=7");
        let pattern = infer_pattern(&url);
        let next = next_from_pattern(&url, &pattern).unwrap();
        assert!(next.as_str().ends_with("?p=8"));
    }

    #[test]
    fn path_segment_pattern_round_trips() {
        let url = parse("https://example.com/acme/reviews/page/2");
        let pattern = infer_pattern(&url);
        assert_eq!(
            pattern,
            PaginationPattern::PathSegment {
                segment_index: 3,
                current_page: 2
            }
        );

        let next = next_from_pattern(&url, &pattern).unwrap();
        assert!(next.as_str().ends_with("/acme/reviews/page/3"));
    }

    #[test]
    fn path_segment_matching_is_case_insensitive() {
        let url = parse("https://example.com/Pages/5/reviews");
        let next = next_from_pattern(&url, &infer_pattern(&url)).unwrap();
        assert!(next.as_str().contains("/Pages/6/reviews"));
    }

    #[test]
    fn patternless_url_yields_none() {
        assert_eq!(
            infer_pattern(&parse("https://example.com/reviews")),
            PaginationPattern::None
        );
    }

    #[test]
    fn guessed_second_page_appends_default_parameter() {
        let guessed = guess_second_page(&parse("https://example.com/reviews"));
        assert!(guessed.as_str().ends_with("?page=2"));
    }

    #[test]
    fn detected_pattern_wins_over_dom_links() {
        let html = Html::parse_document(r#"<a class="next-link" href="/reviews?page=9">Next</a>"#);
        let profile = profile_with_pagination("a.next-link");
        let current = parse("https://example.com/reviews?page=3");

        let urls = next_urls(&html, &profile, &current, true);
        assert_eq!(urls.len(), 1);
        assert!(urls[0].url.as_str().contains("page=4"));
        assert!(!urls[0].guessed);
    }

    #[test]
    fn rule_links_are_used_when_no_pattern_detected() {
        let html = Html::parse_document(
            r#"<a class="page-link" href="/reviews/2">2</a>
               <a class="page-link" href="/reviews/3">3</a>"#,
        );
        let profile = profile_with_pagination("a.page-link");
        let current = parse("https://example.com/reviews");

        let urls = next_urls(&html, &profile, &current, true);
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].url.as_str(), "https://example.com/reviews/2");
    }

    #[test]
    fn generic_next_link_is_found_by_text_and_rel() {
        let html = Html::parse_document(
            r#"<a href="/about">About us</a>
               <a rel="next" href="/reviews/next-batch">more</a>"#,
        );
        let current = parse("https://example.com/reviews");

        let urls = next_urls(&html, &generic_profile(), &current, false);
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].url.as_str(), "https://example.com/reviews/next-batch");
    }

    #[test]
    fn dead_end_guesses_page_two_when_allowed() {
        let html = Html::parse_document("<p>no links here</p>");
        let current = parse("https://example.com/reviews");

        let urls = next_urls(&html, &generic_profile(), &current, true);
        assert_eq!(urls.len(), 1);
        assert!(urls[0].guessed);
        assert!(urls[0].url.as_str().ends_with("?page=2"));

        let none = next_urls(&html, &generic_profile(), &current, false);
        assert!(none.is_empty());
    }

    #[test]
    fn word_containing_next_is_not_a_next_link() {
        let html = Html::parse_document(r#"<a href="/nextdoor">Nextdoor pickup</a>"#);
        let current = parse("https://example.com/reviews");

        let urls = next_urls(&html, &generic_profile(), &current, false);
        assert!(urls.is_empty());
    }
}
