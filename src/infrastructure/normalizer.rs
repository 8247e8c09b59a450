//! Review normalization
//!
//! Validates, cleans, and deduplicates candidate reviews before they leave
//! the core: whitespace collapse, length capping, spam filtering, and
//! exact-text dedup on the lower-cased collapsed form.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use crate::domain::entities::{CandidateReview, Review, ReviewProvenance};
use crate::infrastructure::config::ValidationConfig;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Validates and deduplicates extracted reviews.
pub struct ReviewNormalizer {
    validation: ValidationConfig,
}

impl ReviewNormalizer {
    pub fn new(validation: ValidationConfig) -> Self {
        Self { validation }
    }

    /// Clean and deduplicate candidates, stamping each survivor with the
    /// crawl provenance. Emits in discovery order, skipping rejects.
    pub fn normalize(
        &self,
        candidates: Vec<CandidateReview>,
        provenance: &ReviewProvenance,
    ) -> Vec<Review> {
        let total = candidates.len();
        let mut seen_texts: HashSet<String> = HashSet::new();
        let mut reviews = Vec::new();

        for mut candidate in candidates {
            let cleaned = collapse_whitespace(&candidate.text);
            let cleaned = truncate_chars(&cleaned, self.validation.max_review_length);

            if !is_valid_review_text(&cleaned, &self.validation) {
                continue;
            }

            let dedup_key = cleaned.to_lowercase();
            if !seen_texts.insert(dedup_key) {
                continue;
            }

            reviews.push(Review {
                text: cleaned,
                rating: candidate.rating,
                reviewer: candidate.reviewer.take(),
                date: candidate.date.take(),
                source_url: provenance.source_url.clone(),
                source_domain: provenance.source_domain.clone(),
                scraped_at: provenance.scraped_at,
            });
        }

        info!(
            "Cleaned reviews: {} kept, {} removed as duplicate or invalid",
            reviews.len(),
            total - reviews.len()
        );
        reviews
    }
}

/// Validation shared by the extractor (early drop) and the normalizer
/// (final gate): minimum length, and rejection when two or more distinct
/// spam keywords match. A single keyword is tolerated.
pub fn is_valid_review_text(text: &str, validation: &ValidationConfig) -> bool {
    let trimmed = text.trim();
    if trimmed.chars().count() < validation.min_review_length {
        return false;
    }

    let lower = trimmed.to_lowercase();
    let spam_hits = validation
        .spam_keywords
        .iter()
        .filter(|keyword| lower.contains(keyword.as_str()))
        .count();

    spam_hits < 2
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

/// Truncate to at most `max` characters, respecting char boundaries.
fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((index, _)) => text[..index].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn candidate(text: &str) -> CandidateReview {
        CandidateReview {
            text: text.to_string(),
            rating: Some(4.0),
            reviewer: Some("Priya".to_string()),
            date: None,
            source_tag: "rules".to_string(),
        }
    }

    fn provenance() -> ReviewProvenance {
        ReviewProvenance {
            source_url: "https://example.com/reviews".to_string(),
            source_domain: "example.com".to_string(),
            scraped_at: Utc::now(),
        }
    }

    fn normalizer() -> ReviewNormalizer {
        ReviewNormalizer::new(ValidationConfig::default())
    }

    #[test]
    fn collapses_internal_whitespace() {
        let reviews = normalizer().normalize(
            vec![candidate("Great   product,\n\t works well")],
            &provenance(),
        );
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].text, "Great product, works well");
    }

    #[test]
    fn rejects_too_short_text() {
        let reviews = normalizer().normalize(vec![candidate("ok!")], &provenance());
        assert!(reviews.is_empty());
    }

    #[test]
    fn single_spam_keyword_is_tolerated() {
        let text = "Got a nice discount code with my order, product itself is solid";
        assert!(is_valid_review_text(text, &ValidationConfig::default()));
    }

    #[test]
    fn two_distinct_spam_keywords_are_rejected() {
        let text = "Use this discount code now, click here to buy";
        assert!(!is_valid_review_text(text, &ValidationConfig::default()));
    }

    #[test]
    fn deduplicates_by_normalized_text_keeping_first() {
        let mut first = candidate("Great product, works well");
        first.reviewer = Some("First".to_string());
        let mut second = candidate("great   PRODUCT, works well");
        second.reviewer = Some("Second".to_string());

        let reviews = normalizer().normalize(vec![first, second], &provenance());
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].reviewer.as_deref(), Some("First"));
    }

    #[test]
    fn truncates_to_max_length_on_char_boundary() {
        let mut validation = ValidationConfig::default();
        validation.max_review_length = 10;
        let normalizer = ReviewNormalizer::new(validation);

        let reviews = normalizer.normalize(
            vec![candidate("éééééééééééé more text beyond the cap")],
            &provenance(),
        );
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].text.chars().count(), 10);
    }

    #[test]
    fn stamps_provenance_onto_reviews() {
        let reviews = normalizer().normalize(
            vec![candidate("Solid build quality and quick delivery")],
            &provenance(),
        );
        assert_eq!(reviews[0].source_domain, "example.com");
        assert_eq!(reviews[0].source_url, "https://example.com/reviews");
    }
}
