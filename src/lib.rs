//! Review Pulse - review acquisition engine
//!
//! Collects customer-review text from heterogeneous web sources and turns
//! it into a feed of normalized review records for downstream sentiment and
//! topic analysis. Given an arbitrary review-site URL the engine resolves an
//! extraction strategy, walks the site's pagination without a fixed API,
//! avoids duplicate fetches, validates and deduplicates extracted text, and
//! stays polite about it.

pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-export the public surface
pub use application::{ScrapeService, SeedScrapeResult};
pub use domain::entities::{
    CandidateReview, ExtractionRules, RawPage, Review, ReviewSelectors, SiteProfile,
};
pub use domain::events::{ScrapeProgress, ScrapeStage};
pub use domain::services::{FetchError, PageFetcher, PageRenderer, ScrapeObserver};
pub use infrastructure::config::ScraperConfig;
pub use infrastructure::frontier::{
    ReviewScrapeEngine, ScrapeError, ScrapeOutcome, TerminationReason,
};
pub use infrastructure::logging::{init_logging, init_logging_with_config};
