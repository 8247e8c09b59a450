//! Domain module - core entities, events, and service seams
//!
//! Everything here is independent of the HTTP stack and the DOM parser;
//! infrastructure provides the concrete implementations.

pub mod entities;
pub mod events;
pub mod services;

// Re-export commonly used items
pub use entities::{
    CandidateReview, ExtractionRules, RawPage, Review, ReviewProvenance, ReviewSelectors,
    SiteProfile,
};
pub use events::{ScrapeProgress, ScrapeStage};
pub use services::{FetchError, PageFetcher, PageRenderer, ScrapeObserver, TracingObserver};
