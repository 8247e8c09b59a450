//! Application layer - orchestration over the acquisition core and the
//! contracts consumed by the downstream analysis pipeline.

pub mod collaborators;
pub mod scrape_service;

pub use collaborators::{ReportRenderer, ReviewClassifier, ReviewLabel, Sentiment, TextEmbedder};
pub use scrape_service::{ScrapeService, SeedScrapeResult};
