//! Progress event types emitted during a crawl
//!
//! One crawl reports its stage transitions and running counters through an
//! observer handle, so concurrent crawls never interleave shared log state.

use serde::{Deserialize, Serialize};

/// Stage of the fetch/extract/paginate loop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScrapeStage {
    /// Frontier initialized, nothing fetched yet
    Ready,
    /// Retrieving a page
    Fetching,
    /// Converting page content into candidate reviews
    Extracting,
    /// Discovering follow-up page URLs
    Paginating,
    /// Record budget reached; finishing with what was collected
    Draining,
    /// Crawl finished
    Done,
}

impl std::fmt::Display for ScrapeStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScrapeStage::Ready => write!(f, "ready"),
            ScrapeStage::Fetching => write!(f, "fetching"),
            ScrapeStage::Extracting => write!(f, "extracting"),
            ScrapeStage::Paginating => write!(f, "paginating"),
            ScrapeStage::Draining => write!(f, "draining"),
            ScrapeStage::Done => write!(f, "done"),
        }
    }
}

/// Snapshot of crawl progress delivered to the observer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeProgress {
    pub stage: ScrapeStage,
    /// URL currently being worked on, when the stage has one
    pub current_url: Option<String>,
    /// Pages popped from the queue so far, successful or not
    pub pages_processed: u32,
    /// Pages that failed to fetch and were skipped
    pub pages_failed: u32,
    /// Candidate reviews accumulated so far
    pub reviews_collected: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_display_is_lowercase() {
        assert_eq!(ScrapeStage::Fetching.to_string(), "fetching");
        assert_eq!(ScrapeStage::Draining.to_string(), "draining");
    }
}
