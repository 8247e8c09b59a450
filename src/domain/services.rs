//! Service traits at the seams of the crawl loop
//!
//! Fetching, rendering, and progress observation are injected capabilities
//! so the frontier can run against fakes in tests and real backends in
//! production without touching crawl logic.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::domain::entities::RawPage;
use crate::domain::events::ScrapeProgress;

/// Why a single page retrieval failed. All variants are non-fatal to a
/// crawl; the frontier skips the URL and moves on.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out: {url}")]
    Timeout { url: String },

    #[error("HTTP status {status} from {url}")]
    HttpStatus {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("render failed: {0}")]
    Render(String),
}

/// Page retrieval capability.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch one document, statically or through the rendering capability.
    async fn fetch(&self, url: &Url, requires_rendering: bool) -> Result<RawPage, FetchError>;

    /// Courtesy robots.txt check. Implementations without one allow everything.
    async fn is_allowed_by_robots(&self, _url: &Url) -> bool {
        true
    }
}

/// Headless-browser capability: load a URL, wait for client-side hydration,
/// return the materialized DOM markup.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str) -> anyhow::Result<String>;
}

/// Observer handle for crawl progress, scoped to one scrape invocation.
pub trait ScrapeObserver: Send + Sync {
    fn on_progress(&self, progress: &ScrapeProgress);
}

/// Default observer that forwards progress to the tracing subscriber.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl ScrapeObserver for TracingObserver {
    fn on_progress(&self, progress: &ScrapeProgress) {
        debug!(
            stage = %progress.stage,
            url = progress.current_url.as_deref().unwrap_or("-"),
            pages = progress.pages_processed,
            failed = progress.pages_failed,
            reviews = progress.reviews_collected,
            "scrape progress"
        );
    }
}
