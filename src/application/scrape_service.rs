//! Scrape orchestration
//!
//! Runs one crawl engine per seed URL. Seeds in a batch are independent and
//! run concurrently up to a configured bound; they share only the read-only
//! site profile cache and the batch-wide cancellation token.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::domain::services::{PageFetcher, ScrapeObserver, TracingObserver};
use crate::infrastructure::config::ScraperConfig;
use crate::infrastructure::frontier::{ReviewScrapeEngine, ScrapeError, ScrapeOutcome};
use crate::infrastructure::http_client::HttpClient;
use crate::infrastructure::site_profiles::SiteProfileResolver;

/// Outcome of one seed within a batch.
#[derive(Debug)]
pub struct SeedScrapeResult {
    pub seed_url: String,
    pub result: Result<ScrapeOutcome, ScrapeError>,
}

/// Entry point for single and batch scrapes.
pub struct ScrapeService {
    config: ScraperConfig,
    fetcher: Arc<dyn PageFetcher>,
    resolver: Arc<SiteProfileResolver>,
    observer: Arc<dyn ScrapeObserver>,
    cancellation: CancellationToken,
}

impl ScrapeService {
    /// Build a service backed by the real HTTP client.
    pub fn new(config: ScraperConfig) -> Result<Self> {
        let fetcher = Arc::new(HttpClient::new(config.http.clone())?);
        Ok(Self::with_fetcher(config, fetcher))
    }

    /// Build a service around any fetcher implementation.
    pub fn with_fetcher(config: ScraperConfig, fetcher: Arc<dyn PageFetcher>) -> Self {
        let resolver = Arc::new(SiteProfileResolver::with_extra_rules(&config.extra_site_rules));
        Self {
            config,
            fetcher,
            resolver,
            observer: Arc::new(TracingObserver),
            cancellation: CancellationToken::new(),
        }
    }

    /// Replace the default tracing observer.
    pub fn with_observer(mut self, observer: Arc<dyn ScrapeObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Token that cancels every crawl started by this service.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Build a crawl engine sharing this service's capabilities.
    pub fn engine(&self) -> ReviewScrapeEngine {
        ReviewScrapeEngine::new(self.fetcher.clone(), self.resolver.clone(), self.config.clone())
            .with_observer(self.observer.clone())
            .with_cancellation(self.cancellation.clone())
    }

    /// Scrape a single seed URL.
    pub async fn scrape(&self, seed_url: &str, max_pages: u32) -> Result<ScrapeOutcome, ScrapeError> {
        self.engine().scrape(seed_url, max_pages).await
    }

    /// Scrape a batch of independent seed URLs concurrently. Results come
    /// back in input order, one per seed.
    pub async fn scrape_batch(&self, seed_urls: &[String], max_pages: u32) -> Vec<SeedScrapeResult> {
        let limit = self.config.max_concurrent_crawls.max(1);
        let semaphore = Arc::new(Semaphore::new(limit));
        let mut join_set = JoinSet::new();

        for (index, seed_url) in seed_urls.iter().enumerate() {
            let engine = self.engine();
            let semaphore = semaphore.clone();
            let seed_url = seed_url.clone();

            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let result = engine.scrape(&seed_url, max_pages).await;
                (index, seed_url, result)
            });
        }

        let mut slots: Vec<Option<SeedScrapeResult>> =
            (0..seed_urls.len()).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, seed_url, result)) => {
                    slots[index] = Some(SeedScrapeResult { seed_url, result });
                }
                Err(error) => warn!("Scrape task failed to complete: {}", error),
            }
        }

        slots.into_iter().flatten().collect()
    }
}
