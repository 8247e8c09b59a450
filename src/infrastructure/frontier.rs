//! Crawl frontier
//!
//! Drives the fetch/extract/paginate loop for one seed URL: FIFO queue of
//! discovered URLs, a visited set guaranteeing termination, page and record
//! budgets, politeness delays, cooperative cancellation, and tolerance for
//! individual page failures.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use scraper::Html;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

use crate::domain::entities::{CandidateReview, Review, ReviewProvenance, SiteProfile};
use crate::domain::events::{ScrapeProgress, ScrapeStage};
use crate::domain::services::{FetchError, PageFetcher, ScrapeObserver, TracingObserver};
use crate::infrastructure::config::ScraperConfig;
use crate::infrastructure::extractor::ReviewExtractor;
use crate::infrastructure::normalizer::ReviewNormalizer;
use crate::infrastructure::pagination::{self, NextUrl};
use crate::infrastructure::site_profiles::SiteProfileResolver;

/// Why a crawl is not startable or produced nothing usable. Transient page
/// failures are never escalated here; they surface only when the seed itself
/// is unreachable or the whole crawl comes back empty.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("invalid seed URL: {0}")]
    InvalidSeed(String),

    #[error("seed URL could not be fetched: {url}")]
    SeedUnreachable {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("no reviews found at {url} after {pages_fetched} page(s)")]
    NoReviews { url: String, pages_fetched: u32 },
}

/// What ended the crawl loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationReason {
    /// No more URLs to visit
    QueueExhausted,
    /// Processed `max_pages` URLs
    PageBudgetReached,
    /// Collected the configured review ceiling
    RecordCeilingReached,
    /// Stopped cooperatively by the caller
    Cancelled,
}

/// Result of one scrape invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeOutcome {
    /// Normalized reviews in discovery order
    pub reviews: Vec<Review>,
    pub pages_fetched: u32,
    pub pages_failed: u32,
    pub termination: TerminationReason,
}

impl ScrapeOutcome {
    /// True when the crawl was stopped before running its course.
    pub fn is_partial(&self) -> bool {
        self.termination == TerminationReason::Cancelled
    }
}

/// One queued URL plus whether it came from an unconfirmed pagination guess.
#[derive(Debug, Clone)]
struct QueuedUrl {
    url: Url,
    guessed: bool,
}

/// Sequential crawl engine for a single seed URL. Batches run one engine
/// per seed; engines share no mutable state beyond the profile cache.
#[derive(Clone)]
pub struct ReviewScrapeEngine {
    fetcher: Arc<dyn PageFetcher>,
    resolver: Arc<SiteProfileResolver>,
    observer: Arc<dyn ScrapeObserver>,
    cancellation: CancellationToken,
    config: ScraperConfig,
}

impl ReviewScrapeEngine {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        resolver: Arc<SiteProfileResolver>,
        config: ScraperConfig,
    ) -> Self {
        Self {
            fetcher,
            resolver,
            observer: Arc::new(TracingObserver),
            cancellation: CancellationToken::new(),
            config,
        }
    }

    /// Replace the default tracing observer.
    pub fn with_observer(mut self, observer: Arc<dyn ScrapeObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Scrape reviews starting from a seed URL, walking pagination until a
    /// budget is exhausted, the site runs out of pages, or the caller
    /// cancels. Returns partial results on cancellation.
    pub async fn scrape(
        &self,
        seed_url: &str,
        max_pages: u32,
    ) -> Result<ScrapeOutcome, ScrapeError> {
        let seed = parse_seed(seed_url)?;
        let profile = self.resolver.resolve(&seed);

        info!(
            "Starting to scrape reviews from {} (domain {}, max {} pages)",
            seed, profile.domain, max_pages
        );

        let state = self.run_crawl(&seed, &profile, max_pages).await;

        self.observer
            .on_progress(&state.progress(ScrapeStage::Done, None));

        if state.termination != TerminationReason::Cancelled && state.pages_fetched == 0 {
            return Err(match state.seed_failure {
                Some(source) => ScrapeError::SeedUnreachable {
                    url: seed.to_string(),
                    source,
                },
                None => ScrapeError::NoReviews {
                    url: seed.to_string(),
                    pages_fetched: 0,
                },
            });
        }

        let provenance = ReviewProvenance {
            source_url: seed.to_string(),
            source_domain: profile.domain.clone(),
            scraped_at: Utc::now(),
        };

        let normalizer = ReviewNormalizer::new(self.config.validation.clone());
        let mut candidates = state.candidates;
        candidates.truncate(self.config.max_reviews_per_site);
        let reviews = normalizer.normalize(candidates, &provenance);

        if reviews.is_empty() && state.termination != TerminationReason::Cancelled {
            return Err(ScrapeError::NoReviews {
                url: seed.to_string(),
                pages_fetched: state.pages_fetched,
            });
        }

        info!(
            "Scraping completed for {}: {} reviews from {} page(s), {} failed",
            seed,
            reviews.len(),
            state.pages_fetched,
            state.pages_failed
        );

        Ok(ScrapeOutcome {
            reviews,
            pages_fetched: state.pages_fetched,
            pages_failed: state.pages_failed,
            termination: state.termination,
        })
    }

    async fn run_crawl(&self, seed: &Url, profile: &SiteProfile, max_pages: u32) -> CrawlState {
        let extractor = ReviewExtractor::new(self.config.validation.clone());

        let mut queue: VecDeque<QueuedUrl> = VecDeque::new();
        queue.push_back(QueuedUrl {
            url: seed.clone(),
            guessed: false,
        });

        let mut visited: HashSet<String> = HashSet::new();
        let mut state = CrawlState::new();
        let mut allow_guess = true;

        self.observer
            .on_progress(&state.progress(ScrapeStage::Ready, None));

        loop {
            if self.cancellation.is_cancelled() {
                info!("Scrape of {} cancelled, returning partial results", seed);
                state.termination = TerminationReason::Cancelled;
                break;
            }
            if state.pages_processed >= max_pages {
                state.termination = TerminationReason::PageBudgetReached;
                break;
            }
            let Some(item) = queue.pop_front() else {
                state.termination = TerminationReason::QueueExhausted;
                break;
            };

            // Mark visited at dequeue so pagination cycles cannot loop
            if !visited.insert(item.url.as_str().to_string()) {
                continue;
            }
            state.pages_processed += 1;

            if !self.fetcher.is_allowed_by_robots(&item.url).await {
                info!("Skipping {} (disallowed by robots.txt)", item.url);
                continue;
            }

            self.observer
                .on_progress(&state.progress(ScrapeStage::Fetching, Some(&item.url)));

            let page = match self.fetcher.fetch(&item.url, profile.requires_rendering).await {
                Ok(page) => {
                    state.pages_fetched += 1;
                    page
                }
                Err(error) => {
                    warn!("Failed to fetch {}: {}", item.url, error);
                    state.pages_failed += 1;
                    if state.pages_fetched == 0 && state.seed_failure.is_none() {
                        state.seed_failure = Some(error);
                    }
                    continue;
                }
            };

            self.observer
                .on_progress(&state.progress(ScrapeStage::Extracting, Some(&item.url)));

            // DOM work stays inside this block: Html is not Send and must
            // not live across an await point
            let (extracted, discovered) = {
                let html = Html::parse_document(&page.content);
                let extracted = extractor.extract_document(&html, profile);
                let discovered = pagination::next_urls(&html, profile, &page.url, allow_guess);
                (extracted, discovered)
            };

            if item.guessed && extracted.is_empty() {
                // The guessed page exists but holds no reviews; stop guessing
                allow_guess = false;
            }

            info!(
                "Extracted {} review(s) from page {} of {}",
                extracted.len(),
                state.pages_processed,
                seed
            );
            state.candidates.extend(extracted);

            if state.candidates.len() >= self.config.max_reviews_per_site {
                info!(
                    "Reached maximum review limit: {}",
                    self.config.max_reviews_per_site
                );
                self.observer
                    .on_progress(&state.progress(ScrapeStage::Draining, None));
                state.termination = TerminationReason::RecordCeilingReached;
                break;
            }

            self.observer
                .on_progress(&state.progress(ScrapeStage::Paginating, Some(&item.url)));

            for NextUrl { url, guessed } in discovered {
                if !visited.contains(url.as_str()) {
                    queue.push_back(QueuedUrl { url, guessed });
                }
            }

            if self.config.default_delay_ms > 0 && !queue.is_empty() {
                tokio::select! {
                    _ = sleep(Duration::from_millis(self.config.default_delay_ms)) => {}
                    _ = self.cancellation.cancelled() => {}
                }
            }
        }

        state
    }
}

struct CrawlState {
    candidates: Vec<CandidateReview>,
    pages_processed: u32,
    pages_fetched: u32,
    pages_failed: u32,
    seed_failure: Option<FetchError>,
    termination: TerminationReason,
}

impl CrawlState {
    fn new() -> Self {
        Self {
            candidates: Vec::new(),
            pages_processed: 0,
            pages_fetched: 0,
            pages_failed: 0,
            seed_failure: None,
            termination: TerminationReason::QueueExhausted,
        }
    }

    fn progress(&self, stage: ScrapeStage, url: Option<&Url>) -> ScrapeProgress {
        ScrapeProgress {
            stage,
            current_url: url.map(|u| u.to_string()),
            pages_processed: self.pages_processed,
            pages_failed: self.pages_failed,
            reviews_collected: self.candidates.len(),
        }
    }
}

/// Seeds are validated only for a syntactic scheme + host.
fn parse_seed(seed_url: &str) -> Result<Url, ScrapeError> {
    let parsed =
        Url::parse(seed_url).map_err(|_| ScrapeError::InvalidSeed(seed_url.to_string()))?;
    if parsed.host_str().is_none() {
        return Err(ScrapeError::InvalidSeed(seed_url.to_string()));
    }
    Ok(parsed)
}
