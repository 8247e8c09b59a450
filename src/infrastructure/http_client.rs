//! HTTP client for review-site crawling
//!
//! Static page retrieval with randomized browser headers, a bounded
//! timeout, a shared rate limiter, and a randomized post-fetch delay.
//! Sites that hydrate content client-side are delegated to an injected
//! rendering capability.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, direct::NotKeyed},
};
use reqwest::{
    Client,
    header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT},
};
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use crate::domain::entities::RawPage;
use crate::domain::services::{FetchError, PageFetcher, PageRenderer};
use crate::infrastructure::config::HttpClientConfig;

const FALLBACK_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// HTTP client with rate limiting and an optional rendering capability.
pub struct HttpClient {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    renderer: Option<Arc<dyn PageRenderer>>,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration.
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .gzip(true)
            .brotli(true)
            .cookie_store(true)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .context("Failed to create HTTP client")?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.max_requests_per_second)
                .context("Rate limit must be greater than 0")?,
        );

        Ok(Self {
            client,
            rate_limiter: RateLimiter::direct(quota),
            renderer: None,
            config,
        })
    }

    /// Attach the headless-rendering capability used for sites flagged as
    /// requiring client-side hydration.
    pub fn with_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    fn pick_user_agent(&self) -> &str {
        if self.config.user_agents.is_empty() {
            return FALLBACK_USER_AGENT;
        }
        let index = fastrand::usize(..self.config.user_agents.len());
        &self.config.user_agents[index]
    }

    async fn politeness_pause(&self) {
        let (min_ms, max_ms) = self.config.random_delay_range_ms;
        if max_ms == 0 {
            return;
        }
        let delay = if min_ms >= max_ms {
            min_ms
        } else {
            fastrand::u64(min_ms..=max_ms)
        };
        sleep(Duration::from_millis(delay)).await;
    }

    async fn fetch_static(&self, url: &Url) -> Result<RawPage, FetchError> {
        self.rate_limiter.until_ready().await;

        debug!("Fetching URL: {}", url);

        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, self.pick_user_agent())
            .header(
                ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            )
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header("Upgrade-Insecure-Requests", "1")
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout {
                        url: url.to_string(),
                    }
                } else {
                    FetchError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status,
                url: url.to_string(),
            });
        }

        let content = response.text().await.map_err(FetchError::Network)?;
        debug!("Successfully fetched: {} ({} chars)", url, content.len());

        self.politeness_pause().await;

        Ok(RawPage {
            url: url.clone(),
            content,
            fetched_at: Utc::now(),
        })
    }

    async fn fetch_rendered(&self, url: &Url) -> Result<RawPage, FetchError> {
        let Some(renderer) = &self.renderer else {
            warn!(
                "Rendering required for {} but no renderer configured, falling back to static fetch",
                url
            );
            return self.fetch_static(url).await;
        };

        let content = renderer
            .render(url.as_str())
            .await
            .map_err(|e| FetchError::Render(e.to_string()))?;

        Ok(RawPage {
            url: url.clone(),
            content,
            fetched_at: Utc::now(),
        })
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(&self, url: &Url, requires_rendering: bool) -> Result<RawPage, FetchError> {
        if requires_rendering {
            self.fetch_rendered(url).await
        } else {
            self.fetch_static(url).await
        }
    }

    async fn is_allowed_by_robots(&self, url: &Url) -> bool {
        if !self.config.respect_robots_txt {
            return true;
        }

        let Some(host) = url.host_str() else {
            return true;
        };
        let robots_url = format!("{}://{host}/robots.txt", url.scheme());

        let Ok(parsed) = Url::parse(&robots_url) else {
            return true;
        };
        match self.fetch_static(&parsed).await {
            Ok(page) => !robots_disallows(&page.content, url.path()),
            Err(_) => {
                // Unreachable robots.txt is treated as permissive
                warn!("Could not fetch {}, assuming allowed", robots_url);
                true
            }
        }
    }
}

/// Minimal robots.txt interpretation: any Disallow path that prefixes the
/// request path blocks it. Proper group/user-agent handling is out of scope.
fn robots_disallows(robots_content: &str, path: &str) -> bool {
    robots_content
        .lines()
        .filter_map(|line| line.trim().strip_prefix("Disallow:"))
        .map(str::trim)
        .any(|disallowed| !disallowed.is_empty() && path.starts_with(disallowed))
}
