//! Configuration infrastructure
//!
//! Runtime configuration for the acquisition engine: crawl budgets, HTTP
//! politeness settings, validation thresholds, extra per-site selector
//! rules, and logging. Defaults work out of the box; a JSON config file can
//! override any of them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use crate::domain::entities::ReviewSelectors;

/// Complete engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Hard ceiling on reviews collected in one scrape invocation
    pub max_reviews_per_site: usize,

    /// Fixed politeness delay between frontier iterations, in milliseconds
    pub default_delay_ms: u64,

    /// Upper bound on concurrently running crawls in a batch
    pub max_concurrent_crawls: usize,

    /// HTTP client behavior
    pub http: HttpClientConfig,

    /// Review validation thresholds and spam filtering
    pub validation: ValidationConfig,

    /// Additional domain -> selector rules merged over the built-in table.
    /// Keys match by substring against the normalized domain.
    pub extra_site_rules: HashMap<String, ReviewSelectors>,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            max_reviews_per_site: 5000,
            default_delay_ms: 2000,
            max_concurrent_crawls: 4,
            http: HttpClientConfig::default(),
            validation: ValidationConfig::default(),
            extra_site_rules: HashMap::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ScraperConfig {
    /// Load configuration from a JSON file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: ScraperConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Persist configuration as pretty-printed JSON.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize configuration")?;
        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}

/// HTTP client configuration for polite crawling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    /// Browser user agents rotated at random per request
    pub user_agents: Vec<String>,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Rate limit applied across all requests from one client
    pub max_requests_per_second: u32,

    /// Randomized post-fetch delay range in milliseconds (min, max)
    pub random_delay_range_ms: (u64, u64),

    /// Check robots.txt before fetching
    pub respect_robots_txt: bool,

    /// Follow HTTP redirects (bounded)
    pub follow_redirects: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agents: vec![
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:89.0) Gecko/20100101 Firefox/89.0".to_string(),
            ],
            request_timeout_secs: 30,
            max_requests_per_second: 2,
            random_delay_range_ms: (500, 1500),
            respect_robots_txt: true,
            follow_redirects: true,
        }
    }
}

/// Validation thresholds applied to extracted review text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Minimum characters for a valid review
    pub min_review_length: usize,

    /// Maximum characters kept per review; longer text is truncated
    pub max_review_length: usize,

    /// Minimum characters for a text fragment to count during heuristic
    /// extraction
    pub min_fragment_length: usize,

    /// A review matching two or more distinct entries is rejected; a single
    /// match is tolerated since real reviews mention discounts and the like
    pub spam_keywords: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_review_length: 5,
            max_review_length: 5000,
            min_fragment_length: 20,
            spam_keywords: [
                "spam",
                "fake",
                "bot",
                "advertisement",
                "promo",
                "discount code",
                "click here",
                "visit our website",
                "buy now",
                "limited time",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// Logging configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Emit logs to the console
    pub console_output: bool,

    /// Also write logs to a file
    pub file_output: bool,

    /// Directory for the log file
    pub log_dir: PathBuf,

    /// Log file name
    pub log_file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: false,
            log_dir: PathBuf::from("logs"),
            log_file: "scraper.log".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budgets_match_expected_limits() {
        let config = ScraperConfig::default();
        assert_eq!(config.max_reviews_per_site, 5000);
        assert_eq!(config.validation.min_review_length, 5);
        assert_eq!(config.validation.max_review_length, 5000);
        assert_eq!(config.http.request_timeout_secs, 30);
        assert!(config.http.random_delay_range_ms.0 <= config.http.random_delay_range_ms.1);
    }

    #[test]
    fn partial_config_file_fills_in_defaults() {
        let config: ScraperConfig =
            serde_json::from_str(r#"{"max_reviews_per_site": 100}"#).unwrap();
        assert_eq!(config.max_reviews_per_site, 100);
        assert_eq!(config.default_delay_ms, 2000);
        assert!(!config.validation.spam_keywords.is_empty());
    }

    #[tokio::test]
    async fn config_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scraper.json");

        let mut config = ScraperConfig::default();
        config.max_reviews_per_site = 42;
        config.http.max_requests_per_second = 1;
        config.save(&path).await.unwrap();

        let loaded = ScraperConfig::load(&path).await.unwrap();
        assert_eq!(loaded.max_reviews_per_site, 42);
        assert_eq!(loaded.http.max_requests_per_second, 1);
    }
}
