//! One-shot scrape runner
//!
//! Scrapes a single seed URL and prints the normalized reviews as JSON.
//! Ctrl-C cancels the crawl cleanly and prints whatever was collected.

use anyhow::Result;
use tracing::{error, info};

use review_pulse::infrastructure::logging::init_logging_with_config;
use review_pulse::{ScrapeService, ScraperConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(seed_url) = args.next() else {
        eprintln!("usage: scrape_reviews <url> [max_pages]");
        std::process::exit(2);
    };
    let max_pages: u32 = args
        .next()
        .and_then(|value| value.parse().ok())
        .unwrap_or(10);

    let config = ScraperConfig::default();
    init_logging_with_config(&config.logging)?;

    let service = ScrapeService::new(config)?;

    let token = service.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping after the current page");
            token.cancel();
        }
    });

    match service.scrape(&seed_url, max_pages).await {
        Ok(outcome) => {
            info!(
                "Collected {} review(s) from {} page(s) ({} failed)",
                outcome.reviews.len(),
                outcome.pages_fetched,
                outcome.pages_failed
            );
            println!("{}", serde_json::to_string_pretty(&outcome.reviews)?);
            Ok(())
        }
        Err(error) => {
            error!("Scrape failed: {}", error);
            std::process::exit(1);
        }
    }
}
