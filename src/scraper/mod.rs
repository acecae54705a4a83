//! Competitor website scraping.
//!
//! Fetches a single page and reduces it to normalized plain text. Every
//! failure degrades to an empty string so one unreachable site never stops
//! a run.

pub mod html;

pub use html::extract_text;

use crate::config::ScraperConfig;
use anyhow::{Context, Result};
use tracing::{debug, error};

/// Fetches competitor pages with a fixed identifying User-Agent.
#[derive(Debug, Clone)]
pub struct WebScraper {
    client: reqwest::Client,
}

impl WebScraper {
    /// Create a scraper from the scraper settings.
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Fetch `url` and return its visible text.
    ///
    /// Returns an empty string on any status other than 200 or any transport or
    /// decoding failure; the failure is logged.
    pub async fn scrape(&self, url: &str) -> String {
        match self.fetch_html(url).await {
            Ok(Some(html)) => {
                let text = extract_text(&html);
                debug!("Scraped {} characters from {}", text.len(), url);
                text
            }
            Ok(None) => String::new(),
            Err(e) => {
                error!("Failed to scrape {}: {:#}", url, e);
                String::new()
            }
        }
    }

    async fn fetch_html(&self, url: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            error!("Error scraping website {}: HTTP {}", url, status);
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        Ok(Some(body))
    }
}
