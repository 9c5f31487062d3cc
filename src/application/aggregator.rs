//! Scraping orchestration
//!
//! Drives the fetch/extract pipeline across a small, capped set of listing
//! pages: category discovery from the listing root, a sequential per-page
//! loop with a cooperative inter-page delay, and order-preserving
//! deduplication by title. One failing page never stops the run, and a
//! cancellation token lets an operator interrupt proceed straight to
//! reporting whatever was accumulated.

use std::collections::HashSet;

use anyhow::Result;
use scraper::{Html, Selector};
use tokio::time::{Duration, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::domain::ProductRecord;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::http_client::{HttpClient, HttpClientConfig};
use crate::infrastructure::parsing::{ParseError, ProductListParser, structured_data};
use crate::infrastructure::parsing::product_list_parser::resolve_url;

/// Sequential product scraper for one site
pub struct Scraper {
    http: HttpClient,
    parser: ProductListParser,
    config: AppConfig,
}

impl Scraper {
    /// Build a scraper from the application configuration
    pub fn new(config: AppConfig) -> Result<Self> {
        let http = HttpClient::with_config(HttpClientConfig::from_crawl_config(&config.crawl))?;
        let parser = ProductListParser::with_config(
            &config.selectors,
            config.crawl.max_containers_per_page,
        )?;

        Ok(Self {
            http,
            parser,
            config,
        })
    }

    /// Find listing pages to scrape: the seeds plus category links discovered
    /// on the listing root, capped at `max_pages`.
    pub async fn discover_listing_pages(&self, token: &CancellationToken) -> Vec<String> {
        let listing_url = self.config.crawl.listing_url();
        let base_url = &self.config.crawl.base_url;
        let mut urls = vec![listing_url.clone(), format!("{base_url}/")];

        match self
            .http
            .fetch_html_string_with_cancellation(&listing_url, token)
            .await
        {
            Ok(body) => {
                let html = Html::parse_document(&body);
                for link in extract_category_links(
                    &html,
                    &listing_url,
                    &self.config.crawl.category_keywords,
                ) {
                    if !urls.contains(&link) {
                        urls.push(link);
                    }
                }
            }
            Err(e) => {
                warn!("Category discovery failed, using seed URLs only: {}", e);
            }
        }

        urls.truncate(self.config.crawl.max_pages);
        info!("Discovered {} listing pages to scrape", urls.len());
        urls
    }

    /// Scrape a single listing page. A fetch failure or an unrecognized page
    /// structure yields zero records; the caller's loop continues.
    pub async fn scrape_page(&self, url: &str, token: &CancellationToken) -> Vec<ProductRecord> {
        info!("Scraping: {}", url);

        let body = match self.http.fetch_html_string_with_cancellation(url, token).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Page unavailable, skipping {}: {}", url, e);
                return Vec::new();
            }
        };

        let html = Html::parse_document(&body);

        // Structured metadata is authoritative when present; the selector
        // cascade is only consulted when it yields nothing.
        let records = structured_data::extract(&html, url);
        if !records.is_empty() {
            info!("Extracted {} structured-data records from {}", records.len(), url);
            return records;
        }

        match self.parser.parse(&html, url) {
            Ok(records) => records,
            Err(ParseError::NoProductsFound { tried_selectors, .. }) => {
                info!(
                    "No product containers on {} (tried {} selectors)",
                    url,
                    tried_selectors.len()
                );
                Vec::new()
            }
            Err(e) => {
                warn!("Failed to parse {}: {}", url, e);
                Vec::new()
            }
        }
    }

    /// Run the full pipeline: discovery, sequential page scraping with the
    /// configured delay, then dedup by title (first occurrence wins).
    pub async fn scrape_all(&self, token: &CancellationToken) -> Vec<ProductRecord> {
        let urls = self.discover_listing_pages(token).await;
        let delay = Duration::from_millis(self.config.crawl.request_delay_ms);
        let mut all_records = Vec::new();

        for (index, url) in urls.iter().enumerate() {
            if token.is_cancelled() {
                info!("Scrape interrupted, keeping {} records", all_records.len());
                break;
            }

            let records = self.scrape_page(url, token).await;
            all_records.extend(records);

            // Cooperative rate limit between pages, not after the last one
            if index + 1 < urls.len() {
                tokio::select! {
                    () = sleep(delay) => {}
                    () = token.cancelled() => {
                        info!("Scrape interrupted, keeping {} records", all_records.len());
                        break;
                    }
                }
            }
        }

        let unique = dedup_by_title(all_records);
        info!("Found {} unique products", unique.len());
        unique
    }
}

/// Collect absolute links whose href contains a category keyword
pub fn extract_category_links(html: &Html, base_url: &str, keywords: &[String]) -> Vec<String> {
    let anchor = Selector::parse("a[href]").expect("anchor selector is valid");
    let mut links = Vec::new();

    for element in html.select(&anchor) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href_lower = href.to_lowercase();
        if !keywords.iter().any(|k| href_lower.contains(k.as_str())) {
            continue;
        }
        if let Some(absolute) = resolve_url(href, base_url) {
            if !links.contains(&absolute) {
                links.push(absolute);
            }
        }
    }

    links
}

/// Keep the first record encountered for each distinct title, preserving order
pub fn dedup_by_title(records: Vec<ProductRecord>) -> Vec<ProductRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.title.clone()))
        .collect()
}
