//! Configuration infrastructure
//!
//! All tunables the scraper embeds as behavior live here as named fields with
//! documented defaults: crawl limits, retry policy, the selector cascade and
//! the sale keyword list. Loaded from a JSON file under the user config
//! directory, created with defaults on first run.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Fetching and crawl-loop settings
    pub crawl: CrawlConfig,

    /// CSS selector cascade for heuristic extraction
    pub selectors: SelectorConfig,

    /// Sale classification settings
    pub sale: SaleConfig,

    /// Output file and console settings
    pub output: OutputConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Fetching and crawl-loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Base site URL
    pub base_url: String,

    /// Path of the known listing root, joined to `base_url`
    pub listing_path: String,

    /// User agent sent with every request
    pub user_agent: String,

    /// Accept-Language header value
    pub accept_language: String,

    /// Per-request timeout in seconds
    pub request_timeout_seconds: u64,

    /// Retry attempts for failed requests
    pub max_retries: u32,

    /// Base delay for exponential retry backoff, in milliseconds
    pub retry_base_delay_ms: u64,

    /// Delay between page fetches in milliseconds (cooperative rate limit)
    pub request_delay_ms: u64,

    /// Maximum number of listing pages to visit in one run
    pub max_pages: usize,

    /// Maximum containers processed per page
    pub max_containers_per_page: usize,

    /// Href substrings that mark a link as a category/listing page
    pub category_keywords: Vec<String>,
}

/// CSS selectors for heuristic product extraction - multiple fallbacks each
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Container cascade, tried in order; first selector that matches wins
    pub product_container: Vec<String>,

    /// Selectors for the product title, tried in order
    pub title: Vec<String>,

    /// Selectors for price-bearing sub-elements
    pub price: Vec<String>,

    /// Selectors for the product description
    pub description: Vec<String>,

    /// Selectors for the product image
    pub image: Vec<String>,

    /// Selectors for the product detail link
    pub link: Vec<String>,
}

/// Sale classification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleConfig {
    /// Substrings that mark a product text as a sale offer.
    /// Locale-specific (Dutch by default); swappable, not core logic.
    pub keywords: Vec<String>,
}

/// Output file and console settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Override for the full product CSV path; timestamped default when unset
    pub products_file: Option<String>,

    /// Override for the sale-only CSV path; timestamped default when unset
    pub sale_file: Option<String>,

    /// Prefix for timestamped default file names
    pub file_prefix: String,

    /// Maximum sale items printed in the console summary
    pub console_limit: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Module-specific log level filters (e.g. "hyper": "warn")
    pub module_filters: HashMap<String, String>,
}

/// Default values for all configuration fields
pub mod defaults {
    pub const BASE_URL: &str = "https://crisp.nl";
    pub const LISTING_PATH: &str = "/onze-producten";
    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
        AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
    pub const ACCEPT_LANGUAGE: &str = "nl-NL,nl;q=0.9,en;q=0.8";
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 10;
    pub const MAX_RETRIES: u32 = 3;
    pub const RETRY_BASE_DELAY_MS: u64 = 1000;
    pub const REQUEST_DELAY_MS: u64 = 1000;
    pub const MAX_PAGES: usize = 5;
    pub const MAX_CONTAINERS_PER_PAGE: usize = 10;
    pub const CATEGORY_KEYWORDS: &[&str] = &["product", "categorie", "category"];

    pub const PRODUCT_CONTAINER_SELECTORS: &[&str] = &[
        "[class*=\"product\"]",
        "[class*=\"item\"]",
        "[data-testid*=\"product\"]",
        "article",
        ".card",
        "[class*=\"tile\"]",
    ];
    pub const TITLE_SELECTORS: &[&str] = &[
        "h1",
        "h2",
        "h3",
        "h4",
        "h5",
        "h6",
        "[class*=\"title\"]",
        "[class*=\"name\"]",
        "[data-testid*=\"title\"]",
        "[data-testid*=\"name\"]",
    ];
    pub const PRICE_SELECTORS: &[&str] = &[
        "[class*=\"price\"]",
        "[class*=\"cost\"]",
        "[class*=\"amount\"]",
        "[data-testid*=\"price\"]",
    ];
    pub const DESCRIPTION_SELECTORS: &[&str] = &[
        "[class*=\"description\"]",
        "[class*=\"desc\"]",
        "[class*=\"summary\"]",
    ];
    pub const IMAGE_SELECTORS: &[&str] = &["img"];
    pub const LINK_SELECTORS: &[&str] = &["a[href]"];

    pub const SALE_KEYWORDS: &[&str] = &[
        "korting",
        "sale",
        "aanbieding",
        "actie",
        "voordeel",
        "nu voor",
        "was",
        "bespaar",
        "nu",
        "%",
    ];

    pub const FILE_PREFIX: &str = "crisp_products";
    pub const CONSOLE_LIMIT: usize = 20;
    pub const LOG_LEVEL: &str = "info";
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| (*s).to_string()).collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            crawl: CrawlConfig::default(),
            selectors: SelectorConfig::default(),
            sale: SaleConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::BASE_URL.to_string(),
            listing_path: defaults::LISTING_PATH.to_string(),
            user_agent: defaults::USER_AGENT.to_string(),
            accept_language: defaults::ACCEPT_LANGUAGE.to_string(),
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_retries: defaults::MAX_RETRIES,
            retry_base_delay_ms: defaults::RETRY_BASE_DELAY_MS,
            request_delay_ms: defaults::REQUEST_DELAY_MS,
            max_pages: defaults::MAX_PAGES,
            max_containers_per_page: defaults::MAX_CONTAINERS_PER_PAGE,
            category_keywords: owned(defaults::CATEGORY_KEYWORDS),
        }
    }
}

impl CrawlConfig {
    /// The listing root URL used for discovery.
    pub fn listing_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.listing_path
        )
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            product_container: owned(defaults::PRODUCT_CONTAINER_SELECTORS),
            title: owned(defaults::TITLE_SELECTORS),
            price: owned(defaults::PRICE_SELECTORS),
            description: owned(defaults::DESCRIPTION_SELECTORS),
            image: owned(defaults::IMAGE_SELECTORS),
            link: owned(defaults::LINK_SELECTORS),
        }
    }
}

impl Default for SaleConfig {
    fn default() -> Self {
        Self {
            keywords: owned(defaults::SALE_KEYWORDS),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            products_file: None,
            sale_file: None,
            file_prefix: defaults::FILE_PREFIX.to_string(),
            console_limit: defaults::CONSOLE_LIMIT,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("hyper".to_string(), "warn".to_string());
                filters.insert("reqwest".to_string(), "warn".to_string());
                filters.insert("html5ever".to_string(), "error".to_string());
                filters
            },
        }
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join("crisp-scraper");
        Ok(config_dir)
    }

    /// Create a configuration manager pointing at the default config path
    pub fn new() -> Result<Self> {
        let config_path = Self::config_dir()?.join("config.json");
        Ok(Self { config_path })
    }

    /// Create a configuration manager with an explicit path
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Load configuration from file, creating the default if it doesn't exist
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!(
                "Configuration file not found, creating default: {:?}",
                self.config_path
            );
            let default_config = AppConfig::default();
            self.save_config(&default_config).await?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .context("Failed to read configuration file")?;

        let config: AppConfig =
            serde_json::from_str(&content).context("Failed to parse configuration file")?;

        info!("Loaded configuration from: {:?}", self.config_path);
        Ok(config)
    }

    /// Save configuration to file, creating the directory if needed
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create config directory")?;
            }
        }

        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        Ok(())
    }
}
