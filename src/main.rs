//! Crisp.nl product scraper CLI
//!
//! Sequential run: load config, discover listing pages, scrape, classify,
//! write the full and sale-only CSV files and print a summary. Ctrl-C stops
//! scraping and reports whatever was collected so far.

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crisp_scraper::application::{Scraper, reporter};
use crisp_scraper::infrastructure::config::{AppConfig, ConfigManager};
use crisp_scraper::infrastructure::logging::init_logging;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            error!("Unexpected error: {:#}", e);
            eprintln!("❌ An error occurred: {e:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

async fn run() -> Result<()> {
    let config = load_config().await;
    init_logging(&config.logging)?;

    // Ctrl-C cancels the scrape loop; the run then proceeds to reporting.
    let token = CancellationToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\n⏹️  Scraping interrupted by user");
            signal_token.cancel();
        }
    });

    println!("🔍 Searching for products at {}...", config.crawl.base_url);

    let scraper = Scraper::new(config.clone())?;
    let mut products = scraper.scrape_all(&token).await;

    if products.is_empty() {
        reporter::print_no_products_notice(&config.crawl.base_url);
        return Ok(());
    }

    reporter::classify_records(&mut products, &config.sale);

    let products_path = config
        .output
        .products_file
        .clone()
        .unwrap_or_else(|| reporter::default_output_path(&config.output.file_prefix));
    reporter::write_csv(&products, &products_path)?;
    println!("📊 All products saved to: {products_path}");

    let sale_products = reporter::select_on_sale(&products);
    reporter::print_sale_summary(&sale_products, config.output.console_limit);

    if !sale_products.is_empty() {
        let sale_path = config.output.sale_file.clone().unwrap_or_else(|| {
            reporter::default_output_path(&format!("{}_sale", config.output.file_prefix))
        });
        reporter::write_csv(&sale_products, &sale_path)?;
        println!("🏷️  Sale products saved to: {sale_path}");
    }

    Ok(())
}

/// Load the config file, falling back to defaults when it cannot be read
async fn load_config() -> AppConfig {
    match ConfigManager::new() {
        Ok(manager) => match manager.load_config().await {
            Ok(config) => config,
            Err(e) => {
                eprintln!("⚠️  Could not load configuration ({e:#}), using defaults");
                AppConfig::default()
            }
        },
        Err(e) => {
            eprintln!("⚠️  Could not locate config directory ({e:#}), using defaults");
            AppConfig::default()
        }
    }
}
