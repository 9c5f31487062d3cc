//! Application layer: scraping orchestration and reporting

pub mod aggregator;
pub mod reporter;

pub use aggregator::Scraper;
