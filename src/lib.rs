//! Crisp.nl product scraper - find products on sale
//!
//! Sequential scraping pipeline: listing page discovery, heuristic product
//! extraction, sale classification and CSV reporting.

pub mod application;
pub mod domain;
pub mod infrastructure;
