//! Domain entities for product scraping

pub mod product;

pub use product::{ProductRecord, RecordSource};
