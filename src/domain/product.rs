//! Product record entity
//!
//! The single entity flowing through the pipeline: created by the extractor,
//! enriched by sale classification, filtered by dedup and reporting.

use serde::{Deserialize, Serialize};

/// Where a record was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordSource {
    /// Built from an embedded JSON-LD `Product` block.
    StructuredData,
    /// Built from the generic container selector cascade.
    Heuristic,
}

/// A single product scraped from a listing page.
///
/// Field order matches the CSV column order: title, price, sale_price,
/// original_price, discount_percentage, description, link, image, on_sale,
/// source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Product title; the dedup key. A record without a title is invalid.
    pub title: String,

    /// Single observed price, when exactly one was found.
    pub price: Option<f64>,

    /// Reduced price, when two or more prices were found (minimum).
    pub sale_price: Option<f64>,

    /// Pre-discount price, when two or more prices were found (maximum).
    pub original_price: Option<f64>,

    /// Discount percentage parsed from the record text, set by classification.
    pub discount_percentage: Option<u32>,

    pub description: Option<String>,

    /// Absolute URL to the product page.
    pub link: Option<String>,

    /// Absolute URL to the product image.
    pub image: Option<String>,

    /// Derived sale flag, set by classification. Never observed directly.
    pub on_sale: bool,

    pub source: Option<RecordSource>,
}

impl ProductRecord {
    /// A record survives extraction only with a title and at least one price.
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty() && (self.price.is_some() || self.sale_price.is_some())
    }

    /// Best available price: regular price, falling back to the sale price.
    pub fn best_price(&self) -> Option<f64> {
        self.price.or(self.sale_price)
    }
}
