//! JSON-LD structured product metadata extraction
//!
//! Pages that embed schema.org `Product` declarations are the most reliable
//! source, so this pass runs before the heuristic selector cascade. Malformed
//! blocks are skipped silently; they are common in the wild and not an error.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use super::price::parse_price;
use crate::domain::{ProductRecord, RecordSource};

static JSON_LD_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("json-ld selector is valid")
});

/// Extract product records from embedded JSON-LD blocks.
///
/// Only top-level objects declaring `@type: "Product"` are considered. The
/// page URL becomes the record link since JSON-LD blocks describe the page
/// they are embedded in.
pub fn extract(html: &Html, page_url: &str) -> Vec<ProductRecord> {
    let mut records = Vec::new();

    for script in html.select(&JSON_LD_SELECTOR) {
        let raw = script.text().collect::<String>();
        let data: Value = match serde_json::from_str(raw.trim()) {
            Ok(data) => data,
            Err(e) => {
                debug!("Skipping malformed JSON-LD block: {}", e);
                continue;
            }
        };

        if data.get("@type").and_then(Value::as_str) != Some("Product") {
            continue;
        }

        let record = ProductRecord {
            title: data
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim()
                .to_string(),
            description: data
                .get("description")
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string()),
            price: offer_price(&data),
            link: Some(page_url.to_string()),
            source: Some(RecordSource::StructuredData),
            ..Default::default()
        };

        if record.is_valid() {
            records.push(record);
        } else {
            debug!("Skipping incomplete JSON-LD product (missing name or price)");
        }
    }

    records
}

/// Pull `offers.price` out of a Product block; both string and numeric
/// representations appear in practice.
fn offer_price(data: &Value) -> Option<f64> {
    match data.get("offers")?.get("price")? {
        Value::String(s) => parse_price(s),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}
