//! Reporting: sale selection, CSV export and console summary
//!
//! The final pipeline stage. All records get classified so the full CSV
//! carries an accurate `on_sale` column; the sale subset is sorted by best
//! discount first, cheapest first within equal discounts.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::info;

use crate::domain::ProductRecord;
use crate::infrastructure::config::SaleConfig;
use crate::infrastructure::parsing::price::apply_sale_classification;

/// Maximum description length in the console summary
const SUMMARY_DESCRIPTION_CHARS: usize = 100;

/// Classify every record, writing `on_sale` and `discount_percentage`
pub fn classify_records(records: &mut [ProductRecord], config: &SaleConfig) {
    for record in records.iter_mut() {
        apply_sale_classification(record, config);
    }
}

/// Select the sale subset, sorted by descending discount percentage
/// (missing counts as 0), then ascending best-available price.
///
/// The sort is stable: records with equal keys keep their input order.
pub fn select_on_sale(records: &[ProductRecord]) -> Vec<ProductRecord> {
    let mut sale: Vec<ProductRecord> =
        records.iter().filter(|r| r.on_sale).cloned().collect();

    sale.sort_by(|a, b| {
        let discount_a = a.discount_percentage.unwrap_or(0);
        let discount_b = b.discount_percentage.unwrap_or(0);
        discount_b.cmp(&discount_a).then_with(|| {
            let price_a = a.best_price().unwrap_or(f64::MAX);
            let price_b = b.best_price().unwrap_or(f64::MAX);
            price_a.total_cmp(&price_b)
        })
    });

    sale
}

/// Timestamped default output path, e.g. `crisp_products_20260828_153000.csv`
pub fn default_output_path(prefix: &str) -> String {
    format!("{}_{}.csv", prefix, Local::now().format("%Y%m%d_%H%M%S"))
}

/// Write records to a CSV file with the fixed column order
/// (title, price, sale_price, original_price, discount_percentage,
/// description, link, image, on_sale, source). Missing fields render empty.
pub fn write_csv(records: &[ProductRecord], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

    for record in records {
        writer
            .serialize(record)
            .with_context(|| format!("Failed to write record '{}'", record.title))?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush CSV file: {}", path.display()))?;

    info!("Saved {} products to {}", records.len(), path.display());
    Ok(())
}

/// Print a human-readable summary of sale products, capped at `limit`
pub fn print_sale_summary(sale_products: &[ProductRecord], limit: usize) {
    if sale_products.is_empty() {
        println!("❌ No products on sale found!");
        return;
    }

    println!("\n🎉 Found {} products on sale!", sale_products.len());
    println!("{}", "=".repeat(80));

    for (i, product) in sale_products.iter().take(limit).enumerate() {
        println!("\n{}. {}", i + 1, product.title);

        if let Some(discount) = product.discount_percentage {
            println!("   💰 {discount}% KORTING!");
        }

        match (product.sale_price, product.original_price) {
            (Some(sale), Some(original)) => {
                let savings = original - sale;
                println!("   💸 Was: €{original:.2} → Nu: €{sale:.2} (bespaar €{savings:.2})");
            }
            _ => {
                if let Some(price) = product.price {
                    println!("   💰 Prijs: €{price:.2}");
                }
            }
        }

        if let Some(description) = &product.description {
            println!("   📝 {}", truncate(description, SUMMARY_DESCRIPTION_CHARS));
        }

        if let Some(link) = &product.link {
            println!("   🔗 {link}");
        }
    }

    if sale_products.len() > limit {
        println!("\n... en nog {} meer!", sale_products.len() - limit);
    }
}

/// Operator guidance when a run produced nothing at all
pub fn print_no_products_notice(base_url: &str) {
    println!("❌ No products found. The structure of {base_url} might have changed.");
    println!("💡 Check whether the site requires app access or blocks scraping.");
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecordSource;

    fn record(title: &str) -> ProductRecord {
        ProductRecord {
            title: title.to_string(),
            price: Some(1.0),
            ..Default::default()
        }
    }

    #[test]
    fn selection_is_a_subset_of_on_sale_records() {
        let mut a = record("A");
        a.on_sale = true;
        let b = record("B");
        let mut c = record("C");
        c.on_sale = true;

        let sale = select_on_sale(&[a, b, c]);
        assert_eq!(sale.len(), 2);
        assert!(sale.iter().all(|r| r.on_sale));
    }

    #[test]
    fn sorts_by_discount_then_price() {
        let mut cheap_no_discount = record("cheap");
        cheap_no_discount.on_sale = true;
        cheap_no_discount.price = Some(0.99);

        let mut big_discount = record("big");
        big_discount.on_sale = true;
        big_discount.discount_percentage = Some(50);
        big_discount.price = Some(10.0);

        let mut small_discount = record("small");
        small_discount.on_sale = true;
        small_discount.discount_percentage = Some(10);
        small_discount.price = Some(5.0);

        let sale = select_on_sale(&[cheap_no_discount, big_discount, small_discount]);
        let titles: Vec<&str> = sale.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["big", "small", "cheap"]);
    }

    #[test]
    fn equal_keys_preserve_input_order() {
        let mut first = record("first");
        first.on_sale = true;
        first.discount_percentage = Some(20);
        first.price = Some(2.0);

        let mut second = record("second");
        second.on_sale = true;
        second.discount_percentage = Some(20);
        second.price = Some(2.0);

        let sale = select_on_sale(&[first, second]);
        let titles: Vec<&str> = sale.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second"]);
    }

    #[test]
    fn sale_price_fallback_orders_after_regular_price() {
        let mut with_price = record("regular");
        with_price.on_sale = true;
        with_price.price = Some(1.50);

        let mut with_sale_price = record("sale-only");
        with_sale_price.on_sale = true;
        with_sale_price.price = None;
        with_sale_price.sale_price = Some(1.00);

        let sale = select_on_sale(&[with_price, with_sale_price]);
        let titles: Vec<&str> = sale.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["sale-only", "regular"]);
    }

    #[test]
    fn csv_has_fixed_header_and_empty_optionals() {
        let mut full = record("Volle yoghurt");
        full.sale_price = Some(2.49);
        full.original_price = Some(3.29);
        full.discount_percentage = Some(24);
        full.on_sale = true;
        full.source = Some(RecordSource::StructuredData);

        let sparse = record("Melk");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.csv");
        write_csv(&[full, sparse], &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "title,price,sale_price,original_price,discount_percentage,\
             description,link,image,on_sale,source"
        );
        assert_eq!(
            lines.next().unwrap(),
            "Volle yoghurt,1.0,2.49,3.29,24,,,,true,structured-data"
        );
        assert_eq!(lines.next().unwrap(), "Melk,1.0,,,,,,,false,");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("kort", 10), "kort");
        let long = "a".repeat(150);
        let cut = truncate(&long, 100);
        assert_eq!(cut.chars().count(), 103);
        assert!(cut.ends_with("..."));
    }
}
