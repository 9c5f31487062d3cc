//! Price normalization and sale classification
//!
//! Pure text heuristics: free-text price strings become numeric values, and a
//! record is classified as "on sale" from discount markers, keyword matches
//! or the presence of both an original and a reduced price.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::ProductRecord;
use crate::infrastructure::config::SaleConfig;

/// First numeric token in a price string, after currency stripping
static PRICE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+[.,]?\d*)").expect("price token pattern is valid"));

/// Numeric discount marker, e.g. "25%"
static DISCOUNT_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)%").expect("discount marker pattern is valid"));

/// Extract a numeric price from free text.
///
/// Strips the currency symbol, normalizes comma decimal separators and takes
/// the first numeric token. Multi-price strings like "Was €19.99 Nu €14.99"
/// therefore resolve to the first value; callers that need all prices collect
/// per-element candidates instead.
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned = text.replace('€', "").replace(',', ".");
    let token = PRICE_TOKEN.captures(&cleaned)?.get(1)?;
    token.as_str().parse::<f64>().ok()
}

/// Classify whether a record is on sale.
///
/// Checked in order, first hit wins:
/// 1. a `<digits>%` marker in title+description, which also yields the
///    discount percentage;
/// 2. any configured sale keyword as a substring;
/// 3. both an original and a reduced price on the record.
pub fn classify_sale(record: &ProductRecord, config: &SaleConfig) -> (bool, Option<u32>) {
    let text = format!(
        "{} {}",
        record.title,
        record.description.as_deref().unwrap_or("")
    )
    .to_lowercase();

    if let Some(captures) = DISCOUNT_MARKER.captures(&text) {
        if let Ok(percentage) = captures[1].parse::<u32>() {
            return (true, Some(percentage));
        }
    }

    if config.keywords.iter().any(|k| text.contains(k.as_str())) {
        return (true, None);
    }

    if record.original_price.is_some() && record.sale_price.is_some() {
        return (true, None);
    }

    (false, None)
}

/// Write the classification result into the record's derived fields
pub fn apply_sale_classification(record: &mut ProductRecord, config: &SaleConfig) {
    let (on_sale, discount) = classify_sale(record, config);
    record.on_sale = on_sale;
    if discount.is_some() {
        record.discount_percentage = discount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("€ 12,50", Some(12.50))]
    #[case("€4.99", Some(4.99))]
    #[case("12,50", Some(12.50))]
    #[case("Was €19.99 Nu €14.99", Some(19.99))]
    #[case("vanaf €3", Some(3.0))]
    #[case("gratis bezorging", None)]
    #[case("", None)]
    fn parses_price_text(#[case] input: &str, #[case] expected: Option<f64>) {
        assert_eq!(parse_price(input), expected);
    }

    #[test]
    fn parse_price_is_idempotent_on_formatted_output() {
        for text in ["€ 12,50", "€4.99", "1,5"] {
            let value = parse_price(text).unwrap();
            let formatted = format!("{value:.2}");
            assert_eq!(parse_price(&formatted), Some(value));
        }
    }

    #[test]
    fn parse_price_returns_none_without_digits() {
        for text in ["€", "prijs onbekend", "--", "   "] {
            assert_eq!(parse_price(text), None);
        }
    }

    fn record(title: &str, description: Option<&str>) -> ProductRecord {
        ProductRecord {
            title: title.to_string(),
            description: description.map(str::to_string),
            price: Some(9.99),
            ..Default::default()
        }
    }

    #[test]
    fn discount_marker_short_circuits_and_sets_percentage() {
        let config = SaleConfig::default();
        let r = record("Kaas 25% korting", None);
        assert_eq!(classify_sale(&r, &config), (true, Some(25)));

        // Marker wins even without any keyword configured
        let bare = SaleConfig { keywords: vec![] };
        assert_eq!(classify_sale(&r, &bare), (true, Some(25)));
    }

    #[test]
    fn keyword_match_classifies_without_percentage() {
        let config = SaleConfig::default();
        let r = record("Verse melk", Some("Deze week in de aanbieding"));
        assert_eq!(classify_sale(&r, &config), (true, None));
    }

    #[test]
    fn price_pair_classifies_when_text_is_neutral() {
        let config = SaleConfig::default();
        let mut r = record("Roomboter", None);
        r.sale_price = Some(2.49);
        r.original_price = Some(3.29);
        assert_eq!(classify_sale(&r, &config), (true, None));
    }

    #[test]
    fn neutral_record_is_not_on_sale() {
        let config = SaleConfig::default();
        let r = record("Roomboter", Some("Vers gekarnde boter"));
        assert_eq!(classify_sale(&r, &config), (false, None));
    }

    #[test]
    fn apply_writes_derived_fields() {
        let config = SaleConfig::default();
        let mut r = record("Yoghurt 10% korting", None);
        apply_sale_classification(&mut r, &config);
        assert!(r.on_sale);
        assert_eq!(r.discount_percentage, Some(10));
    }
}
