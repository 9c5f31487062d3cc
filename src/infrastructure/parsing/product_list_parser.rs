//! Heuristic product extraction from listing page containers
//!
//! Fallback pass for pages without structured metadata: a prioritized cascade
//! of generic container selectors is tried in fixed order, and the first
//! selector matching at least one element wins. Each matched container is
//! sub-extracted independently; a bad container is skipped with a typed
//! reason and never aborts the page.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use super::error::{ParseError, ParseResult, SkipReason};
use super::price::parse_price;
use crate::domain::{ProductRecord, RecordSource};
use crate::infrastructure::config::{SelectorConfig, defaults};

/// Currency-marked price tokens in raw container text, e.g. "€ 2,49"
static PRICE_IN_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"€\s*\d+[.,]?\d*").expect("price-in-text pattern is valid"));

/// Parser for extracting product records from listing pages
pub struct ProductListParser {
    /// Container cascade, paired with the source pattern for reporting
    container_selectors: Vec<(String, Selector)>,
    title_selectors: Vec<Selector>,
    price_selectors: Vec<Selector>,
    description_selectors: Vec<Selector>,
    image_selectors: Vec<Selector>,
    link_selectors: Vec<Selector>,
    max_containers: usize,
}

impl ProductListParser {
    /// Create a parser with the default selector configuration
    pub fn new() -> Result<Self> {
        Self::with_config(&SelectorConfig::default(), defaults::MAX_CONTAINERS_PER_PAGE)
    }

    /// Create a parser with a custom selector configuration
    pub fn with_config(selectors: &SelectorConfig, max_containers: usize) -> Result<Self> {
        Ok(Self {
            container_selectors: Self::compile_named(&selectors.product_container)?,
            title_selectors: Self::compile(&selectors.title)?,
            price_selectors: Self::compile(&selectors.price)?,
            description_selectors: Self::compile(&selectors.description)?,
            image_selectors: Self::compile(&selectors.image)?,
            link_selectors: Self::compile(&selectors.link)?,
            max_containers,
        })
    }

    fn compile_named(patterns: &[String]) -> Result<Vec<(String, Selector)>> {
        let compiled = Self::compile_with_sources(patterns)?;
        Ok(compiled)
    }

    fn compile(patterns: &[String]) -> Result<Vec<Selector>> {
        let compiled = Self::compile_with_sources(patterns)?;
        Ok(compiled.into_iter().map(|(_, s)| s).collect())
    }

    /// Compile selector strings, dropping invalid ones with a warning.
    /// An entirely invalid list is a configuration error.
    fn compile_with_sources(patterns: &[String]) -> Result<Vec<(String, Selector)>> {
        let mut selectors = Vec::new();
        let mut errors = Vec::new();

        for pattern in patterns {
            match Selector::parse(pattern) {
                Ok(selector) => selectors.push((pattern.clone(), selector)),
                Err(e) => {
                    warn!("Failed to compile selector '{}': {}", pattern, e);
                    errors.push(format!("'{pattern}': {e}"));
                }
            }
        }

        if selectors.is_empty() {
            return Err(ParseError::InvalidSelectors {
                errors: errors.join(", "),
            }
            .into());
        }

        Ok(selectors)
    }

    /// Extract product records from a listing page.
    ///
    /// The first container selector matching at least one element is final;
    /// later patterns are not consulted even when every matched container is
    /// skipped. At most `max_containers` elements are processed.
    pub fn parse(&self, html: &Html, page_url: &str) -> ParseResult<Vec<ProductRecord>> {
        let mut tried_selectors = Vec::new();

        for (pattern, selector) in &self.container_selectors {
            tried_selectors.push(pattern.clone());

            let containers: Vec<ElementRef> = html.select(selector).collect();
            if containers.is_empty() {
                continue;
            }

            debug!(
                "Found {} containers with selector '{}' on {}",
                containers.len(),
                pattern,
                page_url
            );

            let mut records = Vec::new();
            for (index, container) in containers.iter().take(self.max_containers).enumerate() {
                match self.extract_record(container, page_url) {
                    Ok(record) => records.push(record),
                    Err(reason) => {
                        warn!("Skipping container {} on {}: {}", index, page_url, reason);
                    }
                }
            }

            debug!("Extracted {} records from {}", records.len(), page_url);
            return Ok(records);
        }

        Err(ParseError::NoProductsFound {
            url: page_url.to_string(),
            tried_selectors,
        })
    }

    /// Extract a single record from one container element
    fn extract_record(
        &self,
        container: &ElementRef,
        page_url: &str,
    ) -> Result<ProductRecord, SkipReason> {
        let title = self
            .first_text(container, &self.title_selectors)
            .ok_or(SkipReason::MissingTitle)?;

        let prices = self.collect_prices(container);
        if prices.is_empty() {
            return Err(SkipReason::MissingPrice);
        }

        let mut record = ProductRecord {
            title,
            description: self.first_text(container, &self.description_selectors),
            image: self.extract_image(container, page_url),
            link: self.extract_link(container, page_url),
            source: Some(RecordSource::Heuristic),
            ..Default::default()
        };

        // Exactly one price is the regular price; with several, the lowest is
        // the sale price and the highest the original. Bundle or multi-variant
        // pricing can defeat this heuristic.
        if prices.len() == 1 {
            record.price = Some(prices[0]);
        } else {
            record.sale_price = prices.first().copied();
            record.original_price = prices.last().copied();
        }

        Ok(record)
    }

    /// Gather distinct price values from currency-marked sub-elements,
    /// falling back to a scan of the container's raw text.
    fn collect_prices(&self, container: &ElementRef) -> Vec<f64> {
        let mut values = Vec::new();

        for selector in &self.price_selectors {
            for element in container.select(selector) {
                let text = element.text().collect::<String>();
                if !text.contains('€') {
                    continue;
                }
                if let Some(value) = parse_price(&text) {
                    values.push(value);
                }
            }
        }

        if values.is_empty() {
            let text = container.text().collect::<String>();
            for token in PRICE_IN_TEXT.find_iter(&text) {
                if let Some(value) = parse_price(token.as_str()) {
                    values.push(value);
                }
            }
        }

        // The same price often appears in several sub-elements; collapse
        // duplicates so a repeated single price is not mistaken for a pair.
        values.sort_by(f64::total_cmp);
        values.dedup();
        values
    }

    /// First non-empty text across the selector fallbacks
    fn first_text(&self, container: &ElementRef, selectors: &[Selector]) -> Option<String> {
        for selector in selectors {
            if let Some(text) = container
                .select(selector)
                .next()
                .map(|e| e.text().collect::<String>().trim().to_string())
                .filter(|text| !text.is_empty())
            {
                return Some(text);
            }
        }
        None
    }

    fn extract_image(&self, container: &ElementRef, page_url: &str) -> Option<String> {
        for selector in &self.image_selectors {
            if let Some(img) = container.select(selector).next() {
                let src = img.value().attr("src").or_else(|| img.value().attr("data-src"))?;
                return resolve_url(src, page_url);
            }
        }
        None
    }

    fn extract_link(&self, container: &ElementRef, page_url: &str) -> Option<String> {
        for selector in &self.link_selectors {
            if let Some(anchor) = container.select(selector).next() {
                let href = anchor.value().attr("href")?;
                return resolve_url(href, page_url);
            }
        }
        None
    }
}

/// Resolve a possibly-relative href against the page URL. Best effort;
/// unresolvable references yield `None` rather than an error.
pub fn resolve_url(href: &str, base_url: &str) -> Option<String> {
    let base = Url::parse(base_url).ok()?;
    base.join(href).ok().map(|u| u.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> ProductListParser {
        ProductListParser::new().unwrap()
    }

    const BASE: &str = "https://crisp.nl/onze-producten";

    #[test]
    fn parser_creation_with_defaults() {
        assert!(ProductListParser::new().is_ok());
    }

    #[test]
    fn extracts_single_price_container() {
        let html = Html::parse_document(
            r#"<div class="product-card">
                <h3>Halfvolle melk</h3>
                <span class="price">€ 1,29</span>
                <p class="description">Verse halfvolle melk van de boerderij</p>
                <a href="/product/melk"><img src="/images/melk.jpg"></a>
            </div>"#,
        );

        let records = parser().parse(&html, BASE).unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.title, "Halfvolle melk");
        assert_eq!(record.price, Some(1.29));
        assert_eq!(record.sale_price, None);
        assert_eq!(
            record.description.as_deref(),
            Some("Verse halfvolle melk van de boerderij")
        );
        assert_eq!(record.link.as_deref(), Some("https://crisp.nl/product/melk"));
        assert_eq!(record.image.as_deref(), Some("https://crisp.nl/images/melk.jpg"));
        assert_eq!(record.source, Some(RecordSource::Heuristic));
    }

    #[test]
    fn two_prices_split_into_sale_and_original() {
        let html = Html::parse_document(
            r#"<div class="product-card">
                <h3>Roomboter</h3>
                <span class="price">€ 2,49</span>
                <span class="price-old">€ 3,29</span>
            </div>"#,
        );

        let records = parser().parse(&html, BASE).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sale_price, Some(2.49));
        assert_eq!(records[0].original_price, Some(3.29));
        assert_eq!(records[0].price, None);
    }

    #[test]
    fn repeated_identical_price_stays_a_single_price() {
        let html = Html::parse_document(
            r#"<div class="product-card">
                <h3>Eieren</h3>
                <span class="price">€ 3,99</span>
                <span class="price-label">€ 3,99</span>
            </div>"#,
        );

        let records = parser().parse(&html, BASE).unwrap();
        assert_eq!(records[0].price, Some(3.99));
        assert_eq!(records[0].sale_price, None);
    }

    #[test]
    fn price_without_currency_marker_is_ignored() {
        let html = Html::parse_document(
            r#"<div class="product-card">
                <h3>Bananen</h3>
                <span class="price">per stuk</span>
                <span class="amount">6</span>
            </div>"#,
        );

        let records = parser().parse(&html, BASE).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn raw_text_scan_is_the_price_fallback() {
        let html = Html::parse_document(
            r#"<div class="product-card">
                <h3>Appels</h3>
                <p>Nu voor €2,79 per kilo</p>
            </div>"#,
        );

        let records = parser().parse(&html, BASE).unwrap();
        assert_eq!(records[0].price, Some(2.79));
    }

    #[test]
    fn container_without_title_is_skipped() {
        let html = Html::parse_document(
            r#"<div class="product-card"><span class="price">€ 1,00</span></div>
               <div class="product-card">
                 <h3>Kaas</h3><span class="price">€ 5,49</span>
               </div>"#,
        );

        let records = parser().parse(&html, BASE).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Kaas");
    }

    #[test]
    fn first_matching_cascade_pattern_wins() {
        // "[class*=product]" matches nothing here; "[class*=item]" does and
        // is final even though ".card" would match more elements.
        let html = Html::parse_document(
            r#"<div class="list-item"><h3>Melk</h3><span class="price">€ 1,29</span></div>
               <div class="card"><h3>Kaas</h3><span class="price">€ 5,49</span></div>
               <div class="card"><h3>Boter</h3><span class="price">€ 2,19</span></div>"#,
        );

        let records = parser().parse(&html, BASE).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Melk");
    }

    #[test]
    fn containers_are_capped_per_page() {
        let mut body = String::new();
        for i in 0..25 {
            body.push_str(&format!(
                r#"<div class="product-card"><h3>Product {i}</h3><span class="price">€ {i},00</span></div>"#
            ));
        }
        let html = Html::parse_document(&body);

        let records = parser().parse(&html, BASE).unwrap();
        assert_eq!(records.len(), defaults::MAX_CONTAINERS_PER_PAGE);
    }

    #[test]
    fn page_without_containers_reports_tried_selectors() {
        let html = Html::parse_document("<main><p>Geen producten</p></main>");

        match parser().parse(&html, BASE) {
            Err(ParseError::NoProductsFound { tried_selectors, .. }) => {
                assert_eq!(
                    tried_selectors.len(),
                    defaults::PRODUCT_CONTAINER_SELECTORS.len()
                );
            }
            other => panic!("expected NoProductsFound, got {other:?}"),
        }
    }

    #[test]
    fn resolves_relative_and_absolute_urls() {
        assert_eq!(
            resolve_url("/product/123", "https://crisp.nl/lijst"),
            Some("https://crisp.nl/product/123".to_string())
        );
        assert_eq!(
            resolve_url("https://cdn.crisp.nl/a.jpg", "https://crisp.nl/"),
            Some("https://cdn.crisp.nl/a.jpg".to_string())
        );
        assert_eq!(resolve_url("foo", "not a url"), None);
    }
}
