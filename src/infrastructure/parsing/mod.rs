//! HTML parsing infrastructure
//!
//! Two extraction passes over a fetched page: embedded JSON-LD product
//! metadata first, then a heuristic container selector cascade. Price
//! normalization and sale classification live in `price`.

pub mod error;
pub mod price;
pub mod product_list_parser;
pub mod structured_data;

pub use error::{ParseError, ParseResult, SkipReason};
pub use product_list_parser::ProductListParser;
