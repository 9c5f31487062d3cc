//! Parsing error types
//!
//! Page-level failures (`ParseError`) are separated from per-container skip
//! reasons (`SkipReason`) so tests can assert why an element was discarded.

use thiserror::Error;

/// Page-level parsing failure
#[derive(Error, Debug, Clone)]
pub enum ParseError {
    #[error("No valid selectors compiled: {errors}")]
    InvalidSelectors { errors: String },

    #[error("No product containers found on {url}")]
    NoProductsFound { url: String, tried_selectors: Vec<String> },
}

/// Why a single container element yielded no record.
///
/// One bad container never aborts the page; it is logged with its reason and
/// skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    #[error("no title found in container")]
    MissingTitle,

    #[error("no parseable price found in container")]
    MissingPrice,
}

pub type ParseResult<T> = Result<T, ParseError>;
