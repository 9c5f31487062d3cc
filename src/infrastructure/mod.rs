//! Infrastructure layer: configuration, HTTP, logging and HTML parsing

pub mod config;
pub mod http_client;
pub mod logging;
pub mod parsing;
