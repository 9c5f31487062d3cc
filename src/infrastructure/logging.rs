//! Logging system initialization
//!
//! Console logging via tracing-subscriber, with the level and per-module
//! filters taken from the configuration file. `RUST_LOG` overrides both.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub use crate::infrastructure::config::LoggingConfig;

/// Initialize the logging system from the given configuration
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(env_directives) => EnvFilter::new(env_directives),
        Err(_) => {
            let mut directives = config.level.clone();
            for (module, level) in &config.module_filters {
                directives.push_str(&format!(",{module}={level}"));
            }
            EnvFilter::new(directives)
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
