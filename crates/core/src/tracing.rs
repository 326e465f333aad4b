//! Native tracing initialization
//!
//! Browser builds install their console subscriber in
//! `unify-frontend-common` instead.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level filter (e.g., "info", "debug", "unify_core=trace")
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}

impl LogConfig {
    /// Verbose configuration for local development
    pub fn dev() -> Self {
        Self {
            log_level: "debug".to_string(),
            json: false,
        }
    }
}

/// Initialize tracing with the given configuration
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(config: &LogConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()?;
    }

    Ok(())
}

/// Initialize with the default configuration
pub fn init_default() -> Result<()> {
    init_tracing(&LogConfig::default())
}
