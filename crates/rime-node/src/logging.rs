//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Install the global subscriber. `RUST_LOG` takes precedence over the configured level.
pub fn init(logging: &LoggingConfig) {
    let make_filter = || {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(logging.level.trim()))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let installed = match logging.format {
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_env_filter(make_filter())
            .with_target(true)
            .compact()
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(make_filter())
            .with_target(true)
            .pretty()
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(make_filter())
            .with_target(true)
            .json()
            .try_init(),
    };

    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
