//! Tracing setup.
//!
//! The engine only emits `tracing` events; hosts that want them printed call
//! [`init_tracing`] once at startup.
//!
//! # Usage
//!
//! ```rust,ignore
//! use analytics_engine::config::load_settings;
//! use analytics_engine::telemetry::init_tracing;
//!
//! let settings = load_settings(None)?;
//! init_tracing(&settings.logging);
//! ```

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use crate::config::LoggingConfig;

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Returns `false`
/// when a global subscriber was already installed.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let span_events = if config.include_spans {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_span_events(span_events);

    let installed = if config.is_json() {
        builder.json().with_current_span(config.include_spans).try_init()
    } else {
        builder.pretty().try_init()
    };

    match installed {
        Ok(()) => {
            tracing::debug!(
                level = %config.level,
                format = %config.format,
                "Tracing initialized"
            );
            true
        }
        Err(_) => false,
    }
}
