//! Tracing subscriber setup
//!
//! `RUST_LOG` takes precedence over the configured filter. An extra layer
//! (the auto-heal capture layer, for instance) can be stacked underneath the
//! formatter.

use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Extra layer stacked on the registry
pub type ExtraLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Logging options, usually read from the `[logging]` config table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogOptions {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

/// Errors while installing the global subscriber
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// The filter directive did not parse
    #[error("invalid log filter '{filter}': {message}")]
    InvalidFilter {
        /// Offending directive
        filter: String,
        /// Parser message
        message: String,
    },

    /// A global subscriber is already set
    #[error("tracing already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Build the filter from `RUST_LOG` or the configured directive
///
/// # Errors
/// Returns `LoggingError::InvalidFilter` if the configured directive is invalid.
pub fn build_filter(options: &LogOptions) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&options.filter).map_err(|e| LoggingError::InvalidFilter {
        filter: options.filter.clone(),
        message: e.to_string(),
    })
}

/// Install the global subscriber
///
/// # Errors
/// Invalid filter, or a subscriber was already installed.
pub fn init_tracing(options: &LogOptions) -> Result<(), LoggingError> {
    init_tracing_with(options, None)
}

/// Install the global subscriber with an extra layer
///
/// # Errors
/// Invalid filter, or a subscriber was already installed.
pub fn init_tracing_with(
    options: &LogOptions,
    extra: Option<ExtraLayer>,
) -> Result<(), LoggingError> {
    let filter = build_filter(options)?;

    let (plain, json) = if options.json {
        (None, Some(fmt::layer().json().with_target(true)))
    } else {
        (Some(fmt::layer().with_target(true)), None)
    };

    tracing_subscriber::registry()
        .with(extra)
        .with(filter)
        .with(plain)
        .with(json)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_filter_is_reported() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let options = LogOptions {
            filter: "dc_core=notalevel".to_string(),
            json: false,
        };
        assert!(matches!(
            build_filter(&options),
            Err(LoggingError::InvalidFilter { .. })
        ));
    }

    #[test]
    fn default_options() {
        let options = LogOptions::default();
        assert_eq!(options.filter, "info");
        assert!(!options.json);
    }
}
