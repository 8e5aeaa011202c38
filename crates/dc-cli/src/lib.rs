//! Datacendia command-line front end
//!
//! Configuration loading and the bodies of the `datacendia` subcommands.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod commands;
pub mod config;

// Re-exports for convenience
pub use config::{AppConfig, AppConfigError, DemoSettings, DEFAULT_CONFIG_FILE};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
