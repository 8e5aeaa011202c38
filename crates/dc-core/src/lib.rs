//! Datacendia Core
//!
//! Shared plumbing for the client-side services:
//! - REST client with base URL, auth header and response envelope handling
//! - Session and settings endpoint mappers
//! - Keyed deterministic numbers and pure "live" metric drift
//! - Tracing subscriber setup
//!
//! # Example
//!
//! ```rust,ignore
//! use dc_core::{ApiClient, ClientConfig, SessionClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = ApiClient::new(ClientConfig::new().with_env_overrides())?;
//! let session = SessionClient::new(api).bootstrap().await?;
//! println!("signed in to {}", session.organization.name);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod api;
pub mod config;
pub mod error;
pub mod live;
pub mod logging;
pub mod rng;
pub mod session;
pub mod settings;

// Re-exports for convenience
pub use api::{ApiClient, ApiEnvelope};
pub use config::ClientConfig;
pub use error::{ApiError, ApiResult};
pub use live::LiveMetric;
pub use logging::{init_tracing, init_tracing_with, LogOptions, LoggingError};
pub use rng::{deterministic_float, deterministic_int, DeterministicRng};
pub use session::{CurrentUser, Organization, Session, SessionClient};
pub use settings::{OrganizationSettings, OrganizationSettingsPatch, Preferences, SettingsClient, UserSummary};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
