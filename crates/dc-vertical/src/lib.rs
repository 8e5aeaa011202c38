//! Vertical service-toggle cache
//!
//! Maintains which platform services are enabled for the current
//! organization and answers [`VerticalConfigStore::is_service_enabled`]
//! queries used to gate features.
//!
//! # Invariants
//!
//! - Core services are always enabled, whatever the stored lists say.
//! - A non-core service named in both the enabled and disabled lists is
//!   disabled.
//! - Backend failures never propagate out of the store; they are logged and
//!   reported through [`ToggleOutcome`], [`BulkToggleReport`] or the state's
//!   error string.
//!
//! # Example
//!
//! ```rust,ignore
//! use dc_vertical::{HttpVerticalConfigBackend, VerticalConfigStore};
//! use std::sync::Arc;
//!
//! # async fn example(api: dc_core::ApiClient) {
//! let store = VerticalConfigStore::new(Arc::new(HttpVerticalConfigBackend::new(api)));
//! store.initialize().await;
//! if store.is_service_enabled("fleet-tracking") {
//!     // show the fleet widget
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod backend;
pub mod error;
pub mod merge;
pub mod model;
pub mod store;

// Re-exports for convenience
pub use backend::{HttpVerticalConfigBackend, VerticalConfigBackend};
pub use error::VerticalError;
pub use merge::{compute_enabled, conflicting_ids};
pub use model::{
    BulkToggleRequest, OrganizationVerticalConfig, SelectVerticalRequest, ServiceCatalog,
    ServiceDefinition, ServiceTier, ServiceToggle, VerticalTemplate,
};
pub use store::{BulkToggleReport, StoreOptions, ToggleOutcome, VerticalConfigStore, VerticalState};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
