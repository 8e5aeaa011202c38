//! Vertical service-toggle cache
//!
//! Holds the enabled service set for the current organization and keeps it
//! in step with the backend. Backend failures never propagate: they are
//! logged, stored as the state's error string, and reported through the
//! returned outcome.

use crate::backend::VerticalConfigBackend;
use crate::error::VerticalError;
use crate::merge::{compute_enabled, conflicting_ids};
use crate::model::{
    BulkToggleRequest, OrganizationVerticalConfig, SelectVerticalRequest, ServiceCatalog,
    ServiceDefinition, ServiceToggle, VerticalTemplate,
};
use moka::future::Cache;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

const CATALOG_KEY: &str = "catalog";
const VERTICALS_KEY: &str = "verticals";

/// Store tuning, usually read from the `[vertical]` config table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// How long a fetched catalog or template list is reused
    pub catalog_ttl_secs: u64,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            catalog_ttl_secs: 300,
        }
    }
}

/// Snapshot of the cache state
#[derive(Debug, Clone, Default)]
pub struct VerticalState {
    /// Service catalog
    pub catalog: Arc<ServiceCatalog>,
    /// Vertical templates
    pub verticals: Arc<Vec<VerticalTemplate>>,
    /// Organization config, once loaded
    pub config: Option<OrganizationVerticalConfig>,
    /// Effective enabled service ids
    pub enabled: BTreeSet<String>,
    /// A load is in flight
    pub loading: bool,
    /// Last backend failure, cleared by the next success
    pub error: Option<String>,
}

/// Result of a single toggle
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    /// Backend accepted; local state updated from the returned config
    Applied(OrganizationVerticalConfig),
    /// Core services cannot be toggled; nothing was sent
    CoreLocked,
    /// Backend call failed; local state unchanged
    Failed(String),
}

impl ToggleOutcome {
    /// Whether the toggle took effect
    #[inline]
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Result of a bulk toggle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkToggleReport {
    /// Service ids sent to the backend and accepted
    pub applied: Vec<String>,
    /// Core service ids filtered out before sending
    pub skipped_core: Vec<String>,
    /// Backend failure, if the batch was rejected
    pub error: Option<String>,
}

/// Per-organization service-toggle cache
pub struct VerticalConfigStore {
    backend: Arc<dyn VerticalConfigBackend>,
    catalog_cache: Cache<&'static str, Arc<ServiceCatalog>>,
    verticals_cache: Cache<&'static str, Arc<Vec<VerticalTemplate>>>,
    state: RwLock<VerticalState>,
}

impl VerticalConfigStore {
    /// Create store with default options
    #[must_use]
    pub fn new(backend: Arc<dyn VerticalConfigBackend>) -> Self {
        Self::with_options(backend, &StoreOptions::default())
    }

    /// Create store with options
    #[must_use]
    pub fn with_options(backend: Arc<dyn VerticalConfigBackend>, options: &StoreOptions) -> Self {
        let ttl = Duration::from_secs(options.catalog_ttl_secs.max(1));
        Self {
            backend,
            catalog_cache: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
            verticals_cache: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
            state: RwLock::new(VerticalState::default()),
        }
    }

    /// Load catalog, templates and organization config in parallel
    ///
    /// On failure the error string is stored in state and the previous
    /// enabled set is kept.
    pub async fn initialize(&self) {
        self.state.write().loading = true;

        let result = futures::try_join!(
            self.load_catalog(),
            self.load_verticals(),
            self.fetch_config()
        );

        let mut state = self.state.write();
        state.loading = false;
        match result {
            Ok((catalog, verticals, config)) => {
                let conflicts = conflicting_ids(&catalog, &config);
                if !conflicts.is_empty() {
                    tracing::warn!(?conflicts, "services both enabled and disabled; disabled wins");
                }
                state.enabled = compute_enabled(&catalog, &config);
                tracing::info!(
                    vertical = %config.vertical_id,
                    services = catalog.len(),
                    enabled = state.enabled.len(),
                    "vertical config initialized"
                );
                state.catalog = catalog;
                state.verticals = verticals;
                state.config = Some(config);
                state.error = None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "vertical config initialization failed");
                state.error = Some(err.to_string());
            }
        }
    }

    /// Drop cached catalog and templates, then reload everything
    pub async fn refresh(&self) {
        self.catalog_cache.invalidate_all();
        self.verticals_cache.invalidate_all();
        self.initialize().await;
    }

    /// Switch the organization to another vertical
    ///
    /// Returns the new config, or `None` if the vertical is unknown or the
    /// backend call failed (the reason is stored in state).
    pub async fn select_vertical(
        &self,
        vertical_id: &str,
        preserve_customizations: bool,
    ) -> Option<OrganizationVerticalConfig> {
        let known = {
            let state = self.state.read();
            state.verticals.is_empty() || state.verticals.iter().any(|v| v.id == vertical_id)
        };
        if !known {
            let err = VerticalError::UnknownVertical(vertical_id.to_string());
            tracing::warn!(error = %err, "select vertical rejected");
            self.state.write().error = Some(err.to_string());
            return None;
        }

        let request = SelectVerticalRequest {
            vertical_id: vertical_id.to_string(),
            preserve_customizations,
        };
        match self.backend.select_vertical(&request).await {
            Ok(config) => {
                tracing::info!(vertical = %vertical_id, preserve_customizations, "vertical selected");
                self.apply_config(config.clone());
                Some(config)
            }
            Err(err) => {
                let err = VerticalError::from(err);
                tracing::warn!(vertical = %vertical_id, error = %err, "select vertical failed");
                self.state.write().error = Some(err.to_string());
                None
            }
        }
    }

    /// Enable or disable one service
    pub async fn toggle_service(
        &self,
        service_id: &str,
        enabled: bool,
        reason: Option<&str>,
    ) -> ToggleOutcome {
        if self.state.read().catalog.is_core(service_id) {
            tracing::debug!(service = %service_id, "core service toggle ignored");
            return ToggleOutcome::CoreLocked;
        }

        let toggle = ServiceToggle {
            service_id: service_id.to_string(),
            enabled,
            reason: reason.map(str::to_string),
        };
        match self.backend.toggle_service(&toggle).await {
            Ok(config) => {
                tracing::info!(service = %service_id, enabled, "service toggled");
                self.apply_config(config.clone());
                ToggleOutcome::Applied(config)
            }
            Err(err) => {
                let err = VerticalError::from(err);
                tracing::warn!(service = %service_id, error = %err, "service toggle failed");
                let message = err.to_string();
                self.state.write().error = Some(message.clone());
                ToggleOutcome::Failed(message)
            }
        }
    }

    /// Apply several toggles as one backend call, skipping core services
    pub async fn bulk_toggle_services(&self, toggles: Vec<ServiceToggle>) -> BulkToggleReport {
        let (skipped, toggles): (Vec<ServiceToggle>, Vec<ServiceToggle>) = {
            let state = self.state.read();
            toggles
                .into_iter()
                .partition(|t| state.catalog.is_core(&t.service_id))
        };

        let mut report = BulkToggleReport {
            skipped_core: skipped.into_iter().map(|t| t.service_id).collect(),
            ..BulkToggleReport::default()
        };
        if toggles.is_empty() {
            return report;
        }

        let ids: Vec<String> = toggles.iter().map(|t| t.service_id.clone()).collect();
        match self.backend.bulk_toggle(&BulkToggleRequest { toggles }).await {
            Ok(config) => {
                tracing::info!(count = ids.len(), skipped = report.skipped_core.len(), "services bulk toggled");
                self.apply_config(config);
                report.applied = ids;
            }
            Err(err) => {
                let err = VerticalError::from(err);
                tracing::warn!(error = %err, "bulk toggle failed");
                let message = err.to_string();
                self.state.write().error = Some(message.clone());
                report.error = Some(message);
            }
        }
        report
    }

    /// Whether a feature gated on `service_id` should show
    #[must_use]
    pub fn is_service_enabled(&self, service_id: &str) -> bool {
        let state = self.state.read();
        state.catalog.is_core(service_id) || state.enabled.contains(service_id)
    }

    /// Effective enabled service ids
    #[must_use]
    pub fn enabled_services(&self) -> BTreeSet<String> {
        self.state.read().enabled.clone()
    }

    /// Template of the selected vertical
    #[must_use]
    pub fn current_vertical(&self) -> Option<VerticalTemplate> {
        let state = self.state.read();
        let id = &state.config.as_ref()?.vertical_id;
        state.verticals.iter().find(|v| &v.id == id).cloned()
    }

    /// Catalog grouped by category
    #[must_use]
    pub fn services_by_category(&self) -> BTreeMap<String, Vec<ServiceDefinition>> {
        self.state.read().catalog.by_category()
    }

    /// Core service definitions
    #[must_use]
    pub fn core_services(&self) -> Vec<ServiceDefinition> {
        self.state
            .read()
            .catalog
            .iter()
            .filter(|s| s.is_core)
            .cloned()
            .collect()
    }

    /// Loaded vertical templates
    #[must_use]
    pub fn verticals(&self) -> Arc<Vec<VerticalTemplate>> {
        Arc::clone(&self.state.read().verticals)
    }

    /// Loaded organization config
    #[must_use]
    pub fn config(&self) -> Option<OrganizationVerticalConfig> {
        self.state.read().config.clone()
    }

    /// Last backend failure
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state.read().error.clone()
    }

    /// Whether a load is in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.read().loading
    }

    /// Full state snapshot
    #[must_use]
    pub fn snapshot(&self) -> VerticalState {
        self.state.read().clone()
    }

    fn apply_config(&self, config: OrganizationVerticalConfig) {
        let mut state = self.state.write();
        state.enabled = compute_enabled(&state.catalog, &config);
        state.config = Some(config);
        state.error = None;
    }

    async fn load_catalog(&self) -> Result<Arc<ServiceCatalog>, VerticalError> {
        let backend = Arc::clone(&self.backend);
        self.catalog_cache
            .try_get_with(CATALOG_KEY, async move {
                backend
                    .fetch_catalog()
                    .await
                    .map(|services| Arc::new(ServiceCatalog::new(services)))
            })
            .await
            .map_err(VerticalError::from)
    }

    async fn load_verticals(&self) -> Result<Arc<Vec<VerticalTemplate>>, VerticalError> {
        let backend = Arc::clone(&self.backend);
        self.verticals_cache
            .try_get_with(VERTICALS_KEY, async move {
                backend.fetch_verticals().await.map(Arc::new)
            })
            .await
            .map_err(VerticalError::from)
    }

    async fn fetch_config(&self) -> Result<OrganizationVerticalConfig, VerticalError> {
        self.backend
            .fetch_organization_config()
            .await
            .map_err(VerticalError::from)
    }
}

impl std::fmt::Debug for VerticalConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerticalConfigStore")
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}
