//! Catalog, template and organization config types
//!
//! Wire shapes follow the backend's camelCase JSON.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Commercial tier of a service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceTier {
    /// Included in every plan
    #[default]
    Standard,
    /// Professional plan and above
    Professional,
    /// Enterprise plan only
    Enterprise,
    /// Tier name this client does not know
    #[serde(other)]
    Unknown,
}

/// Static catalog entry owned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDefinition {
    /// Stable service id, e.g. `fleet-tracking`
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Short description
    #[serde(default)]
    pub description: String,
    /// Grouping used by the settings page
    #[serde(default)]
    pub category: String,
    /// Commercial tier
    #[serde(default)]
    pub tier: ServiceTier,
    /// Core services are always enabled
    #[serde(default)]
    pub is_core: bool,
    /// Services this one relies on
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl ServiceDefinition {
    /// Create a non-core service in a category
    #[must_use]
    pub fn new(id: impl Into<String>, category: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: String::new(),
            category: category.into(),
            tier: ServiceTier::Standard,
            is_core: false,
            dependencies: Vec::new(),
        }
    }

    /// Mark as core
    #[inline]
    #[must_use]
    pub fn core(mut self) -> Self {
        self.is_core = true;
        self
    }

    /// With tier
    #[inline]
    #[must_use]
    pub fn with_tier(mut self, tier: ServiceTier) -> Self {
        self.tier = tier;
        self
    }
}

/// Industry template listing default services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerticalTemplate {
    /// Vertical id, e.g. `logistics`
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Short description
    #[serde(default)]
    pub description: String,
    /// Enabled on first selection
    #[serde(default)]
    pub default_services: Vec<String>,
    /// Suggested in the settings page
    #[serde(default)]
    pub recommended_services: Vec<String>,
}

/// Organization's stored vertical configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationVerticalConfig {
    /// Owning organization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    /// Selected vertical
    pub vertical_id: String,
    /// Explicitly enabled service ids
    #[serde(default)]
    pub enabled_services: Vec<String>,
    /// Explicitly disabled service ids
    #[serde(default)]
    pub disabled_services: Vec<String>,
    /// Free-form per-organization overrides
    #[serde(default)]
    pub customizations: Map<String, Value>,
}

impl OrganizationVerticalConfig {
    /// Create config for a vertical with empty lists
    #[must_use]
    pub fn new(vertical_id: impl Into<String>) -> Self {
        Self {
            vertical_id: vertical_id.into(),
            ..Self::default()
        }
    }

    /// With enabled services
    #[must_use]
    pub fn with_enabled<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enabled_services = ids.into_iter().map(Into::into).collect();
        self
    }

    /// With disabled services
    #[must_use]
    pub fn with_disabled<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disabled_services = ids.into_iter().map(Into::into).collect();
        self
    }
}

/// One service toggle request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceToggle {
    /// Target service
    pub service_id: String,
    /// Desired state
    pub enabled: bool,
    /// Audit reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ServiceToggle {
    /// Create toggle without a reason
    #[must_use]
    pub fn new(service_id: impl Into<String>, enabled: bool) -> Self {
        Self {
            service_id: service_id.into(),
            enabled,
            reason: None,
        }
    }

    /// With audit reason
    #[inline]
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Body of the select-vertical call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectVerticalRequest {
    /// Vertical to switch to
    pub vertical_id: String,
    /// Keep existing customizations
    pub preserve_customizations: bool,
}

/// Body of the bulk-toggle call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkToggleRequest {
    /// Toggles applied as one batch
    pub toggles: Vec<ServiceToggle>,
}

/// Catalog indexed by service id, in backend order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceCatalog {
    services: IndexMap<String, ServiceDefinition>,
}

impl ServiceCatalog {
    /// Index a list of definitions; later duplicates replace earlier ones
    #[must_use]
    pub fn new(services: Vec<ServiceDefinition>) -> Self {
        Self {
            services: services.into_iter().map(|s| (s.id.clone(), s)).collect(),
        }
    }

    /// Look up a service
    #[inline]
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ServiceDefinition> {
        self.services.get(id)
    }

    /// Whether the id names a core service; unknown ids are not core
    #[inline]
    #[must_use]
    pub fn is_core(&self, id: &str) -> bool {
        self.services.get(id).is_some_and(|s| s.is_core)
    }

    /// Ids of all core services
    pub fn core_ids(&self) -> impl Iterator<Item = &str> {
        self.services
            .values()
            .filter(|s| s.is_core)
            .map(|s| s.id.as_str())
    }

    /// All services in backend order
    pub fn iter(&self) -> impl Iterator<Item = &ServiceDefinition> {
        self.services.values()
    }

    /// Services grouped by category
    #[must_use]
    pub fn by_category(&self) -> BTreeMap<String, Vec<ServiceDefinition>> {
        let mut groups: BTreeMap<String, Vec<ServiceDefinition>> = BTreeMap::new();
        for service in self.services.values() {
            groups
                .entry(service.category.clone())
                .or_default()
                .push(service.clone());
        }
        groups
    }

    /// Number of services
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether the catalog is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_definition_decodes_backend_shape() {
        let def: ServiceDefinition = serde_json::from_str(
            r#"{"id":"council","name":"Council","category":"governance","tier":"enterprise","isCore":true}"#,
        )
        .unwrap();
        assert!(def.is_core);
        assert_eq!(def.tier, ServiceTier::Enterprise);
        assert!(def.dependencies.is_empty());
    }

    #[test]
    fn unknown_tier_is_tolerated() {
        let def: ServiceDefinition =
            serde_json::from_str(r#"{"id":"x","tier":"platinum"}"#).unwrap();
        assert_eq!(def.tier, ServiceTier::Unknown);
        assert!(!def.is_core);
    }

    #[test]
    fn toggle_omits_missing_reason() {
        let json = serde_json::to_value(ServiceToggle::new("fleet-tracking", true)).unwrap();
        assert_eq!(json, serde_json::json!({"serviceId": "fleet-tracking", "enabled": true}));
    }

    #[test]
    fn config_decodes_with_defaults() {
        let config: OrganizationVerticalConfig =
            serde_json::from_str(r#"{"verticalId":"healthcare"}"#).unwrap();
        assert_eq!(config.vertical_id, "healthcare");
        assert!(config.enabled_services.is_empty());
        assert!(config.customizations.is_empty());
    }

    #[test]
    fn catalog_groups_by_category() {
        let catalog = ServiceCatalog::new(vec![
            ServiceDefinition::new("council", "governance").core(),
            ServiceDefinition::new("fleet-tracking", "operations"),
            ServiceDefinition::new("route-optimizer", "operations"),
        ]);
        let groups = catalog.by_category();
        assert_eq!(groups["operations"].len(), 2);
        assert_eq!(groups["governance"][0].id, "council");
        assert_eq!(catalog.core_ids().collect::<Vec<_>>(), vec!["council"]);
        assert!(!catalog.is_core("missing"));
    }
}
