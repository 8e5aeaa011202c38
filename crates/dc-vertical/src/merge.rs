//! Enabled-set computation
//!
//! `enabled = core ∪ config.enabled − (config.disabled − core)`.
//! A non-core id listed in both lists ends up disabled.

use crate::model::{OrganizationVerticalConfig, ServiceCatalog};
use std::collections::BTreeSet;

/// Compute the enabled service ids for a stored config
#[must_use]
pub fn compute_enabled(
    catalog: &ServiceCatalog,
    config: &OrganizationVerticalConfig,
) -> BTreeSet<String> {
    let mut enabled: BTreeSet<String> = catalog.core_ids().map(str::to_string).collect();
    enabled.extend(config.enabled_services.iter().cloned());

    for id in &config.disabled_services {
        if !catalog.is_core(id) {
            enabled.remove(id);
        }
    }

    enabled
}

/// Non-core ids named in both the enabled and disabled lists
#[must_use]
pub fn conflicting_ids(
    catalog: &ServiceCatalog,
    config: &OrganizationVerticalConfig,
) -> Vec<String> {
    let disabled: BTreeSet<&str> = config.disabled_services.iter().map(String::as_str).collect();
    let mut conflicts: Vec<String> = config
        .enabled_services
        .iter()
        .filter(|id| disabled.contains(id.as_str()) && !catalog.is_core(id))
        .cloned()
        .collect();
    conflicts.sort();
    conflicts.dedup();
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ServiceDefinition;
    use proptest::prelude::*;

    fn catalog() -> ServiceCatalog {
        ServiceCatalog::new(vec![
            ServiceDefinition::new("council", "governance").core(),
            ServiceDefinition::new("audit-trail", "governance").core(),
            ServiceDefinition::new("fleet-tracking", "operations"),
            ServiceDefinition::new("route-optimizer", "operations"),
            ServiceDefinition::new("claims-triage", "finance"),
        ])
    }

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn core_cannot_be_disabled() {
        let config = OrganizationVerticalConfig::new("logistics")
            .with_enabled(["fleet-tracking"])
            .with_disabled(["council"]);
        assert_eq!(
            compute_enabled(&catalog(), &config),
            set(&["audit-trail", "council", "fleet-tracking"])
        );
    }

    #[test]
    fn disabled_wins_for_non_core_conflict() {
        let config = OrganizationVerticalConfig::new("logistics")
            .with_enabled(["fleet-tracking", "route-optimizer"])
            .with_disabled(["route-optimizer"]);
        let enabled = compute_enabled(&catalog(), &config);
        assert!(!enabled.contains("route-optimizer"));
        assert_eq!(conflicting_ids(&catalog(), &config), vec!["route-optimizer"]);
    }

    #[test]
    fn unknown_enabled_ids_are_kept() {
        let config = OrganizationVerticalConfig::new("logistics").with_enabled(["beta-feature"]);
        assert!(compute_enabled(&catalog(), &config).contains("beta-feature"));
    }

    #[test]
    fn empty_config_yields_core_only() {
        let config = OrganizationVerticalConfig::new("finance");
        assert_eq!(compute_enabled(&catalog(), &config), set(&["audit-trail", "council"]));
    }

    fn ids() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(
            prop_oneof![
                Just("council".to_string()),
                Just("audit-trail".to_string()),
                Just("fleet-tracking".to_string()),
                Just("route-optimizer".to_string()),
                Just("claims-triage".to_string()),
                "[a-z]{3,8}",
            ],
            0..8,
        )
    }

    proptest! {
        #[test]
        fn prop_core_always_enabled(enabled in ids(), disabled in ids()) {
            let catalog = catalog();
            let config = OrganizationVerticalConfig::new("any")
                .with_enabled(enabled)
                .with_disabled(disabled);
            let result = compute_enabled(&catalog, &config);
            for core in catalog.core_ids() {
                prop_assert!(result.contains(core));
            }
        }

        #[test]
        fn prop_disabled_non_core_never_enabled(enabled in ids(), disabled in ids()) {
            let catalog = catalog();
            let config = OrganizationVerticalConfig::new("any")
                .with_enabled(enabled)
                .with_disabled(disabled.clone());
            let result = compute_enabled(&catalog, &config);
            for id in disabled.iter().filter(|id| !catalog.is_core(id)) {
                prop_assert!(!result.contains(id));
            }
        }
    }
}
