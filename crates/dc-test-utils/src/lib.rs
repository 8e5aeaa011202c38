//! Testing utilities for the Datacendia workspace
//!
//! In-memory backends, a hand-driven clock and canned fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use dc_autoheal::{
    ApplyError, Clock, FixApplier, FixGenerator, FixRequest, FixSuggestion, GenerateError,
};
use dc_core::{ApiError, ApiResult};
use dc_vertical::{
    BulkToggleRequest, OrganizationVerticalConfig, SelectVerticalRequest, ServiceDefinition,
    ServiceTier, ServiceToggle, VerticalConfigBackend, VerticalTemplate,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

// ----------------------------------------------------------------------
// Fixtures
// ----------------------------------------------------------------------

/// Catalog with two core services and three optional ones
pub fn sample_catalog() -> Vec<ServiceDefinition> {
    vec![
        ServiceDefinition::new("council", "governance").core(),
        ServiceDefinition::new("decision-log", "governance").core(),
        ServiceDefinition::new("fleet-tracking", "operations"),
        ServiceDefinition::new("route-optimization", "operations")
            .with_tier(ServiceTier::Professional),
        ServiceDefinition::new("patient-records", "clinical").with_tier(ServiceTier::Enterprise),
    ]
}

/// Two vertical templates
pub fn sample_verticals() -> Vec<VerticalTemplate> {
    vec![
        VerticalTemplate {
            id: "logistics".into(),
            name: "Logistics".into(),
            description: "Fleets, routes and depots".into(),
            default_services: vec!["fleet-tracking".into(), "route-optimization".into()],
            recommended_services: vec!["route-optimization".into()],
        },
        VerticalTemplate {
            id: "healthcare".into(),
            name: "Healthcare".into(),
            description: "Clinical operations".into(),
            default_services: vec!["patient-records".into()],
            recommended_services: Vec::new(),
        },
    ]
}

/// Config enabling fleet tracking and (ineffectively) disabling the council
pub fn sample_config() -> OrganizationVerticalConfig {
    OrganizationVerticalConfig::new("logistics")
        .with_enabled(["fleet-tracking"])
        .with_disabled(["council"])
}

/// Model output carrying a safe fix
pub fn safe_fix_response() -> String {
    "Here is a fix.\n\n```json\n{\n  \"description\": \"Default rows to an empty list\",\n  \
     \"explanation\": \"rows is undefined until the first fetch resolves\",\n  \
     \"filePath\": \"src/components/FleetTable.tsx\",\n  \
     \"originalCode\": \"rows.map(render)\",\n  \
     \"suggestedCode\": \"(rows ?? []).map(render)\",\n  \
     \"riskLevel\": \"safe\",\n  \"confidence\": 0.9\n}\n```\n"
        .to_string()
}

/// Model output carrying a moderate-risk fix
pub fn moderate_fix_response() -> String {
    "```json\n{\"description\":\"Retry the telemetry request\",\"riskLevel\":\"moderate\",\"confidence\":0.6}\n```"
        .to_string()
}

/// Fixed start time for clock-driven tests
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

// ----------------------------------------------------------------------
// Vertical backend
// ----------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Failure {
    Status(u16, String),
    Network(String),
}

impl Failure {
    fn to_error(&self, path: &str) -> ApiError {
        match self {
            Self::Status(status, body) => ApiError::Status {
                status: *status,
                path: path.to_string(),
                body: body.clone(),
            },
            Self::Network(message) => ApiError::Network(message.clone()),
        }
    }
}

/// Per-method call counters
#[derive(Debug, Default)]
pub struct CallCounts {
    pub fetch_catalog: AtomicUsize,
    pub fetch_verticals: AtomicUsize,
    pub fetch_config: AtomicUsize,
    pub select_vertical: AtomicUsize,
    pub toggle: AtomicUsize,
    pub bulk_toggle: AtomicUsize,
}

impl CallCounts {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

/// Vertical backend keeping the organization config in memory
///
/// Toggles and vertical selection mutate the stored config the way the
/// server does. Failures can be injected for every call.
#[derive(Debug)]
pub struct InMemoryVerticalBackend {
    catalog: Mutex<Vec<ServiceDefinition>>,
    verticals: Mutex<Vec<VerticalTemplate>>,
    config: Mutex<OrganizationVerticalConfig>,
    failure: Mutex<Option<Failure>>,
    pub calls: CallCounts,
}

impl InMemoryVerticalBackend {
    pub fn new(
        catalog: Vec<ServiceDefinition>,
        verticals: Vec<VerticalTemplate>,
        config: OrganizationVerticalConfig,
    ) -> Self {
        Self {
            catalog: Mutex::new(catalog),
            verticals: Mutex::new(verticals),
            config: Mutex::new(config),
            failure: Mutex::new(None),
            calls: CallCounts::default(),
        }
    }

    /// Backend seeded with the sample fixtures
    pub fn sample() -> Self {
        Self::new(sample_catalog(), sample_verticals(), sample_config())
    }

    /// Fail every call with an HTTP status
    pub fn fail_with_status(&self, status: u16, body: impl Into<String>) {
        *self.failure.lock() = Some(Failure::Status(status, body.into()));
    }

    /// Fail every call with a transport error
    pub fn fail_with_network(&self, message: impl Into<String>) {
        *self.failure.lock() = Some(Failure::Network(message.into()));
    }

    /// Stop failing
    pub fn recover(&self) {
        *self.failure.lock() = None;
    }

    /// Replace the catalog served from now on
    pub fn set_catalog(&self, catalog: Vec<ServiceDefinition>) {
        *self.catalog.lock() = catalog;
    }

    /// Stored organization config
    pub fn stored_config(&self) -> OrganizationVerticalConfig {
        self.config.lock().clone()
    }

    fn check(&self, path: &str) -> ApiResult<()> {
        match &*self.failure.lock() {
            Some(failure) => Err(failure.to_error(path)),
            None => Ok(()),
        }
    }

    fn apply_toggle(config: &mut OrganizationVerticalConfig, toggle: &ServiceToggle) {
        let id = &toggle.service_id;
        config.enabled_services.retain(|s| s != id);
        config.disabled_services.retain(|s| s != id);
        if toggle.enabled {
            config.enabled_services.push(id.clone());
        } else {
            config.disabled_services.push(id.clone());
        }
    }
}

#[async_trait]
impl VerticalConfigBackend for InMemoryVerticalBackend {
    async fn fetch_catalog(&self) -> ApiResult<Vec<ServiceDefinition>> {
        CallCounts::bump(&self.calls.fetch_catalog);
        self.check("/vertical-config/services")?;
        Ok(self.catalog.lock().clone())
    }

    async fn fetch_verticals(&self) -> ApiResult<Vec<VerticalTemplate>> {
        CallCounts::bump(&self.calls.fetch_verticals);
        self.check("/vertical-config/verticals")?;
        Ok(self.verticals.lock().clone())
    }

    async fn fetch_organization_config(&self) -> ApiResult<OrganizationVerticalConfig> {
        CallCounts::bump(&self.calls.fetch_config);
        self.check("/vertical-config/organization")?;
        Ok(self.config.lock().clone())
    }

    async fn select_vertical(
        &self,
        request: &SelectVerticalRequest,
    ) -> ApiResult<OrganizationVerticalConfig> {
        CallCounts::bump(&self.calls.select_vertical);
        self.check("/vertical-config/organization/vertical")?;
        let defaults = self
            .verticals
            .lock()
            .iter()
            .find(|v| v.id == request.vertical_id)
            .map(|v| v.default_services.clone())
            .ok_or_else(|| ApiError::Status {
                status: 404,
                path: "/vertical-config/organization/vertical".into(),
                body: format!("unknown vertical {}", request.vertical_id),
            })?;

        let mut config = self.config.lock();
        config.vertical_id = request.vertical_id.clone();
        if !request.preserve_customizations {
            config.enabled_services = defaults;
            config.disabled_services.clear();
            config.customizations.clear();
        }
        Ok(config.clone())
    }

    async fn toggle_service(
        &self,
        toggle: &ServiceToggle,
    ) -> ApiResult<OrganizationVerticalConfig> {
        CallCounts::bump(&self.calls.toggle);
        self.check("/vertical-config/organization/services/toggle")?;
        let mut config = self.config.lock();
        Self::apply_toggle(&mut config, toggle);
        Ok(config.clone())
    }

    async fn bulk_toggle(
        &self,
        request: &BulkToggleRequest,
    ) -> ApiResult<OrganizationVerticalConfig> {
        CallCounts::bump(&self.calls.bulk_toggle);
        self.check("/vertical-config/organization/services/bulk-toggle")?;
        let mut config = self.config.lock();
        for toggle in &request.toggles {
            Self::apply_toggle(&mut config, toggle);
        }
        Ok(config.clone())
    }
}

// ----------------------------------------------------------------------
// Auto-heal fakes
// ----------------------------------------------------------------------

/// Clock moved by hand
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Generator replaying queued responses
///
/// When the script runs dry the fallback response (if any) is returned.
#[derive(Debug, Default)]
pub struct ScriptedFixGenerator {
    script: Mutex<VecDeque<Result<String, String>>>,
    fallback: Option<String>,
    requests: Mutex<Vec<FixRequest>>,
}

impl ScriptedFixGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer with `response`
    pub fn always(response: impl Into<String>) -> Self {
        Self {
            fallback: Some(response.into()),
            ..Self::default()
        }
    }

    /// Queue a successful response
    pub fn push_response(&self, response: impl Into<String>) {
        self.script.lock().push_back(Ok(response.into()));
    }

    /// Queue a backend failure
    pub fn push_failure(&self, message: impl Into<String>) {
        self.script.lock().push_back(Err(message.into()));
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<FixRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl FixGenerator for ScriptedFixGenerator {
    async fn generate(&self, request: &FixRequest) -> Result<String, GenerateError> {
        self.requests.lock().push(request.clone());
        let next = self.script.lock().pop_front();
        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(GenerateError::Api(ApiError::Network(message))),
            None => self.fallback.clone().ok_or(GenerateError::EmptyResponse),
        }
    }
}

/// Generator that parks until released
#[derive(Debug)]
pub struct GatedFixGenerator {
    response: String,
    entered: Notify,
    release: Notify,
}

impl GatedFixGenerator {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    /// Wait until a call is parked inside `generate`
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    /// Let the parked call finish
    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl FixGenerator for GatedFixGenerator {
    async fn generate(&self, _request: &FixRequest) -> Result<String, GenerateError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(self.response.clone())
    }
}

/// Applier recording every fix it is handed
#[derive(Debug, Default)]
pub struct RecordingApplier {
    applied: Mutex<Vec<FixSuggestion>>,
    fail: Mutex<Option<String>>,
}

impl RecordingApplier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every apply fail
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.fail.lock() = Some(message.into());
    }

    /// Fixes applied successfully
    pub fn applied(&self) -> Vec<FixSuggestion> {
        self.applied.lock().clone()
    }
}

#[async_trait]
impl FixApplier for RecordingApplier {
    async fn apply(&self, fix: &FixSuggestion) -> Result<(), ApplyError> {
        // Suspend once so concurrent callers interleave
        tokio::task::yield_now().await;
        if let Some(message) = self.fail.lock().clone() {
            return Err(ApplyError(message));
        }
        self.applied.lock().push(fix.clone());
        Ok(())
    }
}
