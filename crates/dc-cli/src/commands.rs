//! Subcommand bodies
//!
//! `main` parses arguments and prints; everything here returns data or
//! writes to a caller-supplied sink.

use crate::config::DemoSettings;
use anyhow::{bail, Context};
use async_trait::async_trait;
use dc_autoheal::{
    assign_agent, classify, parse_fix_response, should_capture_console, ErrorSource, FixAgent,
    FixDraft, Severity,
};
use dc_core::{ApiError, ApiResult, LiveMetric};
use dc_demo::{
    CompletionStore, DemoCatalog, DemoError, DemoPlayer, FileCompletionStore,
    MemoryCompletionStore, PlayerOptions,
};
use dc_vertical::{
    conflicting_ids, BulkToggleRequest, OrganizationVerticalConfig, SelectVerticalRequest,
    ServiceDefinition, ServiceTier, ServiceToggle, VerticalConfigBackend, VerticalConfigStore,
    VerticalState, VerticalTemplate,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

// ----------------------------------------------------------------------
// Demos
// ----------------------------------------------------------------------

/// `--speed` value parser
///
/// # Errors
/// Not a number, or not a positive finite one.
pub fn parse_speed(raw: &str) -> Result<f64, String> {
    let speed = parse_finite(raw)?;
    if PlayerOptions::is_valid_speed(speed) {
        Ok(speed)
    } else {
        Err(format!("speed must be greater than zero, got {speed}"))
    }
}

/// Built-in demos plus every configured definition file
///
/// # Errors
/// First definition file that fails to load.
pub fn load_catalog(settings: &DemoSettings) -> Result<DemoCatalog, DemoError> {
    let mut catalog = DemoCatalog::builtin();
    for path in &settings.definitions {
        let added = catalog.load_file(path)?;
        tracing::debug!(path = %path.display(), added, "Loaded demo definitions");
    }
    Ok(catalog)
}

/// Completion flags on disk when a file is configured, in memory otherwise
///
/// # Errors
/// Existing completion file is unreadable or malformed.
pub fn completion_store(settings: &DemoSettings) -> Result<Arc<dyn CompletionStore>, DemoError> {
    let store: Arc<dyn CompletionStore> = match &settings.completion_file {
        Some(path) => Arc::new(FileCompletionStore::open(path.clone())?),
        None => Arc::new(MemoryCompletionStore::new()),
    };
    Ok(store)
}

/// One row of `demo list`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemoSummary {
    pub id: String,
    pub name: String,
    pub category: String,
    pub steps: usize,
    pub total_secs: f64,
    pub completed: bool,
}

/// Summaries in catalog order
#[must_use]
pub fn demo_summaries(catalog: &DemoCatalog, completions: &dyn CompletionStore) -> Vec<DemoSummary> {
    catalog
        .iter()
        .map(|demo| DemoSummary {
            id: demo.id.clone(),
            name: demo.name.clone(),
            category: demo.category.clone(),
            steps: demo.steps.len(),
            total_secs: demo.total_duration().as_secs_f64(),
            completed: completions.is_completed(&demo.id),
        })
        .collect()
}

/// Play a demo to the end, printing each step
///
/// Click-to-continue steps are released by a line on `input`, or at once
/// with `auto_advance`. End of input stops the demo.
///
/// # Errors
/// Unknown demo id, or a failed read or write.
pub async fn run_demo<R, W>(
    player: &DemoPlayer,
    demo_id: &str,
    auto_advance: bool,
    input: R,
    out: &mut W,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    player.start_demo(demo_id)?;
    let mut updates = player.subscribe();
    player.play();

    let mut lines = input.lines();
    let mut shown = None;

    loop {
        let snapshot = updates.borrow_and_update().clone();
        if snapshot.demo_id.is_none() {
            break;
        }

        if shown != Some(snapshot.step_index) {
            shown = Some(snapshot.step_index);
            if let Some(step) = &snapshot.current_step {
                writeln!(
                    out,
                    "[{}/{}] {}",
                    snapshot.step_index + 1,
                    snapshot.total_steps,
                    step.title
                )?;
                if !step.description.is_empty() {
                    writeln!(out, "      {}", step.description)?;
                }
                if let Some(route) = &step.route {
                    writeln!(out, "      route: {route}")?;
                }
                if let Some(script) = &step.script {
                    writeln!(out, "      script: {script}")?;
                }
            }
        }

        if snapshot.completed {
            writeln!(out, "Demo complete")?;
            break;
        }

        if snapshot.awaiting_click {
            let release = if auto_advance {
                true
            } else {
                writeln!(out, "      (press Enter to continue)")?;
                out.flush()?;
                lines.next_line().await?.is_some()
            };
            if !release || !player.next_step() {
                player.stop_demo();
                writeln!(out, "Demo stopped")?;
                break;
            }
        }

        if updates.changed().await.is_err() {
            break;
        }
    }
    Ok(())
}

// ----------------------------------------------------------------------
// Services
// ----------------------------------------------------------------------

/// `{catalog, verticals?, config}` document for offline inspection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicesSnapshot {
    pub catalog: Vec<ServiceDefinition>,
    #[serde(default)]
    pub verticals: Vec<VerticalTemplate>,
    pub config: OrganizationVerticalConfig,
}

impl ServicesSnapshot {
    /// Read a snapshot file
    ///
    /// # Errors
    /// Unreadable file or unexpected JSON shape.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read snapshot {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("invalid snapshot {}", path.display()))
    }
}

/// Read-only backend answering from a snapshot
#[derive(Debug, Clone)]
pub struct SnapshotBackend {
    snapshot: ServicesSnapshot,
}

impl SnapshotBackend {
    #[must_use]
    pub fn new(snapshot: ServicesSnapshot) -> Self {
        Self { snapshot }
    }

    fn read_only() -> ApiError {
        ApiError::Rejected("snapshot backend is read-only".to_string())
    }
}

#[async_trait]
impl VerticalConfigBackend for SnapshotBackend {
    async fn fetch_catalog(&self) -> ApiResult<Vec<ServiceDefinition>> {
        Ok(self.snapshot.catalog.clone())
    }

    async fn fetch_verticals(&self) -> ApiResult<Vec<VerticalTemplate>> {
        Ok(self.snapshot.verticals.clone())
    }

    async fn fetch_organization_config(&self) -> ApiResult<OrganizationVerticalConfig> {
        Ok(self.snapshot.config.clone())
    }

    async fn select_vertical(
        &self,
        _request: &SelectVerticalRequest,
    ) -> ApiResult<OrganizationVerticalConfig> {
        Err(Self::read_only())
    }

    async fn toggle_service(&self, _toggle: &ServiceToggle) -> ApiResult<OrganizationVerticalConfig> {
        Err(Self::read_only())
    }

    async fn bulk_toggle(&self, _request: &BulkToggleRequest) -> ApiResult<OrganizationVerticalConfig> {
        Err(Self::read_only())
    }
}

/// One service in the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceLine {
    pub id: String,
    pub name: String,
    pub tier: ServiceTier,
    pub core: bool,
    pub enabled: bool,
}

/// Output of `services`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServicesReport {
    pub vertical_id: Option<String>,
    pub vertical_name: Option<String>,
    pub enabled: Vec<String>,
    /// Non-core ids listed as both enabled and disabled
    pub conflicts: Vec<String>,
    pub categories: BTreeMap<String, Vec<ServiceLine>>,
    pub error: Option<String>,
}

impl ServicesReport {
    /// Build from a store snapshot
    #[must_use]
    pub fn from_state(state: &VerticalState) -> Self {
        let vertical_id = state.config.as_ref().map(|c| c.vertical_id.clone());
        let vertical_name = vertical_id.as_deref().and_then(|id| {
            state
                .verticals
                .iter()
                .find(|v| v.id == id)
                .map(|v| v.name.clone())
        });
        let conflicts = state
            .config
            .as_ref()
            .map(|c| conflicting_ids(&state.catalog, c))
            .unwrap_or_default();

        let mut categories: BTreeMap<String, Vec<ServiceLine>> = BTreeMap::new();
        for service in state.catalog.iter() {
            categories
                .entry(service.category.clone())
                .or_default()
                .push(ServiceLine {
                    id: service.id.clone(),
                    name: service.name.clone(),
                    tier: service.tier,
                    core: service.is_core,
                    enabled: state.enabled.contains(&service.id),
                });
        }

        Self {
            vertical_id,
            vertical_name,
            enabled: state.enabled.iter().cloned().collect(),
            conflicts,
            categories,
            error: state.error.clone(),
        }
    }

    /// Human-readable rendering
    #[must_use]
    pub fn render(&self) -> String {
        let mut text = String::new();
        let vertical = match (&self.vertical_id, &self.vertical_name) {
            (Some(id), Some(name)) => format!("{name} ({id})"),
            (Some(id), None) => id.clone(),
            _ => "none".to_string(),
        };
        let _ = writeln!(text, "Vertical: {vertical}");
        let _ = writeln!(text, "Enabled: {}", self.enabled.len());
        for (category, services) in &self.categories {
            let _ = writeln!(text);
            let _ = writeln!(text, "{category}:");
            for s in services {
                let mark = if s.enabled { "x" } else { " " };
                let core = if s.core { " [core]" } else { "" };
                let _ = writeln!(text, "  [{mark}] {} ({}){core}", s.id, s.name);
            }
        }
        if !self.conflicts.is_empty() {
            let _ = writeln!(text);
            let _ = writeln!(text, "Listed as enabled and disabled: {}", self.conflicts.join(", "));
        }
        text
    }
}

/// Initialize a store over `backend` and report on it
///
/// # Errors
/// The backend could not be loaded.
pub async fn inspect_services(
    backend: Arc<dyn VerticalConfigBackend>,
    options: &dc_vertical::StoreOptions,
) -> anyhow::Result<ServicesReport> {
    let store = VerticalConfigStore::with_options(backend, options);
    store.initialize().await;
    let report = ServicesReport::from_state(&store.snapshot());
    if let Some(error) = &report.error {
        bail!("failed to load vertical configuration: {error}");
    }
    Ok(report)
}

// ----------------------------------------------------------------------
// Auto-heal
// ----------------------------------------------------------------------

/// Capture source names accepted by `classify --source`
pub const SOURCE_NAMES: [&str; 5] = [
    "window-error",
    "unhandled-rejection",
    "console-error",
    "panic",
    "manual",
];

/// Map a `--source` value
#[must_use]
pub fn parse_source(name: &str) -> Option<ErrorSource> {
    match name {
        "window-error" => Some(ErrorSource::WindowError),
        "unhandled-rejection" => Some(ErrorSource::UnhandledRejection),
        "console-error" => Some(ErrorSource::ConsoleError),
        "panic" => Some(ErrorSource::Panic),
        "manual" => Some(ErrorSource::Manual),
        _ => None,
    }
}

/// Output of `classify`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub severity: Severity,
    pub agent: FixAgent,
    /// Whether an error-level log line with this text would be captured
    pub console_capture: bool,
}

/// Severity, agent and console verdict for a message
#[must_use]
pub fn classify_message(message: &str, source: ErrorSource) -> Classification {
    Classification {
        severity: classify(message),
        agent: assign_agent(message, None, source),
        console_capture: should_capture_console(message),
    }
}

/// Parse a saved model response
///
/// # Errors
/// Unreadable file or a response that is not a valid fix.
pub fn parse_fix_file(path: &Path) -> anyhow::Result<FixDraft> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    parse_fix_response(&raw).with_context(|| format!("rejected response in {}", path.display()))
}

// ----------------------------------------------------------------------
// Live metrics
// ----------------------------------------------------------------------

/// Value parser for `ticks` bounds; rejects NaN and infinities
///
/// # Errors
/// Not a number, or not a finite one.
pub fn parse_finite(raw: &str) -> Result<f64, String> {
    let value: f64 = raw.trim().parse().map_err(|e| format!("{e}"))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("expected a finite number, got {raw}"))
    }
}

/// `(tick, value)` pairs starting at tick 1
#[must_use]
pub fn tick_series(metric: &LiveMetric, count: usize) -> Vec<(u64, f64)> {
    (1u64..).zip(metric.series(1, count)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_source_name_parses() {
        for name in SOURCE_NAMES {
            assert!(parse_source(name).is_some(), "{name}");
        }
        assert_eq!(parse_source("stdout"), None);
    }

    #[test]
    fn classification_combines_policies() {
        let c = classify_message("Uncaught TypeError: x is not a function", ErrorSource::WindowError);
        assert_eq!(c.agent, FixAgent::Frontend);
        assert!(c.console_capture);

        let quiet = classify_message("Rendered dashboard", ErrorSource::Manual);
        assert_eq!(quiet.severity, Severity::Low);
        assert!(!quiet.console_capture);
    }

    #[test]
    fn numeric_arguments_must_be_finite() {
        assert_eq!(parse_finite(" 12.5"), Ok(12.5));
        assert!(parse_finite("NaN").is_err());
        assert!(parse_finite("-inf").is_err());
        assert!(parse_finite("ten").is_err());

        assert_eq!(parse_speed("2"), Ok(2.0));
        assert!(parse_speed("0").is_err());
        assert!(parse_speed("-1").is_err());
        assert!(parse_speed("inf").is_err());
    }

    #[test]
    fn tick_series_is_numbered_from_one() {
        let metric = LiveMetric::new("revenue", 50.0, 0.0, 100.0);
        let series = tick_series(&metric, 3);
        assert_eq!(series.iter().map(|(t, _)| *t).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(series.iter().all(|(_, v)| (0.0..=100.0).contains(v)));
        assert_eq!(series, tick_series(&metric, 3));
    }
}
