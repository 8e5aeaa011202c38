//! Demo catalog
//!
//! Ships the built-in demos and loads extra ones from YAML or JSON files of
//! the form `{ demos: [ ... ] }`. Every demo is validated on insert.

use crate::error::DemoError;
use crate::model::{Demo, DemoStep};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Built-in demo ids
pub mod builtin {
    /// Leadership walkthrough of the council and decision views
    pub const EXECUTIVE_OVERVIEW: &str = "executive-overview";
    /// Industry vertical switcher and service toggles
    pub const VERTICAL_TOUR: &str = "vertical-tour";
    /// Error capture and fix approval
    pub const AUTO_HEAL_WALKTHROUGH: &str = "auto-heal-walkthrough";
}

/// On-disk document shape
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DemoFile {
    /// Demos in the file
    #[serde(default)]
    pub demos: Vec<Demo>,
}

/// Demos indexed by id, in insertion order
#[derive(Debug, Clone, Default)]
pub struct DemoCatalog {
    demos: IndexMap<String, Demo>,
}

impl DemoCatalog {
    /// Empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding the built-in demos
    #[must_use]
    pub fn builtin() -> Self {
        let demos = builtin_demos()
            .into_iter()
            .map(|d| (d.id.clone(), d))
            .collect();
        Self { demos }
    }

    /// Add a demo
    ///
    /// # Errors
    /// `InvalidDemo` or `DuplicateDemo`.
    pub fn insert(&mut self, demo: Demo) -> Result<(), DemoError> {
        demo.validate()?;
        if self.demos.contains_key(&demo.id) {
            return Err(DemoError::DuplicateDemo(demo.id));
        }
        self.demos.insert(demo.id.clone(), demo);
        Ok(())
    }

    /// Add every demo, or none of them
    ///
    /// The whole batch is validated and checked for duplicates, against the
    /// catalog and within itself, before anything is inserted.
    ///
    /// # Errors
    /// As [`Self::insert`].
    pub fn extend(&mut self, demos: impl IntoIterator<Item = Demo>) -> Result<usize, DemoError> {
        let demos: Vec<Demo> = demos.into_iter().collect();
        let mut incoming = HashSet::new();
        for demo in &demos {
            demo.validate()?;
            if self.demos.contains_key(&demo.id) || !incoming.insert(demo.id.as_str()) {
                return Err(DemoError::DuplicateDemo(demo.id.clone()));
            }
        }

        let added = demos.len();
        self.demos.extend(demos.into_iter().map(|d| (d.id.clone(), d)));
        Ok(added)
    }

    /// Load demos from a `.yaml`, `.yml` or `.json` file
    ///
    /// # Errors
    /// I/O, parse and validation failures.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<usize, DemoError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DemoError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let origin = path.display().to_string();
        let demos = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => parse_yaml(&text, &origin)?,
            Some("json") => parse_json(&text, &origin)?,
            _ => return Err(DemoError::UnsupportedFormat(path.to_path_buf())),
        };
        let added = self.extend(demos)?;
        tracing::info!(path = %origin, added, "Loaded demo definitions");
        Ok(added)
    }

    /// Look up a demo
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Demo> {
        self.demos.get(id)
    }

    /// Demo ids in insertion order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.demos.keys().map(String::as_str)
    }

    /// Demos in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Demo> {
        self.demos.values()
    }

    /// Number of demos
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.demos.len()
    }

    /// Whether the catalog is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.demos.is_empty()
    }
}

/// Parse a YAML demo document
///
/// # Errors
/// `Parse` on malformed input.
pub fn parse_yaml(text: &str, origin: &str) -> Result<Vec<Demo>, DemoError> {
    serde_yaml::from_str::<DemoFile>(text)
        .map(|f| f.demos)
        .map_err(|e| DemoError::Parse {
            origin: origin.to_string(),
            message: e.to_string(),
        })
}

/// Parse a JSON demo document
///
/// # Errors
/// `Parse` on malformed input.
pub fn parse_json(text: &str, origin: &str) -> Result<Vec<Demo>, DemoError> {
    serde_json::from_str::<DemoFile>(text)
        .map(|f| f.demos)
        .map_err(|e| DemoError::Parse {
            origin: origin.to_string(),
            message: e.to_string(),
        })
}

fn builtin_demos() -> Vec<Demo> {
    vec![
        Demo::new(
            builtin::EXECUTIVE_OVERVIEW,
            "Executive Overview",
            vec![
                DemoStep::new("welcome", "Welcome to Datacendia", 6.0)
                    .with_description("A decision intelligence platform for the whole organization.")
                    .with_route("/cortex"),
                DemoStep::new("council", "The Council", 8.0)
                    .with_description("Specialist agents deliberate on every strategic question.")
                    .with_route("/cortex/council")
                    .with_highlight("#council-panel"),
                DemoStep::new("decisions", "Decision Log", 7.0)
                    .with_description("Every recommendation is recorded with its evidence trail.")
                    .with_route("/cortex/decisions"),
                DemoStep::new("metrics", "Live Metrics", 6.0)
                    .with_description("Operational KPIs refresh as the underlying data changes.")
                    .with_route("/cortex/dashboard")
                    .with_highlight("#kpi-grid"),
                DemoStep::new("summary", "Next Steps", 5.0)
                    .with_description("Pick a vertical to tailor the platform to your industry."),
            ],
        )
        .with_description("Five-minute tour for leadership")
        .with_category("overview"),
        Demo::new(
            builtin::VERTICAL_TOUR,
            "Industry Verticals",
            vec![
                DemoStep::new("catalog", "Service Catalog", 6.0)
                    .with_description("Services are grouped by category; core services are always on.")
                    .with_route("/settings/services"),
                DemoStep::new("select", "Choose a Vertical", 8.0)
                    .with_description("Selecting a vertical enables its recommended services.")
                    .with_route("/settings/vertical")
                    .with_highlight("#vertical-picker")
                    .wait_for_click(),
                DemoStep::new("toggle", "Fine-tune Services", 6.0)
                    .with_description("Toggle individual services; changes apply immediately.")
                    .with_route("/settings/services"),
            ],
        )
        .with_description("How verticals shape the enabled services")
        .with_category("configuration"),
        Demo::new(
            builtin::AUTO_HEAL_WALKTHROUGH,
            "Auto-Heal",
            vec![
                DemoStep::new("capture", "Error Capture", 5.0)
                    .with_description("Runtime errors are captured and classified by severity.")
                    .with_route("/admin/auto-heal"),
                DemoStep::new("suggest", "Fix Suggestions", 7.0)
                    .with_description("A specialist agent drafts a fix with a risk assessment.")
                    .with_highlight("#fix-list"),
                DemoStep::new("approve", "Approve or Reject", 6.0)
                    .with_description("Anything not marked safe waits for a reviewer.")
                    .with_highlight("#approve-button")
                    .wait_for_click(),
                DemoStep::new("limits", "Rate Limits", 5.0)
                    .with_description("Automatic fixes are capped per hour."),
            ],
        )
        .with_description("From captured error to approved fix")
        .with_category("operations"),
    ]
}
