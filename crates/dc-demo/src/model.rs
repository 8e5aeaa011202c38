//! Demo definitions

use crate::error::DemoError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Longest step a demo may schedule, in seconds
pub const MAX_STEP_SECS: f64 = 86_400.0;

/// One step of a guided demo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoStep {
    /// Step id, unique within its demo
    pub id: String,
    /// Heading shown in the overlay
    pub title: String,
    /// Body text shown in the overlay
    #[serde(default)]
    pub description: String,
    /// Seconds before auto-advance
    #[serde(rename = "duration")]
    pub duration_secs: f64,
    /// Route the application should navigate to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    /// Element to highlight
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<String>,
    /// Narration read while the step is shown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    /// Hold on this step until advanced by hand
    #[serde(default)]
    pub wait_for_click: bool,
}

impl DemoStep {
    /// Create a timed step
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, duration_secs: f64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            duration_secs,
            route: None,
            highlight: None,
            script: None,
            wait_for_click: false,
        }
    }

    /// With body text
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// With route
    #[inline]
    #[must_use]
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    /// With highlighted element
    #[inline]
    #[must_use]
    pub fn with_highlight(mut self, selector: impl Into<String>) -> Self {
        self.highlight = Some(selector.into());
        self
    }

    /// With narration
    #[inline]
    #[must_use]
    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = Some(script.into());
        self
    }

    /// Hold until advanced by hand
    #[inline]
    #[must_use]
    pub fn wait_for_click(mut self) -> Self {
        self.wait_for_click = true;
        self
    }

    /// Auto-advance delay
    ///
    /// Only meaningful for validated steps; values that are not positive or
    /// not representable map to zero.
    #[must_use]
    pub fn duration(&self) -> Duration {
        if self.duration_secs > 0.0 {
            Duration::try_from_secs_f64(self.duration_secs).unwrap_or(Duration::ZERO)
        } else {
            Duration::ZERO
        }
    }
}

/// A guided demo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Demo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub steps: Vec<DemoStep>,
}

impl Demo {
    /// Create a demo
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, steps: Vec<DemoStep>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category: String::new(),
            steps,
        }
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// With category
    #[inline]
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Index of the last step
    #[inline]
    #[must_use]
    pub fn last_index(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    /// Total scripted time, ignoring click holds
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.steps.iter().map(DemoStep::duration).sum()
    }

    /// Check the demo is playable
    ///
    /// # Errors
    /// `InvalidDemo` if the id is blank, there are no steps, step ids repeat,
    /// or a duration is not a positive number up to [`MAX_STEP_SECS`].
    pub fn validate(&self) -> Result<(), DemoError> {
        let invalid = |reason: String| DemoError::InvalidDemo {
            id: self.id.clone(),
            reason,
        };

        if self.id.trim().is_empty() {
            return Err(invalid("demo id is empty".to_string()));
        }
        if self.steps.is_empty() {
            return Err(invalid("demo has no steps".to_string()));
        }

        let mut seen = HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.id.as_str()) {
                return Err(invalid(format!("duplicate step id '{}'", step.id)));
            }
            if !(step.duration_secs.is_finite() && step.duration_secs > 0.0) {
                return Err(invalid(format!(
                    "step '{}' has non-positive duration {}",
                    step.id, step.duration_secs
                )));
            }
            if step.duration_secs > MAX_STEP_SECS {
                return Err(invalid(format!(
                    "step '{}' duration {} exceeds {MAX_STEP_SECS} seconds",
                    step.id, step.duration_secs
                )));
            }
        }
        Ok(())
    }
}
