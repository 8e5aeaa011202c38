//! Captured error records

use crate::agent::{assign_agent, FixAgent};
use crate::severity::{classify, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Captured error identifier (ULID, sortable by capture time)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorId(pub Ulid);

impl ErrorId {
    /// Generate new id
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ErrorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ErrorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where an error was intercepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorSource {
    /// Global error handler
    WindowError,
    /// Unhandled promise rejection
    UnhandledRejection,
    /// Error-level log line
    ConsoleError,
    /// Rust panic
    Panic,
    /// Reported explicitly by application code
    Manual,
}

/// Source position of an error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

/// Raw error as handed to the capture entry points
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorReport {
    /// Error message
    pub message: String,
    /// Stack trace, if available
    pub stack: Option<String>,
    /// Source position, if available
    pub location: Option<SourceLocation>,
    /// Component or module the error surfaced in
    pub component: Option<String>,
}

impl ErrorReport {
    /// Report with just a message
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// With stack trace
    #[inline]
    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// With source position
    #[inline]
    #[must_use]
    pub fn with_location(mut self, file: impl Into<String>, line: u32, column: u32) -> Self {
        self.location = Some(SourceLocation {
            file: file.into(),
            line,
            column,
        });
        self
    }

    /// With component name
    #[inline]
    #[must_use]
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }
}

/// Queued error annotated with severity and agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedError {
    pub id: ErrorId,
    pub message: String,
    pub stack: Option<String>,
    pub location: Option<SourceLocation>,
    pub component: Option<String>,
    pub source: ErrorSource,
    pub severity: Severity,
    pub assigned_agent: FixAgent,
    pub captured_at: DateTime<Utc>,
    /// Identical captures folded into this entry
    pub occurrences: u32,
}

impl CapturedError {
    /// Annotate a report
    #[must_use]
    pub fn from_report(report: ErrorReport, source: ErrorSource, now: DateTime<Utc>) -> Self {
        let severity = classify(&report.message);
        let assigned_agent = assign_agent(&report.message, report.stack.as_deref(), source);
        Self {
            id: ErrorId::new(),
            message: report.message,
            stack: report.stack,
            location: report.location,
            component: report.component,
            source,
            severity,
            assigned_agent,
            captured_at: now,
            occurrences: 1,
        }
    }

    /// Whether another capture should fold into this one
    #[inline]
    #[must_use]
    pub fn is_duplicate_of(&self, message: &str, source: ErrorSource) -> bool {
        self.source == source && self.message == message
    }
}

const CONSOLE_KEYWORDS: &[&str] = &[
    "typeerror",
    "referenceerror",
    "syntaxerror",
    "cannot read",
    "is not a function",
    "is not defined",
    "undefined",
    "uncaught",
    "exception",
    "failed to",
    "fatal",
];

/// Heuristic filter for error-level log lines
///
/// Lines starting with `warning:` are never captured; otherwise the lower-cased
/// text must contain one of the error keywords.
#[must_use]
pub fn should_capture_console(message: &str) -> bool {
    let lower = message.trim_start().to_lowercase();
    if lower.starts_with("warning:") {
        return false;
    }
    CONSOLE_KEYWORDS.iter().any(|k| lower.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_filter_matches_keywords() {
        assert!(should_capture_console("Uncaught TypeError: x is not a function"));
        assert!(should_capture_console("Cannot read properties of null"));
        assert!(!should_capture_console("Rendered dashboard in 12ms"));
    }

    #[test]
    fn console_filter_skips_warnings() {
        assert!(!should_capture_console("Warning: Each child in a list should have a unique key; TypeError"));
        assert!(!should_capture_console("  warning: undefined prop"));
    }

    #[test]
    fn from_report_annotates() {
        let report = ErrorReport::new("Fatal: store corrupted")
            .with_location("src/store.ts", 10, 4)
            .with_component("MissionControl");
        let captured = CapturedError::from_report(report, ErrorSource::Manual, Utc::now());
        assert_eq!(captured.severity, Severity::Critical);
        assert_eq!(captured.occurrences, 1);
        assert_eq!(captured.component.as_deref(), Some("MissionControl"));
        assert!(captured.is_duplicate_of("Fatal: store corrupted", ErrorSource::Manual));
        assert!(!captured.is_duplicate_of("Fatal: store corrupted", ErrorSource::Panic));
    }
}
