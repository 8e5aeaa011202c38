//! Severity classification
//!
//! A fixed, ordered keyword policy over the lower-cased message: critical
//! keywords are checked first, then high, then medium; anything else is low.
//! The capture source plays no part.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error severity, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Application is unusable or data is at risk
    Critical,
    /// A feature is broken
    High,
    /// Degraded behaviour
    Medium,
    /// Cosmetic or informational
    Low,
}

impl Severity {
    /// Fixed ordering used for threshold comparison
    pub const ORDER: [Severity; 4] = [Self::Critical, Self::High, Self::Medium, Self::Low];

    /// Index in [`Self::ORDER`]; lower is more severe
    #[inline]
    #[must_use]
    pub fn rank(self) -> usize {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }

    /// Whether this severity is at or above `threshold`
    #[inline]
    #[must_use]
    pub fn meets(self, threshold: Severity) -> bool {
        self.rank() <= threshold.rank()
    }

    /// Lower-case name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Self::Critical),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

const CRITICAL_KEYWORDS: &[&str] = &[
    "fatal",
    "crash",
    "out of memory",
    "maximum call stack",
    "security",
    "data loss",
    "corrupt",
];

const HIGH_KEYWORDS: &[&str] = &[
    "cannot read",
    "undefined is not",
    "is not a function",
    "is not defined",
    "typeerror",
    "referenceerror",
    "of null",
];

const MEDIUM_KEYWORDS: &[&str] = &[
    "failed to fetch",
    "network",
    "timeout",
    "timed out",
    "syntaxerror",
    "unhandled",
    "rejected",
];

/// Classify a message
#[must_use]
pub fn classify(message: &str) -> Severity {
    let lower = message.to_lowercase();
    let hit = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

    if hit(CRITICAL_KEYWORDS) {
        Severity::Critical
    } else if hit(HIGH_KEYWORDS) {
        Severity::High
    } else if hit(MEDIUM_KEYWORDS) {
        Severity::Medium
    } else {
        Severity::Low
    }
}
