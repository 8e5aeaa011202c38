//! Fix suggestions and strict parsing of model output
//!
//! The model is asked for a fenced JSON block. Output is accepted only if it
//! contains one (or is a bare JSON object) that deserialises into a
//! [`FixDraft`]; anything else is a [`FixParseError`].

use crate::agent::FixAgent;
use crate::capture::{CapturedError, ErrorId};
use crate::severity::Severity;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

static FENCED_JSON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?[ \t]*\r?\n?\s*(\{.*?\})\s*```").expect("valid regex")
});

/// Longest excerpt of unparseable output kept in an error
const EXCERPT_LEN: usize = 120;

/// How risky applying a fix is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Local, reversible change
    Safe,
    /// Behavioural change within one component
    Moderate,
    /// Cross-cutting or data-affecting change
    Risky,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Safe => "safe",
            Self::Moderate => "moderate",
            Self::Risky => "risky",
        })
    }
}

/// Lifecycle of a suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FixStatus {
    /// Waiting for approval
    Pending,
    /// Approved; the applier is running
    Applying,
    /// Applied automatically or after approval
    Applied,
    /// Rejected by a reviewer
    Rejected,
    /// Applier reported failure
    Failed,
}

/// Fields the model is asked to produce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixDraft {
    pub description: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub original_code: Option<String>,
    #[serde(default)]
    pub suggested_code: Option<String>,
    pub risk_level: RiskLevel,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    0.5
}

/// Reasons model output was not accepted
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FixParseError {
    /// Nothing but whitespace
    #[error("empty model response")]
    Empty,

    /// No fenced block or bare object found
    #[error("no JSON object in model response: {excerpt:?}")]
    NoJson {
        /// Start of the response
        excerpt: String,
    },

    /// JSON found but not a valid draft
    #[error("malformed fix JSON: {0}")]
    InvalidJson(String),

    /// Draft decoded but fails validation
    #[error("invalid fix: {0}")]
    Invalid(String),
}

/// Parse model output into a draft
///
/// # Errors
/// See [`FixParseError`].
pub fn parse_fix_response(raw: &str) -> Result<FixDraft, FixParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FixParseError::Empty);
    }

    let json = if let Some(caps) = FENCED_JSON.captures(trimmed) {
        caps.get(1).map_or("", |m| m.as_str())
    } else if trimmed.starts_with('{') && trimmed.ends_with('}') {
        trimmed
    } else {
        return Err(FixParseError::NoJson {
            excerpt: trimmed.chars().take(EXCERPT_LEN).collect(),
        });
    };

    let mut draft: FixDraft =
        serde_json::from_str(json).map_err(|e| FixParseError::InvalidJson(e.to_string()))?;

    if draft.description.trim().is_empty() {
        return Err(FixParseError::Invalid("description is empty".to_string()));
    }
    if !draft.confidence.is_finite() {
        return Err(FixParseError::Invalid("confidence is not a number".to_string()));
    }
    draft.confidence = draft.confidence.clamp(0.0, 1.0);

    Ok(draft)
}

/// Suggested fix for a captured error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixSuggestion {
    pub id: Uuid,
    pub error_id: ErrorId,
    pub error_message: String,
    pub severity: Severity,
    pub agent: FixAgent,
    pub description: String,
    pub explanation: String,
    pub file_path: Option<String>,
    pub original_code: Option<String>,
    pub suggested_code: Option<String>,
    pub risk_level: RiskLevel,
    pub confidence: f64,
    pub status: FixStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl FixSuggestion {
    /// Pending suggestion built from a draft
    #[must_use]
    pub fn from_draft(draft: FixDraft, error: &CapturedError, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            error_id: error.id,
            error_message: error.message.clone(),
            severity: error.severity,
            agent: error.assigned_agent,
            description: draft.description,
            explanation: draft.explanation,
            file_path: draft.file_path,
            original_code: draft.original_code,
            suggested_code: draft.suggested_code,
            risk_level: draft.risk_level,
            confidence: draft.confidence,
            status: FixStatus::Pending,
            created_at: now,
            resolved_at: None,
        }
    }

    /// Whether this fix may be applied without a reviewer
    #[inline]
    #[must_use]
    pub fn is_auto_applicable(&self, require_approval: bool) -> bool {
        !require_approval && self.risk_level == RiskLevel::Safe
    }

    /// Move to a terminal status
    pub fn resolve(&mut self, status: FixStatus, now: DateTime<Utc>) {
        self.status = status;
        self.resolved_at = Some(now);
    }
}
