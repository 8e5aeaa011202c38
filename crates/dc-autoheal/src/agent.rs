//! Fix agent assignment
//!
//! Each captured error is routed to the specialist agent whose prompt
//! persona best matches it. Matching runs over message and stack together.

use crate::capture::ErrorSource;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Specialist that drafts the fix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FixAgent {
    /// Rendering, component state, type errors
    Frontend,
    /// Fetch failures, API contracts, CORS
    Network,
    /// Parsing, serialization, schema mismatches
    Data,
    /// Auth, permissions, content policy
    Security,
    /// Memory, recursion, timeouts
    Performance,
}

impl FixAgent {
    /// Persona line used in the generation prompt
    #[must_use]
    pub fn persona(self) -> &'static str {
        match self {
            Self::Frontend => "a senior frontend engineer focused on component correctness",
            Self::Network => "an API integration engineer focused on request handling",
            Self::Data => "a data engineer focused on parsing and schema validation",
            Self::Security => "an application security engineer",
            Self::Performance => "a performance engineer focused on memory and latency",
        }
    }
}

impl fmt::Display for FixAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Frontend => "frontend",
            Self::Network => "network",
            Self::Data => "data",
            Self::Security => "security",
            Self::Performance => "performance",
        };
        f.write_str(name)
    }
}

const SECURITY_KEYWORDS: &[&str] = &[
    "unauthorized",
    "forbidden",
    "401",
    "403",
    "csrf",
    "cors",
    "content security policy",
    "token",
];
const PERFORMANCE_KEYWORDS: &[&str] = &[
    "out of memory",
    "maximum call stack",
    "timeout",
    "timed out",
    "too much recursion",
];
const NETWORK_KEYWORDS: &[&str] = &["fetch", "network", "econnrefused", "http", "socket"];
const DATA_KEYWORDS: &[&str] = &["json", "parse", "unexpected token", "schema", "serialize"];

/// Assign the agent for an error
#[must_use]
pub fn assign_agent(message: &str, stack: Option<&str>, source: ErrorSource) -> FixAgent {
    let haystack = format!("{} {}", message, stack.unwrap_or_default()).to_lowercase();
    let hit = |keywords: &[&str]| keywords.iter().any(|k| haystack.contains(k));

    if hit(SECURITY_KEYWORDS) {
        FixAgent::Security
    } else if hit(PERFORMANCE_KEYWORDS) {
        FixAgent::Performance
    } else if hit(NETWORK_KEYWORDS) || source == ErrorSource::UnhandledRejection {
        FixAgent::Network
    } else if hit(DATA_KEYWORDS) {
        FixAgent::Data
    } else {
        FixAgent::Frontend
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_error_goes_to_frontend() {
        let agent = assign_agent(
            "TypeError: Cannot read properties of undefined",
            None,
            ErrorSource::WindowError,
        );
        assert_eq!(agent, FixAgent::Frontend);
    }

    #[test]
    fn security_wins_over_network() {
        let agent = assign_agent("fetch failed: 403 Forbidden", None, ErrorSource::ConsoleError);
        assert_eq!(agent, FixAgent::Security);
    }

    #[test]
    fn rejections_default_to_network() {
        let agent = assign_agent("something odd", None, ErrorSource::UnhandledRejection);
        assert_eq!(agent, FixAgent::Network);
    }

    #[test]
    fn stack_is_considered() {
        let agent = assign_agent(
            "boom",
            Some("at JSON.parse (<anonymous>)"),
            ErrorSource::WindowError,
        );
        assert_eq!(agent, FixAgent::Data);
    }
}
