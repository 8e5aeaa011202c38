//! Fix generation backends
//!
//! [`FixGenerator`] turns a prompt into raw model text. The HTTP
//! implementation posts to the backend's `/auto-heal/generate` endpoint,
//! which fronts whichever model the deployment runs.

use crate::capture::CapturedError;
use async_trait::async_trait;
use dc_core::{ApiClient, ApiError};
use serde::{Deserialize, Serialize};

/// Generation endpoint, relative to the API base
pub const GENERATE_PATH: &str = "/auto-heal/generate";

/// System prompt sent with every request
pub const SYSTEM_PROMPT: &str = "You are an automated error remediation assistant. \
Respond with a single fenced ```json block containing the fields: description, \
explanation, filePath, originalCode, suggestedCode, riskLevel (safe|moderate|risky) \
and confidence (0 to 1). Do not include any other JSON.";

/// Body of a generation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixRequest {
    pub prompt: String,
    pub model: String,
    pub system_prompt: String,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Errors from a generator
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// Backend call failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Model answered with nothing
    #[error("model returned an empty response")]
    EmptyResponse,
}

/// Source of raw fix text
#[async_trait]
pub trait FixGenerator: Send + Sync {
    /// Generate a raw response for `request`
    async fn generate(&self, request: &FixRequest) -> Result<String, GenerateError>;
}

/// Build the request for a captured error
#[must_use]
pub fn build_request(error: &CapturedError, model: &str) -> FixRequest {
    let mut prompt = format!(
        "You are {}.\n\nAn error was captured in the running application.\n\n\
         Severity: {}\nSource: {:?}\nOccurrences: {}\nMessage: {}\n",
        error.assigned_agent.persona(),
        error.severity,
        error.source,
        error.occurrences,
        error.message,
    );
    if let Some(location) = &error.location {
        prompt.push_str(&format!(
            "Location: {}:{}:{}\n",
            location.file, location.line, location.column
        ));
    }
    if let Some(component) = &error.component {
        prompt.push_str(&format!("Component: {component}\n"));
    }
    if let Some(stack) = &error.stack {
        prompt.push_str(&format!("Stack:\n{stack}\n"));
    }
    prompt.push_str("\nPropose the smallest change that prevents this error.");

    FixRequest {
        prompt,
        model: model.to_string(),
        system_prompt: SYSTEM_PROMPT.to_string(),
    }
}

/// Generator backed by the REST API
#[derive(Debug, Clone)]
pub struct HttpFixGenerator {
    api: ApiClient,
}

impl HttpFixGenerator {
    /// Create generator
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl FixGenerator for HttpFixGenerator {
    async fn generate(&self, request: &FixRequest) -> Result<String, GenerateError> {
        let data: GenerateResponse = self.api.post_data(GENERATE_PATH, request).await?;
        if data.response.trim().is_empty() {
            return Err(GenerateError::EmptyResponse);
        }
        Ok(data.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{ErrorReport, ErrorSource};
    use chrono::Utc;

    #[test]
    fn request_carries_context() {
        let report = ErrorReport::new("TypeError: rows is undefined")
            .with_stack("at FleetTable (FleetTable.tsx:12:3)")
            .with_location("FleetTable.tsx", 12, 3)
            .with_component("FleetTable");
        let error = CapturedError::from_report(report, ErrorSource::WindowError, Utc::now());
        let request = build_request(&error, "qwen2.5-coder");

        assert_eq!(request.model, "qwen2.5-coder");
        assert_eq!(request.system_prompt, SYSTEM_PROMPT);
        assert!(request.prompt.contains("Severity: high"));
        assert!(request.prompt.contains("Location: FleetTable.tsx:12:3"));
        assert!(request.prompt.contains("Component: FleetTable"));
        assert!(request.prompt.contains(error.assigned_agent.persona()));
    }

    #[test]
    fn request_serializes_camel_case() {
        let request = FixRequest {
            prompt: "p".into(),
            model: "m".into(),
            system_prompt: "s".into(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["systemPrompt"], "s");
        assert!(json.get("system_prompt").is_none());
    }
}
