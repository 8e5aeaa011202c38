//! REST client configuration
//!
//! The API base comes from `DATACENDIA_API_URL`, then `VITE_API_URL` (the
//! name the web build uses), then the local development default.

use serde::{Deserialize, Serialize};

/// Primary environment variable for the API base URL
pub const API_URL_ENV: &str = "DATACENDIA_API_URL";

/// Fallback environment variable shared with the web build
pub const LEGACY_API_URL_ENV: &str = "VITE_API_URL";

/// Environment variable holding a bearer token
pub const API_TOKEN_ENV: &str = "DATACENDIA_API_TOKEN";

/// Base URL used when nothing is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:3001/api/v1";

/// Connection settings for [`crate::ApiClient`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API base, including the `/api/v1` prefix
    pub base_url: String,
    /// Bearer token sent as `Authorization`
    pub auth_token: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl ClientConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With base URL
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// With bearer token
    #[inline]
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Apply environment overrides on top of this configuration
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let url = lookup(API_URL_ENV)
            .or_else(|| lookup(LEGACY_API_URL_ENV))
            .filter(|v| !v.trim().is_empty());
        if let Some(url) = url {
            self.base_url = url;
        }
        if let Some(token) = lookup(API_TOKEN_ENV).filter(|v| !v.trim().is_empty()) {
            self.auth_token = Some(token);
        }
        self
    }

    /// Join a request path onto the base URL
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_token: None,
            timeout_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_points_at_local_backend() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn primary_env_wins_over_legacy() {
        let config = ClientConfig::new().with_overrides_from(lookup(&[
            (API_URL_ENV, "https://api.example.com/api/v1"),
            (LEGACY_API_URL_ENV, "https://legacy.example.com/api/v1"),
        ]));
        assert_eq!(config.base_url, "https://api.example.com/api/v1");
    }

    #[test]
    fn legacy_env_used_as_fallback() {
        let config = ClientConfig::new()
            .with_overrides_from(lookup(&[(LEGACY_API_URL_ENV, "http://vite:8080/api/v1")]));
        assert_eq!(config.base_url, "http://vite:8080/api/v1");
    }

    #[test]
    fn blank_env_is_ignored() {
        let config = ClientConfig::new().with_overrides_from(lookup(&[(API_URL_ENV, "  ")]));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn url_for_normalises_slashes() {
        let config = ClientConfig::new().with_base_url("http://host/api/v1/");
        assert_eq!(
            config.url_for("/vertical-config/services"),
            "http://host/api/v1/vertical-config/services"
        );
        assert_eq!(config.url_for("auth/me"), "http://host/api/v1/auth/me");
    }
}
