//! Typed mappers over the `/settings/*` endpoints

use crate::api::ApiClient;
use crate::error::ApiResult;
use serde::{Deserialize, Serialize};

/// Organization profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSettings {
    pub name: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

/// Partial update for [`OrganizationSettings`]; `None` fields are omitted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// Per-user preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub email_notifications: bool,
    #[serde(default)]
    pub reduced_motion: bool,
}

fn default_theme() -> String {
    "system".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            language: default_language(),
            email_notifications: false,
            reduced_motion: false,
        }
    }
}

/// Member of the organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub active: bool,
}

/// Client for settings endpoints
#[derive(Debug, Clone)]
pub struct SettingsClient {
    api: ApiClient,
}

impl SettingsClient {
    #[inline]
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// # Errors
    /// Any [`crate::ApiError`].
    pub async fn organization(&self) -> ApiResult<OrganizationSettings> {
        self.api.get_data("/settings/organization").await
    }

    /// # Errors
    /// Any [`crate::ApiError`].
    pub async fn update_organization(
        &self,
        patch: &OrganizationSettingsPatch,
    ) -> ApiResult<OrganizationSettings> {
        self.api.patch_data("/settings/organization", patch).await
    }

    /// # Errors
    /// Any [`crate::ApiError`].
    pub async fn preferences(&self) -> ApiResult<Preferences> {
        self.api.get_data("/settings/preferences").await
    }

    /// # Errors
    /// Any [`crate::ApiError`].
    pub async fn update_preferences(&self, preferences: &Preferences) -> ApiResult<Preferences> {
        self.api.patch_data("/settings/preferences", preferences).await
    }

    /// # Errors
    /// Any [`crate::ApiError`].
    pub async fn users(&self) -> ApiResult<Vec<UserSummary>> {
        self.api.get_data("/settings/users").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_omits_unset_fields() {
        let patch = OrganizationSettingsPatch {
            timezone: Some("UTC".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"timezone": "UTC"}));
    }

    #[test]
    fn preferences_fill_defaults() {
        let prefs: Preferences = serde_json::from_str(r#"{"reducedMotion": true}"#).unwrap();
        assert_eq!(prefs.theme, "system");
        assert_eq!(prefs.language, "en");
        assert!(prefs.reduced_motion);
    }
}
