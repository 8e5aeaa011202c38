//! Session bootstrap: current user and organization

use crate::api::ApiClient;
use crate::error::ApiResult;
use serde::{Deserialize, Serialize};

/// Authenticated user as returned by `GET /auth/me`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    /// User id
    pub id: String,
    /// Login email
    pub email: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Role names granted in the current organization
    #[serde(default)]
    pub roles: Vec<String>,
    /// Organization the session is bound to
    #[serde(default)]
    pub organization_id: Option<String>,
}

impl CurrentUser {
    /// Check for a role by name
    #[inline]
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }
}

/// Organization as returned by `GET /organizations/current`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    /// Organization id
    pub id: String,
    /// Display name
    pub name: String,
    /// URL slug
    #[serde(default)]
    pub slug: Option<String>,
    /// Selected vertical, if any
    #[serde(default)]
    pub vertical_id: Option<String>,
    /// Billing plan
    #[serde(default)]
    pub plan: Option<String>,
}

/// Everything a client needs before rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Signed-in user
    pub user: CurrentUser,
    /// Active organization
    pub organization: Organization,
}

/// Client for session endpoints
#[derive(Debug, Clone)]
pub struct SessionClient {
    api: ApiClient,
}

impl SessionClient {
    /// Create from a shared API client
    #[inline]
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Fetch the signed-in user
    ///
    /// # Errors
    /// Any [`crate::ApiError`].
    pub async fn me(&self) -> ApiResult<CurrentUser> {
        self.api.get_data("/auth/me").await
    }

    /// Fetch the active organization
    ///
    /// # Errors
    /// Any [`crate::ApiError`].
    pub async fn current_organization(&self) -> ApiResult<Organization> {
        self.api.get_data("/organizations/current").await
    }

    /// Fetch user and organization concurrently
    ///
    /// # Errors
    /// The first failure of either request.
    pub async fn bootstrap(&self) -> ApiResult<Session> {
        let (user, organization) = futures::join!(self.me(), self.current_organization());
        let session = Session {
            user: user?,
            organization: organization?,
        };
        tracing::info!(
            user = %session.user.id,
            organization = %session.organization.id,
            "session bootstrapped"
        );
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_user_decodes_camel_case() {
        let user: CurrentUser = serde_json::from_str(
            r#"{"id":"u1","email":"a@b.c","roles":["Admin"],"organizationId":"org-1"}"#,
        )
        .unwrap();
        assert_eq!(user.organization_id.as_deref(), Some("org-1"));
        assert!(user.has_role("admin"));
        assert!(!user.has_role("billing"));
    }

    #[test]
    fn organization_optional_fields() {
        let org: Organization = serde_json::from_str(r#"{"id":"o","name":"Acme"}"#).unwrap();
        assert!(org.vertical_id.is_none());
    }
}
