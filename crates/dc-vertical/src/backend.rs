//! Backend seam for vertical configuration
//!
//! [`HttpVerticalConfigBackend`] talks to the `/vertical-config/*` REST
//! endpoints; tests substitute an in-memory implementation.

use crate::model::{
    BulkToggleRequest, OrganizationVerticalConfig, SelectVerticalRequest, ServiceDefinition,
    ServiceToggle, VerticalTemplate,
};
use async_trait::async_trait;
use dc_core::{ApiClient, ApiResult};

/// Endpoint paths relative to the API base
pub mod paths {
    /// Service catalog
    pub const SERVICES: &str = "/vertical-config/services";
    /// Vertical templates
    pub const VERTICALS: &str = "/vertical-config/verticals";
    /// Organization config
    pub const ORGANIZATION: &str = "/vertical-config/organization";
    /// Switch vertical
    pub const SELECT_VERTICAL: &str = "/vertical-config/organization/vertical";
    /// Toggle one service
    pub const TOGGLE: &str = "/vertical-config/organization/services/toggle";
    /// Toggle several services
    pub const BULK_TOGGLE: &str = "/vertical-config/organization/services/bulk-toggle";
}

/// Vertical configuration backend
#[async_trait]
pub trait VerticalConfigBackend: Send + Sync {
    /// Fetch the service catalog
    async fn fetch_catalog(&self) -> ApiResult<Vec<ServiceDefinition>>;

    /// Fetch vertical templates
    async fn fetch_verticals(&self) -> ApiResult<Vec<VerticalTemplate>>;

    /// Fetch the current organization's config
    async fn fetch_organization_config(&self) -> ApiResult<OrganizationVerticalConfig>;

    /// Switch the organization to another vertical
    async fn select_vertical(
        &self,
        request: &SelectVerticalRequest,
    ) -> ApiResult<OrganizationVerticalConfig>;

    /// Toggle one service, returning the updated config
    async fn toggle_service(&self, toggle: &ServiceToggle)
        -> ApiResult<OrganizationVerticalConfig>;

    /// Toggle several services as one call, returning the updated config
    async fn bulk_toggle(&self, request: &BulkToggleRequest)
        -> ApiResult<OrganizationVerticalConfig>;
}

/// REST implementation over [`ApiClient`]
#[derive(Debug, Clone)]
pub struct HttpVerticalConfigBackend {
    api: ApiClient,
}

impl HttpVerticalConfigBackend {
    /// Create from a shared API client
    #[inline]
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl VerticalConfigBackend for HttpVerticalConfigBackend {
    async fn fetch_catalog(&self) -> ApiResult<Vec<ServiceDefinition>> {
        self.api.get_data(paths::SERVICES).await
    }

    async fn fetch_verticals(&self) -> ApiResult<Vec<VerticalTemplate>> {
        self.api.get_data(paths::VERTICALS).await
    }

    async fn fetch_organization_config(&self) -> ApiResult<OrganizationVerticalConfig> {
        self.api.get_data(paths::ORGANIZATION).await
    }

    async fn select_vertical(
        &self,
        request: &SelectVerticalRequest,
    ) -> ApiResult<OrganizationVerticalConfig> {
        self.api.post_data(paths::SELECT_VERTICAL, request).await
    }

    async fn toggle_service(
        &self,
        toggle: &ServiceToggle,
    ) -> ApiResult<OrganizationVerticalConfig> {
        self.api.post_data(paths::TOGGLE, toggle).await
    }

    async fn bulk_toggle(
        &self,
        request: &BulkToggleRequest,
    ) -> ApiResult<OrganizationVerticalConfig> {
        self.api.post_data(paths::BULK_TOGGLE, request).await
    }
}
