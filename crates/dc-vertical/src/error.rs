//! Error types for the vertical configuration cache

use dc_core::ApiError;
use std::sync::Arc;

/// Vertical configuration errors
///
/// Store operations never return these to callers; they are logged and kept
/// as the display string in [`crate::VerticalState::error`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum VerticalError {
    /// Backend call failed
    #[error("backend error: {0}")]
    Backend(String),

    /// Vertical id not present in the loaded templates
    #[error("unknown vertical: {0}")]
    UnknownVertical(String),
}

impl From<ApiError> for VerticalError {
    fn from(err: ApiError) -> Self {
        Self::Backend(err.to_string())
    }
}

impl From<Arc<ApiError>> for VerticalError {
    fn from(err: Arc<ApiError>) -> Self {
        Self::Backend(err.to_string())
    }
}
