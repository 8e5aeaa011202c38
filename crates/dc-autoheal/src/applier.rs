//! Fix application seam
//!
//! Applying a fix means different things per deployment (opening a pull
//! request, hot-patching a config, paging someone). The service only needs to
//! know whether it worked.

use crate::fix::FixSuggestion;
use async_trait::async_trait;

/// Failure reported by an applier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to apply fix: {0}")]
pub struct ApplyError(pub String);

/// Applies approved or auto-applicable fixes
#[async_trait]
pub trait FixApplier: Send + Sync {
    /// Apply `fix`
    async fn apply(&self, fix: &FixSuggestion) -> Result<(), ApplyError>;
}

/// Applier that only records the fix in the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogApplier;

#[async_trait]
impl FixApplier for LogApplier {
    async fn apply(&self, fix: &FixSuggestion) -> Result<(), ApplyError> {
        tracing::info!(
            fix_id = %fix.id,
            error_id = %fix.error_id,
            agent = %fix.agent,
            risk = %fix.risk_level,
            file = fix.file_path.as_deref().unwrap_or("-"),
            "Applying fix: {}",
            fix.description
        );
        Ok(())
    }
}
