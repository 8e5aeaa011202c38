//! Service-level errors

use crate::applier::ApplyError;
use crate::config::ConfigError;
use crate::fix::FixStatus;
use uuid::Uuid;

/// Errors from approval and persistence operations
#[derive(Debug, thiserror::Error)]
pub enum AutoHealError {
    /// No fix with this id
    #[error("fix not found: {0}")]
    FixNotFound(Uuid),

    /// Fix was already resolved
    #[error("fix {id} is {status:?}, not pending")]
    FixNotPending {
        /// Fix id
        id: Uuid,
        /// Current status
        status: FixStatus,
    },

    /// Applier failed
    #[error(transparent)]
    Apply(#[from] ApplyError),

    /// Settings could not be read or written
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result alias for auto-heal operations
pub type AutoHealResult<T> = Result<T, AutoHealError>;
