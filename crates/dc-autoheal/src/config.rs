//! Auto-heal settings
//!
//! Persisted as a small JSON document. A missing file means defaults; a file
//! that exists but does not parse is an error.

use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Auto-heal settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoHealConfig {
    /// Master switch for capture and processing
    pub enabled: bool,
    /// Least severe error that gets a fix generated
    pub auto_fix_severity: Severity,
    /// Cap on automatically applied fixes per hour
    pub max_auto_fixes_per_hour: u32,
    /// Queue every fix for approval instead of applying
    pub require_approval: bool,
    /// Capture error-level log lines
    pub capture_console_errors: bool,
    /// Model name forwarded to the generation endpoint
    pub model: String,
}

impl Default for AutoHealConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_fix_severity: Severity::High,
            max_auto_fixes_per_hour: 5,
            require_approval: true,
            capture_console_errors: true,
            model: "default".to_string(),
        }
    }
}

impl AutoHealConfig {
    /// With severity threshold
    #[inline]
    #[must_use]
    pub fn with_auto_fix_severity(mut self, severity: Severity) -> Self {
        self.auto_fix_severity = severity;
        self
    }

    /// With hourly cap
    #[inline]
    #[must_use]
    pub fn with_max_auto_fixes_per_hour(mut self, max: u32) -> Self {
        self.max_auto_fixes_per_hour = max;
        self
    }

    /// With approval requirement
    #[inline]
    #[must_use]
    pub fn with_require_approval(mut self, require: bool) -> Self {
        self.require_approval = require;
        self
    }

    /// With model name
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Load from `path`, or defaults if the file does not exist
    ///
    /// # Errors
    /// Unreadable or malformed file.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No auto-heal config, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Write to `path` as pretty JSON, creating parent directories
    ///
    /// # Errors
    /// Filesystem failures.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, json).map_err(io_err)
    }
}

/// Errors loading or saving settings
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Filesystem failure
    #[error("auto-heal config I/O error at {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Contents are not a valid config
    #[error("invalid auto-heal config at {path}: {message}")]
    Parse {
        /// File involved
        path: PathBuf,
        /// Decoder message
        message: String,
    },
}
