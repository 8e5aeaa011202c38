//! `datacendia.toml` loading
//!
//! Every table is optional. A missing default file means defaults; a file
//! named explicitly on the command line must exist.

use dc_autoheal::AutoHealConfig;
use dc_core::{ClientConfig, LogOptions};
use dc_demo::PlayerOptions;
use dc_vertical::StoreOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File looked up in the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "datacendia.toml";

/// Demo table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    /// Extra YAML/JSON demo definition files
    pub definitions: Vec<PathBuf>,
    /// Where completion flags persist; in-memory when unset
    pub completion_file: Option<PathBuf>,
    /// Playback speed multiplier
    pub speed: f64,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            definitions: Vec::new(),
            completion_file: None,
            speed: 1.0,
        }
    }
}

/// Whole application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub client: ClientConfig,
    pub vertical: StoreOptions,
    pub auto_heal: AutoHealConfig,
    pub logging: LogOptions,
    pub demo: DemoSettings,
}

/// Errors loading or rendering the configuration
#[derive(Debug, thiserror::Error)]
pub enum AppConfigError {
    /// File could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// File is not valid TOML for this schema
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Values parsed but are out of range
    #[error("invalid config {path}: {message}")]
    Invalid { path: PathBuf, message: String },

    /// Rendering back to TOML failed
    #[error("cannot render config: {0}")]
    Render(#[from] toml::ser::Error),
}

impl AppConfig {
    /// Load from an explicit path, or from [`DEFAULT_CONFIG_FILE`] if present
    ///
    /// # Errors
    /// Explicit path missing, unreadable file, or malformed TOML.
    pub fn load(explicit: Option<&Path>) -> Result<Self, AppConfigError> {
        let (path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        match std::fs::read_to_string(&path) {
            Ok(text) => Self::from_toml_str(&text, &path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(AppConfigError::Io { path, source }),
        }
    }

    /// Parse TOML text; `path` is only used in error messages
    ///
    /// # Errors
    /// Malformed TOML, wrong value types, or out-of-range values.
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, AppConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| AppConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if !PlayerOptions::is_valid_speed(config.demo.speed) {
            return Err(AppConfigError::Invalid {
                path: path.to_path_buf(),
                message: format!("demo.speed must be a positive number, got {}", config.demo.speed),
            });
        }
        Ok(config)
    }

    /// Apply `DATACENDIA_*` environment overrides to the client table
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        self.client = self.client.with_overrides_from(lookup);
        self
    }

    /// Player options from the demo table
    #[inline]
    #[must_use]
    pub fn player_options(&self) -> PlayerOptions {
        PlayerOptions {
            speed: self.demo.speed,
        }
    }

    /// Render the effective configuration as TOML
    ///
    /// # Errors
    /// Values TOML cannot represent.
    pub fn to_toml_string(&self) -> Result<String, AppConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dc_autoheal::Severity;

    const SAMPLE: &str = r#"
[client]
base_url = "https://api.example.com/api/v1"
timeout_secs = 10

[vertical]
catalog_ttl_secs = 60

[auto_heal]
auto_fix_severity = "critical"
require_approval = false

[logging]
filter = "dc_autoheal=debug,info"
json = true

[demo]
definitions = ["demos/fleet.yaml"]
speed = 2.0
"#;

    #[test]
    fn parses_every_table() {
        let config = AppConfig::from_toml_str(SAMPLE, Path::new("datacendia.toml")).unwrap();
        assert_eq!(config.client.base_url, "https://api.example.com/api/v1");
        assert_eq!(config.client.timeout_secs, 10);
        assert_eq!(config.vertical.catalog_ttl_secs, 60);
        assert_eq!(config.auto_heal.auto_fix_severity, Severity::Critical);
        assert!(!config.auto_heal.require_approval);
        assert_eq!(config.auto_heal.max_auto_fixes_per_hour, 5);
        assert!(config.logging.json);
        assert_eq!(config.demo.definitions, vec![PathBuf::from("demos/fleet.yaml")]);
        assert!((config.player_options().speed - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_file_is_default() {
        let config = AppConfig::from_toml_str("", Path::new("empty.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn wrong_type_is_parse_error() {
        let err = AppConfig::from_toml_str("[vertical]\ncatalog_ttl_secs = \"soon\"\n", Path::new("x.toml"))
            .unwrap_err();
        assert!(matches!(err, AppConfigError::Parse { .. }));
    }

    #[test]
    fn unusable_speed_is_rejected() {
        for speed in ["0.0", "-1.5", "nan", "inf"] {
            let err = AppConfig::from_toml_str(&format!("[demo]\nspeed = {speed}\n"), Path::new("x.toml"))
                .unwrap_err();
            assert!(matches!(err, AppConfigError::Invalid { .. }), "{speed}");
        }
        let config = AppConfig::from_toml_str("[demo]\nspeed = 1e-300\n", Path::new("x.toml")).unwrap();
        assert!(config.demo.speed > 0.0);
    }

    #[test]
    fn env_override_replaces_base_url() {
        let config = AppConfig::default().with_overrides_from(|key| {
            (key == dc_core::config::API_URL_ENV).then(|| "http://staging/api/v1".to_string())
        });
        assert_eq!(config.client.base_url, "http://staging/api/v1");
    }

    #[test]
    fn rendered_toml_reloads() {
        let config = AppConfig::from_toml_str(SAMPLE, Path::new("datacendia.toml")).unwrap();
        let text = config.to_toml_string().unwrap();
        assert_eq!(AppConfig::from_toml_str(&text, Path::new("again.toml")).unwrap(), config);
    }
}
