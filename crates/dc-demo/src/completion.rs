//! Demo completion flags
//!
//! Flags are keyed `demo-completed:<id>`. The file store rewrites the whole
//! document on every change; concurrent writers race and the last one wins.

use crate::error::DemoError;
use dashmap::DashSet;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Key prefix for completion flags
pub const COMPLETION_KEY_PREFIX: &str = "demo-completed:";

/// Storage key for a demo's completion flag
#[must_use]
pub fn completion_key(demo_id: &str) -> String {
    format!("{COMPLETION_KEY_PREFIX}{demo_id}")
}

/// Completion flag storage
pub trait CompletionStore: Send + Sync {
    /// Whether the demo was completed
    fn is_completed(&self, demo_id: &str) -> bool;

    /// Set the flag
    ///
    /// # Errors
    /// Storage failures.
    fn mark_completed(&self, demo_id: &str) -> Result<(), DemoError>;

    /// Clear the flag
    ///
    /// # Errors
    /// Storage failures.
    fn reset(&self, demo_id: &str) -> Result<(), DemoError>;

    /// Completed demo ids, sorted
    fn completed(&self) -> Vec<String>;
}

/// Process-local flags
#[derive(Debug, Default)]
pub struct MemoryCompletionStore {
    keys: DashSet<String>,
}

impl MemoryCompletionStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CompletionStore for MemoryCompletionStore {
    fn is_completed(&self, demo_id: &str) -> bool {
        self.keys.contains(&completion_key(demo_id))
    }

    fn mark_completed(&self, demo_id: &str) -> Result<(), DemoError> {
        self.keys.insert(completion_key(demo_id));
        Ok(())
    }

    fn reset(&self, demo_id: &str) -> Result<(), DemoError> {
        self.keys.remove(&completion_key(demo_id));
        Ok(())
    }

    fn completed(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .keys
            .iter()
            .filter_map(|k| k.strip_prefix(COMPLETION_KEY_PREFIX).map(str::to_string))
            .collect();
        ids.sort();
        ids
    }
}

/// Flags persisted as a JSON object of `key -> bool`
#[derive(Debug)]
pub struct FileCompletionStore {
    path: PathBuf,
    flags: Mutex<BTreeMap<String, bool>>,
}

impl FileCompletionStore {
    /// Open the store, reading existing flags if the file exists
    ///
    /// # Errors
    /// Unreadable or malformed file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DemoError> {
        let path = path.into();
        let flags = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).map_err(|e| DemoError::Parse {
                origin: path.display().to_string(),
                message: e.to_string(),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(DemoError::Io { path, source }),
        };
        Ok(Self {
            path,
            flags: Mutex::new(flags),
        })
    }

    /// Backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, flags: &BTreeMap<String, bool>) -> Result<(), DemoError> {
        let io_err = |source| DemoError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(flags).map_err(|e| DemoError::Parse {
            origin: self.path.display().to_string(),
            message: e.to_string(),
        })?;
        std::fs::write(&self.path, json).map_err(io_err)
    }
}

impl CompletionStore for FileCompletionStore {
    fn is_completed(&self, demo_id: &str) -> bool {
        self.flags
            .lock()
            .get(&completion_key(demo_id))
            .copied()
            .unwrap_or(false)
    }

    fn mark_completed(&self, demo_id: &str) -> Result<(), DemoError> {
        let mut flags = self.flags.lock();
        flags.insert(completion_key(demo_id), true);
        self.persist(&flags)
    }

    fn reset(&self, demo_id: &str) -> Result<(), DemoError> {
        let mut flags = self.flags.lock();
        if flags.remove(&completion_key(demo_id)).is_none() {
            return Ok(());
        }
        self.persist(&flags)
    }

    fn completed(&self) -> Vec<String> {
        self.flags
            .lock()
            .iter()
            .filter(|(_, done)| **done)
            .filter_map(|(k, _)| k.strip_prefix(COMPLETION_KEY_PREFIX).map(str::to_string))
            .collect()
    }
}
