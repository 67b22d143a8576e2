//! Durable storage for the theme preference.
//!
//! [`KeyValueStore`] is the raw backend, modelled on a browser's local
//! storage: string keys, string values, every call may fail.
//! [`PreferenceStore`] sits on top and never fails: unreadable or unknown
//! values load as the default mode, failed writes are logged and dropped.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::mode::ThemeMode;
use crate::error::StoreError;

/// A string key-value store.
///
/// The theme context calls `set` before it updates its own state, so an
/// implementation may read the context but must not switch its mode.
pub trait KeyValueStore {
    /// Returns the stored value, `None` when the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory store. Clones share the same map, so a host can keep a handle
/// and inspect what the resolver wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with one entry.
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        store
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.value(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A JSON object on disk, one member per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    const APP_DIR: &'static str = "foodflow";
    const FILE_NAME: &'static str = "preferences.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/foodflow/preferences.json` for the current user.
    pub fn default_location() -> Result<Self, StoreError> {
        let dir = dirs::config_dir().ok_or_else(|| {
            StoreError::Unavailable("no configuration directory for this user".to_string())
        })?;
        Ok(Self::new(dir.join(Self::APP_DIR).join(Self::FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&raw).map_err(|source| StoreError::Corrupted {
            path: self.path.clone(),
            source,
        })
    }

    /// Writes to a temporary file next to the target and renames it into
    /// place, so an interrupted write never leaves a half-written file.
    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(io_err)?;
        let body = serde_json::to_string_pretty(map).map_err(|source| StoreError::Corrupted {
            path: self.path.clone(),
            source,
        })?;

        let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
        file.write_all(body.as_bytes()).map_err(io_err)?;
        file.persist(&self.path).map_err(|err| io_err(err.error))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_map()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut map = match self.read_map() {
            Ok(map) => map,
            Err(err @ StoreError::Corrupted { .. }) => {
                debug!(error = %err, "replacing corrupted preference file");
                BTreeMap::new()
            }
            Err(err) => return Err(err),
        };
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }
}

/// Soft-failing theme preference persistence under a single key.
pub struct PreferenceStore {
    backend: Box<dyn KeyValueStore>,
    key: String,
    default_mode: ThemeMode,
}

impl PreferenceStore {
    pub fn new(
        backend: Box<dyn KeyValueStore>,
        key: impl Into<String>,
        default_mode: ThemeMode,
    ) -> Self {
        Self {
            backend,
            key: key.into(),
            default_mode,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Reads the stored mode, falling back to the default on any failure.
    pub fn load(&self) -> ThemeMode {
        match self.backend.get(&self.key) {
            Ok(Some(raw)) => match raw.parse() {
                Ok(mode) => mode,
                Err(err) => {
                    warn!(key = %self.key, error = %err, "ignoring stored theme preference");
                    self.default_mode
                }
            },
            Ok(None) => self.default_mode,
            Err(err) => {
                warn!(key = %self.key, error = %err, "theme preference unavailable");
                self.default_mode
            }
        }
    }

    /// Writes `mode`; a failed write is logged and otherwise ignored.
    pub fn save(&mut self, mode: ThemeMode) {
        if let Err(err) = self.backend.set(&self.key, mode.as_str()) {
            warn!(key = %self.key, %mode, error = %err, "failed to persist theme preference");
        }
    }
}

impl std::fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceStore")
            .field("key", &self.key)
            .field("default_mode", &self.default_mode)
            .finish_non_exhaustive()
    }
}
